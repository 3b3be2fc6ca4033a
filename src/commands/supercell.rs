//! # supercell 子命令实现
//!
//! 构建任务的调制磁超胞并导出位置与磁矩；可选写出位点标签缓存文件。
//!
//! ## 依赖关系
//! - 使用 `cli/supercell.rs` 定义的 SupercellArgs
//! - 使用 `models/job.rs` 和 `magnetic/export.rs`

use crate::cli::supercell::SupercellArgs;
use crate::error::Result;
use crate::magnetic;
use crate::models::Job;
use crate::utils::output;

use std::path::Path;

pub fn execute(args: SupercellArgs) -> Result<()> {
    output::print_header("Modulated Magnetic Supercell");

    let job = Job::load(&args.input)?;
    for warning in job.warnings() {
        output::print_warning(&warning);
    }

    let crystal = job.crystal()?;
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();
    output::print_field(
        "Lattice",
        format!("{:.4} {:.4} {:.4} / {:.2} {:.2} {:.2}", a, b, c, alpha, beta, gamma),
    );

    let geometry = job.geometry()?;
    let cell = job.unit_cell()?;
    output::print_field("Site labels", cell.labels().join(", "));
    let sites = job.site_table()?;
    let supercell = job.supercell(&cell, &sites, &geometry)?;

    output::print_notes(&supercell.notes);
    match job.modulation() {
        Some(modulation) => {
            output::print_field("Wavevector", format!("{:?}", modulation.wavevector));
            output::print_field("Mode", modulation.mode);
        }
        None => output::print_info("No modulation given, exporting the unit cell"),
    }
    output::print_field(
        "Tiles",
        format!(
            "{} x {} x {} ({} cells)",
            supercell.tiles[0],
            supercell.tiles[1],
            supercell.tiles[2],
            supercell.cell_count()
        ),
    );
    output::print_field("Moments", supercell.len());

    magnetic::export::supercell_to_csv(&supercell, &args.output)?;
    output::print_success(&format!("Supercell saved to '{}'", args.output.display()));

    if args.save_labels {
        let dir = args.output.parent().unwrap_or_else(|| Path::new(""));
        let path = job.save_labels(&cell, dir)?;
        output::print_success(&format!("Site labels saved to '{}'", path.display()));
    }
    Ok(())
}
