//! # simulate 子命令实现
//!
//! 读取任务文件，构建调制超胞并计算磁 Bragg 峰强度。
//!
//! ## 功能
//! - 单任务文件与批量目录两种模式
//! - 命令行覆盖任务中的强度公式与磁矩方向
//! - 导出 CSV / JSON / DAT，终端打印最强峰表格
//!
//! ## 依赖关系
//! - 使用 `cli/simulate.rs` 定义的 SimulateArgs
//! - 使用 `batch/` 进行批量处理
//! - 使用 `models/job.rs` 和 `magnetic/`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::simulate::{OutputFormat, SimulateArgs};
use crate::error::{MandyError, Result};
use crate::magnetic::{self, BraggPeak, BraggResult, DiffractionCalculator, IntensityFormula, MomentOrientation};
use crate::models::Job;
use crate::utils::{output, progress};

use std::fs;
use std::path::{Path, PathBuf};

/// 命令行对任务的覆盖项
#[derive(Debug, Clone)]
struct Overrides {
    formula: Option<IntensityFormula>,
    orientation: Option<[f64; 3]>,
    form_factors: Option<PathBuf>,
}

/// 一次模拟的全部产物
struct Simulation {
    job: Job,
    formula: IntensityFormula,
    result: BraggResult,
    supercell_size: usize,
    tiles: [usize; 3],
    notes: Vec<String>,
}

/// 执行 simulate
pub fn execute(args: SimulateArgs) -> Result<()> {
    output::print_header("Magnetic Neutron Diffraction");

    let overrides = Overrides {
        formula: args.formula.map(IntensityFormula::from),
        orientation: args.orientation,
        form_factors: args.form_factors.clone(),
    };

    if args.input.is_file() {
        execute_single_file(&args, &overrides)
    } else if args.input.is_dir() {
        execute_batch(&args, &overrides)
    } else {
        Err(MandyError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 单文件模式
fn execute_single_file(args: &SimulateArgs, overrides: &Overrides) -> Result<()> {
    output::print_info(&format!("Single job mode: '{}'", args.input.display()));

    let job = Job::load(&args.input)?;
    output::print_success(&format!(
        "Loaded job: {} ({} atoms, {} magnetic sites)",
        job.name,
        job.structure.atoms.len(),
        job.sites.len()
    ));
    for warning in job.warnings() {
        output::print_warning(&warning);
    }

    let spinner = progress::create_spinner("Computing structure factors...");
    let simulation = simulate(job, overrides);
    spinner.finish_and_clear();
    let simulation = simulation?;

    output::print_notes(&simulation.notes);
    output::print_field("Formula", simulation.formula);
    output::print_field(
        "Supercell",
        format!(
            "{} x {} x {} cells, {} moments",
            simulation.tiles[0], simulation.tiles[1], simulation.tiles[2], simulation.supercell_size
        ),
    );
    output::print_field("Reflections", simulation.result.len());
    output::print_field("Max intensity", format!("{:.6e}", simulation.result.max_intensity()));

    let format = args.format.unwrap_or_else(|| OutputFormat::from_path(&args.output));
    write_result(&simulation, format, &args.output)?;

    print_peak_table(&simulation.result.strongest(args.top));
    output::print_success(&format!("Intensities saved to '{}'", args.output.display()));
    Ok(())
}

/// 批量模式
fn execute_batch(args: &SimulateArgs, overrides: &Overrides) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    output::print_info(&format!("Found {} job files", files.len()));

    fs::create_dir_all(&args.output).map_err(|e| MandyError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let format = args.format.unwrap_or(OutputFormat::Csv);
    output::print_info(&format!("Output format: {:?}", format));

    let runner = BatchRunner::new(args.jobs);
    output::print_info(&format!("Worker threads: {}", runner.jobs()));
    let result = runner.run(&files, |file| {
        process_batch_file(file, &args.output, format, args.overwrite, overrides)
    })?;

    output::print_separator();
    print_listing(&result.completed, output::print_info);
    print_listing(&result.skips, output::print_skip);
    output::print_success(&format!(
        "Batch complete: {} jobs, {} success, {} skipped, {} failed",
        result.total(),
        result.success,
        result.skipped,
        result.failed
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed jobs:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 最多列出 10 条，其余只给出数量
fn print_listing(lines: &[String], print: fn(&str)) {
    for line in lines.iter().take(10) {
        print(line);
    }
    if lines.len() > 10 {
        output::print_info(&format!("  ... and {} more", lines.len() - 10));
    }
}

/// 批量模式中的单个任务
fn process_batch_file(
    input: &PathBuf,
    output_dir: &Path,
    format: OutputFormat,
    overwrite: bool,
    overrides: &Overrides,
) -> ProcessResult {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("job");
    let output_file = output_dir.join(format!("{}_bragg.{}", stem, format.extension()));

    if output_file.exists() && !overwrite {
        return ProcessResult::Skipped(format!(
            "Output exists, skipping: {}",
            output_file.display()
        ));
    }

    let outcome = Job::load(input)
        .and_then(|job| simulate(job, overrides))
        .and_then(|simulation| write_result(&simulation, format, &output_file));

    match outcome {
        Ok(()) => ProcessResult::Success(format!("{} -> {}", input.display(), output_file.display())),
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}

/// 构建晶胞、位点与超胞并计算强度
fn simulate(job: Job, overrides: &Overrides) -> Result<Simulation> {
    let geometry = job.geometry()?;
    let cell = job.unit_cell()?;
    let sites = job.site_table()?;
    let table = job.form_factor_table(overrides.form_factors.as_deref())?;
    let request = job.miller_request()?;

    let supercell = job.supercell(&cell, &sites, &geometry)?;

    let formula = overrides.formula.unwrap_or(job.formula);
    let orientation = match overrides.orientation {
        Some(direction) => MomentOrientation::Global(direction),
        None => job.orientation(),
    };

    let result = DiffractionCalculator::new(&geometry, &sites, &table)
        .formula(formula)
        .orientation(orientation)
        .calculate(&supercell, &request)?;

    Ok(Simulation {
        job,
        formula,
        result,
        supercell_size: supercell.len(),
        tiles: supercell.tiles,
        notes: supercell.notes,
    })
}

fn write_result(simulation: &Simulation, format: OutputFormat, path: &Path) -> Result<()> {
    let name = &simulation.job.name;
    match format {
        OutputFormat::Csv => magnetic::export::bragg_to_csv(&simulation.result, path),
        OutputFormat::Json => {
            magnetic::export::bragg_to_json(&simulation.result, name, simulation.formula, path)
        }
        OutputFormat::Dat => {
            magnetic::export::bragg_to_dat(&simulation.result, name, simulation.formula, path)
        }
    }
}

/// 打印最强峰表格
fn print_peak_table(peaks: &[BraggPeak]) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct PeakRow {
        #[tabled(rename = "(hkl)")]
        hkl: String,
        #[tabled(rename = "I")]
        intensity: String,
    }

    let rows: Vec<PeakRow> = peaks
        .iter()
        .map(|p| PeakRow {
            hkl: format!("({} {} {})", p.index[0], p.index[1], p.index[2]),
            intensity: format!("{:.6e}", p.intensity),
        })
        .collect();

    if !rows.is_empty() {
        output::print_header(&format!("Top {} Magnetic Bragg Peaks", rows.len()));
        println!("{}", Table::new(&rows));
    }
}
