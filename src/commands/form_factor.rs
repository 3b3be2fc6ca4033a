//! # form-factor 子命令实现
//!
//! 按 s = |Q|/4π 列出离子的归一化磁形状因子 f(s)/f(0)。
//!
//! ## 依赖关系
//! - 使用 `cli/form_factor.rs` 定义的 FormFactorArgs
//! - 使用 `magnetic/form_factor.rs`

use crate::cli::form_factor::FormFactorArgs;
use crate::error::{MandyError, Result};
use crate::magnetic::{FormFactorTable, MagneticFormFactor};
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct FormFactorRow {
    #[tabled(rename = "s (1/Å)")]
    s: String,
    #[tabled(rename = "|Q| (1/Å)")]
    q: String,
    #[tabled(rename = "f(s)/f(0)")]
    value: String,
}

pub fn execute(args: FormFactorArgs) -> Result<()> {
    output::print_header(&format!("Magnetic Form Factor: {}", args.ion));

    if args.step <= 0.0 || args.q_max < 0.0 {
        return Err(MandyError::InvalidRange(format!(
            "q-max {} / step {} (need q-max >= 0 and step > 0)",
            args.q_max, args.step
        )));
    }

    let mut table = FormFactorTable::builtin();
    if let Some(path) = &args.form_factors {
        table.merge(FormFactorTable::from_file(path)?);
        output::print_info(&format!("Loaded form factor table '{}'", path.display()));
    }

    let factor = match table.resolve(&args.ion, args.l, args.s) {
        Ok(factor) => factor,
        Err(e) => {
            output::print_info(&format!("Known ions: {}", table.ions().join(", ")));
            return Err(e);
        }
    };
    if factor.normalization() == 0.0 {
        output::print_warning("f(0) = 0 for these quantum numbers, all values are reported as 0");
    }

    let values = tabulate(&factor, &sample_points(args.q_max, args.step), args.squared);

    let rows: Vec<FormFactorRow> = values
        .iter()
        .map(|(s, value)| FormFactorRow {
            s: format!("{:.3}", s),
            q: format!("{:.3}", s * 4.0 * std::f64::consts::PI),
            value: format!("{:.6}", value),
        })
        .collect();
    println!("{}", Table::new(&rows));

    if let Some(path) = &args.output {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["s", "value"])?;
        for (s, value) in &values {
            wtr.write_record(&[format!("{:.6}", s), format!("{:.8}", value)])?;
        }
        wtr.flush().map_err(|e| MandyError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        output::print_success(&format!("Table saved to '{}'", path.display()));
    }

    Ok(())
}

/// 0, step, 2·step, ... 直到 q_max（含端点附近的舍入）
fn sample_points(q_max: f64, step: f64) -> Vec<f64> {
    let count = (q_max / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| i as f64 * step).collect()
}

/// 每个 s 对应 f(s)/f(0)，或其平方
fn tabulate(factor: &MagneticFormFactor, points: &[f64], squared: bool) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&s| {
            let value = if squared {
                factor.normalized_squared(s)
            } else {
                factor.normalized(s)
            };
            (s, value)
        })
        .collect()
}
