//! # simulate 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/simulate.rs`

use crate::magnetic::IntensityFormula;

use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

/// 强度公式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FormulaArg {
    /// Selection-rule weighted structure factor (collinear moments)
    SelectionRule,
    /// Projection of the vector structure factor perpendicular to Q
    Orthogonal,
}

impl From<FormulaArg> for IntensityFormula {
    fn from(arg: FormulaArg) -> Self {
        match arg {
            FormulaArg::SelectionRule => IntensityFormula::SelectionRule,
            FormulaArg::Orthogonal => IntensityFormula::OrthogonalProjection,
        }
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// CSV (h, k, l, intensity)
    Csv,
    /// JSON document with metadata
    Json,
    /// Whitespace separated columns with a commented header
    Dat,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Dat => "dat",
        }
    }

    /// 从扩展名推断，未知扩展名使用 CSV
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .as_deref()
        {
            Some("json") => OutputFormat::Json,
            Some("dat") | Some("txt") | Some("xy") => OutputFormat::Dat,
            _ => OutputFormat::Csv,
        }
    }
}

/// 解析 "x,y,z" 形式的方向
pub fn parse_direction(input: &str) -> Result<[f64; 3], String> {
    let values: Vec<f64> = input
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("Invalid direction '{}'. Expected three numbers, e.g. 0,0,1", input))?;

    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!(
            "Invalid direction '{}'. Expected three components, found {}",
            input,
            values.len()
        )),
    }
}

/// simulate 子命令参数
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Input: job file (JSON) or directory containing job files
    pub input: PathBuf,

    /// Output: file path (single mode) or directory (batch mode)
    #[arg(short, long, default_value = "bragg.csv")]
    pub output: PathBuf,

    /// Output format (auto-detected from extension if not specified)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Intensity formula (overrides the job file)
    #[arg(long, value_enum)]
    pub formula: Option<FormulaArg>,

    /// Global moment direction for the selection rule, e.g. "0,0,1" (overrides the job file)
    #[arg(long, value_parser = parse_direction, allow_hyphen_values = true)]
    pub orientation: Option<[f64; 3]>,

    /// Extra form factor table in ILL text format
    #[arg(long, env = "MANDY_FORM_FACTORS")]
    pub form_factors: Option<PathBuf>,

    /// Number of strongest peaks to print
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// File pattern for batch mode (comma separated)
    #[arg(short, long, default_value = "*.json")]
    pub pattern: String,

    /// Search subdirectories in batch mode
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs in batch mode (0 = all cores)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files in batch mode
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direction() {
        assert_eq!(parse_direction("0,0,1").unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(parse_direction(" 1, -1 , 0.5").unwrap(), [1.0, -1.0, 0.5]);
        assert!(parse_direction("1,0").is_err());
        assert!(parse_direction("x,y,z").is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.JSON")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path(Path::new("out.dat")), OutputFormat::Dat);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Csv);
    }
}
