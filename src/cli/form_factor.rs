//! # form-factor 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/form_factor.rs`

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct FormFactorArgs {
    /// Ion name, e.g. Fe2
    pub ion: String,

    /// Orbital quantum number L
    #[arg(long, default_value_t = 0.0)]
    pub l: f64,

    /// Spin quantum number S
    #[arg(long, default_value_t = 0.5)]
    pub s: f64,

    /// Largest s = |Q|/4π to tabulate (1/Å)
    #[arg(long, default_value_t = 0.5)]
    pub q_max: f64,

    /// Step in s
    #[arg(long, default_value_t = 0.05)]
    pub step: f64,

    /// Print the squared form factor
    #[arg(long, default_value_t = false)]
    pub squared: bool,

    /// Extra form factor table in ILL text format
    #[arg(long, env = "MANDY_FORM_FACTORS")]
    pub form_factors: Option<PathBuf>,

    /// Also write the table to a CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
