//! # supercell 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/supercell.rs`

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SupercellArgs {
    /// Input job file (JSON)
    pub input: PathBuf,

    /// Output CSV file (label, x, y, z, mx, my, mz)
    #[arg(short, long, default_value = "supercell.csv")]
    pub output: PathBuf,

    /// Also write the resolved site labels to <name>SiteNames.dat next to the output
    #[arg(long)]
    pub save_labels: bool,
}
