//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `models/`, `magnetic/`, `batch/`, `utils/`
//! - 子模块: simulate, supercell, form_factor

pub mod form_factor;
pub mod simulate;
pub mod supercell;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Simulate(args) => simulate::execute(args),
        Commands::Supercell(args) => supercell::execute(args),
        Commands::FormFactor(args) => form_factor::execute(args),
    }
}
