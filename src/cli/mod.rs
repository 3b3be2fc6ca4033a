//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `simulate`: 计算磁 Bragg 峰强度
//! - `supercell`: 导出调制磁超胞
//! - `form-factor`: 列出离子磁形状因子
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: simulate, supercell, form_factor

pub mod form_factor;
pub mod simulate;
pub mod supercell;

use clap::{Parser, Subcommand};

/// Mandy - 磁中子衍射模拟
#[derive(Parser)]
#[command(name = "mandy")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Magnetic neutron diffraction from modulated magnetic supercells", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Compute magnetic Bragg intensities for a job file or a directory of jobs
    Simulate(simulate::SimulateArgs),

    /// Build the modulated magnetic supercell of a job and export it
    Supercell(supercell::SupercellArgs),

    /// Tabulate the normalised magnetic form factor of an ion
    FormFactor(form_factor::FormFactorArgs),
}
