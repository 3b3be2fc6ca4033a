//! # Mandy - 磁中子衍射模拟工具
//!
//! 从晶体结构与磁性位点出发，构建带调制（自旋密度波、螺旋、摆线）的磁超胞，
//! 并计算给定 Miller 指数处的磁 Bragg 峰强度。
//!
//! ## 子命令
//! - `simulate`    - 计算 Bragg 峰强度（单任务文件或批量目录）
//! - `supercell`   - 构建并导出调制磁超胞
//! - `form-factor` - 列出离子的磁形状因子
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── models/    (晶体、位点、任务文件)
//!   │     └── magnetic/  (形状因子、选择定则、调制、强度)
//!   ├── batch/      (批量处理)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod magnetic;
mod models;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
