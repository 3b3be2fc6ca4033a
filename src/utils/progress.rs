//! # 进度显示
//!
//! 封装 `indicatif`：批量任务用计数进度条，单个任务的强度扫描用 spinner。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 和 `commands/simulate.rs` 使用
//! - 使用 `indicatif` crate

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// 批量任务进度条
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .map(|style| style.progress_chars("#>-"))
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// 不确定时长的计算
pub fn create_spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.green} {elapsed_precise} {msg}")
        .map(|style| style.tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
