//! # 批量处理模块
//!
//! 对目录中的多个任务文件执行同一操作。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录）
//! - 按 glob 模式收集任务文件
//! - 并行执行，进度反馈与失败汇总
//!
//! ## 依赖关系
//! - 被 `commands/simulate.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
