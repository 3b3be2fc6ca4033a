//! # 工具函数模块
//!
//! 提供美化输出、进度条与三维向量运算。
//!
//! ## 依赖关系
//! - 被 `magnetic/`、`models/` 和 `commands/` 使用
//! - 子模块: output, progress, vector

pub mod output;
pub mod progress;
pub mod vector;
