//! # 统一错误处理模块
//!
//! 定义 Mandy 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 配置错误（未知离子、缺失位点标签、标签数量不匹配）：立即返回，不重试
//! - I/O 与解析错误：来自任务文件、标签缓存、形状因子表
//! - 数值边界情况（零向量、(000) 指数）不是错误，由计算模块返回哨兵值 0
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// Mandy 统一错误类型
#[derive(Error, Debug)]
pub enum MandyError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Invalid term symbol '{0}' (expected e.g. '6D' or '5D<4>')")]
    InvalidTermSymbol(String),

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("No form factor coefficients for ion '{ion}' (order <j{order}>)")]
    UnknownIon { ion: String, order: u8 },

    #[error("Site label '{label}' is not defined in the magnetic site table")]
    MissingSite { label: String },

    #[error("Site label '{label}' is defined more than once")]
    DuplicateSite { label: String },

    #[error("Label count mismatch: {found} labels for {expected} position rows")]
    LabelCountMismatch { expected: usize, found: usize },

    #[error("Degenerate lattice: {0}")]
    DegenerateLattice(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid range format: {0}")]
    InvalidRange(String),

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MandyError>;
