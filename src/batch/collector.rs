//! # 任务文件收集
//!
//! 单文件输入原样返回；目录输入按 glob 模式（逗号分隔，如 `*.json,job_*`）
//! 匹配文件名，可选递归。结果按路径排序，批量输出顺序稳定。
//!
//! ## 依赖关系
//! - 被 `commands/simulate.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{MandyError, Result};

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 任务文件的默认匹配模式
pub const DEFAULT_PATTERN: &str = "*.json";

pub struct FileCollector {
    input: PathBuf,
    patterns: Vec<Pattern>,
    recursive: bool,
}

impl FileCollector {
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: Vec::new(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔）；空模式回退到 `*.json`
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let mut patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    MandyError::InvalidArgument(format!("invalid glob pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if patterns.is_empty() {
            patterns.push(default_pattern()?);
        }
        self.patterns = patterns;
        Ok(self)
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn is_single_file(&self) -> bool {
        self.input.is_file()
    }

    /// 收集匹配的文件；输入不存在时报错
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }

        if !self.input.is_dir() {
            return Err(MandyError::FileNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let default = [default_pattern()?];
        let patterns = if self.patterns.is_empty() {
            &default[..]
        } else {
            &self.patterns[..]
        };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| matches_any(patterns, e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        Ok(files)
    }
}

fn default_pattern() -> Result<Pattern> {
    Pattern::new(DEFAULT_PATTERN)
        .map_err(|e| MandyError::InvalidArgument(format!("invalid glob pattern: {}", e)))
}

fn matches_any(patterns: &[Pattern], path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| patterns.iter().any(|p| p.matches(name)))
        .unwrap_or(false)
}
