//! # 批量执行器
//!
//! 在独立的 rayon 线程池中并行处理任务文件；单个文件失败不影响其他文件，
//! 失败信息汇总后统一报告。
//!
//! ## 依赖关系
//! - 被 `commands/simulate.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 与 `num_cpus`

use crate::error::{MandyError, Result};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个文件处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    Success(String),
    /// 跳过（如输出已存在）
    Skipped(String),
    /// (文件路径, 错误信息)
    Failed(String, String),
}

/// 批量处理统计
#[derive(Debug, Default)]
pub struct BatchResult {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 成功任务的说明（输入 -> 输出）
    pub completed: Vec<String>,
    /// 跳过原因
    pub skips: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Success(msg) => {
                self.success += 1;
                self.completed.push(msg);
            }
            ProcessResult::Skipped(reason) => {
                self.skipped += 1;
                self.skips.push(reason);
            }
            ProcessResult::Failed(path, err) => {
                self.failed += 1;
                self.failures.push((path, err));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

pub struct BatchRunner {
    jobs: usize,
}

impl BatchRunner {
    /// `jobs = 0` 时使用全部 CPU 核心
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 并行处理文件列表，结果顺序与输入一致
    pub fn run<F>(&self, files: &[PathBuf], processor: F) -> Result<BatchResult>
    where
        F: Fn(&PathBuf) -> ProcessResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, "Simulating");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| MandyError::Other(format!("Failed to build thread pool: {}", e)))?;

        let results: Vec<ProcessResult> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = processor(file);
                    pb.inc(1);
                    result
                })
                .collect()
        });

        pb.finish_and_clear();

        let mut batch_result = BatchResult::default();
        for result in results {
            batch_result.merge(result);
        }
        Ok(batch_result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_collects_statistics() {
        let files: Vec<PathBuf> = ["a.json", "b.json", "c.json", "d.json"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let result = BatchRunner::new(2)
            .run(&files, |file| {
                let name = file.display().to_string();
                match name.as_str() {
                    "a.json" => ProcessResult::Skipped(name),
                    "d.json" => ProcessResult::Failed(name, "boom".to_string()),
                    _ => ProcessResult::Success(name),
                }
            })
            .unwrap();

        assert_eq!(result.total(), 4);
        assert_eq!(result.success, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.failures, vec![("d.json".to_string(), "boom".to_string())]);
        assert_eq!(result.skips, vec!["a.json".to_string()]);
        assert_eq!(result.completed, vec!["b.json".to_string(), "c.json".to_string()]);
    }

    #[test]
    fn test_zero_jobs_uses_all_cores() {
        assert_eq!(BatchRunner::new(0).jobs(), num_cpus::get());
    }
}
