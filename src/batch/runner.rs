//! # 批量执行器
//!
//! 并行执行批量处理任务。
//!
//! ## 功能
//! - 基于 rayon 的并行迭代
//! - 进度条显示
//! - 错误收集与汇总报告
//!
//! ## 依赖关系
//! - 被 `commands/check.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{TbtError, Result};
use crate::utils::progress;

use rayon::prelude::*;
use std::path::PathBuf;

/// 单个文件处理结果
#[derive(Debug, Clone)]
pub enum ProcessResult {
    /// 处理成功
    Success(String),
    /// 跳过（如不是输运输入）
    Skipped(String),
    /// 处理失败
    Failed(String, String), // (文件路径, 错误信息)
}

/// 批量处理结果统计
#[derive(Debug, Default)]
pub struct BatchResult {
    /// 成功数量
    pub success: usize,
    /// 跳过数量
    pub skipped: usize,
    /// 失败数量
    pub failed: usize,
    /// 成功文件的摘要
    pub passed: Vec<String>,
    /// 跳过的文件
    pub skipped_files: Vec<String>,
    /// 失败详情
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    /// 合并处理结果
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Success(summary) => {
                self.success += 1;
                self.passed.push(summary);
            }
            ProcessResult::Skipped(path) => {
                self.skipped += 1;
                self.skipped_files.push(path);
            }
            ProcessResult::Failed(path, err) => {
                self.failed += 1;
                self.failures.push((path, err));
            }
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行作业数
    jobs: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    /// 并行处理文件列表，结果顺序与输入一致
    pub fn run<F>(&self, files: Vec<PathBuf>, processor: F) -> Result<BatchResult>
    where
        F: Fn(&PathBuf) -> ProcessResult + Sync + Send,
    {
        let pb = progress::create_progress_bar(files.len() as u64, "Checking");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| TbtError::Other(format!("Failed to start thread pool: {}", e)))?;

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
    fn test_run_collects_results() {
        let files: Vec<PathBuf> = ["a.fdf", "skip.fdf", "bad.fdf", "c.fdf"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let result = BatchRunner::new(2)
            .run(files, |f| {
                let name = f.display().to_string();
                if name.starts_with("bad") {
                    ProcessResult::Failed(name, "broken".to_string())
                } else if name.starts_with("skip") {
                    ProcessResult::Skipped(name)
                } else {
                    ProcessResult::Success(name)
                }
            })
            .unwrap();

        assert_eq!(result.total(), 4);
        assert_eq!((result.success, result.skipped, result.failed), (2, 1, 1));
        assert_eq!(result.failures[0].0, "bad.fdf");
        assert_eq!(result.passed, vec!["a.fdf", "c.fdf"]);
        assert_eq!(result.skipped_files, vec!["skip.fdf"]);
    }
}
