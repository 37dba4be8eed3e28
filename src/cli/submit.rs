//! # submit 子命令 CLI 定义
//!
//! 由一个 TBtrans 输入模板生成偏压扫描作业并提交到 Slurm
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/submit.rs`

use clap::Args;
use std::path::PathBuf;

/// submit 子命令参数
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// TBtrans input template
    pub input: PathBuf,

    /// Bias values in eV: 'start:stop:step' (inclusive) or a comma list
    #[arg(long, allow_hyphen_values = true)]
    pub voltages: String,

    /// Root directory for job folders
    #[arg(long, default_value = "jobs")]
    pub jobs_root: PathBuf,

    // ─────────────────────────────────────────────────────────────
    // TBtrans options
    // ─────────────────────────────────────────────────────────────
    /// TBtrans executable name
    #[arg(long, default_value = "tbtrans")]
    pub tbtrans_exec: String,

    /// Number of MPI processes (1 = run without mpirun)
    #[arg(long, default_value_t = 1)]
    pub np: u32,

    /// Module list (comma-separated)
    #[arg(long, default_value = "")]
    pub modules: String,

    // ─────────────────────────────────────────────────────────────
    // Slurm options
    // ─────────────────────────────────────────────────────────────
    /// Slurm partition
    #[arg(long, default_value = "cpu")]
    pub partition: String,

    /// Slurm constraint
    #[arg(long)]
    pub constraint: Option<String>,

    /// Number of nodes
    #[arg(long, default_value_t = 1)]
    pub nodes: u32,

    /// Number of tasks
    #[arg(long, default_value_t = 1)]
    pub ntasks: u32,

    /// CPUs per task
    #[arg(long, default_value_t = 1)]
    pub cpus_per_task: u32,

    /// Memory per CPU
    #[arg(long, default_value = "2G")]
    pub mem_per_cpu: String,

    /// Time limit (e.g., '04:00:00')
    #[arg(long, default_value = "04:00:00")]
    pub time: String,

    // ─────────────────────────────────────────────────────────────
    // Execution control
    // ─────────────────────────────────────────────────────────────
    /// Only generate job files, do not submit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Submit jobs to Slurm after generation
    #[arg(long, default_value_t = false)]
    pub submit: bool,

    /// Generate jobs even if the template fails validation
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
