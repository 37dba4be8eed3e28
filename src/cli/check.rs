//! # check 子命令 CLI 定义
//!
//! 检查单个 TBtrans 输入或批量检查目录中的 fdf 文件
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/check.rs`

use clap::Args;
use std::path::PathBuf;

/// check 子命令参数
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input fdf file or directory
    pub input: PathBuf,

    /// Glob pattern(s) for directory mode (comma-separated)
    #[arg(short, long, default_value = "*.fdf")]
    pub pattern: String,

    /// Recurse into subdirectories
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, default_value_t = 0, env = "TBTKIT_JOBS")]
    pub jobs: usize,

    /// Number of atoms in the device (overrides NumberOfAtoms)
    #[arg(long)]
    pub atoms: Option<usize>,

    /// Check that TBT.HS and electrode HS files exist
    #[arg(long, default_value_t = false)]
    pub check_files: bool,

    /// Treat warnings as failures
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}
