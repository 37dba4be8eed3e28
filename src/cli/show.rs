//! # show 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/show.rs`

use clap::Args;
use std::path::PathBuf;

/// show 子命令参数
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// TBtrans input file
    pub input: PathBuf,

    /// Override the bias (eV) used to evaluate expressions
    #[arg(long, allow_hyphen_values = true)]
    pub voltage: Option<f64>,
}
