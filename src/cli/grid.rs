//! # grid 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/grid.rs`

use clap::Args;
use std::path::PathBuf;

/// grid 子命令参数
#[derive(Args, Debug)]
pub struct GridArgs {
    /// TBtrans input file
    pub input: PathBuf,

    /// Only expand this contour
    #[arg(long)]
    pub contour: Option<String>,

    /// Override the bias (eV)
    #[arg(long, allow_hyphen_values = true)]
    pub voltage: Option<f64>,

    /// Write points to a CSV file (contour,energy_eV,weight)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
