//! # density 子命令 CLI 定义
//!
//! 自旋密度存档统一入口，包含多个子命令：
//! - `list`: 列出存档记录
//! - `show`: 显示某条记录的逐格点密度
//! - `put`: 写入（或替换）一条记录
//! - `plot`: 绘制自旋极化图
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 使用 `cli/params.rs` 的 HubbardOpts
//! - 参数传递给 `commands/density.rs`

use super::params::HubbardOpts;

use clap::{Args, Subcommand};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// Density 主命令
// ─────────────────────────────────────────────────────────────

/// density 主命令参数
#[derive(Args, Debug)]
pub struct DensityArgs {
    /// Density archive (CSV)
    #[arg(short, long, default_value = "densities.csv", global = true)]
    pub archive: PathBuf,

    #[command(subcommand)]
    pub command: DensityCommands,
}

/// density 子命令
#[derive(Subcommand, Debug)]
pub enum DensityCommands {
    /// List archived records
    List,

    /// Show the per-site density of one record
    Show(RecordArgs),

    /// Store a density under the hash of the given parameters
    Put(PutArgs),

    /// Plot the per-site spin polarization of one record
    Plot(PlotArgs),
}

// ─────────────────────────────────────────────────────────────
// 子命令参数
// ─────────────────────────────────────────────────────────────

/// 按哈希选择记录
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Record hash (7 hex digits, as printed by 'params' and 'list')
    pub hash: String,
}

/// put 子命令参数
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Density file: CSV with columns 'up,dn', one row per site
    pub input: PathBuf,

    #[command(flatten)]
    pub hubbard: HubbardOpts,

    /// Total energy of the converged solution (eV)
    #[arg(long, allow_hyphen_values = true)]
    pub etot: Option<f64>,

    /// Rescale the density to Nup/Ndn electrons before storing
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Sites (0-based, comma-separated) forced to spin up before storing
    #[arg(long, value_delimiter = ',')]
    pub up_sites: Vec<usize>,

    /// Sites (0-based, comma-separated) forced to spin down before storing
    #[arg(long, value_delimiter = ',')]
    pub dn_sites: Vec<usize>,
}

/// plot 子命令参数
#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Record hash (7 hex digits)
    pub hash: String,

    /// Output image (.png or .svg)
    #[arg(short, long, default_value = "polarization.png")]
    pub output: PathBuf,

    /// Plot title (default: parameters of the record)
    #[arg(long)]
    pub title: Option<String>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    pub height: u32,
}
