//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `check`: 检查 TBtrans 输入（单文件或批量目录）
//! - `show`: 以表格显示解析后的输运设置
//! - `fmt`: 规范化重写 fdf 文件
//! - `init`: 生成两电极器件输入模板
//! - `grid`: 展开实轴能量网格
//! - `params`: MFH 参数标签、指纹与填充
//! - `density`: 自旋密度存档（嵌套子命令）
//!   - `list`, `show`, `put`, `plot`
//! - `submit`: 偏压扫描作业生成与提交
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: check, show, fmt, init, grid, params, density, submit

pub mod check;
pub mod density;
pub mod fmt;
pub mod grid;
pub mod init;
pub mod params;
pub mod show;
pub mod submit;

use clap::{Parser, Subcommand};

/// tbtkit - TBtrans 输入与 MFH 参数工具箱
#[derive(Parser)]
#[command(name = "tbtkit")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "TBtrans/TranSiesta input toolkit for mean-field Hubbard transport setups", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Disable colored output
    #[arg(long, global = true, env = "TBTKIT_NO_COLOR", default_value_t = false)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Check TBtrans inputs for consistency (file or directory)
    Check(check::CheckArgs),

    /// Show the parsed transport setup of an input file
    Show(show::ShowArgs),

    /// Rewrite an fdf file in normalized form
    Fmt(fmt::FmtArgs),

    /// Generate a two-electrode TBtrans input template
    Init(init::InitArgs),

    /// Expand contour windows into energy points and weights
    Grid(grid::GridArgs),

    /// Print mean-field Hubbard parameter label, fingerprint and filling
    Params(params::ParamsArgs),

    /// Manage the spin-density archive
    Density(density::DensityArgs),

    /// Generate (and optionally submit) a bias sweep for Slurm
    Submit(submit::SubmitArgs),
}
