//! # init 子命令 CLI 定义
//!
//! 生成左右两电极器件的 TBtrans 输入模板
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/init.rs`

use clap::Args;
use std::path::PathBuf;

/// init 子命令参数
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Output file
    #[arg(short, long, default_value = "RUN.fdf")]
    pub output: PathBuf,

    /// System label
    #[arg(long, default_value = "device")]
    pub label: String,

    /// Device Hamiltonian file (default: <label>.TSHS)
    #[arg(long)]
    pub hs: Option<String>,

    /// Left electrode Hamiltonian file
    #[arg(long, default_value = "elec-left.TSHS")]
    pub left_hs: String,

    /// Right electrode Hamiltonian file
    #[arg(long, default_value = "elec-right.TSHS")]
    pub right_hs: String,

    /// Bias voltage (eV)
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub voltage: f64,

    /// Electronic temperature (K)
    #[arg(long, default_value_t = 300.0)]
    pub temperature: f64,

    /// Number of atoms in the device
    #[arg(long)]
    pub atoms: Option<usize>,

    /// Atoms used by each electrode
    #[arg(long)]
    pub electrode_atoms: Option<usize>,

    /// Overwrite an existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Write the template even if it fails validation
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
