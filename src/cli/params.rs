//! # params 子命令 CLI 定义
//!
//! MFH 计算参数：跃迁、在位能、Hubbard U 与自旋填充
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - `HubbardOpts` 同时被 `cli/density.rs` 复用
//! - 参数传递给 `commands/params.rs`

use crate::models::HubbardParams;

use clap::Args;

// ─────────────────────────────────────────────────────────────
// 共享的 Hubbard 参数
// ─────────────────────────────────────────────────────────────

/// 紧束缚与 Hubbard 参数
#[derive(Args, Debug, Clone)]
pub struct HubbardOpts {
    /// First-neighbor hopping (eV)
    #[arg(long, default_value_t = 2.7)]
    pub t1: f64,

    /// Second-neighbor hopping (eV)
    #[arg(long, default_value_t = 0.2)]
    pub t2: f64,

    /// Third-neighbor hopping (eV); 0 selects the 1NN model
    #[arg(long, default_value_t = 0.18)]
    pub t3: f64,

    /// On-site Coulomb repulsion (eV)
    #[arg(short = 'U', long = "U", default_value_t = 0.0)]
    pub u: f64,

    /// Boron on-site energy (eV)
    #[arg(long = "eB", default_value_t = 3.0, allow_hyphen_values = true)]
    pub e_b: f64,

    /// Nitrogen on-site energy (eV)
    #[arg(long = "eN", default_value_t = -3.0, allow_hyphen_values = true)]
    pub e_n: f64,

    /// Spin-up electrons (default: neutral low-spin filling)
    #[arg(long)]
    pub nup: Option<i64>,

    /// Spin-down electrons (default: neutral low-spin filling)
    #[arg(long)]
    pub ndn: Option<i64>,
}

impl HubbardOpts {
    pub fn to_params(&self) -> HubbardParams {
        HubbardParams {
            t1: self.t1,
            t2: self.t2,
            t3: self.t3,
            u: self.u,
            e_b: self.e_b,
            e_n: self.e_n,
            nup: self.nup.unwrap_or(0),
            ndn: self.ndn.unwrap_or(0),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// params 子命令
// ─────────────────────────────────────────────────────────────

/// params 子命令参数
#[derive(Args, Debug)]
pub struct ParamsArgs {
    #[command(flatten)]
    pub hubbard: HubbardOpts,

    /// Number of boron atoms (π electrons: 0 each)
    #[arg(long, default_value_t = 0)]
    pub boron: usize,

    /// Number of carbon atoms (π electrons: 1 each)
    #[arg(long, default_value_t = 0)]
    pub carbon: usize,

    /// Number of nitrogen atoms (π electrons: 2 each)
    #[arg(long, default_value_t = 0)]
    pub nitrogen: usize,

    /// Move this many electrons from spin-down to spin-up
    #[arg(long, allow_hyphen_values = true)]
    pub polarize: Option<i64>,

    /// Stem used for the output label
    #[arg(long, default_value = "molecule")]
    pub stem: String,

    /// Uniform k-point mesh, e.g. '4,1,1'
    #[arg(long)]
    pub kmesh: Option<String>,
}
