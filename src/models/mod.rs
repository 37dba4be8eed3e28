//! # 数据模型模块
//!
//! 定义 TBtrans 输入、Hubbard 计算参数与自旋密度的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`transport/`、`density/` 和 `commands/` 使用
//! - 子模块: energy, tbtrans, hubbard, density

pub mod density;
pub mod energy;
pub mod hubbard;
pub mod tbtrans;

pub use density::SpinDensity;
pub use energy::EnergyExpr;
pub use hubbard::{ElectronCount, HubbardParams};
pub use tbtrans::TbtransInput;
