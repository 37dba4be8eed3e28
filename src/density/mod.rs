//! # 自旋密度模块
//!
//! 管理平均场 Hubbard 计算的自旋密度：按参数哈希存档、检索与绘图。
//!
//! ## 依赖关系
//! - 被 `commands/density.rs` 使用
//! - 使用 `models/density.rs`, `models/hubbard.rs`
//! - 子模块: archive, plot

pub mod archive;
pub mod plot;

pub use archive::{DensityArchive, DensityRecord};
pub use plot::generate_polarization_plot;
