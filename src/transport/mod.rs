//! # 输运设置模块
//!
//! 对已解析的 TBtrans 输入做一致性检查，并展开实轴能量网格。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/tbtrans.rs`
//! - 子模块: validate, grid, export

pub mod export;
pub mod grid;
pub mod validate;

pub use grid::{expand_contour, point_count, EnergyPoint};
pub use validate::{validate, Report, Severity, ValidateOptions};
