//! # 解析器模块
//!
//! 提供 fdf 格式的通用解析器以及 TBtrans/TranSiesta 输入的读写。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: fdf, tbtrans, units

pub mod fdf;
pub mod tbtrans;
pub mod units;

pub use fdf::{parse_fdf_file, FdfDocument};
pub use tbtrans::{parse_tbtrans_file, read_tbtrans, to_tbtrans_string};
