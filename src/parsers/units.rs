//! # fdf 物理量单位换算
//!
//! fdf 的物理量写作 `value unit`，单位大小写不敏感。
//! 内部统一使用 eV（能量）和 K（温度）。
//!
//! ## 依赖关系
//! - 被 `parsers/fdf.rs`, `models/energy.rs`, `parsers/tbtrans.rs` 使用

use crate::error::{TbtError, Result};

/// Boltzmann 常数 (eV/K)
pub const BOLTZMANN_EV: f64 = 8.617_333_262e-5;

/// 1 Ry 对应的 eV
pub const RYDBERG_EV: f64 = 13.605_693_122_994;

/// 1 Hartree 对应的 eV
pub const HARTREE_EV: f64 = 27.211_386_245_988;

/// 1 J 对应的 eV
pub const JOULE_EV: f64 = 6.241_509_074_460_763e18;

/// 能量单位换算因子（→ eV）
pub fn energy_scale(unit: &str) -> Option<f64> {
    let scale = match unit.to_ascii_lowercase().as_str() {
        "ev" => 1.0,
        "mev" => 1e-3,
        "ry" => RYDBERG_EV,
        "mry" => 1e-3 * RYDBERG_EV,
        "ha" | "hartree" => HARTREE_EV,
        "mha" => 1e-3 * HARTREE_EV,
        "k" => BOLTZMANN_EV,
        "j" => JOULE_EV,
        _ => return None,
    };
    Some(scale)
}

/// 将能量换算为 eV
pub fn energy_to_ev(value: f64, unit: &str) -> Result<f64> {
    energy_scale(unit)
        .map(|s| value * s)
        .ok_or_else(|| TbtError::UnknownUnit {
            kind: "energy".to_string(),
            unit: unit.to_string(),
        })
}

/// 将温度换算为 K
pub fn temperature_to_kelvin(value: f64, unit: &str) -> Result<f64> {
    let kelvin = match unit.to_ascii_lowercase().as_str() {
        "k" => value,
        "ev" => value / BOLTZMANN_EV,
        "mev" => 1e-3 * value / BOLTZMANN_EV,
        "ry" => value * RYDBERG_EV / BOLTZMANN_EV,
        "mry" => 1e-3 * value * RYDBERG_EV / BOLTZMANN_EV,
        _ => {
            return Err(TbtError::UnknownUnit {
                kind: "temperature".to_string(),
                unit: unit.to_string(),
            })
        }
    };
    Ok(kelvin)
}

/// 解析实数，兼容 Fortran 风格指数 (`1.0d-3`) 与尾随小数点 (`2.`)
pub fn parse_real(token: &str) -> Option<f64> {
    let normalized: String = token
        .chars()
        .map(|c| if c == 'd' || c == 'D' { 'e' } else { c })
        .collect();
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 解析 fdf 逻辑值
pub fn parse_logical(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "t" | "true" | ".true." | "yes" | "y" => Some(true),
        "f" | "false" | ".false." | "no" | "n" => Some(false),
        _ => None,
    }
}
