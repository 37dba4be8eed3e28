//! # 实轴能量网格
//!
//! 将 `TBT.Contour.<name>` 窗口展开为能量点与积分权重。
//!
//! ## 积分方法
//! - `mid-rule`: 中点公式，`E_i = from + (i + 1/2) h`，权重 `h`
//! - `simpson-mix`: 复合 Simpson 公式（N 向上取偶数），包含端点
//! - `gauss-legendre`: Gauss–Legendre 节点映射到 `[from, to]`
//!
//! 所有方法的权重之和等于窗口宽度 `to - from`。
//!
//! ## 依赖关系
//! - 被 `commands/grid.rs` 调用
//! - 使用 `models/tbtrans.rs` 的 Contour

use crate::error::{TbtError, Result};
use crate::models::tbtrans::{Contour, QuadratureMethod, Spacing};

/// 能量点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyPoint {
    /// 能量 (eV)
    pub energy: f64,
    /// 积分权重 (eV)
    pub weight: f64,
}

/// 单个窗口允许的最大能量点数
pub const MAX_POINTS: usize = 1_000_000;

/// Gauss–Legendre 节点数上限（求根代价为 O(N²)）
pub const MAX_GAUSS_NODES: usize = 4096;

/// 窗口展开后的能量点数，不分配内存
pub fn point_count(contour: &Contour, voltage_ev: f64, kt_ev: f64) -> Result<usize> {
    let n = intervals(contour, voltage_ev, kt_ev)?;
    Ok(match contour.method {
        QuadratureMethod::SimpsonMix => even_intervals(n) + 1,
        _ => n,
    })
}

/// 窗口的点数（Simpson 公式为区间数）
fn intervals(contour: &Contour, voltage_ev: f64, kt_ev: f64) -> Result<usize> {
    let from = contour.from.evaluate(voltage_ev, kt_ev);
    let to = contour.to.evaluate(voltage_ev, kt_ev);
    let width = to - from;
    let invalid = |reason: String| TbtError::InvalidBlock {
        block: format!("TBT.Contour.{}", contour.name),
        reason,
    };

    if !width.is_finite() || width <= 0.0 {
        return Err(invalid(format!("empty window [{}, {}] eV", from, to)));
    }

    let n = match contour.spacing {
        Spacing::Points(0) => return Err(invalid("zero points".to_string())),
        Spacing::Points(n) => n,
        Spacing::Delta(d) if d > 0.0 => {
            let ratio = (width / d - 1e-9).ceil();
            if !ratio.is_finite() || ratio > MAX_POINTS as f64 {
                return Err(invalid(format!(
                    "delta {} eV gives more than {} points",
                    d, MAX_POINTS
                )));
            }
            (ratio as usize).max(1)
        }
        Spacing::Delta(d) => return Err(invalid(format!("non-positive delta {}", d))),
    };

    if n > MAX_POINTS {
        return Err(invalid(format!("{} points exceed the limit of {}", n, MAX_POINTS)));
    }
    if contour.method == QuadratureMethod::GaussLegendre && n > MAX_GAUSS_NODES {
        return Err(invalid(format!(
            "{} Gauss-Legendre nodes exceed the limit of {}",
            n, MAX_GAUSS_NODES
        )));
    }
    Ok(n)
}

/// 展开积分窗口
pub fn expand_contour(contour: &Contour, voltage_ev: f64, kt_ev: f64) -> Result<Vec<EnergyPoint>> {
    let n = intervals(contour, voltage_ev, kt_ev)?;
    let from = contour.from.evaluate(voltage_ev, kt_ev);
    let to = contour.to.evaluate(voltage_ev, kt_ev);
    let width = to - from;

    let points = match contour.method {
        QuadratureMethod::MidRule => mid_rule(from, to, n),
        QuadratureMethod::SimpsonMix => simpson(from, to, n),
        QuadratureMethod::GaussLegendre => {
            let (nodes, weights) = gauss_legendre(n);
            let half = 0.5 * width;
            let mid = 0.5 * (from + to);
            nodes
                .iter()
                .zip(&weights)
                .map(|(x, w)| EnergyPoint {
                    energy: mid + half * x,
                    weight: half * w,
                })
                .collect()
        }
    };

    Ok(points)
}

fn mid_rule(from: f64, to: f64, n: usize) -> Vec<EnergyPoint> {
    let h = (to - from) / n as f64;
    (0..n)
        .map(|i| EnergyPoint {
            energy: from + (i as f64 + 0.5) * h,
            weight: h,
        })
        .collect()
}

/// Simpson 公式的区间数向上取偶数
fn even_intervals(n: usize) -> usize {
    if n % 2 == 1 {
        n + 1
    } else {
        n.max(2)
    }
}

fn simpson(from: f64, to: f64, n: usize) -> Vec<EnergyPoint> {
    let n = even_intervals(n);
    let h = (to - from) / n as f64;
    (0..=n)
        .map(|i| {
            let factor = if i == 0 || i == n {
                1.0
            } else if i % 2 == 1 {
                4.0
            } else {
                2.0
            };
            EnergyPoint {
                energy: from + i as f64 * h,
                weight: factor * h / 3.0,
            }
        })
        .collect()
}

/// [-1, 1] 上的 Gauss–Legendre 节点与权重（Newton 迭代求 P_n 的零点）
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let m = n.div_ceil(2);

    for i in 0..m {
        // Chebyshev 初值
        let mut z = (std::f64::consts::PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 0.0;

        for _ in 0..100 {
            let (p, d) = legendre(n, z);
            dp = d;
            let z_next = z - p / d;
            let converged = (z_next - z).abs() < 1e-15;
            z = z_next;
            if converged {
                break;
            }
        }

        let (_, d) = legendre(n, z);
        if d.is_finite() {
            dp = d;
        }

        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        let w = 2.0 / ((1.0 - z * z) * dp * dp);
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}

/// 返回 (P_n(x), P_n'(x))
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2.0 * k - 1.0) * x * p1 - (k - 1.0) * p0) / k;
        p0 = p1;
        p1 = p2;
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}
