//! # 自旋分辨的格点电子密度
//!
//! 保存每个 π 格点上自旋向上、向下的占据数，并提供归一化、局域极化等
//! 初始化自洽计算时常用的操作。
//!
//! ## 依赖关系
//! - 被 `density/archive.rs`, `density/plot.rs`, `commands/density.rs` 使用

use crate::error::{TbtError, Result};

/// 自旋密度
#[derive(Debug, Clone, PartialEq)]
pub struct SpinDensity {
    pub up: Vec<f64>,
    pub dn: Vec<f64>,
}

impl SpinDensity {
    pub fn new(up: Vec<f64>, dn: Vec<f64>) -> Result<Self> {
        if up.len() != dn.len() {
            return Err(TbtError::InvalidDensity(format!(
                "spin channels differ in length ({} up vs {} down)",
                up.len(),
                dn.len()
            )));
        }
        Ok(SpinDensity { up, dn })
    }

    /// 格点数
    pub fn sites(&self) -> usize {
        self.up.len()
    }

    /// 两个自旋通道分别缩放到 Nup、Ndn 个电子
    pub fn normalize(&mut self, nup: i64, ndn: i64) -> Result<()> {
        rescale(&mut self.up, nup as f64, "up")?;
        rescale(&mut self.dn, ndn as f64, "down")?;
        Ok(())
    }

    /// 将指定格点设为完全极化（up 格点 (1, 0)，dn 格点 (0, 1)），然后重新归一化
    pub fn polarize_sites(&mut self, up: &[usize], dn: &[usize], nup: i64, ndn: i64) -> Result<()> {
        for &ia in up.iter().chain(dn) {
            if ia >= self.sites() {
                return Err(TbtError::InvalidDensity(format!(
                    "site {} out of range (0..{})",
                    ia,
                    self.sites()
                )));
            }
        }
        for &ia in up {
            self.up[ia] = 1.0;
            self.dn[ia] = 0.0;
        }
        for &ia in dn {
            self.up[ia] = 0.0;
            self.dn[ia] = 1.0;
        }
        self.normalize(nup, ndn)
    }

    /// 每个格点的自旋极化 n_up - n_dn
    pub fn polarization(&self) -> Vec<f64> {
        self.up.iter().zip(&self.dn).map(|(u, d)| u - d).collect()
    }

    /// 每个格点的总占据
    pub fn charge(&self) -> Vec<f64> {
        self.up.iter().zip(&self.dn).map(|(u, d)| u + d).collect()
    }

    /// 与另一密度的差异 Σ|n_up - n_up'|
    pub fn change_from(&self, other: &SpinDensity) -> Result<f64> {
        if other.sites() != self.sites() {
            return Err(TbtError::InvalidDensity(format!(
                "cannot compare densities with {} and {} sites",
                self.sites(),
                other.sites()
            )));
        }
        Ok(self
            .up
            .iter()
            .zip(&other.up)
            .map(|(a, b)| (a - b).abs())
            .sum())
    }
}

fn rescale(channel: &mut [f64], electrons: f64, name: &str) -> Result<()> {
    let total: f64 = channel.iter().sum();
    if total.abs() < f64::EPSILON {
        if electrons == 0.0 {
            return Ok(());
        }
        return Err(TbtError::InvalidDensity(format!(
            "spin-{} channel is empty and cannot hold {} electrons",
            name, electrons
        )));
    }
    let factor = electrons / total;
    channel.iter_mut().for_each(|n| *n *= factor);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let mut d = SpinDensity::new(vec![1.0, 1.0, 2.0], vec![0.5, 0.5, 0.0]).unwrap();
        d.normalize(2, 1).unwrap();
        assert_eq!(d.up, vec![0.5, 0.5, 1.0]);
        assert_eq!(d.dn, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_normalize_empty_channel() {
        let mut d = SpinDensity::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        assert!(d.normalize(1, 1).is_err());
        let mut d = SpinDensity::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
        assert!(d.normalize(0, 1).is_ok());
    }

    #[test]
    fn test_polarize_sites() {
        let mut d = SpinDensity::new(vec![0.5; 4], vec![0.5; 4]).unwrap();
        d.polarize_sites(&[0], &[3], 2, 2).unwrap();
        let pol = d.polarization();
        assert!(pol[0] > 0.0);
        assert!(pol[3] < 0.0);
        assert!((d.up.iter().sum::<f64>() - 2.0).abs() < 1e-12);
        assert!((d.dn.iter().sum::<f64>() - 2.0).abs() < 1e-12);
        assert!(d.polarize_sites(&[4], &[], 2, 2).is_err());
    }

    #[test]
    fn test_change_from() {
        let a = SpinDensity::new(vec![1.0, 0.0], vec![0.0, 1.0]).unwrap();
        let b = SpinDensity::new(vec![0.5, 0.5], vec![0.5, 0.5]).unwrap();
        assert_eq!(a.change_from(&b).unwrap(), 1.0);
        assert_eq!(a.charge(), vec![1.0, 1.0]);
        assert!(SpinDensity::new(vec![1.0], vec![]).is_err());
    }
}
