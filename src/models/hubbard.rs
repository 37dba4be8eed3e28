//! # 平均场 Hubbard 计算参数
//!
//! 记录一次 MFH 计算的紧束缚参数与电子填充，生成结果文件标签和用于
//! 检索已保存密度的参数指纹。这里只做参数管理，不求解自洽方程。
//!
//! ## 参数
//! - `t1, t2, t3`: 第一、二、三近邻跃迁 (eV)；`t3 = 0` 时为 1NN 模型
//! - `U`: 在位 Coulomb 排斥 (eV)
//! - `eB, eN`: 硼、氮相对碳的在位能 (eV)
//! - `Nup, Ndn`: 自旋向上/向下电子总数
//!
//! ## 依赖关系
//! - 被 `commands/params.rs`, `commands/density.rs` 使用
//! - 被 `density/archive.rs` 用作记录键
//! - 使用 `md-5` 计算指纹哈希

use crate::error::{TbtError, Result};

use md5::{Digest, Md5};

/// 紧束缚模型类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborModel {
    /// 仅最近邻
    FirstNeighbor,
    /// 至第三近邻
    ThirdNeighbor,
}

impl std::fmt::Display for NeighborModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborModel::FirstNeighbor => write!(f, "1NN"),
            NeighborModel::ThirdNeighbor => write!(f, "3NN"),
        }
    }
}

/// MFH 计算参数
#[derive(Debug, Clone, PartialEq)]
pub struct HubbardParams {
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
    pub u: f64,
    pub e_b: f64,
    pub e_n: f64,
    pub nup: i64,
    pub ndn: i64,
}

impl Default for HubbardParams {
    fn default() -> Self {
        HubbardParams {
            t1: 2.7,
            t2: 0.2,
            t3: 0.18,
            u: 0.0,
            e_b: 3.0,
            e_n: -3.0,
            nup: 0,
            ndn: 0,
        }
    }
}

impl HubbardParams {
    pub fn model(&self) -> NeighborModel {
        if self.t3 == 0.0 {
            NeighborModel::FirstNeighbor
        } else {
            NeighborModel::ThirdNeighbor
        }
    }

    /// 结果文件标签，如 `molecule-3NN-U350`
    pub fn label(&self, stem: &str) -> String {
        let u = (self.u * 100.0) as i64;
        let sign = if u < 0 { "-" } else { "" };
        format!("{}-{}-U{}{:03}", stem, self.model(), sign, u.unsigned_abs())
    }

    /// 参数指纹字符串（两位小数，末尾带空格）
    pub fn fingerprint(&self) -> String {
        format!(
            "t1={:.2} t2={:.2} t3={:.2} U={:.2} eB={:.2} eN={:.2} Nup={:.2} Ndn={:.2} ",
            self.t1,
            self.t2,
            self.t3,
            self.u,
            self.e_b,
            self.e_n,
            self.nup as f64,
            self.ndn as f64
        )
    }

    /// 指纹 MD5 的前 7 位十六进制数
    pub fn hash(&self) -> u64 {
        let digest = Md5::digest(self.fingerprint().as_bytes());
        ((digest[0] as u64) << 20)
            | ((digest[1] as u64) << 12)
            | ((digest[2] as u64) << 4)
            | ((digest[3] as u64) >> 4)
    }

    /// 将 `pol` 个电子从自旋向下翻转到自旋向上
    pub fn polarize(&mut self, pol: i64) -> Result<(i64, i64)> {
        let nup = self.nup + pol;
        let ndn = self.ndn - pol;
        if nup < 0 || ndn < 0 {
            return Err(TbtError::InvalidArgument(format!(
                "polarization {} leaves negative filling (Nup={}, Ndn={})",
                pol, nup, ndn
            )));
        }
        self.nup = nup;
        self.ndn = ndn;
        Ok((nup, ndn))
    }

    /// 未指定（<= 0）的自旋填充使用中性体系的低自旋填充
    pub fn fill_defaults(&mut self, count: &ElectronCount) {
        let (_, ndn) = count.default_filling();
        if self.ndn <= 0 {
            self.ndn = ndn;
        }
        if self.nup <= 0 {
            self.nup = count.total() - self.ndn;
        }
    }
}

/// π 电子计数：B 贡献 0，C 贡献 1，N 贡献 2
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElectronCount {
    pub boron: usize,
    pub carbon: usize,
    pub nitrogen: usize,
}

impl ElectronCount {
    /// 中性体系的 π 电子总数
    pub fn total(&self) -> i64 {
        (self.carbon + 2 * self.nitrogen) as i64
    }

    /// 低自旋填充 (Nup, Ndn)
    pub fn default_filling(&self) -> (i64, i64) {
        let ndn = self.total() / 2;
        (self.total() - ndn, ndn)
    }
}

/// k 点总数上限
pub const MAX_KPOINTS: usize = 100_000_000;

/// 布里渊区均匀 k 点网格（分数坐标，x 变化最慢），按需生成
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KMesh {
    dims: [usize; 3],
    len: usize,
}

impl KMesh {
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// k 点总数
    pub fn len(&self) -> usize {
        self.len
    }

    /// 第 i 个 k 点
    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        if i >= self.len {
            return None;
        }
        let [nx, ny, nz] = self.dims;
        let (x, rest) = (i / (ny * nz), i % (ny * nz));
        let (y, z) = (rest / nz, rest % nz);
        Some([
            x as f64 / nx as f64,
            y as f64 / ny as f64,
            z as f64 / nz as f64,
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        (0..self.len).filter_map(move |i| self.point(i))
    }
}

/// 构造 `nx × ny × nz` 的 k 点网格
pub fn kmesh(n: [usize; 3]) -> Result<KMesh> {
    if n.contains(&0) {
        return Err(TbtError::InvalidArgument(format!(
            "k-mesh dimensions must be positive, got {:?}",
            n
        )));
    }

    let len = n[0]
        .checked_mul(n[1])
        .and_then(|v| v.checked_mul(n[2]))
        .filter(|&v| v <= MAX_KPOINTS)
        .ok_or_else(|| {
            TbtError::InvalidArgument(format!(
                "k-mesh {:?} has more than {} points",
                n, MAX_KPOINTS
            ))
        })?;

    Ok(KMesh { dims: n, len })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_and_label() {
        let mut p = HubbardParams {
            u: 3.5,
            ..Default::default()
        };
        assert_eq!(p.model(), NeighborModel::ThirdNeighbor);
        assert_eq!(p.label("triangulene"), "triangulene-3NN-U350");

        p.t3 = 0.0;
        p.u = 0.5;
        assert_eq!(p.label("mol"), "mol-1NN-U050");

        p.u = -0.5;
        assert_eq!(p.label("mol"), "mol-1NN-U-050");
    }

    #[test]
    fn test_fingerprint_format() {
        let p = HubbardParams {
            u: 5.0,
            nup: 11,
            ndn: 11,
            ..Default::default()
        };
        assert_eq!(
            p.fingerprint(),
            "t1=2.70 t2=0.20 t3=0.18 U=5.00 eB=3.00 eN=-3.00 Nup=11.00 Ndn=11.00 "
        );
    }

    #[test]
    fn test_hash_matches_md5_prefix() {
        let p = HubbardParams::default();
        let digest = Md5::digest(p.fingerprint().as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        let expected = u64::from_str_radix(&hex[..7], 16).unwrap();
        assert_eq!(p.hash(), expected);
        assert!(p.hash() < 1 << 28);
    }

    #[test]
    fn test_hash_changes_with_parameters() {
        let a = HubbardParams::default();
        let b = HubbardParams {
            u: 3.0,
            ..Default::default()
        };
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_polarize() {
        let mut p = HubbardParams {
            nup: 5,
            ndn: 5,
            ..Default::default()
        };
        assert_eq!(p.polarize(1).unwrap(), (6, 4));
        assert!(p.polarize(5).is_err());
        assert_eq!((p.nup, p.ndn), (6, 4));
    }

    #[test]
    fn test_default_filling() {
        let count = ElectronCount {
            boron: 1,
            carbon: 21,
            nitrogen: 1,
        };
        assert_eq!(count.total(), 23);
        assert_eq!(count.default_filling(), (12, 11));

        let mut p = HubbardParams::default();
        p.fill_defaults(&count);
        assert_eq!((p.nup, p.ndn), (12, 11));

        let mut p = HubbardParams {
            ndn: 10,
            ..Default::default()
        };
        p.fill_defaults(&count);
        assert_eq!((p.nup, p.ndn), (13, 10));
    }

    #[test]
    fn test_kmesh() {
        let mesh = kmesh([2, 1, 1]).unwrap();
        assert_eq!(mesh.iter().collect::<Vec<_>>(), vec![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0]]);
        assert_eq!(kmesh([3, 2, 1]).unwrap().len(), 6);
        assert!(kmesh([0, 1, 1]).is_err());

        let mesh = kmesh([2, 2, 2]).unwrap();
        let points: Vec<[f64; 3]> = mesh.iter().collect();
        assert_eq!(points[1], [0.0, 0.0, 0.5]);
        assert_eq!(points[2], [0.0, 0.5, 0.0]);
        assert_eq!(points[7], [0.5, 0.5, 0.5]);
        assert_eq!(mesh.point(8), None);
    }

    #[test]
    fn test_kmesh_too_large() {
        assert!(kmesh([usize::MAX, 2, 1]).is_err());
        assert!(kmesh([100_000, 100_000, 1]).is_err());

        let mesh = kmesh([10_000, 10_000, 1]).unwrap();
        assert_eq!(mesh.len(), 100_000_000);
        assert_eq!(mesh.iter().take(2).count(), 2);
    }
}
