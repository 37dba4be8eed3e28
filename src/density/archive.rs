//! # 自旋密度存档
//!
//! 以参数指纹哈希为键保存自洽密度，便于后续计算从已收敛的密度出发。
//!
//! ## 文件格式 (CSV)
//! ```text
//! hash,U,Nup,Ndn,Etot,spin,site,density
//! 1234567,3.5,11,11,-52.1,0,0,0.5123
//! 1234567,3.5,11,11,-52.1,1,0,0.4877
//! ...
//! ```
//! 每条记录占 `2 × sites` 行；spin 0 为向上，1 为向下。
//! 写入相同哈希的记录会替换旧记录。
//!
//! ## 依赖关系
//! - 被 `commands/density.rs` 调用
//! - 使用 `models/density.rs`, `models/hubbard.rs`
//! - 使用 `csv` + `serde` 读写

use crate::error::{TbtError, Result};
use crate::models::{HubbardParams, SpinDensity};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 存档中的一条密度记录
#[derive(Debug, Clone, PartialEq)]
pub struct DensityRecord {
    pub hash: u64,
    pub u: f64,
    pub nup: i64,
    pub ndn: i64,
    pub etot: Option<f64>,
    pub density: SpinDensity,
}

impl DensityRecord {
    /// 由计算参数构建记录，哈希取参数指纹
    pub fn new(params: &HubbardParams, density: SpinDensity, etot: Option<f64>) -> Self {
        DensityRecord {
            hash: params.hash(),
            u: params.u,
            nup: params.nup,
            ndn: params.ndn,
            etot,
            density,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ArchiveRow {
    hash: u64,
    #[serde(rename = "U")]
    u: f64,
    #[serde(rename = "Nup")]
    nup: i64,
    #[serde(rename = "Ndn")]
    ndn: i64,
    #[serde(rename = "Etot")]
    etot: Option<f64>,
    spin: u8,
    site: usize,
    density: f64,
}

/// 密度存档
#[derive(Debug)]
pub struct DensityArchive {
    path: PathBuf,
    records: Vec<DensityRecord>,
}

impl DensityArchive {
    /// 打开存档；文件不存在时为空存档
    pub fn open(path: &Path) -> Result<Self> {
        let mut archive = DensityArchive {
            path: path.to_path_buf(),
            records: Vec::new(),
        };
        if !path.exists() {
            return Ok(archive);
        }

        let mut rdr = csv::Reader::from_path(path)?;
        let mut order: Vec<u64> = Vec::new();
        let mut grouped: HashMap<u64, (ArchiveRow, Vec<(u8, usize, f64)>)> = HashMap::new();

        for row in rdr.deserialize() {
            let row: ArchiveRow = row?;
            let entry = (row.spin, row.site, row.density);
            match grouped.get_mut(&row.hash) {
                Some((_, values)) => values.push(entry),
                None => {
                    order.push(row.hash);
                    grouped.insert(row.hash, (row, vec![entry]));
                }
            }
        }

        for hash in order {
            if let Some((head, values)) = grouped.remove(&hash) {
                let density = assemble(hash, &values)?;
                archive.records.push(DensityRecord {
                    hash,
                    u: head.u,
                    nup: head.nup,
                    ndn: head.ndn,
                    etot: head.etot,
                    density,
                });
            }
        }

        Ok(archive)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[DensityRecord] {
        &self.records
    }

    pub fn find(&self, hash: u64) -> Option<&DensityRecord> {
        self.records.iter().find(|r| r.hash == hash)
    }

    /// 插入或替换（按哈希）；返回是否替换了已有记录
    pub fn upsert(&mut self, record: DensityRecord) -> bool {
        match self.records.iter_mut().find(|r| r.hash == record.hash) {
            Some(existing) => {
                *existing = record;
                true
            }
            None => {
                self.records.push(record);
                false
            }
        }
    }

    /// 写回文件
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TbtError::FileWriteError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let mut wtr = csv::Writer::from_path(&self.path)?;
        for record in &self.records {
            for (spin, channel) in [(0u8, &record.density.up), (1u8, &record.density.dn)] {
                for (site, value) in channel.iter().enumerate() {
                    wtr.serialize(ArchiveRow {
                        hash: record.hash,
                        u: record.u,
                        nup: record.nup,
                        ndn: record.ndn,
                        etot: record.etot,
                        spin,
                        site,
                        density: *value,
                    })?;
                }
            }
        }
        wtr.flush().map_err(|e| TbtError::FileWriteError {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }
}

/// 将 (spin, site, value) 行组装为完整的自旋密度
fn assemble(hash: u64, values: &[(u8, usize, f64)]) -> Result<SpinDensity> {
    let sites = values.iter().map(|(_, s, _)| s + 1).max().unwrap_or(0);
    let mut up = vec![None; sites];
    let mut dn = vec![None; sites];

    for &(spin, site, value) in values {
        let channel = match spin {
            0 => &mut up,
            1 => &mut dn,
            other => {
                return Err(TbtError::InvalidDensity(format!(
                    "record {}: spin index {} is not 0 or 1",
                    hash, other
                )))
            }
        };
        if channel[site].replace(value).is_some() {
            return Err(TbtError::InvalidDensity(format!(
                "record {}: duplicate entry for spin {} site {}",
                hash, spin, site
            )));
        }
    }

    let complete = |channel: Vec<Option<f64>>, spin: u8| -> Result<Vec<f64>> {
        channel
            .into_iter()
            .enumerate()
            .map(|(site, v)| {
                v.ok_or_else(|| {
                    TbtError::InvalidDensity(format!(
                        "record {}: missing spin {} site {}",
                        hash, spin, site
                    ))
                })
            })
            .collect()
    };

    SpinDensity::new(complete(up, 0)?, complete(dn, 1)?)
}
