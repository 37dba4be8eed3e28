//! # density 命令实现
//!
//! 自旋密度存档统一入口，包含多个子命令：
//! - `list`: 列出存档记录
//! - `show`: 显示某条记录的逐格点密度与极化
//! - `put`: 读取 `up,dn` CSV，按参数哈希写入存档
//! - `plot`: 绘制自旋极化图
//!
//! ## 依赖关系
//! - 使用 `cli/density.rs` 定义的参数
//! - 使用 `density/` 模块的存档与绘图
//! - 使用 `models/density.rs`, `models/hubbard.rs`

use crate::cli::density::{DensityArgs, DensityCommands, PlotArgs, PutArgs, RecordArgs};
use crate::density::{generate_polarization_plot, DensityArchive, DensityRecord};
use crate::error::{TbtError, Result};
use crate::models::SpinDensity;
use crate::utils::output;

use serde::Deserialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// 存档记录行
#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Hash")]
    hash: String,
    #[tabled(rename = "U (eV)")]
    u: String,
    #[tabled(rename = "Nup")]
    nup: i64,
    #[tabled(rename = "Ndn")]
    ndn: i64,
    #[tabled(rename = "Etot (eV)")]
    etot: String,
    #[tabled(rename = "Sites")]
    sites: usize,
    #[tabled(rename = "Σ|m|")]
    moment: String,
}

/// 格点密度行
#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "Site")]
    site: usize,
    #[tabled(rename = "n↑")]
    up: String,
    #[tabled(rename = "n↓")]
    dn: String,
    #[tabled(rename = "n↑ + n↓")]
    charge: String,
    #[tabled(rename = "n↑ - n↓")]
    pol: String,
}

/// 输入 CSV 的一行
#[derive(Debug, Deserialize)]
struct DensityRow {
    up: f64,
    dn: f64,
}

/// 执行 density 命令
pub fn execute(args: DensityArgs) -> Result<()> {
    match args.command {
        DensityCommands::List => list(&args.archive),
        DensityCommands::Show(record) => show(&args.archive, &record),
        DensityCommands::Put(put_args) => put(&args.archive, &put_args),
        DensityCommands::Plot(plot_args) => plot(&args.archive, &plot_args),
    }
}

fn list(path: &Path) -> Result<()> {
    let archive = DensityArchive::open(path)?;
    if archive.records().is_empty() {
        output::print_warning(&format!("No records in '{}'", path.display()));
        return Ok(());
    }

    output::print_header(&format!("Density archive: {}", path.display()));
    let rows: Vec<RecordRow> = archive
        .records()
        .iter()
        .map(|r| RecordRow {
            hash: format!("{:07x}", r.hash),
            u: format!("{:.2}", r.u),
            nup: r.nup,
            ndn: r.ndn,
            etot: r.etot.map(|e| format!("{:.6}", e)).unwrap_or_else(|| "-".to_string()),
            sites: r.density.sites(),
            moment: format!(
                "{:.4}",
                r.density.polarization().iter().map(|m| m.abs()).sum::<f64>()
            ),
        })
        .collect();
    println!("{}", Table::new(&rows));
    output::print_info(&format!("{} record(s)", rows.len()));
    Ok(())
}

fn show(path: &Path, args: &RecordArgs) -> Result<()> {
    let archive = DensityArchive::open(path)?;
    let record = find_record(&archive, &args.hash)?;

    output::print_header(&format!(
        "Record {:07x}: U = {:.2} eV, Nup = {}, Ndn = {}",
        record.hash, record.u, record.nup, record.ndn
    ));

    let pol = record.density.polarization();
    let charge = record.density.charge();
    let rows: Vec<SiteRow> = record
        .density
        .up
        .iter()
        .zip(&record.density.dn)
        .enumerate()
        .map(|(i, (u, d))| SiteRow {
            site: i,
            up: format!("{:.6}", u),
            dn: format!("{:.6}", d),
            charge: format!("{:.6}", charge[i]),
            pol: format!("{:+.6}", pol[i]),
        })
        .collect();
    println!("{}", Table::new(&rows));
    Ok(())
}

/// put 的结果
#[derive(Debug)]
struct StoreOutcome {
    hash: u64,
    fingerprint: String,
    replaced: bool,
    /// 与被替换记录的密度差
    change: Option<f64>,
}

fn put(path: &Path, args: &PutArgs) -> Result<()> {
    let outcome = store(path, args)?;

    if let Some(change) = outcome.change {
        output::print_info(&format!("Density change vs stored record: {:.6}", change));
    }
    let action = if outcome.replaced { "Replaced" } else { "Stored" };
    output::print_success(&format!(
        "{} record {:07x} ({}) in '{}'",
        action,
        outcome.hash,
        outcome.fingerprint,
        path.display()
    ));
    Ok(())
}

/// 读取密度、按参数处理后写入存档
fn store(path: &Path, args: &PutArgs) -> Result<StoreOutcome> {
    let mut density = read_density_csv(&args.input)?;

    let mut params = args.hubbard.to_params();
    // 未指定填充时取密度各通道的电子数
    if args.hubbard.nup.is_none() {
        params.nup = density.up.iter().sum::<f64>().round() as i64;
    }
    if args.hubbard.ndn.is_none() {
        params.ndn = density.dn.iter().sum::<f64>().round() as i64;
    }

    if !args.up_sites.is_empty() || !args.dn_sites.is_empty() {
        density.polarize_sites(&args.up_sites, &args.dn_sites, params.nup, params.ndn)?;
    } else if args.normalize {
        density.normalize(params.nup, params.ndn)?;
    }

    let mut archive = DensityArchive::open(path)?;
    let record = DensityRecord::new(&params, density, args.etot);
    let hash = record.hash;

    let change = match archive.find(hash) {
        Some(old) => match record.density.change_from(&old.density) {
            Ok(dn) => Some(dn),
            Err(e) => {
                output::print_warning(&e.to_string());
                None
            }
        },
        None => None,
    };

    let replaced = archive.upsert(record);
    archive.save()?;

    Ok(StoreOutcome {
        hash,
        fingerprint: params.fingerprint().trim_end().to_string(),
        replaced,
        change,
    })
}

fn plot(path: &Path, args: &PlotArgs) -> Result<()> {
    let archive = DensityArchive::open(path)?;
    let record = find_record(&archive, &args.hash)?;

    let title = args.title.clone().unwrap_or_else(|| {
        format!(
            "U = {:.2} eV, Nup = {}, Ndn = {}",
            record.u, record.nup, record.ndn
        )
    });

    generate_polarization_plot(&record.density, &args.output, &title, args.width, args.height)?;
    output::print_success(&format!(
        "Polarization plot saved to '{}'",
        args.output.display()
    ));
    Ok(())
}

/// 解析十六进制哈希（可带 `0x` 前缀）
fn parse_hash(text: &str) -> Result<u64> {
    let digits = text.trim().trim_start_matches("0x");
    u64::from_str_radix(digits, 16)
        .map_err(|_| TbtError::InvalidArgument(format!("'{}' is not a hexadecimal hash", text)))
}

fn find_record<'a>(archive: &'a DensityArchive, hash: &str) -> Result<&'a DensityRecord> {
    let hash = parse_hash(hash)?;
    archive.find(hash).ok_or_else(|| TbtError::RecordNotFound {
        hash,
        path: archive.path().display().to_string(),
    })
}

/// 读取 `up,dn` CSV
fn read_density_csv(path: &Path) -> Result<SpinDensity> {
    if !path.exists() {
        return Err(TbtError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut up = Vec::new();
    let mut dn = Vec::new();
    for row in reader.deserialize() {
        let row: DensityRow = row?;
        up.push(row.up);
        dn.push(row.dn);
    }

    if up.is_empty() {
        return Err(TbtError::InvalidDensity(format!(
            "'{}' contains no sites",
            path.display()
        )));
    }

    SpinDensity::new(up, dn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::params::HubbardOpts;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tbtkit-density-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn put_args(input: PathBuf) -> PutArgs {
        PutArgs {
            input,
            hubbard: HubbardOpts {
                t1: 2.7,
                t2: 0.2,
                t3: 0.18,
                u: 3.0,
                e_b: 3.0,
                e_n: -3.0,
                nup: None,
                ndn: None,
            },
            etot: Some(-12.5),
            normalize: false,
            up_sites: vec![],
            dn_sites: vec![],
        }
    }

    #[test]
    fn test_store_fills_from_channel_sums() {
        let dir = temp_dir("sums");
        let input = dir.join("in.csv");
        fs::write(&input, "up,dn\n0.9,0.2\n0.8,0.3\n0.6,0.4\n").unwrap();
        let archive_path = dir.join("densities.csv");

        let outcome = store(&archive_path, &put_args(input)).unwrap();
        assert!(!outcome.replaced);
        assert_eq!(outcome.change, None);
        assert!(outcome.fingerprint.ends_with("Nup=2.00 Ndn=1.00"));

        let archive = DensityArchive::open(&archive_path).unwrap();
        let record = archive.find(outcome.hash).unwrap();
        assert_eq!((record.nup, record.ndn), (2, 1));
        assert_eq!(record.etot, Some(-12.5));
        // 未要求归一化时密度原样保存
        assert_eq!(record.density.up, vec![0.9, 0.8, 0.6]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_polarized_sites() {
        let dir = temp_dir("sites");
        let input = dir.join("in.csv");
        fs::write(&input, "up,dn\n0.5,0.5\n0.5,0.5\n0.5,0.5\n0.5,0.5\n").unwrap();
        let archive_path = dir.join("densities.csv");

        let mut args = put_args(input);
        args.up_sites = vec![0];
        args.dn_sites = vec![3];
        let outcome = store(&archive_path, &args).unwrap();

        let archive = DensityArchive::open(&archive_path).unwrap();
        let density = &archive.find(outcome.hash).unwrap().density;
        let pol = density.polarization();
        assert!(pol[0] > 0.0);
        assert!(pol[3] < 0.0);
        assert!((density.up.iter().sum::<f64>() - 2.0).abs() < 1e-9);
        assert!((density.dn.iter().sum::<f64>() - 2.0).abs() < 1e-9);

        args.up_sites = vec![7];
        assert!(store(&archive_path, &args).is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_replaces_and_reports_change() {
        let dir = temp_dir("replace");
        let first = dir.join("first.csv");
        let second = dir.join("second.csv");
        fs::write(&first, "up,dn\n1.0,0.0\n0.0,1.0\n").unwrap();
        fs::write(&second, "up,dn\n0.5,0.5\n0.5,0.5\n").unwrap();
        let archive_path = dir.join("densities.csv");

        let a = store(&archive_path, &put_args(first)).unwrap();
        let b = store(&archive_path, &put_args(second)).unwrap();
        assert_eq!(a.hash, b.hash);
        assert!(b.replaced);
        assert_eq!(b.change, Some(1.0));

        let archive = DensityArchive::open(&archive_path).unwrap();
        assert_eq!(archive.records().len(), 1);
        assert_eq!(archive.records()[0].density.up, vec![0.5, 0.5]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parse_hash() {
        assert_eq!(parse_hash("00000ff").unwrap(), 255);
        assert_eq!(parse_hash("0xa").unwrap(), 10);
        assert!(parse_hash("zz").is_err());
    }

    #[test]
    fn test_read_density_csv() {
        let path = std::env::temp_dir().join(format!("tbtkit-density-in-{}.csv", std::process::id()));
        fs::write(&path, "up, dn\n0.75, 0.25\n0.25, 0.75\n").unwrap();
        let density = read_density_csv(&path).unwrap();
        assert_eq!(density.up, vec![0.75, 0.25]);
        assert_eq!(density.polarization(), vec![0.5, -0.5]);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_density_csv_empty() {
        let path = std::env::temp_dir().join(format!("tbtkit-density-empty-{}.csv", std::process::id()));
        fs::write(&path, "up,dn\n").unwrap();
        assert!(read_density_csv(&path).is_err());
        fs::remove_file(&path).ok();
    }
}
