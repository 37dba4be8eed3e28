//! # params 命令实现
//!
//! 显示 MFH 计算的参数表、结果标签、参数指纹与哈希，
//! 未指定填充时按 π 电子计数给出中性低自旋填充。
//!
//! ## 依赖关系
//! - 使用 `cli/params.rs` 定义的参数
//! - 使用 `models/hubbard.rs`

use crate::cli::params::ParamsArgs;
use crate::error::{TbtError, Result};
use crate::models::hubbard::kmesh;
use crate::models::{ElectronCount, HubbardParams};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 参数行
#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Parameter")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// 打印的 k 点个数
const KMESH_PREVIEW: usize = 8;

/// 执行 params 命令
pub fn execute(args: ParamsArgs) -> Result<()> {
    let count = ElectronCount {
        boron: args.boron,
        carbon: args.carbon,
        nitrogen: args.nitrogen,
    };

    let params = resolve_params(&args, &count)?;

    output::print_header(&format!("MFH parameters: {}", params.label(&args.stem)));

    let rows = vec![
        row("model", params.model().to_string()),
        row("t1 (eV)", format!("{:.2}", params.t1)),
        row("t2 (eV)", format!("{:.2}", params.t2)),
        row("t3 (eV)", format!("{:.2}", params.t3)),
        row("U (eV)", format!("{:.2}", params.u)),
        row("eB (eV)", format!("{:.2}", params.e_b)),
        row("eN (eV)", format!("{:.2}", params.e_n)),
        row("π electrons", count.total().to_string()),
        row("Nup", params.nup.to_string()),
        row("Ndn", params.ndn.to_string()),
        row("fingerprint", params.fingerprint().trim_end().to_string()),
        row("hash", format!("{:07x}", params.hash())),
    ];
    println!("{}", Table::new(&rows));

    if let Some(spec) = &args.kmesh {
        let mesh = kmesh(parse_kmesh(spec)?)?;
        let [nx, ny, nz] = mesh.dims();
        output::print_info(&format!(
            "k-mesh {}x{}x{}: {} points",
            nx,
            ny,
            nz,
            mesh.len()
        ));
        for k in mesh.iter().take(KMESH_PREVIEW) {
            println!("    {:.4} {:.4} {:.4}", k[0], k[1], k[2]);
        }
        if mesh.len() > KMESH_PREVIEW {
            println!("    ... ({} more)", mesh.len() - KMESH_PREVIEW);
        }
    }

    Ok(())
}

fn row(name: &'static str, value: String) -> ParamRow {
    ParamRow { name, value }
}

/// 由命令行构造参数：补全默认填充，再按 `--polarize` 翻转自旋
fn resolve_params(args: &ParamsArgs, count: &ElectronCount) -> Result<HubbardParams> {
    let mut params = args.hubbard.to_params();
    params.fill_defaults(count);
    if let Some(pol) = args.polarize {
        params.polarize(pol)?;
    }
    Ok(params)
}

/// 解析 `nx,ny,nz`
fn parse_kmesh(spec: &str) -> Result<[usize; 3]> {
    let values: Vec<usize> = spec
        .split(|c: char| c == ',' || c == 'x' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| TbtError::InvalidArgument(format!("invalid k-mesh '{}'", spec)))
        })
        .collect::<Result<_>>()?;

    match values.as_slice() {
        [nx, ny, nz] => Ok([*nx, *ny, *nz]),
        _ => Err(TbtError::InvalidArgument(format!(
            "k-mesh needs three integers, got '{}'",
            spec
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::params::HubbardOpts;

    fn args(polarize: Option<i64>) -> ParamsArgs {
        ParamsArgs {
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
            boron: 0,
            carbon: 22,
            nitrogen: 0,
            polarize,
            stem: "triangulene".to_string(),
            kmesh: None,
        }
    }

    #[test]
    fn test_resolve_default_filling() {
        let a = args(None);
        let count = ElectronCount {
            carbon: 22,
            ..Default::default()
        };
        let p = resolve_params(&a, &count).unwrap();
        assert_eq!((p.nup, p.ndn), (11, 11));
        assert_eq!(p.label(&a.stem), "triangulene-3NN-U300");
    }

    #[test]
    fn test_resolve_polarized() {
        let a = args(Some(1));
        let count = ElectronCount {
            carbon: 22,
            ..Default::default()
        };
        let p = resolve_params(&a, &count).unwrap();
        assert_eq!((p.nup, p.ndn), (12, 10));
    }

    #[test]
    fn test_parse_kmesh() {
        assert_eq!(parse_kmesh("4,1,1").unwrap(), [4, 1, 1]);
        assert_eq!(parse_kmesh("2x2x1").unwrap(), [2, 2, 1]);
        assert!(parse_kmesh("4,1").is_err());
        assert!(parse_kmesh("a,b,c").is_err());
    }

    #[test]
    fn test_large_kmesh_rejected() {
        let n = parse_kmesh("100000,100000,100000").unwrap();
        assert!(kmesh(n).is_err());
        let mesh = kmesh(parse_kmesh("1000 1000 10").unwrap()).unwrap();
        assert_eq!(mesh.len(), 10_000_000);
        assert_eq!(mesh.iter().take(KMESH_PREVIEW).count(), KMESH_PREVIEW);
    }
}
