//! # grid 命令实现
//!
//! 展开 `TBT.Contours` 中的窗口，打印每个窗口的点数与权重和，
//! 可选导出为 CSV。未定义窗口时使用 TBtrans 的默认窗口。
//!
//! ## 依赖关系
//! - 使用 `cli/grid.rs` 定义的参数
//! - 使用 `parsers/tbtrans.rs`, `transport/grid.rs`, `transport/export.rs`

use crate::cli::grid::GridArgs;
use crate::error::{TbtError, Result};
use crate::models::tbtrans::{Contour, TbtransInput};
use crate::parsers;
use crate::transport::export::grid_to_csv;
use crate::transport::{expand_contour, EnergyPoint};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 窗口汇总行
#[derive(Tabled)]
struct GridRow {
    #[tabled(rename = "Contour")]
    name: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Points")]
    points: usize,
    #[tabled(rename = "E min (eV)")]
    e_min: String,
    #[tabled(rename = "E max (eV)")]
    e_max: String,
    #[tabled(rename = "Σw (eV)")]
    weight_sum: String,
}

/// 执行 grid 命令
pub fn execute(args: GridArgs) -> Result<()> {
    let (_, mut input) = parsers::parse_tbtrans_file(&args.input)?;
    if let Some(v) = args.voltage {
        input.voltage_ev = v;
    }

    let contours = select_contours(&input, args.contour.as_deref())?;

    let grids = expand_all(&input, &contours)?;

    output::print_header(&format!(
        "Energy grid at V = {} eV, kT = {:.6} eV",
        input.voltage_ev,
        input.kt_ev()
    ));

    let rows: Vec<GridRow> = contours
        .iter()
        .zip(&grids)
        .map(|(c, (_, points))| summarize(c, points))
        .collect();
    println!("{}", Table::new(&rows));

    if let Some(path) = args.output {
        grid_to_csv(&grids, &path)?;
        let total: usize = grids.iter().map(|(_, p)| p.len()).sum();
        output::print_success(&format!("{} energy points saved to '{}'", total, path.display()));
    }

    Ok(())
}

/// 选择要展开的窗口
fn select_contours(input: &TbtransInput, only: Option<&str>) -> Result<Vec<Contour>> {
    let available = if input.contours.is_empty() {
        output::print_warning("No TBT.Contours defined; using the TBtrans default window");
        vec![Contour::default_window()]
    } else {
        input.contours.clone()
    };

    match only {
        None => Ok(available),
        Some(name) => available
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| vec![c])
            .ok_or_else(|| TbtError::InvalidArgument(format!("no contour named '{}'", name))),
    }
}

fn expand_all(input: &TbtransInput, contours: &[Contour]) -> Result<Vec<(String, Vec<EnergyPoint>)>> {
    let kt = input.kt_ev();
    contours
        .iter()
        .map(|c| Ok((c.name.clone(), expand_contour(c, input.voltage_ev, kt)?)))
        .collect()
}

fn summarize(contour: &Contour, points: &[EnergyPoint]) -> GridRow {
    let e_min = points.iter().map(|p| p.energy).fold(f64::INFINITY, f64::min);
    let e_max = points.iter().map(|p| p.energy).fold(f64::NEG_INFINITY, f64::max);
    GridRow {
        name: contour.name.clone(),
        method: contour.method.to_string(),
        points: points.len(),
        e_min: format!("{:.6}", e_min),
        e_max: format!("{:.6}", e_max),
        weight_sum: format!("{:.6}", points.iter().map(|p| p.weight).sum::<f64>()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_when_missing() {
        let input = TbtransInput::two_electrode("dev", "dev.TSHS", "l.TSHS", "r.TSHS");
        let mut bare = input.clone();
        bare.contours.clear();

        let contours = select_contours(&bare, None).unwrap();
        assert_eq!(contours, vec![Contour::default_window()]);

        let grids = expand_all(&bare, &contours).unwrap();
        assert_eq!(grids[0].1.len(), 400);
        let row = summarize(&contours[0], &grids[0].1);
        assert_eq!(row.weight_sum, "4.000000");
    }

    #[test]
    fn test_unknown_name_without_contours() {
        let mut bare = TbtransInput::two_electrode("dev", "dev.TSHS", "l.TSHS", "r.TSHS");
        bare.contours.clear();
        assert!(select_contours(&bare, Some("neq")).is_err());
        assert_eq!(select_contours(&bare, Some("window")).unwrap().len(), 1);
    }

    #[test]
    fn test_select_by_name() {
        let input = TbtransInput::two_electrode("dev", "dev.TSHS", "l.TSHS", "r.TSHS");
        let name = input.contours[0].name.to_uppercase();
        assert_eq!(select_contours(&input, Some(&name)).unwrap().len(), 1);
        assert!(select_contours(&input, Some("missing")).is_err());
    }
}
