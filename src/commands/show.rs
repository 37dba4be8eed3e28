//! # show 命令实现
//!
//! 解析 TBtrans 输入并以表格形式显示窗口、电极与化学势，
//! 能量表达式按当前偏压与温度求值。
//!
//! ## 依赖关系
//! - 使用 `cli/show.rs` 定义的参数
//! - 使用 `parsers/tbtrans.rs`, `transport/grid.rs`（只计数，不展开）
//! - 使用 `tabled` 输出表格

use crate::cli::show::ShowArgs;
use crate::error::Result;
use crate::models::tbtrans::{Spacing, TbtransInput};
use crate::parsers::{self, FdfDocument};
use crate::transport::point_count;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 积分窗口行
#[derive(Tabled)]
struct ContourRow {
    #[tabled(rename = "Contour")]
    name: String,
    #[tabled(rename = "From (eV)")]
    from: String,
    #[tabled(rename = "To (eV)")]
    to: String,
    #[tabled(rename = "Spacing")]
    spacing: String,
    #[tabled(rename = "Points")]
    points: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Bias-dependent")]
    bias_dependent: String,
}

/// 电极行
#[derive(Tabled)]
struct ElectrodeRow {
    #[tabled(rename = "Electrode")]
    name: String,
    #[tabled(rename = "HS")]
    hs: String,
    #[tabled(rename = "Chem. pot.")]
    chem_pot: String,
    #[tabled(rename = "Semi-inf")]
    semi_inf: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "Atoms")]
    atoms: String,
}

/// 化学势行
#[derive(Tabled)]
struct ChemPotRow {
    #[tabled(rename = "Chem. pot.")]
    name: String,
    #[tabled(rename = "mu")]
    expr: String,
    #[tabled(rename = "mu (eV)")]
    mu: String,
    #[tabled(rename = "T (K)")]
    temperature: String,
}

/// 输出开关行
#[derive(Tabled)]
struct SwitchRow {
    #[tabled(rename = "Switch")]
    label: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// 常用的 TBtrans 逻辑开关
const LOGICAL_SWITCHES: [&str; 5] = [
    "TBT.DOS.Gf",
    "TBT.DOS.A",
    "TBT.DOS.A.All",
    "TBT.Current.Orb",
    "TBT.T.Bulk",
];

/// 执行 show 命令
pub fn execute(args: ShowArgs) -> Result<()> {
    let (doc, mut input) = parsers::parse_tbtrans_file(&args.input)?;
    if let Some(v) = args.voltage {
        input.voltage_ev = v;
    }

    output::print_header(&format!("Transport setup: {}", input.system_label));
    output::print_info(&format!(
        "{} fdf item(s) in '{}'",
        doc.len(),
        args.input.display()
    ));
    output::print_info(&format!("Device HS: {}", input.hs_file));
    output::print_info(&format!(
        "Bias: {} eV, T = {} K (kT = {:.6} eV)",
        input.voltage_ev,
        input.electronic_temperature_k,
        input.kt_ev()
    ));
    if let Some(n) = input.number_of_atoms {
        output::print_info(&format!("Atoms: {}", n));
    }

    if input.contours.is_empty() {
        output::print_warning("No TBT.Contours; TBtrans default window applies");
    }
    for table in render_tables(&doc, &input) {
        println!("\n{}", table);
    }

    Ok(())
}

/// 依次渲染窗口、电极、化学势与开关表；空表省略
fn render_tables(doc: &FdfDocument, input: &TbtransInput) -> Vec<String> {
    [
        contour_table(input),
        electrode_table(input),
        chem_pot_table(input),
        switch_table(doc),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// 已设置的输出开关；无法解析的值原样显示
fn switch_table(doc: &FdfDocument) -> Option<String> {
    let raw = |label: &str| {
        doc.get(label)
            .map(|e| e.value())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "(no value)".to_string())
    };

    let mut rows = Vec::new();
    for label in LOGICAL_SWITCHES {
        let value = match doc.get_bool(label) {
            Ok(Some(flag)) => flag.to_string(),
            Ok(None) => continue,
            Err(_) => format!("{} (not logical)", raw(label)),
        };
        rows.push(SwitchRow { label, value });
    }
    let eig = match doc.get_int("TBT.T.Eig") {
        Ok(Some(n)) => Some(n.to_string()),
        Ok(None) => None,
        Err(_) => Some(format!("{} (not an integer)", raw("TBT.T.Eig"))),
    };
    if let Some(value) = eig {
        rows.push(SwitchRow {
            label: "TBT.T.Eig",
            value,
        });
    }

    (!rows.is_empty()).then(|| Table::new(&rows).to_string())
}

fn contour_table(input: &TbtransInput) -> Option<String> {
    if input.contours.is_empty() {
        return None;
    }

    let kt = input.kt_ev();
    let rows: Vec<ContourRow> = input
        .contours
        .iter()
        .map(|c| ContourRow {
            name: c.name.clone(),
            from: format!("{:.6}", c.from.evaluate(input.voltage_ev, kt)),
            to: format!("{:.6}", c.to.evaluate(input.voltage_ev, kt)),
            spacing: match c.spacing {
                Spacing::Delta(d) => format!("delta {} eV", d),
                Spacing::Points(n) => format!("points {}", n),
            },
            points: point_count(c, input.voltage_ev, kt)
                .map(|n| n.to_string())
                .unwrap_or_else(|_| "invalid".to_string()),
            method: c.method.to_string(),
            bias_dependent: if c.from.depends_on_voltage() || c.to.depends_on_voltage() {
                "yes".to_string()
            } else {
                "no".to_string()
            },
        })
        .collect();

    Some(Table::new(&rows).to_string())
}

fn electrode_table(input: &TbtransInput) -> Option<String> {
    if input.electrodes.is_empty() {
        return None;
    }

    let or_dash = |s: Option<String>| s.unwrap_or_else(|| "-".to_string());
    let rows: Vec<ElectrodeRow> = input
        .electrodes
        .iter()
        .map(|e| {
            let range = match (e.position, e.used_atoms, input.number_of_atoms) {
                (Some(pos), Some(n), Some(total)) => pos
                    .atom_range(n, total)
                    .map(|(a, b)| format!("{}-{}", a, b))
                    .unwrap_or_else(|| "out of range".to_string()),
                (_, Some(n), _) => format!("{} used", n),
                _ => "-".to_string(),
            };
            ElectrodeRow {
                name: e.name.clone(),
                hs: or_dash(e.hs_file.clone()),
                chem_pot: or_dash(e.chem_pot.clone()),
                semi_inf: or_dash(e.semi_inf.map(|d| d.to_string())),
                position: or_dash(e.position.map(|p| p.to_string())),
                atoms: range,
            }
        })
        .collect();

    Some(Table::new(&rows).to_string())
}

fn chem_pot_table(input: &TbtransInput) -> Option<String> {
    if input.chem_pots.is_empty() {
        return None;
    }

    let kt = input.kt_ev();
    let rows: Vec<ChemPotRow> = input
        .chem_pots
        .iter()
        .map(|c| ChemPotRow {
            name: c.name.clone(),
            expr: c.mu.to_string(),
            mu: format!("{:.6}", c.mu.evaluate(input.voltage_ev, kt)),
            temperature: format!("{}", c.temperature.kelvin(input.electronic_temperature_k)),
        })
        .collect();

    Some(Table::new(&rows).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fdf::parse_fdf_content;
    use crate::parsers::read_tbtrans;

    const DEVICE: &str = "\
SystemLabel dev
TBT.Voltage 0.5 eV
NumberOfAtoms 20
%block TBT.Contours
  window
%endblock TBT.Contours
%block TBT.Contour.window
  part line
  from -|V|/2 - 0.5 eV to |V|/2 + 0.5 eV
  delta 0.01 eV
  method mid-rule
%endblock TBT.Contour.window
%block TS.Elecs
  Left
%endblock TS.Elecs
%block TS.Elec.Left
  HS left.TSHS
  chemical-potential Left
  semi-inf-direction -a3
  electrode-position 1
  used-atoms 4
%endblock TS.Elec.Left
%block TBT.ChemPots
  Left
%endblock TBT.ChemPots
%block TBT.ChemPot.Left
  mu V/2
  temp kT
%endblock TBT.ChemPot.Left
";

    #[test]
    fn test_render_tables() {
        let doc = parse_fdf_content(&format!("{}TBT.DOS.A T\n", DEVICE), "dev").unwrap();
        let input = read_tbtrans(&doc).unwrap();
        let tables = render_tables(&doc, &input);
        assert_eq!(tables.len(), 4);

        // 窗口 [-0.75, 0.75] eV，步长 0.01 eV
        assert!(tables[0].contains("-0.750000"));
        assert!(tables[0].contains("150"));
        assert!(tables[0].contains("yes"));
        assert!(tables[1].contains("1-4"));
        assert!(tables[1].contains("-a3"));
        assert!(tables[2].contains("0.250000"));
        assert!(tables[3].contains("TBT.DOS.A"));
    }

    #[test]
    fn test_render_without_optional_sections() {
        let doc = parse_fdf_content("SystemLabel bare\n", "bare").unwrap();
        let input = read_tbtrans(&doc).unwrap();
        assert!(render_tables(&doc, &input).is_empty());
    }

    #[test]
    fn test_switches_are_best_effort() {
        let doc = parse_fdf_content("TBT.T.Eig\nTBT.DOS.Gf maybe\n", "x").unwrap();
        let table = switch_table(&doc).unwrap();
        assert!(table.contains("(no value) (not an integer)"));
        assert!(table.contains("maybe (not logical)"));

        let doc = parse_fdf_content("TBT.T.Eig 3\n", "x").unwrap();
        assert!(switch_table(&doc).unwrap().contains('3'));
        assert!(switch_table(&parse_fdf_content("", "x").unwrap()).is_none());
    }

    #[test]
    fn test_huge_contour_is_not_expanded() {
        let text = DEVICE.replace("delta 0.01 eV", "delta 1e-300 eV");
        let doc = parse_fdf_content(&text, "dev").unwrap();
        let input = read_tbtrans(&doc).unwrap();
        assert!(contour_table(&input).unwrap().contains("invalid"));
    }
}
