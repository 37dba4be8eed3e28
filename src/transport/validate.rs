//! # TBtrans 输入一致性检查
//!
//! 在提交计算之前发现常见错误：电极引用未定义的化学势、积分窗口为空、
//! 电极原子区间越界或重叠、化学势差与偏压不符等。
//!
//! ## 依赖关系
//! - 被 `commands/check.rs`, `commands/init.rs`, `commands/submit.rs` 调用
//! - 使用 `models/tbtrans.rs`

use crate::models::tbtrans::{Spacing, TbtransInput};

use std::path::{Path, PathBuf};

/// 偏压一致性容差 (eV)
const BIAS_TOLERANCE: f64 = 1e-8;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// 单条诊断
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// 检查选项
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// 器件原子数（覆盖 `NumberOfAtoms`）
    pub atoms: Option<usize>,
    /// 若给出，检查 HS 文件是否存在（相对此目录）
    pub check_files_in: Option<PathBuf>,
    /// fdf 中重复定义的 label
    pub duplicates: Vec<String>,
}

/// 检查报告
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn is_ok(&self) -> bool {
        self.errors() == 0
    }
}

/// 执行全部检查
pub fn validate(input: &TbtransInput, options: &ValidateOptions) -> Report {
    let mut report = Report::default();

    for label in &options.duplicates {
        report.warning(format!("'{}' is defined more than once; the first definition is used", label));
    }

    check_electrodes(input, &mut report);
    check_chem_pots(input, &mut report);
    check_contours(input, &mut report);
    check_bias(input, &mut report);
    check_atom_ranges(input, options.atoms.or(input.number_of_atoms), &mut report);

    if let Some(dir) = &options.check_files_in {
        check_files(input, dir, &mut report);
    }

    report
}

fn check_electrodes(input: &TbtransInput, report: &mut Report) {
    match input.electrodes.len() {
        0 => report.error("No electrodes defined (TS.Elecs)"),
        1 => report.warning("Only one electrode defined; transmission needs at least two"),
        _ => {}
    }

    for elec in &input.electrodes {
        if elec.hs_file.is_none() {
            report.error(format!("Electrode '{}' has no HS file", elec.name));
        }
        if elec.semi_inf.is_none() {
            report.error(format!("Electrode '{}' has no semi-inf-direction", elec.name));
        }
        if elec.position.is_none() {
            report.error(format!("Electrode '{}' has no electrode-position", elec.name));
        }
        match &elec.chem_pot {
            None => report.error(format!("Electrode '{}' has no chemical-potential", elec.name)),
            Some(cp) if input.chem_pot(cp).is_none() => report.error(format!(
                "Electrode '{}' uses chemical potential '{}' which is not listed in TBT.ChemPots",
                elec.name, cp
            )),
            Some(_) => {}
        }
    }

    for (i, a) in input.electrodes.iter().enumerate() {
        for b in input.electrodes.iter().skip(i + 1) {
            if a.name.eq_ignore_ascii_case(&b.name) {
                report.error(format!("Electrode '{}' is listed twice", a.name));
            }
        }
    }
}

fn check_chem_pots(input: &TbtransInput, report: &mut Report) {
    for cp in &input.chem_pots {
        if !cp.defined {
            report.warning(format!(
                "Chemical potential '{}' has no block; using mu = 0 eV, temp = kT",
                cp.name
            ));
        }
        let used = input.electrodes.iter().any(|e| {
            e.chem_pot
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(&cp.name))
        });
        if !used {
            report.warning(format!(
                "Chemical potential '{}' is not used by any electrode",
                cp.name
            ));
        }
    }
}

fn check_contours(input: &TbtransInput, report: &mut Report) {
    if input.contours.is_empty() {
        report.warning("No TBT.Contours defined; TBtrans uses -2 eV to 2 eV with 0.01 eV steps");
        return;
    }

    let kt = input.kt_ev();
    for c in &input.contours {
        let from = c.from.evaluate(input.voltage_ev, kt);
        let to = c.to.evaluate(input.voltage_ev, kt);
        if from >= to {
            report.error(format!(
                "Contour '{}' is empty: from {:.6} eV >= to {:.6} eV",
                c.name, from, to
            ));
        }
        match c.spacing {
            Spacing::Delta(d) if d <= 0.0 => {
                report.error(format!("Contour '{}' has non-positive delta {}", c.name, d))
            }
            Spacing::Delta(d) if from < to && d > to - from => report.warning(format!(
                "Contour '{}' delta {} eV exceeds the window width",
                c.name, d
            )),
            Spacing::Points(0) => report.error(format!("Contour '{}' has zero points", c.name)),
            _ => {}
        }
    }
}

fn check_bias(input: &TbtransInput, report: &mut Report) {
    let mus: Vec<f64> = input
        .electrodes
        .iter()
        .filter_map(|e| e.chem_pot.as_deref())
        .filter_map(|cp| input.chem_pot_mu(cp))
        .collect();
    if mus.len() < 2 {
        return;
    }

    let max = mus.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min = mus.iter().cloned().fold(f64::INFINITY, f64::min);
    let spread = max - min;
    let bias = input.voltage_ev.abs();
    if (spread - bias).abs() > BIAS_TOLERANCE {
        report.warning(format!(
            "Chemical potential spread {:.6} eV does not match |TBT.Voltage| = {:.6} eV",
            spread, bias
        ));
    }
}

fn check_atom_ranges(input: &TbtransInput, atoms: Option<usize>, report: &mut Report) {
    let Some(total) = atoms else {
        if !input.electrodes.is_empty() {
            report.warning("Atom count unknown (NumberOfAtoms or --atoms); electrode ranges not checked");
        }
        return;
    };

    let mut ranges: Vec<(&str, usize, usize)> = Vec::new();
    for elec in &input.electrodes {
        let (Some(pos), Some(n)) = (elec.position, elec.used_atoms) else {
            report.warning(format!(
                "Electrode '{}' has no used-atoms; its atom range cannot be checked",
                elec.name
            ));
            continue;
        };
        match pos.atom_range(n, total) {
            Some((first, last)) => ranges.push((elec.name.as_str(), first, last)),
            None => report.error(format!(
                "Electrode '{}' ({} atoms at position {}) lies outside atoms 1..{}",
                elec.name, n, pos, total
            )),
        }
    }

    for (i, a) in ranges.iter().enumerate() {
        for b in ranges.iter().skip(i + 1) {
            if a.1 <= b.2 && b.1 <= a.2 {
                report.error(format!(
                    "Electrodes '{}' [{}..{}] and '{}' [{}..{}] overlap",
                    a.0, a.1, a.2, b.0, b.1, b.2
                ));
            }
        }
    }
}

fn check_files(input: &TbtransInput, dir: &Path, report: &mut Report) {
    if !dir.join(&input.hs_file).exists() {
        report.error(format!("Device HS file '{}' not found", input.hs_file));
    }
    for elec in &input.electrodes {
        if let Some(hs) = &elec.hs_file {
            if !dir.join(hs).exists() {
                report.error(format!(
                    "HS file '{}' of electrode '{}' not found",
                    hs, elec.name
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::energy::EnergyExpr;
    use crate::models::tbtrans::{ElectrodePosition, Electrode};

    fn device() -> TbtransInput {
        let mut input = TbtransInput::two_electrode("dev", "dev.TSHS", "l.TSHS", "r.TSHS");
        input.number_of_atoms = Some(20);
        for elec in &mut input.electrodes {
            elec.used_atoms = Some(4);
        }
        input
    }

    fn messages(report: &Report, severity: Severity) -> Vec<String> {
        report
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn test_clean_device() {
        let report = validate(&device(), &ValidateOptions::default());
        assert!(report.is_ok(), "{:?}", report.diagnostics);
        assert_eq!(report.warnings(), 0, "{:?}", report.diagnostics);
    }

    #[test]
    fn test_undefined_chem_pot() {
        let mut input = device();
        input.electrodes[1].chem_pot = Some("Drain".to_string());
        let report = validate(&input, &ValidateOptions::default());
        assert_eq!(report.errors(), 1);
        assert!(messages(&report, Severity::Error)[0].contains("Drain"));
        // Right 不再被引用
        assert!(messages(&report, Severity::Warning)
            .iter()
            .any(|m| m.contains("'Right' is not used")));
    }

    #[test]
    fn test_empty_window() {
        let mut input = device();
        input.contours[0].from = EnergyExpr::constant(1.0);
        input.contours[0].to = EnergyExpr::constant(-1.0);
        let report = validate(&input, &ValidateOptions::default());
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_non_positive_delta() {
        let mut input = device();
        input.contours[0].spacing = Spacing::Delta(0.0);
        let report = validate(&input, &ValidateOptions::default());
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_overlapping_electrodes() {
        let mut input = device();
        input.number_of_atoms = Some(6);
        let report = validate(&input, &ValidateOptions::default());
        assert!(messages(&report, Severity::Error)
            .iter()
            .any(|m| m.contains("overlap")));
    }

    #[test]
    fn test_out_of_bounds_electrode() {
        let mut input = device();
        input.electrodes[0].position = Some(ElectrodePosition::Begin(19));
        let report = validate(&input, &ValidateOptions::default());
        assert_eq!(report.errors(), 1);
    }

    #[test]
    fn test_cli_atoms_override() {
        let mut input = device();
        input.number_of_atoms = None;
        let options = ValidateOptions {
            atoms: Some(6),
            ..Default::default()
        };
        assert!(!validate(&input, &options).is_ok());
    }

    #[test]
    fn test_bias_mismatch_warns() {
        let mut input = device();
        input.voltage_ev = 0.5;
        input.chem_pots[1].mu = EnergyExpr::constant(0.0);
        let report = validate(&input, &ValidateOptions::default());
        assert!(report.is_ok());
        assert!(messages(&report, Severity::Warning)
            .iter()
            .any(|m| m.contains("spread")));
    }

    #[test]
    fn test_no_electrodes() {
        let mut input = device();
        input.electrodes.clear();
        let report = validate(&input, &ValidateOptions::default());
        assert!(!report.is_ok());
    }

    #[test]
    fn test_missing_fields() {
        let mut input = device();
        input.electrodes.push(Electrode::new("Gate"));
        let report = validate(&input, &ValidateOptions::default());
        // HS, semi-inf, position, chemical-potential
        assert_eq!(report.errors(), 4);
    }

    #[test]
    fn test_duplicates_reported() {
        let options = ValidateOptions {
            duplicates: vec!["TBT.Voltage".to_string()],
            ..Default::default()
        };
        let report = validate(&device(), &options);
        assert_eq!(report.warnings(), 1);
    }

    #[test]
    fn test_missing_files() {
        let dir = std::env::temp_dir().join(format!("tbtkit-validate-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("dev.TSHS"), b"").unwrap();
        std::fs::write(dir.join("l.TSHS"), b"").unwrap();

        let options = ValidateOptions {
            check_files_in: Some(dir.clone()),
            ..Default::default()
        };
        let report = validate(&device(), &options);
        assert_eq!(report.errors(), 1);
        assert!(messages(&report, Severity::Error)[0].contains("r.TSHS"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
