//! # TBtrans / TranSiesta 输入解析与输出
//!
//! 从 fdf 文档中读取输运计算设置，并可将模型重新写成 fdf 文本。
//!
//! ## 输入格式说明
//! ```text
//! SystemLabel   device
//! TBT.HS        device.TSHS
//! TBT.Voltage   0.5 eV
//!
//! %block TBT.Contours
//!   window
//! %endblock TBT.Contours
//! %block TBT.Contour.window
//!   part line
//!   from -2. eV to 2. eV
//!   delta 0.01 eV
//!   method mid-rule
//! %endblock TBT.Contour.window
//!
//! %block TS.Elecs
//!   Left
//! %endblock TS.Elecs
//! %block TS.Elec.Left
//!   HS elec.TSHS
//!   chemical-potential Left
//!   semi-inf-direction -a1
//!   electrode-position 1
//!   used-atoms 4
//! %endblock TS.Elec.Left
//!
//! %block TBT.ChemPots
//!   Left
//! %endblock TBT.ChemPots
//! %block TBT.ChemPot.Left
//!   mu V/2
//!   temp kT
//! %endblock TBT.ChemPot.Left
//! ```
//!
//! ## 依赖关系
//! - 使用 `parsers/fdf.rs` 的 FdfDocument
//! - 生成 `models/tbtrans.rs` 的 TbtransInput

use crate::error::{TbtError, Result};
use crate::models::EnergyExpr;
use crate::models::tbtrans::{
    ChemPot, ChemPotTemperature, Contour, Electrode, ElectrodePosition, QuadratureMethod,
    SemiInfDirection, Spacing, TbtransInput,
};
use crate::parsers::fdf::{normalize_label, parse_fdf_file, FdfBlock, FdfDocument};
use crate::parsers::units;

use std::path::Path;

/// 解析 TBtrans 输入文件
pub fn parse_tbtrans_file(path: &Path) -> Result<(FdfDocument, TbtransInput)> {
    let doc = parse_fdf_file(path)?;
    let input = read_tbtrans(&doc)?;
    Ok((doc, input))
}

/// 从 fdf 文档构建 TBtrans 输入
pub fn read_tbtrans(doc: &FdfDocument) -> Result<TbtransInput> {
    let system_label = doc
        .get_string("SystemLabel")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "siesta".to_string());

    let hs_entry = doc.get_string("TBT.HS").filter(|s| !s.is_empty());
    let hs_explicit = hs_entry.is_some();
    let hs_file = hs_entry.unwrap_or_else(|| format!("{}.TSHS", system_label));

    let voltage_ev = if doc.get("TBT.Voltage").is_some() {
        doc.get_energy("TBT.Voltage")?
    } else {
        doc.get_energy("TS.Voltage")?
    }
    .unwrap_or(0.0);

    let electronic_temperature_k = doc.get_temperature("ElectronicTemperature")?.unwrap_or(300.0);

    let number_of_atoms = match doc.get_int("NumberOfAtoms")? {
        Some(n) if n > 0 => Some(n as usize),
        Some(n) => {
            return Err(TbtError::InvalidValue {
                label: "NumberOfAtoms".to_string(),
                reason: format!("must be positive, got {}", n),
            })
        }
        None => None,
    };

    let mut contours = Vec::new();
    if let Some(list) = doc.block("TBT.Contours") {
        for name in list.names() {
            let block_name = format!("TBT.Contour.{}", name);
            let block = doc
                .block(&block_name)
                .ok_or(TbtError::MissingBlock { block: block_name })?;
            contours.push(read_contour(&name, block)?);
        }
    }

    let mut electrodes = Vec::new();
    if let Some(list) = doc.block_any(&["TS.Elecs", "TBT.Elecs"]) {
        for name in list.names() {
            let primary = format!("TS.Elec.{}", name);
            let alias = format!("TBT.Elec.{}", name);
            let block = doc
                .block_any(&[primary.as_str(), alias.as_str()])
                .ok_or(TbtError::MissingBlock { block: primary.clone() })?;
            electrodes.push(read_electrode(&name, block)?);
        }
    }

    let mut chem_pots = Vec::new();
    if let Some(list) = doc.block_any(&["TBT.ChemPots", "TS.ChemPots"]) {
        for name in list.names() {
            let primary = format!("TBT.ChemPot.{}", name);
            let alias = format!("TS.ChemPot.{}", name);
            let block = doc.block_any(&[primary.as_str(), alias.as_str()]);
            let chem_pot = match block {
                Some(b) => read_chem_pot(&name, b)?,
                None => ChemPot::default_for(name),
            };
            chem_pots.push(chem_pot);
        }
    }

    Ok(TbtransInput {
        system_label,
        hs_file,
        hs_explicit,
        voltage_ev,
        electronic_temperature_k,
        number_of_atoms,
        contours,
        electrodes,
        chem_pots,
    })
}

fn block_error(block: &FdfBlock, reason: impl Into<String>) -> TbtError {
    TbtError::InvalidBlock {
        block: block.name.clone(),
        reason: reason.into(),
    }
}

/// 拆分块内一行为 (规范化关键字, 其余 token)
fn split_keyword(line: &str) -> (String, Vec<&str>) {
    let mut parts = line.split_whitespace();
    let key = parts.next().map(normalize_label).unwrap_or_default();
    (key, parts.collect())
}

fn read_contour(name: &str, block: &FdfBlock) -> Result<Contour> {
    let mut from = None;
    let mut to = None;
    let mut spacing = None;
    let mut method = QuadratureMethod::MidRule;

    for line in &block.lines {
        let (key, rest) = split_keyword(line);
        match key.as_str() {
            "part" => {
                let part = rest.first().copied().unwrap_or_default();
                if !part.eq_ignore_ascii_case("line") {
                    return Err(block_error(
                        block,
                        format!("only 'part line' is supported on the real axis, got '{}'", part),
                    ));
                }
            }
            "from" => {
                let split = rest
                    .iter()
                    .position(|t| t.eq_ignore_ascii_case("to"))
                    .ok_or_else(|| block_error(block, "'from' line needs 'to'"))?;
                from = Some(EnergyExpr::parse(&rest[..split].join(" "))?);
                to = Some(EnergyExpr::parse(&rest[split + 1..].join(" "))?);
            }
            "delta" => {
                let value = rest
                    .first()
                    .and_then(|t| units::parse_real(t))
                    .ok_or_else(|| block_error(block, "'delta' needs a number"))?;
                let unit = rest.get(1).copied().unwrap_or("eV");
                spacing = Some(Spacing::Delta(units::energy_to_ev(value, unit)?));
            }
            "points" => {
                let n = rest
                    .first()
                    .and_then(|t| t.parse::<usize>().ok())
                    .ok_or_else(|| block_error(block, "'points' needs a non-negative integer"))?;
                spacing = Some(Spacing::Points(n));
            }
            "method" => {
                let keyword = rest.first().copied().unwrap_or_default();
                method = QuadratureMethod::from_keyword(keyword).ok_or_else(|| {
                    block_error(block, format!("unknown quadrature method '{}'", keyword))
                })?;
            }
            _ => {
                return Err(block_error(block, format!("unrecognized line '{}'", line)));
            }
        }
    }

    Ok(Contour {
        name: name.to_string(),
        from: from.ok_or_else(|| block_error(block, "missing 'from ... to ...'"))?,
        to: to.ok_or_else(|| block_error(block, "missing 'from ... to ...'"))?,
        spacing: spacing.ok_or_else(|| block_error(block, "missing 'delta' or 'points'"))?,
        method,
    })
}

fn read_electrode(name: &str, block: &FdfBlock) -> Result<Electrode> {
    let mut elec = Electrode::new(name);

    for line in &block.lines {
        let (key, rest) = split_keyword(line);
        let first = rest.first().copied();
        match key.as_str() {
            "hs" | "hsfile" | "tshs" => {
                elec.hs_file = Some(first.ok_or_else(|| block_error(block, "'HS' needs a file"))?.to_string());
            }
            "chemicalpotential" | "chempot" => {
                elec.chem_pot = Some(
                    first
                        .ok_or_else(|| block_error(block, "'chemical-potential' needs a name"))?
                        .to_string(),
                );
            }
            "semiinfdirection" | "semiinfdir" | "semiinf" => {
                let text = first.ok_or_else(|| block_error(block, "'semi-inf-direction' needs a value"))?;
                elec.semi_inf = Some(SemiInfDirection::parse(text)?);
            }
            "electrodeposition" | "elecpos" => {
                elec.position = Some(parse_position(block, &rest)?);
            }
            "usedatoms" => {
                let n = first
                    .and_then(|t| t.parse::<usize>().ok())
                    .filter(|n| *n > 0)
                    .ok_or_else(|| block_error(block, "'used-atoms' needs a positive integer"))?;
                elec.used_atoms = Some(n);
            }
            "bulk" => {
                let flag = match first {
                    None => true,
                    Some(t) => units::parse_logical(t)
                        .ok_or_else(|| block_error(block, format!("'{}' is not a logical value", t)))?,
                };
                elec.bulk = Some(flag);
            }
            _ => elec.extra.push(line.clone()),
        }
    }

    Ok(elec)
}

/// `electrode-position [begin|end] <idx>`
fn parse_position(block: &FdfBlock, rest: &[&str]) -> Result<ElectrodePosition> {
    let (at_end, index) = match rest {
        [kw, idx] if kw.eq_ignore_ascii_case("end") => (true, *idx),
        [kw, idx] if kw.eq_ignore_ascii_case("begin") || kw.eq_ignore_ascii_case("start") => {
            (false, *idx)
        }
        [idx] => (false, *idx),
        _ => return Err(block_error(block, "'electrode-position' expects [begin|end] <index>")),
    };

    let index: i64 = index
        .parse()
        .map_err(|_| block_error(block, format!("'{}' is not an atom index", index)))?;
    if index == 0 {
        return Err(block_error(block, "atom indices start at 1 (negative counts from the end)"));
    }

    Ok(if at_end {
        ElectrodePosition::End(index)
    } else {
        ElectrodePosition::Begin(index)
    })
}

fn read_chem_pot(name: &str, block: &FdfBlock) -> Result<ChemPot> {
    let mut chem_pot = ChemPot::default_for(name);
    chem_pot.defined = true;

    for line in &block.lines {
        let (key, rest) = split_keyword(line);
        match key.as_str() {
            "mu" | "chemicalshift" => {
                chem_pot.mu = EnergyExpr::parse(&rest.join(" "))?;
            }
            "temp" | "temperature" | "kt" => {
                chem_pot.temperature = parse_temperature(block, &rest)?;
            }
            _ => chem_pot.extra.push(line.clone()),
        }
    }

    Ok(chem_pot)
}

fn parse_temperature(block: &FdfBlock, rest: &[&str]) -> Result<ChemPotTemperature> {
    match rest {
        [kt] if kt.eq_ignore_ascii_case("kt") => Ok(ChemPotTemperature::Electronic),
        [value] | [value, _] => {
            let v = units::parse_real(value)
                .ok_or_else(|| block_error(block, format!("'{}' is not a temperature", value)))?;
            let unit = rest.get(1).copied().unwrap_or("K");
            Ok(ChemPotTemperature::Kelvin(units::temperature_to_kelvin(v, unit)?))
        }
        _ => Err(block_error(block, "'temp' expects kT or '<value> <unit>'")),
    }
}

/// 将 TBtrans 输入写成 fdf 文本
pub fn to_tbtrans_string(input: &TbtransInput) -> String {
    let mut out = String::new();

    out.push_str(&format!("SystemLabel            {}\n", input.system_label));
    out.push_str(&format!("TBT.HS                 {}\n", input.hs_file));
    out.push_str(&format!("TBT.Voltage            {} eV\n", input.voltage_ev));
    out.push_str(&format!(
        "ElectronicTemperature  {} K\n",
        input.electronic_temperature_k
    ));
    if let Some(n) = input.number_of_atoms {
        out.push_str(&format!("NumberOfAtoms          {}\n", n));
    }

    if !input.contours.is_empty() {
        let names: Vec<&str> = input.contours.iter().map(|c| c.name.as_str()).collect();
        push_list_block(&mut out, "TBT.Contours", &names);
        for c in &input.contours {
            let spacing = match c.spacing {
                Spacing::Delta(d) => format!("delta {} eV", d),
                Spacing::Points(n) => format!("points {}", n),
            };
            let body = vec![
                "part line".to_string(),
                format!("from {} to {}", c.from, c.to),
                spacing,
                format!("method {}", c.method),
            ];
            push_block(&mut out, &format!("TBT.Contour.{}", c.name), &body);
        }
    }

    if !input.electrodes.is_empty() {
        let names: Vec<&str> = input.electrodes.iter().map(|e| e.name.as_str()).collect();
        push_list_block(&mut out, "TS.Elecs", &names);
        for e in &input.electrodes {
            let mut body = Vec::new();
            if let Some(hs) = &e.hs_file {
                body.push(format!("HS {}", hs));
            }
            if let Some(cp) = &e.chem_pot {
                body.push(format!("chemical-potential {}", cp));
            }
            if let Some(dir) = &e.semi_inf {
                body.push(format!("semi-inf-direction {}", dir));
            }
            if let Some(pos) = &e.position {
                body.push(format!("electrode-position {}", pos));
            }
            if let Some(n) = e.used_atoms {
                body.push(format!("used-atoms {}", n));
            }
            if let Some(bulk) = e.bulk {
                body.push(format!("bulk {}", bulk));
            }
            body.extend(e.extra.iter().cloned());
            push_block(&mut out, &format!("TS.Elec.{}", e.name), &body);
        }
    }

    if !input.chem_pots.is_empty() {
        let names: Vec<&str> = input.chem_pots.iter().map(|c| c.name.as_str()).collect();
        push_list_block(&mut out, "TBT.ChemPots", &names);
        for c in input.chem_pots.iter().filter(|c| c.defined) {
            let temp = match c.temperature {
                ChemPotTemperature::Electronic => "temp kT".to_string(),
                ChemPotTemperature::Kelvin(t) => format!("temp {} K", t),
            };
            let mut body = vec![format!("mu {}", c.mu), temp];
            body.extend(c.extra.iter().cloned());
            push_block(&mut out, &format!("TBT.ChemPot.{}", c.name), &body);
        }
    }

    out
}

fn push_list_block(out: &mut String, name: &str, names: &[&str]) {
    let body: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    push_block(out, name, &body);
}

fn push_block(out: &mut String, name: &str, body: &[String]) {
    out.push_str(&format!("\n%block {}\n", name));
    for line in body {
        out.push_str(&format!("  {}\n", line));
    }
    out.push_str(&format!("%endblock {}\n", name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fdf::parse_fdf_content;

    const DEVICE: &str = r#"
SystemLabel   zgnr
TBT.HS        zgnr.TSHS
TBT.Voltage   0.4 eV
NumberOfAtoms 24

%block TBT.Contours
  window
%endblock TBT.Contours

%block TBT.Contour.window
  part line
  from -|V|/2 - 5 kT to |V|/2 + 5 kT
  delta 0.01 eV
  method mid-rule
%endblock TBT.Contour.window

%block TS.Elecs
  Left
  Right
%endblock TS.Elecs

%block TS.Elec.Left
  HS elec-left.TSHS
  chemical-potential Left
  semi-inf-direction -a2
  electrode-position 1
  used-atoms 4
%endblock TS.Elec.Left

%block TS.Elec.Right
  HS elec-right.TSHS
  chem-pot Right
  semi-inf-dir +a2
  elec-pos end -1
  used-atoms 4
  out-of-core true
%endblock TS.Elec.Right

%block TBT.ChemPots
  Left
  Right
%endblock TBT.ChemPots

%block TBT.ChemPot.Left
  mu V/2
  temp kT
%endblock TBT.ChemPot.Left

%block TBT.ChemPot.Right
  mu -V/2
  temp 300 K
%endblock TBT.ChemPot.Right
"#;

    fn device() -> TbtransInput {
        let doc = parse_fdf_content(DEVICE, "device").unwrap();
        read_tbtrans(&doc).unwrap()
    }

    #[test]
    fn test_read_globals() {
        let input = device();
        assert_eq!(input.system_label, "zgnr");
        assert_eq!(input.hs_file, "zgnr.TSHS");
        assert!(input.hs_explicit);
        assert_eq!(input.voltage_ev, 0.4);
        assert_eq!(input.electronic_temperature_k, 300.0);
        assert_eq!(input.number_of_atoms, Some(24));
    }

    #[test]
    fn test_read_electrodes() {
        let input = device();
        assert_eq!(input.electrodes.len(), 2);

        let right = &input.electrodes[1];
        assert_eq!(right.hs_file.as_deref(), Some("elec-right.TSHS"));
        assert_eq!(right.chem_pot.as_deref(), Some("Right"));
        assert_eq!(right.semi_inf.unwrap().to_string(), "+a2");
        assert_eq!(right.position, Some(ElectrodePosition::End(-1)));
        assert_eq!(right.extra, vec!["out-of-core true".to_string()]);
    }

    #[test]
    fn test_read_chem_pots_and_contour() {
        let input = device();
        assert!((input.chem_pot_mu("Left").unwrap() - 0.2).abs() < 1e-12);
        assert!((input.chem_pot_mu("Right").unwrap() + 0.2).abs() < 1e-12);
        assert_eq!(input.chem_pots[1].temperature, ChemPotTemperature::Kelvin(300.0));

        let window = &input.contours[0];
        assert_eq!(window.spacing, Spacing::Delta(0.01));
        let from = window.from.evaluate(input.voltage_ev, input.kt_ev());
        assert!((from - (-0.2 - 5.0 * input.kt_ev())).abs() < 1e-12);
    }

    #[test]
    fn test_defaults() {
        let doc = parse_fdf_content("SystemLabel lone\n", "min").unwrap();
        let input = read_tbtrans(&doc).unwrap();
        assert_eq!(input.hs_file, "lone.TSHS");
        assert!(!input.hs_explicit);
        assert_eq!(input.voltage_ev, 0.0);
        assert!(input.contours.is_empty());
        assert!(input.electrodes.is_empty());
    }

    #[test]
    fn test_chem_pot_without_block_uses_defaults() {
        let doc = parse_fdf_content("%block TBT.ChemPots\n  Bulk\n%endblock\n", "cp").unwrap();
        let input = read_tbtrans(&doc).unwrap();
        assert!(!input.chem_pots[0].defined);
        assert_eq!(input.chem_pot_mu("Bulk"), Some(0.0));
    }

    #[test]
    fn test_missing_electrode_block() {
        let doc = parse_fdf_content("%block TS.Elecs\n  Left\n%endblock\n", "bad").unwrap();
        assert!(matches!(
            read_tbtrans(&doc),
            Err(TbtError::MissingBlock { .. })
        ));
    }

    #[test]
    fn test_bad_contour_lines() {
        let content = "%block TBT.Contours\n w\n%endblock\n%block TBT.Contour.w\n part circle\n%endblock\n";
        let doc = parse_fdf_content(content, "bad").unwrap();
        assert!(read_tbtrans(&doc).is_err());

        let content = "%block TBT.Contours\n w\n%endblock\n%block TBT.Contour.w\n from -1 eV to 1 eV\n method tanh-sinh\n delta 0.1 eV\n%endblock\n";
        let doc = parse_fdf_content(content, "bad").unwrap();
        assert!(read_tbtrans(&doc).is_err());
    }

    #[test]
    fn test_written_input_reads_back() {
        let input = device();
        let text = to_tbtrans_string(&input);
        let doc = parse_fdf_content(&text, "written").unwrap();
        let again = read_tbtrans(&doc).unwrap();
        assert_eq!(again, input);
    }
}
