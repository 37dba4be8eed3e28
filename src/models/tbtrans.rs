//! # TBtrans 输入数据模型
//!
//! 描述一次 TBtrans/TranSiesta 输运计算的输入：体系标签、器件 Hamiltonian
//! 文件、偏压、实轴积分窗口、电极以及化学势。
//!
//! ## 依赖关系
//! - 被 `parsers/tbtrans.rs` 构建与输出
//! - 被 `transport/` 模块校验与展开
//! - 使用 `models/energy.rs`

use crate::error::{TbtError, Result};
use crate::models::energy::EnergyExpr;
use crate::parsers::units::BOLTZMANN_EV;

/// 实轴积分方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadratureMethod {
    MidRule,
    SimpsonMix,
    GaussLegendre,
}

impl QuadratureMethod {
    /// 从 fdf 关键字解析（忽略大小写与 `-`/`_`）
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let key: String = keyword
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | '.'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "midrule" | "mid" => Some(QuadratureMethod::MidRule),
            "simpsonmix" | "simpson" => Some(QuadratureMethod::SimpsonMix),
            "gausslegendre" | "gl" => Some(QuadratureMethod::GaussLegendre),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuadratureMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuadratureMethod::MidRule => write!(f, "mid-rule"),
            QuadratureMethod::SimpsonMix => write!(f, "simpson-mix"),
            QuadratureMethod::GaussLegendre => write!(f, "gauss-legendre"),
        }
    }
}

/// 能量点间距
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spacing {
    /// 步长 (eV)
    Delta(f64),
    /// 点数
    Points(usize),
}

/// 实轴积分窗口（`TBT.Contour.<name>`）
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub name: String,
    pub from: EnergyExpr,
    pub to: EnergyExpr,
    pub spacing: Spacing,
    pub method: QuadratureMethod,
}

impl Contour {
    /// TBtrans 未指定窗口时使用的默认窗口
    pub fn default_window() -> Self {
        Contour {
            name: "window".to_string(),
            from: EnergyExpr::constant(-2.0),
            to: EnergyExpr::constant(2.0),
            spacing: Spacing::Delta(0.01),
            method: QuadratureMethod::MidRule,
        }
    }
}

/// 半无限方向，如 `-a1`、`+a3`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemiInfDirection {
    /// true 表示正方向
    pub positive: bool,
    /// 晶格矢量编号 1..=3
    pub axis: u8,
}

impl SemiInfDirection {
    pub fn parse(text: &str) -> Result<Self> {
        let lower = text.to_ascii_lowercase();
        let (positive, rest) = match lower.as_bytes().first() {
            Some(b'+') => (true, &lower[1..]),
            Some(b'-') => (false, &lower[1..]),
            _ => (true, lower.as_str()),
        };
        let axis = match rest {
            "a1" | "a" => 1,
            "a2" | "b" => 2,
            "a3" | "c" => 3,
            _ => {
                return Err(TbtError::InvalidValue {
                    label: "semi-inf-direction".to_string(),
                    reason: format!("'{}' is not one of ±a1, ±a2, ±a3", text),
                })
            }
        };
        Ok(SemiInfDirection { positive, axis })
    }
}

impl std::fmt::Display for SemiInfDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.positive { '+' } else { '-' };
        write!(f, "{}a{}", sign, self.axis)
    }
}

/// 电极在器件中的位置（1 起的原子下标，负数从末尾数起）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElectrodePosition {
    /// 电极第一个原子的位置
    Begin(i64),
    /// 电极最后一个原子的位置
    End(i64),
}

impl ElectrodePosition {
    /// 电极所占原子区间 [first, last]（1 起），越界时返回 None
    pub fn atom_range(&self, used_atoms: usize, total_atoms: usize) -> Option<(usize, usize)> {
        let total = i64::try_from(total_atoms).ok()?;
        let n = i64::try_from(used_atoms).ok().filter(|&n| n > 0)?;
        let resolve = |idx: i64| -> Option<i64> {
            match idx {
                0 => None,
                i if i > 0 => Some(i),
                i => total.checked_add(i)?.checked_add(1),
            }
        };
        let (first, last) = match *self {
            ElectrodePosition::Begin(i) => {
                let first = resolve(i)?;
                (first, first.checked_add(n - 1)?)
            }
            ElectrodePosition::End(i) => {
                let last = resolve(i)?;
                (last.checked_sub(n - 1)?, last)
            }
        };
        if first < 1 || last > total {
            return None;
        }
        Some((first as usize, last as usize))
    }
}

impl std::fmt::Display for ElectrodePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectrodePosition::Begin(i) => write!(f, "{}", i),
            ElectrodePosition::End(i) => write!(f, "end {}", i),
        }
    }
}

/// 电极（`TS.Elec.<name>`）
#[derive(Debug, Clone, PartialEq)]
pub struct Electrode {
    pub name: String,
    pub hs_file: Option<String>,
    pub chem_pot: Option<String>,
    pub semi_inf: Option<SemiInfDirection>,
    pub position: Option<ElectrodePosition>,
    pub used_atoms: Option<usize>,
    pub bulk: Option<bool>,
    /// 未识别的块内容，原样保留
    pub extra: Vec<String>,
}

impl Electrode {
    pub fn new(name: impl Into<String>) -> Self {
        Electrode {
            name: name.into(),
            hs_file: None,
            chem_pot: None,
            semi_inf: None,
            position: None,
            used_atoms: None,
            bulk: None,
            extra: Vec::new(),
        }
    }
}

/// 化学势的温度
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChemPotTemperature {
    /// `temp kT`：使用全局电子温度
    Electronic,
    Kelvin(f64),
}

impl ChemPotTemperature {
    pub fn kelvin(&self, electronic_k: f64) -> f64 {
        match self {
            ChemPotTemperature::Electronic => electronic_k,
            ChemPotTemperature::Kelvin(t) => *t,
        }
    }
}

/// 化学势（`TBT.ChemPot.<name>`）
#[derive(Debug, Clone, PartialEq)]
pub struct ChemPot {
    pub name: String,
    pub mu: EnergyExpr,
    pub temperature: ChemPotTemperature,
    /// 是否由块定义（否则为默认值）
    pub defined: bool,
    pub extra: Vec<String>,
}

impl ChemPot {
    /// 未定义块时的默认化学势：`mu 0 eV`, `temp kT`
    pub fn default_for(name: impl Into<String>) -> Self {
        ChemPot {
            name: name.into(),
            mu: EnergyExpr::constant(0.0),
            temperature: ChemPotTemperature::Electronic,
            defined: false,
            extra: Vec::new(),
        }
    }
}

/// 完整的 TBtrans 输入
#[derive(Debug, Clone, PartialEq)]
pub struct TbtransInput {
    pub system_label: String,
    pub hs_file: String,
    /// 是否显式给出 `TBT.HS`
    pub hs_explicit: bool,
    pub voltage_ev: f64,
    pub electronic_temperature_k: f64,
    pub number_of_atoms: Option<usize>,
    pub contours: Vec<Contour>,
    pub electrodes: Vec<Electrode>,
    pub chem_pots: Vec<ChemPot>,
}

impl TbtransInput {
    /// 电子温度对应的 kT (eV)
    pub fn kt_ev(&self) -> f64 {
        self.electronic_temperature_k * BOLTZMANN_EV
    }

    pub fn chem_pot(&self, name: &str) -> Option<&ChemPot> {
        self.chem_pots.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// 化学势数值 (eV)
    pub fn chem_pot_mu(&self, name: &str) -> Option<f64> {
        self.chem_pot(name)
            .map(|c| c.mu.evaluate(self.voltage_ev, self.kt_ev()))
    }

    /// 两电极器件模板：左电极从第一个原子开始，右电极在最后一个原子结束，
    /// 化学势分别为 `V/2` 与 `-V/2`
    pub fn two_electrode(label: &str, device_hs: &str, left_hs: &str, right_hs: &str) -> Self {
        let mut left = Electrode::new("Left");
        left.hs_file = Some(left_hs.to_string());
        left.chem_pot = Some("Left".to_string());
        left.semi_inf = Some(SemiInfDirection {
            positive: false,
            axis: 1,
        });
        left.position = Some(ElectrodePosition::Begin(1));

        let mut right = Electrode::new("Right");
        right.hs_file = Some(right_hs.to_string());
        right.chem_pot = Some("Right".to_string());
        right.semi_inf = Some(SemiInfDirection {
            positive: true,
            axis: 1,
        });
        right.position = Some(ElectrodePosition::End(-1));

        let chem_pot = |name: &str, mu: &str| ChemPot {
            name: name.to_string(),
            mu: EnergyExpr::parse(mu).unwrap_or_else(|_| EnergyExpr::constant(0.0)),
            temperature: ChemPotTemperature::Electronic,
            defined: true,
            extra: Vec::new(),
        };

        TbtransInput {
            system_label: label.to_string(),
            hs_file: device_hs.to_string(),
            hs_explicit: true,
            voltage_ev: 0.0,
            electronic_temperature_k: 300.0,
            number_of_atoms: None,
            contours: vec![Contour::default_window()],
            electrodes: vec![left, right],
            chem_pots: vec![chem_pot("Left", "V/2"), chem_pot("Right", "-V/2")],
        }
    }
}
