//! # 能量表达式
//!
//! TBtrans 允许化学势和积分窗口用偏压 `V` 与电子温度 `kT` 表示，例如
//! `mu V/2`、`from -|V|/2 - 5 kT to |V|/2 + 5 kT`、`delta 0.01 eV`。
//!
//! 表达式是 `V`、`|V|`、`kT` 与常数的线性组合；末尾可带一个能量单位，
//! 该单位只作用于常数项。
//!
//! ## 依赖关系
//! - 被 `models/tbtrans.rs`, `parsers/tbtrans.rs` 使用
//! - 使用 `parsers/units.rs`
//! - 使用 `regex` + `lazy_static` 分词

use crate::error::{TbtError, Result};
use crate::parsers::units;

use regex::Regex;

lazy_static::lazy_static! {
    /// `|V|`、`kT`、数字（允许 Fortran 的 `d` 指数）、单位、运算符
    static ref TOKEN: Regex =
        Regex::new(r"\|V\||(?i:kT)|[0-9]*\.?[0-9]+(?:[eEdD][+-]?[0-9]+)?\.?|[A-Za-z]+|[+\-*/]|\S")
            .unwrap();
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Voltage,
    AbsVoltage,
    ThermalEnergy,
    Unit(f64),
    Op(char),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Symbol {
    Voltage,
    AbsVoltage,
    ThermalEnergy,
}

/// 线性能量表达式
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyExpr {
    text: String,
    constant_ev: f64,
    voltage: f64,
    abs_voltage: f64,
    thermal: f64,
}

impl EnergyExpr {
    /// 常数能量 (eV)
    pub fn constant(value_ev: f64) -> Self {
        Self {
            text: format!("{} eV", value_ev),
            constant_ev: value_ev,
            voltage: 0.0,
            abs_voltage: 0.0,
            thermal: 0.0,
        }
    }

    /// 解析表达式
    pub fn parse(expr: &str) -> Result<Self> {
        let text = expr.split_whitespace().collect::<Vec<_>>().join(" ");
        let fail = |reason: &str| TbtError::InvalidExpression {
            expr: text.clone(),
            reason: reason.to_string(),
        };

        let mut tokens = tokenize(&text).map_err(|r| fail(&r))?;
        if tokens.is_empty() {
            return Err(fail("empty expression"));
        }

        let mut unit_scale = 1.0;
        if let Some(Token::Unit(scale)) = tokens.last() {
            unit_scale = *scale;
            tokens.pop();
        }
        if tokens.iter().any(|t| matches!(t, Token::Unit(_))) {
            return Err(fail("a unit may only appear at the end"));
        }

        let mut result = Self {
            text: text.clone(),
            constant_ev: 0.0,
            voltage: 0.0,
            abs_voltage: 0.0,
            thermal: 0.0,
        };

        let mut pos = 0;
        let mut sign = 1.0;
        if let Some(Token::Op(op @ ('+' | '-'))) = tokens.first() {
            sign = if *op == '-' { -1.0 } else { 1.0 };
            pos = 1;
        }

        loop {
            let (coef, symbol, next) = parse_term(&tokens, pos).map_err(|r| fail(&r))?;
            let coef = sign * coef;
            match symbol {
                None => result.constant_ev += coef * unit_scale,
                Some(Symbol::Voltage) => result.voltage += coef,
                Some(Symbol::AbsVoltage) => result.abs_voltage += coef,
                Some(Symbol::ThermalEnergy) => result.thermal += coef,
            }
            pos = next;

            match tokens.get(pos) {
                None => break,
                Some(Token::Op('+')) => sign = 1.0,
                Some(Token::Op('-')) => sign = -1.0,
                Some(_) => return Err(fail("expected '+' or '-' between terms")),
            }
            pos += 1;
        }

        Ok(result)
    }

    /// 在给定偏压与 kT（均为 eV）下求值
    pub fn evaluate(&self, voltage_ev: f64, kt_ev: f64) -> f64 {
        self.constant_ev
            + self.voltage * voltage_ev
            + self.abs_voltage * voltage_ev.abs()
            + self.thermal * kt_ev
    }

    /// 是否依赖偏压
    pub fn depends_on_voltage(&self) -> bool {
        self.voltage != 0.0 || self.abs_voltage != 0.0
    }
}

impl std::fmt::Display for EnergyExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn tokenize(text: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    for m in TOKEN.find_iter(text) {
        let s = m.as_str();
        let token = match s {
            "|V|" => Token::AbsVoltage,
            "V" | "v" => Token::Voltage,
            "+" | "-" | "*" | "/" => Token::Op(s.chars().next().unwrap_or('+')),
            _ if s.eq_ignore_ascii_case("kt") => Token::ThermalEnergy,
            _ if s.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
                Token::Number(units::parse_real(s).ok_or_else(|| format!("bad number '{}'", s))?)
            }
            _ => match units::energy_scale(s) {
                Some(scale) => Token::Unit(scale),
                None => return Err(format!("unexpected '{}'", s)),
            },
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// term := factor (('*' | '/')? factor)*
fn parse_term(
    tokens: &[Token],
    start: usize,
) -> std::result::Result<(f64, Option<Symbol>, usize), String> {
    let mut coef = 1.0;
    let mut symbol: Option<Symbol> = None;
    let mut pos = start;
    let mut expect_factor = true;
    let mut divide = false;

    while let Some(token) = tokens.get(pos) {
        match token {
            Token::Op('*') | Token::Op('/') if !expect_factor => {
                divide = matches!(token, Token::Op('/'));
                expect_factor = true;
            }
            Token::Number(v) => {
                if divide {
                    if *v == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    coef /= v;
                } else {
                    coef *= v;
                }
                divide = false;
                expect_factor = false;
            }
            Token::Voltage | Token::AbsVoltage | Token::ThermalEnergy => {
                if divide {
                    return Err("cannot divide by V or kT".to_string());
                }
                if symbol.is_some() {
                    return Err("product of V and kT is not an energy".to_string());
                }
                symbol = Some(match token {
                    Token::Voltage => Symbol::Voltage,
                    Token::AbsVoltage => Symbol::AbsVoltage,
                    _ => Symbol::ThermalEnergy,
                });
                expect_factor = false;
            }
            _ => break,
        }
        pos += 1;
    }

    if pos == start {
        return Err("missing term".to_string());
    }
    if expect_factor {
        return Err("dangling operator".to_string());
    }
    Ok((coef, symbol, pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_voltage() {
        let e = EnergyExpr::parse("V/2").unwrap();
        assert!((e.evaluate(0.4, 0.025) - 0.2).abs() < 1e-12);
        let e = EnergyExpr::parse("-V/2").unwrap();
        assert!((e.evaluate(0.4, 0.025) + 0.2).abs() < 1e-12);
        assert!(e.depends_on_voltage());
    }

    #[test]
    fn test_window_bound() {
        let e = EnergyExpr::parse("-|V|/2 - 5 kT").unwrap();
        let v = e.evaluate(-1.0, 0.02);
        assert!((v - (-0.5 - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_constant_with_unit() {
        let e = EnergyExpr::parse("-2. eV").unwrap();
        assert_eq!(e.evaluate(1.0, 1.0), -2.0);
        let e = EnergyExpr::parse("0.5 Ry").unwrap();
        assert!((e.evaluate(0.0, 0.0) - 0.5 * units::RYDBERG_EV).abs() < 1e-12);
        assert!(!e.depends_on_voltage());
    }

    #[test]
    fn test_unit_scales_constants_only() {
        let e = EnergyExpr::parse("V/2 + 100 meV").unwrap();
        assert!((e.evaluate(1.0, 0.0) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(EnergyExpr::parse("").is_err());
        assert!(EnergyExpr::parse("V * kT").is_err());
        assert!(EnergyExpr::parse("2 / V").is_err());
        assert!(EnergyExpr::parse("1 eV + 2").is_err());
        assert!(EnergyExpr::parse("V/").is_err());
        assert!(EnergyExpr::parse("banana").is_err());
    }

    #[test]
    fn test_display_normalizes_whitespace() {
        let e = EnergyExpr::parse("  -|V|/2   -  5 kT ").unwrap();
        assert_eq!(e.to_string(), "-|V|/2 - 5 kT");
    }
}
