//! # fdf (Flexible Data Format) 解析器
//!
//! 解析 SIESTA / TranSiesta / TBtrans 使用的 fdf 输入文件。
//!
//! ## fdf 格式说明
//! ```text
//! SystemLabel      device          # label value
//! TBT.Voltage      0.5 eV          # 带单位的物理量
//! TBT.T.Eig        T               # 逻辑值；单独的 label 等价于 true
//! %include extra.fdf               # 引入其他文件
//!
//! %block TS.Elecs
//!   Left
//!   Right
//! %endblock TS.Elecs
//!
//! %block TBT.Contour.window < window.block   # 块内容来自文件
//! ```
//!
//! label 比较时忽略大小写以及 `.`、`_`、`-`。注释以 `#`、`!` 或 `;` 开始。
//! 同一 label 多次出现时以第一次为准。
//!
//! ## 依赖关系
//! - 被 `parsers/tbtrans.rs` 与各命令使用
//! - 使用 `parsers/units.rs` 做单位换算

use crate::error::{TbtError, Result};
use crate::parsers::units;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 规范化 label：小写并去掉 `.`、`_`、`-`
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '.' | '_' | '-'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 去掉行内注释
pub fn strip_comment(line: &str) -> &str {
    match line.find(&['#', '!', ';'][..]) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// label-value 条目
#[derive(Debug, Clone, PartialEq)]
pub struct FdfEntry {
    /// 原始拼写的 label
    pub label: String,
    /// 值的各个 token
    pub tokens: Vec<String>,
    /// 所在行号（1 起）
    pub line: usize,
    /// 来源文件
    pub source: String,
}

impl FdfEntry {
    /// 值的原始文本（token 以单个空格连接）
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }
}

/// `%block` 块
#[derive(Debug, Clone, PartialEq)]
pub struct FdfBlock {
    /// 原始拼写的块名
    pub name: String,
    /// 去除注释和空行后的内容行
    pub lines: Vec<String>,
    /// `%block` 所在行号
    pub line: usize,
    /// 来源文件
    pub source: String,
}

impl FdfBlock {
    /// 每行的第一个 token（用于 `TS.Elecs` 这类名称列表块）
    pub fn names(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|l| l.split_whitespace().next())
            .map(|s| s.to_string())
            .collect()
    }
}

/// 文档条目
#[derive(Debug, Clone, PartialEq)]
pub enum FdfItem {
    Entry(FdfEntry),
    Block(FdfBlock),
}

/// 解析后的 fdf 文档（保持原始顺序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FdfDocument {
    items: Vec<FdfItem>,
}

/// 解析 fdf 文件，处理 `%include` 与 `%block X < file`
pub fn parse_fdf_file(path: &Path) -> Result<FdfDocument> {
    let mut doc = FdfDocument::default();
    let mut stack = Vec::new();
    read_file_into(&mut doc, path, &mut stack)?;
    Ok(doc)
}

/// 从字符串解析 fdf；相对路径按当前目录解析
pub fn parse_fdf_content(content: &str, origin: &str) -> Result<FdfDocument> {
    let mut doc = FdfDocument::default();
    let mut stack = Vec::new();
    parse_into(&mut doc, content, origin, Path::new(""), &mut stack)?;
    Ok(doc)
}

fn read_file_into(doc: &mut FdfDocument, path: &Path, stack: &mut Vec<PathBuf>) -> Result<()> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if stack.contains(&key) {
        return Err(TbtError::IncludeCycle {
            path: path.display().to_string(),
        });
    }

    let content = read_text(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("")).to_path_buf();

    stack.push(key);
    parse_into(doc, &content, &path.display().to_string(), &base, stack)?;
    stack.pop();

    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(TbtError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    fs::read_to_string(path).map_err(|e| TbtError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

fn syntax_error(origin: &str, line: usize, reason: impl Into<String>) -> TbtError {
    TbtError::FdfSyntax {
        path: origin.to_string(),
        line,
        reason: reason.into(),
    }
}

fn parse_into(
    doc: &mut FdfDocument,
    content: &str,
    origin: &str,
    base: &Path,
    stack: &mut Vec<PathBuf>,
) -> Result<()> {
    let lines: Vec<&str> = content.lines().collect();
    let mut i = 0;

    while i < lines.len() {
        let lineno = i + 1;
        let text = strip_comment(lines[i]).trim();
        i += 1;

        let mut tokens = text.split_whitespace();
        let Some(head) = tokens.next() else {
            continue;
        };

        match head.to_ascii_lowercase().as_str() {
            "%include" => {
                let target = tokens
                    .next()
                    .ok_or_else(|| syntax_error(origin, lineno, "%include without a file name"))?;
                read_file_into(doc, &base.join(target), stack)?;
            }
            "%block" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| syntax_error(origin, lineno, "%block without a name"))?
                    .to_string();

                let rest: Vec<&str> = tokens.collect();
                let block_lines = if rest.first() == Some(&"<") {
                    let target = rest.get(1).ok_or_else(|| {
                        syntax_error(origin, lineno, format!("%block {} < without a file", name))
                    })?;
                    let included = read_text(&base.join(target))?;
                    included
                        .lines()
                        .map(|l| strip_comment(l).trim())
                        .filter(|l| !l.is_empty())
                        .map(|l| l.to_string())
                        .collect()
                } else {
                    let (body, next) = read_block_body(&lines, i, &name, origin, lineno)?;
                    i = next;
                    body
                };

                doc.items.push(FdfItem::Block(FdfBlock {
                    name,
                    lines: block_lines,
                    line: lineno,
                    source: origin.to_string(),
                }));
            }
            "%endblock" => {
                return Err(syntax_error(origin, lineno, "%endblock without matching %block"));
            }
            _ if head.starts_with('%') => {
                return Err(syntax_error(
                    origin,
                    lineno,
                    format!("Unknown directive '{}'", head),
                ));
            }
            _ => {
                doc.items.push(FdfItem::Entry(FdfEntry {
                    label: head.to_string(),
                    tokens: tokens.map(|t| t.to_string()).collect(),
                    line: lineno,
                    source: origin.to_string(),
                }));
            }
        }
    }

    Ok(())
}

/// 读取块内容直到 `%endblock`，返回内容行与下一行的下标
fn read_block_body(
    lines: &[&str],
    start: usize,
    name: &str,
    origin: &str,
    open_line: usize,
) -> Result<(Vec<String>, usize)> {
    let mut body = Vec::new();
    let mut i = start;

    while i < lines.len() {
        let lineno = i + 1;
        let text = strip_comment(lines[i]).trim();
        i += 1;

        let mut parts = text.split_whitespace();
        let Some(head) = parts.next() else {
            continue;
        };

        if head.eq_ignore_ascii_case("%endblock") {
            if let Some(end_name) = parts.next() {
                if normalize_label(end_name) != normalize_label(name) {
                    return Err(syntax_error(
                        origin,
                        lineno,
                        format!("%endblock {} closes block '{}'", end_name, name),
                    ));
                }
            }
            return Ok((body, i));
        }

        if head.eq_ignore_ascii_case("%block") {
            return Err(syntax_error(
                origin,
                lineno,
                format!("Nested %block inside '{}'", name),
            ));
        }

        body.push(text.to_string());
    }

    Err(syntax_error(
        origin,
        open_line,
        format!("Block '{}' is never closed", name),
    ))
}

impl FdfDocument {
    /// 条目数量（含块）
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 查找 label 的第一次出现
    pub fn get(&self, label: &str) -> Option<&FdfEntry> {
        let key = normalize_label(label);
        self.items.iter().find_map(|item| match item {
            FdfItem::Entry(e) if normalize_label(&e.label) == key => Some(e),
            _ => None,
        })
    }

    /// 查找块
    pub fn block(&self, name: &str) -> Option<&FdfBlock> {
        let key = normalize_label(name);
        self.items.iter().find_map(|item| match item {
            FdfItem::Block(b) if normalize_label(&b.name) == key => Some(b),
            _ => None,
        })
    }

    /// 依次尝试多个块名
    pub fn block_any(&self, names: &[&str]) -> Option<&FdfBlock> {
        names.iter().find_map(|n| self.block(n))
    }

    /// 字符串值
    pub fn get_string(&self, label: &str) -> Option<String> {
        self.get(label).map(|e| e.value())
    }

    /// 整数值
    pub fn get_int(&self, label: &str) -> Result<Option<i64>> {
        let Some(entry) = self.get(label) else {
            return Ok(None);
        };
        let token = first_token(entry)?;
        token
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(entry, format!("'{}' is not an integer", token)))
    }

    /// 逻辑值；单独的 label 视为 true
    pub fn get_bool(&self, label: &str) -> Result<Option<bool>> {
        let Some(entry) = self.get(label) else {
            return Ok(None);
        };
        match entry.tokens.first() {
            None => Ok(Some(true)),
            Some(token) => units::parse_logical(token)
                .map(Some)
                .ok_or_else(|| invalid(entry, format!("'{}' is not a logical value", token))),
        }
    }

    /// 能量值 (eV)，缺省单位为 eV
    pub fn get_energy(&self, label: &str) -> Result<Option<f64>> {
        self.get_physical(label, units::energy_to_ev, "eV")
    }

    /// 温度值 (K)，缺省单位为 K
    pub fn get_temperature(&self, label: &str) -> Result<Option<f64>> {
        self.get_physical(label, units::temperature_to_kelvin, "K")
    }

    fn get_physical<F>(&self, label: &str, convert: F, default_unit: &str) -> Result<Option<f64>>
    where
        F: Fn(f64, &str) -> Result<f64>,
    {
        let Some(entry) = self.get(label) else {
            return Ok(None);
        };
        let token = first_token(entry)?;
        let value = units::parse_real(token)
            .ok_or_else(|| invalid(entry, format!("'{}' is not a number", token)))?;
        let unit = entry.tokens.get(1).map(|s| s.as_str()).unwrap_or(default_unit);
        convert(value, unit).map(Some)
    }

    /// 被定义多次的 label 与块名（各报告一次，使用首次出现的拼写）
    pub fn duplicates(&self) -> Vec<String> {
        let mut counts: HashMap<String, (String, usize)> = HashMap::new();
        let mut order = Vec::new();

        for item in &self.items {
            let (kind, name) = match item {
                FdfItem::Entry(e) => ("", e.label.as_str()),
                FdfItem::Block(b) => ("%block ", b.name.as_str()),
            };
            let key = format!("{}{}", kind, normalize_label(name));
            let slot = counts.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                (format!("{}{}", kind, name), 0)
            });
            slot.1 += 1;
        }

        order
            .into_iter()
            .filter_map(|k| counts.remove(&k))
            .filter(|(_, n)| *n > 1)
            .map(|(name, _)| name)
            .collect()
    }

    /// 规范化输出：label 对齐、块内容缩进两格
    pub fn to_fdf_string(&self) -> String {
        let width = self
            .items
            .iter()
            .filter_map(|item| match item {
                FdfItem::Entry(e) => Some(e.label.len()),
                FdfItem::Block(_) => None,
            })
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let mut previous_was_block = false;

        for (idx, item) in self.items.iter().enumerate() {
            match item {
                FdfItem::Entry(e) => {
                    if previous_was_block {
                        out.push('\n');
                    }
                    if e.tokens.is_empty() {
                        out.push_str(&format!("{}\n", e.label));
                    } else {
                        out.push_str(&format!("{:<width$} {}\n", e.label, e.value()));
                    }
                    previous_was_block = false;
                }
                FdfItem::Block(b) => {
                    if idx > 0 {
                        out.push('\n');
                    }
                    out.push_str(&format!("%block {}\n", b.name));
                    for line in &b.lines {
                        let normalized: Vec<&str> = line.split_whitespace().collect();
                        out.push_str(&format!("  {}\n", normalized.join(" ")));
                    }
                    out.push_str(&format!("%endblock {}\n", b.name));
                    previous_was_block = true;
                }
            }
        }

        out
    }
}

fn first_token(entry: &FdfEntry) -> Result<&str> {
    entry
        .tokens
        .first()
        .map(|s| s.as_str())
        .ok_or_else(|| invalid(entry, "missing value".to_string()))
}

fn invalid(entry: &FdfEntry, reason: String) -> TbtError {
    TbtError::InvalidValue {
        label: entry.label.clone(),
        reason: format!("{} ({}:{})", reason, entry.source, entry.line),
    }
}
