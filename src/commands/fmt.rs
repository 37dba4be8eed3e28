//! # fmt 命令实现
//!
//! 重写 fdf 文件：默认保留全部条目并对齐 label、展开 `%include`；
//! `--canonical` 时只输出规范的 TBtrans 输运设置。
//!
//! ## 依赖关系
//! - 使用 `cli/fmt.rs` 定义的参数
//! - 使用 `parsers/fdf.rs`, `parsers/tbtrans.rs`

use crate::cli::fmt::FmtArgs;
use crate::error::{TbtError, Result};
use crate::parsers::fdf::parse_fdf_content;
use crate::parsers::{self, parse_fdf_file, FdfDocument};
use crate::utils::output;

use std::fs;
use std::io::Read;
use std::path::Path;

/// 执行 fmt 命令
pub fn execute(args: FmtArgs) -> Result<()> {
    let doc = read_document(&args.input, std::io::stdin())?;
    if doc.is_empty() {
        output::print_warning(&format!("'{}' has no fdf entries", args.input.display()));
    }

    let text = render(&doc, args.canonical)?;

    let Some(path) = args.output else {
        print!("{}", text);
        return Ok(());
    };

    write_output(&path, &text, args.overwrite)?;

    for label in doc.duplicates() {
        output::print_warning(&format!("'{}' was defined more than once; kept the first", label));
    }
    output::print_success(&format!(
        "Formatted '{}' -> '{}'",
        args.input.display(),
        path.display()
    ));
    Ok(())
}

/// 规范化文本，或只保留 TBtrans 输运设置
fn render(doc: &FdfDocument, canonical: bool) -> Result<String> {
    if canonical {
        let input = parsers::read_tbtrans(doc)?;
        Ok(parsers::to_tbtrans_string(&input))
    } else {
        Ok(doc.to_fdf_string())
    }
}

fn write_output(path: &Path, text: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(TbtError::InvalidArgument(format!(
            "'{}' exists; pass --overwrite to replace it",
            path.display()
        )));
    }

    fs::write(path, text).map_err(|e| TbtError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// `-` 表示从标准输入读取（`%include` 相对当前目录解析）
fn read_document<R: Read>(input: &Path, mut stdin: R) -> Result<FdfDocument> {
    if input != Path::new("-") {
        return parse_fdf_file(input);
    }

    let mut content = String::new();
    stdin
        .read_to_string(&mut content)
        .map_err(|e| TbtError::FileReadError {
            path: "<stdin>".to_string(),
            source: e,
        })?;
    parse_fdf_content(&content, "<stdin>")
}
