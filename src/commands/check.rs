//! # check 命令实现
//!
//! 检查 TBtrans 输入的一致性。
//!
//! ## 功能
//! - 单文件模式：逐条打印诊断
//! - 目录模式：并行检查所有匹配文件，跳过不含输运设置的 fdf
//! - `--strict` 时警告也视为失败
//!
//! ## 依赖关系
//! - 使用 `cli/check.rs` 定义的参数
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `parsers/tbtrans.rs`, `transport/validate.rs`

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::cli::check::CheckArgs;
use crate::error::{TbtError, Result};
use crate::parsers::{self, FdfDocument};
use crate::transport::{validate, Report, Severity, ValidateOptions};
use crate::utils::output;

use std::path::{Path, PathBuf};

/// 执行 check 命令
pub fn execute(args: CheckArgs) -> Result<()> {
    output::print_header("TBtrans Input Check");

    if args.input.is_file() {
        execute_single_file(&args)
    } else if args.input.is_dir() {
        execute_batch(&args)
    } else {
        Err(TbtError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 单文件模式
fn execute_single_file(args: &CheckArgs) -> Result<()> {
    output::print_info(&format!("Checking '{}'", args.input.display()));

    let (_, report) = check_file(&args.input, args)?;

    for d in &report.diagnostics {
        match d.severity {
            Severity::Error => output::print_error(&d.message),
            Severity::Warning => output::print_warning(&d.message),
        }
    }

    output::print_separator();
    let failures = failure_count(&report, args.strict);
    if failures > 0 {
        return Err(TbtError::ValidationFailed { errors: failures });
    }

    output::print_success(&format!(
        "'{}' passed with {} warning(s)",
        args.input.display(),
        report.warnings()
    ));
    Ok(())
}

/// 目录模式
fn execute_batch(args: &CheckArgs) -> Result<()> {
    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect();

    if files.is_empty() {
        return Err(TbtError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    output::print_info(&format!("Found {} fdf file(s)", files.len()));

    let result = BatchRunner::new(args.jobs).run(files, |file| process_batch_file(file, args))?;

    for summary in &result.passed {
        output::print_success(summary);
    }
    for path in &result.skipped_files {
        output::print_skip(&format!("{}: no transport setup", path));
    }

    output::print_separator();
    output::print_success(&format!(
        "Check complete: {} passed, {} skipped, {} failed",
        result.success, result.skipped, result.failed
    ));

    if result.failures.is_empty() {
        return Ok(());
    }

    output::print_warning("Failed files:");
    for (path, err) in result.failures.iter().take(10) {
        output::print_error(&format!("  {}: {}", path, err));
    }
    if result.failures.len() > 10 {
        output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
    }

    Err(TbtError::Other(format!(
        "{} of {} file(s) failed the check",
        result.failed,
        result.total()
    )))
}

/// 处理批量模式中的单个文件
fn process_batch_file(path: &PathBuf, args: &CheckArgs) -> ProcessResult {
    let (doc, report) = match check_file(path, args) {
        Ok(r) => r,
        Err(e) => return ProcessResult::Failed(path.display().to_string(), e.to_string()),
    };

    if !is_transport_input(&doc) {
        return ProcessResult::Skipped(path.display().to_string());
    }

    if failure_count(&report, args.strict) > 0 {
        let reasons: Vec<&str> = report
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error || args.strict)
            .map(|d| d.message.as_str())
            .collect();
        return ProcessResult::Failed(path.display().to_string(), reasons.join("; "));
    }

    ProcessResult::Success(format!(
        "{}: {} warning(s)",
        path.display(),
        report.warnings()
    ))
}

/// 解析并检查一个文件
fn check_file(path: &Path, args: &CheckArgs) -> Result<(FdfDocument, Report)> {
    let (doc, input) = parsers::parse_tbtrans_file(path)?;

    let options = ValidateOptions {
        atoms: args.atoms,
        check_files_in: args
            .check_files
            .then(|| path.parent().map(Path::to_path_buf).unwrap_or_default()),
        duplicates: doc.duplicates(),
    };

    let report = validate(&input, &options);
    Ok((doc, report))
}

/// 是否含有任何输运设置
fn is_transport_input(doc: &FdfDocument) -> bool {
    doc.get("TBT.HS").is_some()
        || doc.block_any(&["TS.Elecs", "TBT.Elecs"]).is_some()
        || doc.block("TBT.Contours").is_some()
        || doc.block_any(&["TBT.ChemPots", "TS.ChemPots"]).is_some()
}

fn failure_count(report: &Report, strict: bool) -> usize {
    if strict {
        report.errors() + report.warnings()
    } else {
        report.errors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fdf::parse_fdf_content;

    #[test]
    fn test_is_transport_input() {
        let siesta = parse_fdf_content("SystemLabel bulk\nMeshCutoff 200 Ry\n", "bulk").unwrap();
        assert!(!is_transport_input(&siesta));

        let tbt = parse_fdf_content("%block TS.Elecs\n Left\n%endblock\n", "tbt").unwrap();
        assert!(is_transport_input(&tbt));
    }

    #[test]
    fn test_failure_count() {
        let mut report = Report::default();
        report.diagnostics.push(crate::transport::validate::Diagnostic {
            severity: Severity::Warning,
            message: "w".to_string(),
        });
        assert_eq!(failure_count(&report, false), 0);
        assert_eq!(failure_count(&report, true), 1);
    }
}
