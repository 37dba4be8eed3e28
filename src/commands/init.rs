//! # init 命令实现
//!
//! 生成两电极器件的 TBtrans 输入模板并立即检查。
//!
//! ## 依赖关系
//! - 使用 `cli/init.rs` 定义的参数
//! - 使用 `models/tbtrans.rs` 的模板, `parsers/tbtrans.rs` 输出
//! - 使用 `transport/validate.rs`

use crate::cli::init::InitArgs;
use crate::error::{TbtError, Result};
use crate::models::TbtransInput;
use crate::parsers::to_tbtrans_string;
use crate::transport::{validate, Report, Severity, ValidateOptions};
use crate::utils::output;

use std::fs;

/// 执行 init 命令
pub fn execute(args: InitArgs) -> Result<()> {
    let report = write_template(&args)?;
    output::print_success(&format!(
        "Wrote two-electrode template '{}' ({} error(s), {} warning(s))",
        args.output.display(),
        report.errors(),
        report.warnings()
    ));
    Ok(())
}

/// 构造并检查模板；有错误时不写文件（除非 `--force`）
fn write_template(args: &InitArgs) -> Result<Report> {
    if args.output.exists() && !args.overwrite {
        return Err(TbtError::InvalidArgument(format!(
            "'{}' exists; pass --overwrite to replace it",
            args.output.display()
        )));
    }

    let input = build_input(args);

    let report = validate(&input, &ValidateOptions::default());
    for d in &report.diagnostics {
        match d.severity {
            Severity::Error => output::print_error(&d.message),
            Severity::Warning => output::print_warning(&d.message),
        }
    }
    if !report.is_ok() && !args.force {
        return Err(TbtError::ValidationFailed {
            errors: report.errors(),
        });
    }

    fs::write(&args.output, to_tbtrans_string(&input)).map_err(|e| TbtError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    Ok(report)
}

fn build_input(args: &InitArgs) -> TbtransInput {
    let hs = args
        .hs
        .clone()
        .unwrap_or_else(|| format!("{}.TSHS", args.label));

    let mut input = TbtransInput::two_electrode(&args.label, &hs, &args.left_hs, &args.right_hs);
    input.voltage_ev = args.voltage;
    input.electronic_temperature_k = args.temperature;
    input.number_of_atoms = args.atoms;

    if let Some(n) = args.electrode_atoms {
        for elec in &mut input.electrodes {
            elec.used_atoms = Some(n);
        }
    }

    input
}
