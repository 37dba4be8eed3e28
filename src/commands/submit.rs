//! # submit 命令实现
//!
//! 由一个 TBtrans 输入模板生成偏压扫描作业并提交到 Slurm。
//!
//! ## 功能
//! - 解析并检查模板（有错误时默认中止）
//! - 每个偏压一个作业目录，`RUN.fdf` 开头覆盖 `TBT.Voltage`、`SystemLabel` 与 `TBT.HS`
//! - 生成 sbatch 脚本，在模板所在目录运行 `tbtrans < RUN.fdf > RUN.out`
//! - 可选自动提交
//!
//! ## 依赖关系
//! - 使用 `cli/submit.rs` 定义的参数
//! - 使用 `parsers/tbtrans.rs`, `transport/validate.rs`
//! - 使用 `utils/slurm.rs`, `utils/output.rs`

use crate::cli::submit::SubmitArgs;
use crate::error::{TbtError, Result};
use crate::models::TbtransInput;
use crate::parsers;
use crate::transport::{validate, Severity, ValidateOptions};
use crate::utils::output;
use crate::utils::slurm::{generate_sbatch_script, override_fdf_entry, SlurmConfig};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 执行 submit 命令
pub fn execute(args: SubmitArgs) -> Result<()> {
    output::print_header("TBtrans Bias Sweep");

    if !args.input.is_file() {
        return Err(TbtError::FileNotFound {
            path: args.input.display().to_string(),
        });
    }

    let (doc, input) = parsers::parse_tbtrans_file(&args.input)?;
    let template_dir = absolute_dir(&args.input)?;

    let report = validate(
        &input,
        &ValidateOptions {
            atoms: None,
            check_files_in: Some(template_dir.clone()),
            duplicates: doc.duplicates(),
        },
    );
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

    let voltages = parse_voltages(&args.voltages)?;
    output::print_info(&format!(
        "Generating {} job(s) from '{}'",
        voltages.len(),
        args.input.display()
    ));

    let template = fs::read_to_string(&args.input).map_err(|e| TbtError::FileReadError {
        path: args.input.display().to_string(),
        source: e,
    })?;

    fs::create_dir_all(&args.jobs_root).map_err(|e| TbtError::FileWriteError {
        path: args.jobs_root.display().to_string(),
        source: e,
    })?;

    let mut generated = 0;
    let mut submitted = 0;

    for v in &voltages {
        let name = job_name(*v);
        let job_dir = args.jobs_root.join(&name);
        let sbatch_path = prepare_job(&args, &input, &template, &template_dir, &job_dir, *v)?;
        generated += 1;

        if args.submit && !args.dry_run {
            submit_job(&sbatch_path, &job_dir)?;
            submitted += 1;
        } else {
            output::print_info(&format!("[DRY] Generated job: {}", job_dir.display()));
        }
    }

    output::print_separator();
    output::print_done(&format!(
        "Generated {} job(s), submitted {}",
        generated, submitted
    ));
    Ok(())
}

/// 偏压作业目录名，如 `V0.100`、`V-0.250`
fn job_name(voltage: f64) -> String {
    format!("V{:.3}", voltage)
}

/// 解析偏压列表：`start:stop:step`（含终点）或逗号分隔
pub fn parse_voltages(expr: &str) -> Result<Vec<f64>> {
    let invalid = |reason: &str| TbtError::InvalidArgument(format!("voltages '{}': {}", expr, reason));
    let number = |s: &str| -> Result<f64> {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| invalid(&format!("'{}' is not a number", s.trim())))
    };

    let parts: Vec<&str> = expr.split(':').collect();
    let values = match parts.as_slice() {
        [start, stop, step] => {
            let (start, stop, step) = (number(start)?, number(stop)?, number(step)?);
            if step == 0.0 || (stop - start) * step < 0.0 {
                return Err(invalid("step does not move from start towards stop"));
            }
            let n = ((stop - start) / step + 1e-9).floor() as usize;
            (0..=n).map(|i| start + i as f64 * step).collect()
        }
        [list] => list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(number)
            .collect::<Result<Vec<f64>>>()?,
        _ => return Err(invalid("expected 'start:stop:step' or a comma list")),
    };

    if values.is_empty() {
        return Err(invalid("no voltages given"));
    }
    Ok(values)
}

/// 生成单个作业目录，返回 sbatch 脚本路径
fn prepare_job(
    args: &SubmitArgs,
    input: &TbtransInput,
    template: &str,
    template_dir: &Path,
    job_dir: &Path,
    voltage: f64,
) -> Result<PathBuf> {
    fs::create_dir_all(job_dir.join("slurm_logs")).map_err(|e| TbtError::FileWriteError {
        path: job_dir.display().to_string(),
        source: e,
    })?;
    let job_dir = absolute_path(job_dir)?;

    let run_fdf = render_run_fdf(template, input, voltage)?;
    let fdf_path = job_dir.join("RUN.fdf");
    fs::write(&fdf_path, run_fdf).map_err(|e| TbtError::FileWriteError {
        path: fdf_path.display().to_string(),
        source: e,
    })?;

    let modules: Vec<String> = args
        .modules
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = SlurmConfig {
        job_name: format!("{}-{}", input.system_label, job_name(voltage)),
        partition: args.partition.clone(),
        constraint: args.constraint.clone(),
        nodes: args.nodes,
        ntasks: args.ntasks,
        cpus_per_task: args.cpus_per_task,
        mem_per_cpu: args.mem_per_cpu.clone(),
        time_limit: args.time.clone(),
        modules,
    };

    let launcher = if args.np > 1 {
        format!("mpirun -np {} {}", args.np, args.tbtrans_exec)
    } else {
        args.tbtrans_exec.clone()
    };
    let exec_cmd = format!(
        "{} < \"{}\" > \"{}\"",
        launcher,
        fdf_path.display(),
        job_dir.join("RUN.out").display()
    );

    let sbatch_content = generate_sbatch_script(&config, template_dir, &exec_cmd);
    let sbatch_path = job_dir.join("submit.sbatch");
    fs::write(&sbatch_path, sbatch_content).map_err(|e| TbtError::FileWriteError {
        path: sbatch_path.display().to_string(),
        source: e,
    })?;

    Ok(sbatch_path)
}

/// 在模板开头写入偏压；每个偏压使用独立的 SystemLabel 以免输出互相覆盖，
/// 并固定 `TBT.HS`（其默认值依赖 SystemLabel）
fn render_run_fdf(template: &str, input: &TbtransInput, voltage: f64) -> Result<String> {
    let label = format!("{}_{}", input.system_label, job_name(voltage));
    let text = override_fdf_entry(template, "TBT.HS", &input.hs_file)?;
    let text = override_fdf_entry(&text, "SystemLabel", &label)?;
    override_fdf_entry(&text, "TBT.Voltage", &format!("{} eV", voltage))
}

fn submit_job(sbatch_path: &Path, job_dir: &Path) -> Result<()> {
    let out = Command::new("sbatch")
        .arg(sbatch_path)
        .current_dir(job_dir)
        .output()
        .map_err(|_| TbtError::CommandNotFound {
            command: "sbatch".to_string(),
        })?;

    if !out.status.success() {
        return Err(TbtError::CommandFailed {
            command: format!("sbatch {}", sbatch_path.display()),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        });
    }

    output::print_success(&format!(
        "Submitted: {} - {}",
        job_dir.display(),
        String::from_utf8_lossy(&out.stdout).trim()
    ));
    Ok(())
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| TbtError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 输入文件所在目录的绝对路径
fn absolute_dir(file: &Path) -> Result<PathBuf> {
    let path = absolute_path(file)?;
    Ok(path.parent().map(Path::to_path_buf).unwrap_or(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::fdf::parse_fdf_content;
    use crate::parsers::read_tbtrans;

    #[test]
    fn test_parse_voltage_range() {
        let v = parse_voltages("0:0.3:0.1").unwrap();
        assert_eq!(v.len(), 4);
        assert!((v[3] - 0.3).abs() < 1e-12);

        let v = parse_voltages("0.5:-0.5:-0.5").unwrap();
        assert_eq!(v, vec![0.5, 0.0, -0.5]);

        assert!(parse_voltages("0:1:-0.1").is_err());
        assert!(parse_voltages("0:1:0").is_err());
    }

    #[test]
    fn test_parse_voltage_list() {
        assert_eq!(parse_voltages("0.1, -0.2,0.3").unwrap(), vec![0.1, -0.2, 0.3]);
        assert!(parse_voltages("0.1,x").is_err());
        assert!(parse_voltages("").is_err());
        assert!(parse_voltages("1:2").is_err());
    }

    #[test]
    fn test_job_name() {
        assert_eq!(job_name(0.1), "V0.100");
        assert_eq!(job_name(-0.25), "V-0.250");
    }

    #[test]
    fn test_render_run_fdf() {
        let template = "SystemLabel dev\nTS.Voltage 0.0 eV\n\
                        %block TS.Elecs\n  Left\n%endblock TS.Elecs\n\
                        %block TS.Elec.Left\n  HS left.TSHS\n%endblock TS.Elec.Left\n";
        let input = read_tbtrans(&parse_fdf_content(template, "tpl").unwrap()).unwrap();

        let text = render_run_fdf(template, &input, 0.4).unwrap();
        let run = read_tbtrans(&parse_fdf_content(&text, "run").unwrap()).unwrap();
        assert_eq!(run.voltage_ev, 0.4);
        assert_eq!(run.system_label, "dev_V0.400");
        assert_eq!(run.hs_file, "dev.TSHS");
        assert_eq!(run.electrodes.len(), 1);
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tbtkit-submit-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_render_overrides_included_definitions() {
        let dir = temp_dir("include");
        fs::write(dir.join("base.fdf"), "TBT.Voltage 0.1 eV\nSystemLabel base\n").unwrap();
        let template = "SystemLabel dev\n%include base.fdf\nTBT.Voltage 0.0 eV\n";
        fs::write(dir.join("template.fdf"), template).unwrap();

        let (_, input) = parsers::parse_tbtrans_file(&dir.join("template.fdf")).unwrap();
        assert_eq!(input.voltage_ev, 0.1);

        let text = render_run_fdf(template, &input, 0.5).unwrap();
        fs::write(dir.join("RUN.fdf"), &text).unwrap();
        let (doc, run) = parsers::parse_tbtrans_file(&dir.join("RUN.fdf")).unwrap();
        assert_eq!(run.voltage_ev, 0.5);
        assert_eq!(run.system_label, "dev_V0.500");
        assert_eq!(run.hs_file, "dev.TSHS");
        // 只剩 base.fdf 中被覆盖的两项
        assert_eq!(doc.duplicates().len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    fn submit_args(input: PathBuf, jobs_root: PathBuf) -> SubmitArgs {
        SubmitArgs {
            input,
            voltages: "0.2".to_string(),
            jobs_root,
            tbtrans_exec: "tbtrans".to_string(),
            np: 4,
            modules: "siesta/5.0, openmpi".to_string(),
            partition: "cpu".to_string(),
            constraint: None,
            nodes: 1,
            ntasks: 4,
            cpus_per_task: 1,
            mem_per_cpu: "2G".to_string(),
            time: "01:00:00".to_string(),
            dry_run: true,
            submit: false,
            force: false,
        }
    }

    #[test]
    fn test_prepare_job_files() {
        let dir = temp_dir("prepare");
        let template = "SystemLabel dev\nTBT.Voltage 0.0 eV\n";
        let template_path = dir.join("template.fdf");
        fs::write(&template_path, template).unwrap();

        let args = submit_args(template_path.clone(), dir.join("jobs"));
        let (_, input) = parsers::parse_tbtrans_file(&template_path).unwrap();
        let template_dir = absolute_dir(&template_path).unwrap();
        let job_dir = args.jobs_root.join(job_name(0.2));

        let sbatch_path = prepare_job(&args, &input, template, &template_dir, &job_dir, 0.2).unwrap();
        let job_dir = absolute_path(&job_dir).unwrap();
        assert_eq!(sbatch_path, job_dir.join("submit.sbatch"));
        assert!(job_dir.join("slurm_logs").is_dir());

        let (_, run) = parsers::parse_tbtrans_file(&job_dir.join("RUN.fdf")).unwrap();
        assert_eq!(run.voltage_ev, 0.2);
        assert_eq!(run.system_label, "dev_V0.200");

        let script = fs::read_to_string(&sbatch_path).unwrap();
        assert!(script.contains("#SBATCH -J dev-V0.200"));
        assert!(script.contains("module load siesta/5.0\nmodule load openmpi"));
        assert!(script.contains(&format!("cd \"{}\"", template_dir.display())));
        assert!(script.contains(&format!(
            "mpirun -np 4 tbtrans < \"{}\" > \"{}\"",
            job_dir.join("RUN.fdf").display(),
            job_dir.join("RUN.out").display()
        )));

        fs::remove_dir_all(&dir).ok();
    }
}
