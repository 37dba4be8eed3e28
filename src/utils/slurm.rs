//! # Slurm 脚本生成工具
//!
//! 生成 sbatch 提交脚本，并在 fdf 文本中覆盖单个条目。
//!
//! ## 依赖关系
//! - 被 `commands/submit.rs` 使用
//! - 使用 `parsers/fdf.rs` 的 label 规范化
//! - 使用 `regex` 定位 fdf 条目

use crate::error::{TbtError, Result};
use crate::parsers::fdf::normalize_label;

use regex::{Regex, RegexBuilder};
use std::path::Path;

/// Slurm 作业配置
pub struct SlurmConfig {
    pub job_name: String,
    pub partition: String,
    pub constraint: Option<String>,
    pub nodes: u32,
    pub ntasks: u32,
    pub cpus_per_task: u32,
    pub mem_per_cpu: String,
    pub time_limit: String,
    pub modules: Vec<String>,
}

impl Default for SlurmConfig {
    fn default() -> Self {
        SlurmConfig {
            job_name: "tbtrans".to_string(),
            partition: "cpu".to_string(),
            constraint: None,
            nodes: 1,
            ntasks: 1,
            cpus_per_task: 1,
            mem_per_cpu: "2G".to_string(),
            time_limit: "04:00:00".to_string(),
            modules: vec![],
        }
    }
}

/// 生成 sbatch 脚本内容
pub fn generate_sbatch_script(config: &SlurmConfig, workdir: &Path, exec_cmd: &str) -> String {
    let constraint = config
        .constraint
        .as_ref()
        .map(|c| format!("#SBATCH --constraint \"{}\"\n", c))
        .unwrap_or_default();

    let module_loads = if config.modules.is_empty() {
        String::new()
    } else {
        let loads = config
            .modules
            .iter()
            .map(|m| format!("module load {}", m))
            .collect::<Vec<_>>()
            .join("\n");
        format!("module purge 2>&1\n{}\necho \"Loaded modules\"\n", loads)
    };

    format!(
        r#"#!/bin/bash
{}#SBATCH --partition {}
#SBATCH --nodes={}
#SBATCH --mem-per-cpu {}
#SBATCH --time {}
#SBATCH -c {}
#SBATCH -n {}
#SBATCH -J {}
#SBATCH -o slurm_logs/%x.out
#SBATCH -e slurm_logs/%x.err

set -euo pipefail

{}
cd "{}"
echo "PWD=$(pwd)"
echo "Running: {}"
{}

echo "Timings:"
sacct -o JobID,Submit,Start,End,CPUTime,State -j $SLURM_JOBID
"#,
        constraint,
        config.partition,
        config.nodes,
        config.mem_per_cpu,
        config.time_limit,
        config.cpus_per_task,
        config.ntasks,
        config.job_name,
        module_loads,
        workdir.display(),
        exec_cmd,
        exec_cmd,
    )
}

/// 匹配 fdf 条目行的正则：忽略大小写及 `.`, `_`, `-`
fn entry_regex(label: &str) -> Result<Regex> {
    let key = normalize_label(label);
    if key.is_empty() {
        return Err(TbtError::InvalidArgument(format!("empty fdf label '{}'", label)));
    }

    let body = key
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect::<Vec<_>>()
        .join("[._-]*");

    RegexBuilder::new(&format!(r"^[ \t]*{}(?:[ \t].*)?$", body))
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|e| TbtError::Other(e.to_string()))
}

/// 在 fdf 文本开头写入 `label value`，并注释掉文本中原有的同名条目
///
/// fdf 以第一次出现为准，写在开头的条目同时覆盖 `%include` 引入的定义。
/// 块内的行不受影响。
pub fn override_fdf_entry(text: &str, label: &str, value: &str) -> Result<String> {
    let re = entry_regex(label)?;
    let mut out = format!("{:<22} {}\n", label, value);
    let mut in_block = false;

    for line in text.split_inclusive('\n') {
        let directive = line.trim_start().to_ascii_lowercase();
        if directive.starts_with("%endblock") {
            in_block = false;
        } else if directive.starts_with("%block") {
            in_block = !directive.contains('<');
        } else if !in_block && re.is_match(line.trim_end_matches(['\r', '\n'])) {
            out.push_str("# ");
        }
        out.push_str(line);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_comments_out_old_definitions() {
        let text = "SystemLabel dev\ntbt_voltage 0.1 eV\nTBT.Voltage 0.3 eV\n";
        let out = override_fdf_entry(text, "TBT.Voltage", "0.5 eV").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0].split_whitespace().collect::<Vec<_>>(), ["TBT.Voltage", "0.5", "eV"]);
        assert_eq!(lines[1], "SystemLabel dev");
        assert_eq!(lines[2], "# tbt_voltage 0.1 eV");
        assert_eq!(lines[3], "# TBT.Voltage 0.3 eV");
    }

    #[test]
    fn test_override_inserts_when_missing() {
        let out = override_fdf_entry("SystemLabel dev\n", "TBT.Voltage", "0.2 eV").unwrap();
        assert!(out.starts_with("TBT.Voltage"));
        assert!(out.ends_with("SystemLabel dev\n"));
    }

    #[test]
    fn test_override_ignores_longer_labels() {
        let text = "TBT.Voltage.Extra 1\n";
        let out = override_fdf_entry(text, "TBT.Voltage", "0.2 eV").unwrap();
        assert!(out.contains("\nTBT.Voltage.Extra 1"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn test_override_leaves_blocks_alone() {
        let text = "%block Notes\n  SystemLabel inside\n%endblock Notes\n\
                    %block TS.Elecs < elecs.block\nSystemLabel dev\n";
        let out = override_fdf_entry(text, "SystemLabel", "run").unwrap();
        assert!(out.contains("\n  SystemLabel inside\n"));
        assert!(out.contains("\n# SystemLabel dev\n"));
    }

    #[test]
    fn test_sbatch_script() {
        let config = SlurmConfig {
            job_name: "V0.100".to_string(),
            modules: vec!["siesta/5.0".to_string()],
            ..Default::default()
        };
        let script = generate_sbatch_script(&config, Path::new("/work/dev"), "tbtrans < RUN.fdf > RUN.out");
        assert!(script.starts_with("#!/bin/bash\n#SBATCH --partition cpu"));
        assert!(script.contains("#SBATCH -J V0.100"));
        assert!(script.contains("module load siesta/5.0"));
        assert!(script.contains("cd \"/work/dev\""));
        assert!(!script.contains("--constraint"));
    }
}
