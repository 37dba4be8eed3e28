//! # fmt 子命令 CLI 定义
//!
//! 规范化输出 fdf 文件（对齐 label、展开 %include）
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fmt.rs`

use clap::Args;
use std::path::PathBuf;

/// fmt 子命令参数
#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Input fdf file ('-' for stdin)
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rewrite only the transport setup in canonical TBtrans form
    #[arg(long, default_value_t = false)]
    pub canonical: bool,

    /// Overwrite an existing output file
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
