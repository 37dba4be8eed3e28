//! # tbtkit - TBtrans 输入与 MFH 参数工具箱
//!
//! 为平均场 Hubbard (MFH) 输运计算准备与检查 TBtrans/TranSiesta 输入，
//! 并管理 MFH 参数与自旋密度存档。
//!
//! ## 子命令
//! - `check`   - 检查 TBtrans 输入（单文件或批量）
//! - `show`    - 表格显示输运设置
//! - `fmt`     - 规范化重写 fdf
//! - `init`    - 生成两电极模板
//! - `grid`    - 展开实轴能量网格
//! - `params`  - MFH 参数标签、指纹与填充
//! - `density` - 自旋密度存档
//!   - `list`, `show`, `put`, `plot`
//! - `submit`  - 偏压扫描作业提交到 Slurm
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (fdf 与 TBtrans 解析)
//!   │     ├── models/    (数据模型)
//!   │     ├── transport/ (检查与能量网格)
//!   │     └── density/   (密度存档与绘图)
//!   ├── batch/      (批量处理)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod density;
mod error;
mod models;
mod parsers;
mod transport;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
