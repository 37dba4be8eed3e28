//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `models/`, `transport/`, `density/`, `utils/`
//! - 子模块: check, show, fmt, init, grid, params, density, submit

pub mod check;
pub mod density;
pub mod fmt;
pub mod grid;
pub mod init;
pub mod params;
pub mod show;
pub mod submit;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Check(args) => check::execute(args),
        Commands::Show(args) => show::execute(args),
        Commands::Fmt(args) => fmt::execute(args),
        Commands::Init(args) => init::execute(args),
        Commands::Grid(args) => grid::execute(args),
        Commands::Params(args) => params::execute(args),
        Commands::Density(args) => density::execute(args),
        Commands::Submit(args) => submit::execute(args),
    }
}
