//! # 统一错误处理模块
//!
//! 定义 tbtkit 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// tbtkit 统一错误类型
#[derive(Error, Debug)]
pub enum TbtError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // fdf 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("{path}:{line}: {reason}")]
    FdfSyntax {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Circular %include of {path}")]
    IncludeCycle { path: String },

    #[error("Invalid value for '{label}': {reason}")]
    InvalidValue { label: String, reason: String },

    #[error("Unknown {kind} unit '{unit}'")]
    UnknownUnit { kind: String, unit: String },

    #[error("Invalid energy expression '{expr}': {reason}")]
    InvalidExpression { expr: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // TBtrans 输入错误
    // ─────────────────────────────────────────────────────────────
    #[error("Block '{block}' is listed but not defined")]
    MissingBlock { block: String },

    #[error("Block '{block}': {reason}")]
    InvalidBlock { block: String, reason: String },

    #[error("Input failed validation with {errors} error(s)")]
    ValidationFailed { errors: usize },

    // ─────────────────────────────────────────────────────────────
    // 密度与参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid density: {0}")]
    InvalidDensity(String),

    #[error("No density record with hash {hash} in {path}")]
    RecordNotFound { hash: u64, path: String },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TbtError>;
