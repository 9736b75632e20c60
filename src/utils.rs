use thiserror::Error;
use std::path::{Path, PathBuf};

use crate::markup::MarkupError;

/// 自定义错误类型
#[derive(Error, Debug)]
pub enum FixerError {
    /// 容器无法打开或不是合法的 EPUB（致命错误，不产生部分文档）
    #[error("Invalid EPUB: {0}")]
    InvalidArchive(String),

    #[error("Archive entry not found: {0}")]
    MissingEntry(String),

    #[error("Malformed markup in {path}: {source}")]
    MalformedMarkup {
        path: String,
        #[source]
        source: MarkupError,
    },

    #[error("Invalid unit id: {0}")]
    InvalidUnitId(String),

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("ZIP error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// 截断过长文本用于终端显示（按字符计数，避免切断多字节字符）
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}

/// 创建文件备份
pub fn create_backup(file_path: &Path) -> Result<PathBuf, FixerError> {
    if !file_path.exists() {
        return Err(FixerError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "原文件不存在"
        )));
    }

    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
    let backup_path = file_path.with_extension(format!("{}.bak", timestamp));

    std::fs::copy(file_path, &backup_path)
        .map_err(FixerError::IoError)?;

    Ok(backup_path)
}
