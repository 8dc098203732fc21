//! 文件操作辅助函数
//!
//! 缓存目录的创建、大小统计和格式化。

use std::path::{Path, PathBuf};

use crate::core::error::{AppError, AppResult};

/// 创建目录（含父目录），已存在时直接返回
pub async fn ensure_dir(path: &Path) -> AppResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| AppError::Io(format!("创建目录 {} 失败: {e}", path.display())))
}

/// 递归统计目录下所有普通文件的大小
///
/// 目录不存在时返回 0；不跟随符号链接，读取失败的子项跳过。
pub async fn dir_size(path: &Path) -> AppResult<u64> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(AppError::Io(format!("读取 {} 失败: {e}", path.display())));
        }
    };
    if metadata.is_file() {
        return Ok(metadata.len());
    }

    let mut size = 0u64;
    let mut pending: Vec<PathBuf> = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "跳过无法读取的目录");
                continue;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                if let Ok(metadata) = entry.metadata().await {
                    size += metadata.len();
                }
            }
        }
    }
    Ok(size)
}

/// 按 1024 进位格式化字节数，最多保留两位小数（如 `1.5 KB`）
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let number = format!("{value:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {}", UNITS[unit])
}
