use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{AppError, AppResult, FileError};

/// 读入内存的导入文件（尚未解析）
#[derive(Debug, Clone)]
pub struct ImportFile {
    /// 文件名（仅用于显示）
    pub name: String,
    /// 原始文本
    pub content: String,
}

/// 读取单个导入文件
pub async fn read_import_file(path: &Path) -> AppResult<ImportFile> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ImportFile { name, content })
}

/// 列出文件夹中所有 `.json` 文件，按文件名排序
pub async fn list_json_files(folder_path: &Path) -> AppResult<Vec<PathBuf>> {
    if !folder_path.is_dir() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.display().to_string(),
        }
        .into());
    }

    let mut json_files = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path.display().to_string(), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path.display().to_string(), e))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            json_files.push(path);
        }
    }

    if json_files.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到 JSON 文件", folder_path.display());
    }

    json_files.sort();
    Ok(json_files)
}

/// 路径是文件则返回自身，是文件夹则返回其中所有 `.json` 文件
pub async fn resolve_import_paths(path: &Path) -> AppResult<Vec<PathBuf>> {
    if path.is_dir() {
        list_json_files(path).await
    } else if path.exists() {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into())
    }
}
