use crate::error::{AppError, AppResult, FileError};
use std::path::Path;
use tokio::fs;

/// 读取模板文件；未配置路径时返回内置模板
pub async fn load_template(path: Option<&Path>, builtin: &str) -> AppResult<String> {
    let Some(path) = path else {
        return Ok(builtin.to_string());
    };

    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_when_unset() {
        let template = load_template(None, "<CODE>").await.unwrap();
        assert_eq!(template, "<CODE>");
    }

    #[tokio::test]
    async fn test_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "Grade this:\n<CODE>").unwrap();
        let template = load_template(Some(&path), "unused").await.unwrap();
        assert_eq!(template, "Grade this:\n<CODE>");
    }
}
