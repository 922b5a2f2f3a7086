use crate::error::{AppError, AppResult, FileError};
use crate::models::rubric::Rubric;
use std::path::Path;
use tokio::fs;

/// 从文件加载评分标准
///
/// `.toml` 按 TOML 解析，其余按 JSON 解析
pub async fn load_rubric(path: &Path) -> AppResult<Rubric> {
    if !path.exists() {
        return Err(FileError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let rubric = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => Rubric::from_toml_str(&content)?,
        _ => Rubric::from_json_str(&content)?,
    };

    tracing::info!(
        "成功加载评分标准: {} 个维度, 满分 {}",
        rubric.len(),
        rubric.total_weight()
    );

    Ok(rubric)
}
