use crate::error::{AppError, AppResult, FileError};
use crate::models::submission::Submission;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从文件夹中加载所有属于指定语言的源文件
///
/// 提交标识为文件名；读取失败的文件记录警告后跳过。结果按文件名排序。
pub async fn load_submissions(folder_path: &str, extension: &str) -> AppResult<Vec<Submission>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    let mut submissions = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if !path.is_file() || !matches_language(&path, extension) {
            continue;
        }

        let id = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        match fs::read_to_string(&path).await {
            Ok(code) => {
                tracing::debug!("正在加载: {} ({} 字节)", id, code.len());
                submissions.push(Submission::new(id, code));
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {}", path.display(), e);
            }
        }
    }

    submissions.sort_by(|a, b| a.id.cmp(&b.id));
    tracing::info!("成功加载 {} 个提交", submissions.len());

    Ok(submissions)
}

fn matches_language(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
