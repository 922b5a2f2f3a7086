//! 报告写入服务 - 业务能力层
//!
//! 只负责把汇总结果写到输出目录，不关心评分流程

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::GradeRecord;
use crate::orchestrator::result_aggregator::BatchReport;
use crate::workflow::prompt::format_score;

pub const RESULTS_FILE: &str = "results.json";
pub const FAILURES_FILE: &str = "failures.json";

/// 报告写入服务
///
/// 输出目录结构：
/// - `<提交>/<维度>.md`：每个维度一份反馈
/// - `results.json`：所有成功记录
/// - `failures.json`：所有失败记录
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// 写入整批报告
    pub async fn write(&self, report: &BatchReport) -> AppResult<()> {
        self.ensure_dir(&self.output_dir).await?;

        for record in &report.records {
            self.write_feedback(record).await?;
        }

        self.write_json(RESULTS_FILE, &report.records).await?;
        self.write_json(FAILURES_FILE, &report.failures).await?;

        info!(
            "📄 报告已写入 {} (成功 {} / 失败 {})",
            self.output_dir.display(),
            report.success_count(),
            report.failure_count()
        );
        Ok(())
    }

    /// 写入单个提交的各维度反馈文档
    pub async fn write_feedback(&self, record: &GradeRecord) -> AppResult<()> {
        let dir = self.output_dir.join(safe_file_name(&record.submission_id));
        self.ensure_dir(&dir).await?;

        let writes = record.dimensions.iter().map(|score| {
            let path = dir.join(format!("{}.md", safe_file_name(&score.dimension)));
            let content = format!(
                "# {}\n\n## Grade = {}/{}\n\n{}\n",
                score.dimension,
                format_score(score.grade),
                format_score(score.max_grade),
                score.feedback
            );
            async move {
                debug!("写入反馈: {}", path.display());
                fs::write(&path, content)
                    .await
                    .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
            }
        });

        try_join_all(writes).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> AppResult<()> {
        let path = self.output_dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
    }

    async fn ensure_dir(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::file_write_failed(dir.display().to_string(), e))
    }
}

/// 去掉路径分隔符，避免写出输出目录
fn safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}
