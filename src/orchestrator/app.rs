//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：检查配置、加载评分标准和模板、构造唯一的提供方适配器
//! 2. **批量加载**：扫描并加载所有待评分的提交
//! 3. **委托评分**：交给 `BatchGrader` 并发评分
//! 4. **汇总与输出**：汇总结果、写报告、输出全局统计
//!
//! 任何构造期错误（不支持的模式、缺少 API Key、评分标准格式错误）都在开始评分前返回。

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clients::ProviderAdapter;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{load_rubric, load_submissions, load_template, Rubric, Submission};
use crate::orchestrator::batch_processor::{BatchGrader, BatchOptions};
use crate::orchestrator::result_aggregator::{aggregate, BatchReport};
use crate::services::ReportWriter;
use crate::utils::logging;
use crate::workflow::prompt::{DEFAULT_PROMPT_TEMPLATE, DEFAULT_SYSTEM_TEMPLATE};
use crate::workflow::PromptTemplate;

/// 应用主结构
pub struct App {
    config: Config,
    rubric: Arc<Rubric>,
    grader: BatchGrader,
    writer: ReportWriter,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        let grading_mode = config.grading_mode()?;

        logging::log_startup(&config.provider_mode, config.max_workers);

        let rubric = load_rubric(Path::new(&config.rubric_path)).await?;
        if let Some(expected) = config.expected_max_grade {
            rubric.ensure_total(expected)?;
        }
        info!(
            "✓ 评分标准加载完成: {} 个维度, 满分 {}",
            rubric.len(),
            rubric.total_weight()
        );

        let language = display_language(&config.prog_language);
        let prompt = load_template(
            config.prompt_template_path.as_deref().map(Path::new),
            DEFAULT_PROMPT_TEMPLATE,
        )
        .await?;
        let system = load_template(
            config.system_template_path.as_deref().map(Path::new),
            DEFAULT_SYSTEM_TEMPLATE,
        )
        .await?;
        let system_context = PromptTemplate::render_system(&system, &language);

        let provider = ProviderAdapter::new(&config.provider_config(system_context)?)?;

        let rubric = Arc::new(rubric);
        let grader = BatchGrader::new(
            Arc::new(provider),
            rubric.clone(),
            Arc::new(PromptTemplate::new(prompt, language)),
            BatchOptions {
                pool_size: config.max_workers,
                call_timeout: config.call_timeout(),
                mode: grading_mode,
            },
        );
        let writer = ReportWriter::new(&config.output_dir);

        Ok(Self {
            config,
            rubric,
            grader,
            writer,
        })
    }

    /// 取消令牌，交给信号处理
    pub fn cancel_token(&self) -> CancellationToken {
        self.grader.cancel_token()
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<BatchReport> {
        let submissions = self.load_submissions().await?;

        if submissions.is_empty() {
            warn!("⚠️ 没有找到待评分的提交，程序结束");
            return Ok(BatchReport::default());
        }

        logging::log_submissions_loaded(submissions.len(), self.rubric.len(), self.grader.pool_size());

        let outcomes = self.grader.run(submissions).await;
        let report = aggregate(outcomes);

        self.writer.write(&report).await?;

        for (kind, count) in report.failures_by_kind() {
            warn!("失败类别 {}: {} 个", kind, count);
        }
        logging::print_final_stats(
            report.success_count(),
            report.failure_count(),
            report.total(),
            &self.writer.output_dir().display().to_string(),
        );

        Ok(report)
    }

    /// 加载提交
    async fn load_submissions(&self) -> AppResult<Vec<Submission>> {
        info!("\n📁 正在扫描待评分的提交...");
        load_submissions(&self.config.submissions_folder, &self.config.prog_language).await
    }
}

/// 扩展名对应的语言名，未知扩展名原样使用
fn display_language(extension: &str) -> String {
    crate::models::loaders::language::display_name(extension)
        .map(str::to_string)
        .unwrap_or_else(|| extension.to_string())
}
