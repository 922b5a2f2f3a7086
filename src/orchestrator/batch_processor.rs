//! 批量评分器 - 编排层
//!
//! ## 职责
//!
//! 1. **并发控制**：使用 Semaphore 限制同时评分的提交数量
//! 2. **资源管理**：持有唯一的模型调用闸门，所有工作任务共用
//! 3. **失败隔离**：单个提交失败（包括任务 panic）不影响其他提交
//! 4. **取消**：持有取消令牌，等待并发槽位、等锁、模型调用都会响应
//!
//! ## 设计特点
//!
//! - 提交立即全部派发，超过并发数的任务在信号量上排队
//! - 结果按完成顺序返回，不保证与输入顺序一致
//! - 向下委托 `GradingFlow` 评分单个提交

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::clients::StructuredChat;
use crate::infrastructure::ProviderGate;
use crate::models::{FailureKind, FailureRecord, Rubric, Submission, SubmissionOutcome};
use crate::workflow::{GradingFlow, GradingMode, PromptTemplate};

/// 默认并发数
pub const DEFAULT_POOL_SIZE: usize = 3;

/// 默认单次调用截止时间
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// 批量评分参数
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub pool_size: usize,
    pub call_timeout: Duration,
    pub mode: GradingMode,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            mode: GradingMode::ChainOfThought,
        }
    }
}

/// 批量评分器
///
/// 每个评分器有自己的闸门和锁，多个评分器（例如测试里）互不干扰
pub struct BatchGrader {
    flow: Arc<GradingFlow>,
    gate: Arc<ProviderGate>,
    pool_size: usize,
    cancel: CancellationToken,
}

impl BatchGrader {
    pub fn new(
        provider: Arc<dyn StructuredChat>,
        rubric: Arc<Rubric>,
        template: Arc<PromptTemplate>,
        options: BatchOptions,
    ) -> Self {
        let cancel = CancellationToken::new();
        let gate = Arc::new(ProviderGate::new(
            provider,
            options.call_timeout,
            cancel.clone(),
        ));
        let flow = Arc::new(GradingFlow::new(gate.clone(), rubric, template, options.mode));

        Self {
            flow,
            gate,
            pool_size: options.pool_size.max(1),
            cancel,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn provider_name(&self) -> &str {
        self.gate.provider_name()
    }

    /// 取消令牌；取消后排队和在途的提交都以 `Cancelled` 结束
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 评分一批提交，返回每个提交的结果（按完成顺序）
    pub async fn run<I>(&self, submissions: I) -> Vec<SubmissionOutcome>
    where
        I: IntoIterator<Item = Submission>,
    {
        let submissions: Vec<Submission> = submissions.into_iter().collect();
        let total = submissions.len();
        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        info!(
            "🚀 派发 {} 个提交 (提供方: {}, 并发数: {})",
            total,
            self.provider_name(),
            self.pool_size
        );

        let mut tasks = JoinSet::new();
        let mut task_ids = HashMap::with_capacity(total);

        for (idx, submission) in submissions.into_iter().enumerate() {
            let position = idx + 1;
            let flow = self.flow.clone();
            let semaphore = semaphore.clone();
            let cancel = self.cancel.clone();
            let submission_id = submission.id.clone();

            let handle = tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return SubmissionOutcome::Failed(FailureRecord::new(
                            &submission.id,
                            FailureKind::Cancelled,
                            "批处理已取消，未开始评分",
                        ));
                    }
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(e) => {
                            return SubmissionOutcome::Failed(FailureRecord::new(
                                &submission.id,
                                FailureKind::Internal,
                                e.to_string(),
                            ));
                        }
                    },
                };

                grade_submission(&flow, &submission, position, total).await
            });
            task_ids.insert(handle.id(), submission_id);
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    let submission_id = task_ids
                        .remove(&e.id())
                        .unwrap_or_else(|| "<unknown>".to_string());
                    error!("[{}] 任务执行失败: {}", submission_id, e);
                    outcomes.push(SubmissionOutcome::Failed(FailureRecord::new(
                        submission_id,
                        FailureKind::Internal,
                        e.to_string(),
                    )));
                }
            }
        }

        outcomes
    }
}

/// 评分单个提交，错误转为失败记录
async fn grade_submission(
    flow: &GradingFlow,
    submission: &Submission,
    position: usize,
    total: usize,
) -> SubmissionOutcome {
    info!("[{}] 📝 开始评分 ({}/{})", submission.id, position, total);

    match flow.run(submission).await {
        Ok(record) => SubmissionOutcome::Graded(record),
        Err(e) => {
            warn!("[{}] ❌ 评分失败 ({}): {}", submission.id, e.kind(), e);
            SubmissionOutcome::Failed(FailureRecord::new(&submission.id, e.kind(), e.to_string()))
        }
    }
}
