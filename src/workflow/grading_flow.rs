//! 评分流程 - 流程层
//!
//! 核心职责：定义"一个提交"的完整评分流程
//!
//! 链式评分（默认）：
//! 1. 按评分标准顺序逐个维度评分
//! 2. 每个维度的提示词包含代码、该维度要点、之前所有维度的反馈和分数
//! 3. 任意维度失败则整个提交失败，已完成的维度作废
//!
//! 零样本评分：一次调用包含所有维度

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ConfigError, ProviderError};
use crate::infrastructure::ProviderGate;
use crate::models::{DimensionScore, FeedbackMap, GradeRecord, Rubric, Submission};
use crate::utils::logging::truncate_text;
use crate::workflow::grading_session::GradingSession;
use crate::workflow::prompt::{full_rubric_block, PromptTemplate};

/// 零样本评分时反馈使用的键
pub const OVERALL_FEEDBACK_KEY: &str = "Overall";

/// 评分模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingMode {
    /// 链式评分（逐维度）
    ChainOfThought,
    /// 零样本评分（一次调用）
    ZeroShot,
}

impl FromStr for GradingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "cot" | "chain_of_thought" => Ok(GradingMode::ChainOfThought),
            "zero_shot" | "zeroshot" => Ok(GradingMode::ZeroShot),
            _ => Err(ConfigError::InvalidValue {
                name: "GRADING_MODE".to_string(),
                value: s.to_string(),
                expected: "cot | zero_shot".to_string(),
            }),
        }
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::ChainOfThought => f.write_str("cot"),
            GradingMode::ZeroShot => f.write_str("zero_shot"),
        }
    }
}

/// 评分流程
///
/// - 不持有提供方资源，只通过闸门调用
/// - 评分标准和模板只读共享
/// - 每次运行创建自己的会话
pub struct GradingFlow {
    gate: Arc<ProviderGate>,
    rubric: Arc<Rubric>,
    template: Arc<PromptTemplate>,
    mode: GradingMode,
}

impl GradingFlow {
    pub fn new(
        gate: Arc<ProviderGate>,
        rubric: Arc<Rubric>,
        template: Arc<PromptTemplate>,
        mode: GradingMode,
    ) -> Self {
        Self {
            gate,
            rubric,
            template,
            mode,
        }
    }

    /// 按配置的模式评分一个提交
    pub async fn run(&self, submission: &Submission) -> Result<GradeRecord, ProviderError> {
        match self.mode {
            GradingMode::ChainOfThought => {
                let session = self.run_chain_of_thought(submission).await?;
                Ok(session.reduce())
            }
            GradingMode::ZeroShot => self.run_zero_shot(submission).await,
        }
    }

    /// 链式评分，返回完整的会话
    pub async fn run_chain_of_thought(
        &self,
        submission: &Submission,
    ) -> Result<GradingSession, ProviderError> {
        let mut session = GradingSession::new(&submission.id);
        let total = self.rubric.len();

        for (index, dimension) in self.rubric.iter().enumerate() {
            let prompt = session.running_prompt(&self.template, &submission.code, dimension);
            debug!(
                "[{}] 维度 {} 提示词: {}",
                submission.id,
                dimension.key,
                truncate_text(&prompt, 200)
            );

            let result = self.gate.chat(&prompt).await.map_err(|e| {
                warn!(
                    "[{}] ❌ 维度 {}/{} ({}) 评分失败: {}",
                    submission.id,
                    index + 1,
                    total,
                    dimension.key,
                    e
                );
                e
            })?;

            if result.grade < 0.0 || result.grade > dimension.weight {
                warn!(
                    "[{}] ⚠️ 维度 {} 的分数 {} 超出范围 [0.0, {}]",
                    submission.id, dimension.key, result.grade, dimension.weight
                );
            }

            info!(
                "[{}] ✓ 维度 {}/{} ({}): {}/{}",
                submission.id,
                index + 1,
                total,
                dimension.key,
                result.grade,
                dimension.weight
            );

            session.record(dimension, &result);
        }

        info!(
            "[{}] 评分完成, 总分 {}/{}",
            submission.id,
            session.total_grade(),
            self.rubric.total_weight()
        );

        Ok(session)
    }

    /// 零样本评分：一次调用，所有维度要点拼在一起
    pub async fn run_zero_shot(&self, submission: &Submission) -> Result<GradeRecord, ProviderError> {
        let block = full_rubric_block(self.rubric.iter());
        let prompt = self.template.render(&submission.code, &block, &[]);
        debug!("[{}] 提示词: {}", submission.id, truncate_text(&prompt, 200));

        let mut result = self.gate.chat(&prompt).await?;
        result.name = submission.id.clone();

        info!(
            "[{}] ✓ 零样本评分完成, 总分 {}/{}",
            submission.id,
            result.grade,
            self.rubric.total_weight()
        );

        let mut feedback = FeedbackMap::new();
        feedback.insert(
            OVERALL_FEEDBACK_KEY.to_string(),
            result.error_feedback.clone().into(),
        );

        Ok(GradeRecord {
            submission_id: result.name,
            total_grade: result.grade,
            feedback,
            dimensions: vec![DimensionScore {
                dimension: OVERALL_FEEDBACK_KEY.to_string(),
                grade: result.grade,
                max_grade: self.rubric.total_weight(),
                feedback: result.error_feedback,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::StructuredChat;
    use crate::models::{RubricDimension, StructuredResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    /// 按顺序返回预设结果，并记录收到的提示词
    struct Scripted {
        replies: Mutex<Vec<Result<StructuredResult, ProviderError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<StructuredResult, ProviderError>>) -> Arc<Self> {
            let mut replies = replies;
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl StructuredChat for Scripted {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn structured_chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::call("scripted", "没有更多预设结果")))
        }
    }

    fn reply(grade: f64, feedback: &str) -> Result<StructuredResult, ProviderError> {
        Ok(StructuredResult {
            name: "model-chosen-name".to_string(),
            grade,
            error_feedback: feedback.to_string(),
        })
    }

    fn flow(provider: Arc<Scripted>, mode: GradingMode) -> GradingFlow {
        let rubric = Rubric::new(vec![
            RubricDimension::new("Functionality", vec!["Correct".to_string()], 5.0),
            RubricDimension::new("Quality", vec!["Readable".to_string()], 5.0),
        ])
        .unwrap();
        let gate = ProviderGate::new(provider, Duration::from_secs(5), CancellationToken::new());
        GradingFlow::new(
            Arc::new(gate),
            Arc::new(rubric),
            Arc::new(PromptTemplate::new("<CODE>\n<RUBRIC>", "C")),
            mode,
        )
    }

    #[tokio::test]
    async fn test_chain_of_thought_sums_dimensions() {
        let provider = Scripted::new(vec![reply(4.0, "ok"), reply(3.5, "minor style issues")]);
        let record = flow(provider.clone(), GradingMode::ChainOfThought)
            .run(&Submission::new("main.c", "int main(){}"))
            .await
            .unwrap();

        assert_eq!(record.total_grade, 7.5);
        assert_eq!(record.feedback.len(), 2);
        assert_eq!(record.feedback["Quality"], "minor style issues");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("## Criteria Functionality"));
        assert!(prompts[1].contains("## Criteria Quality"));
        assert!(prompts[1].contains("# Feedback for Functionality\nok"));
        assert!(prompts[1].contains("## Grade for Functionality = 4.0/5.0"));
    }

    #[tokio::test]
    async fn test_failure_midway_discards_session() {
        let provider = Scripted::new(vec![
            reply(4.0, "ok"),
            Err(ProviderError::schema("缺少字段 `grade`", "{}")),
        ]);
        let err = flow(provider, GradingMode::ChainOfThought)
            .run(&Submission::new("main.c", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::SchemaValidation { .. }));
    }

    #[tokio::test]
    async fn test_zero_shot_single_call_with_submission_name() {
        let provider = Scripted::new(vec![reply(8.0, "solid work")]);
        let record = flow(provider.clone(), GradingMode::ZeroShot)
            .run(&Submission::new("hello.c", "x"))
            .await
            .unwrap();

        assert_eq!(record.submission_id, "hello.c");
        assert_eq!(record.total_grade, 8.0);
        assert_eq!(record.feedback[OVERALL_FEEDBACK_KEY], "solid work");
        assert_eq!(record.max_grade(), 10.0);

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("## Criteria Functionality"));
        assert!(prompts[0].contains("## Criteria Quality"));
    }

    #[test]
    fn test_grading_mode_parse() {
        assert_eq!("cot".parse::<GradingMode>().unwrap(), GradingMode::ChainOfThought);
        assert_eq!("zero-shot".parse::<GradingMode>().unwrap(), GradingMode::ZeroShot);
        assert!("few_shot".parse::<GradingMode>().is_err());
    }
}
