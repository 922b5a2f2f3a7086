//! 评分结果模型

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// 维度名 -> 反馈，保持评分标准顺序
pub type FeedbackMap = Map<String, JsonValue>;

/// 模型每次调用必须返回的结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub name: String,
    pub grade: f64,
    pub error_feedback: String,
}

/// 单个维度的得分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: String,
    pub grade: f64,
    pub max_grade: f64,
    pub feedback: String,
}

/// 单个提交的最终成绩
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub submission_id: String,
    /// 各维度分数之和（不是平均值）
    pub total_grade: f64,
    /// 维度名 -> 反馈（评分标准顺序）
    pub feedback: FeedbackMap,
    /// 按评分标准顺序排列的维度明细
    #[serde(default)]
    pub dimensions: Vec<DimensionScore>,
}

impl GradeRecord {
    /// 某个维度的反馈
    pub fn feedback_for(&self, dimension: &str) -> Option<&str> {
        self.feedback.get(dimension).and_then(JsonValue::as_str)
    }

    /// 评分标准顺序下的满分
    pub fn max_grade(&self) -> f64 {
        self.dimensions.iter().map(|d| d.max_grade).sum()
    }
}

/// 失败类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 网络/鉴权/服务端失败，通常可以重试
    ProviderCall,
    /// 模型输出不符合结构，通常是提示词问题
    SchemaValidation,
    /// 单次调用超过截止时间
    Timeout,
    /// 批处理被取消
    Cancelled,
    /// 工作任务异常退出
    Internal,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::ProviderCall => "provider_call",
            FailureKind::SchemaValidation => "schema_validation",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Internal => "internal",
        }
    }

    /// 调用方重新提交是否有意义
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureKind::ProviderCall | FailureKind::Timeout | FailureKind::Cancelled
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个提交的失败记录，交给日志/重试方
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub submission_id: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FailureRecord {
    pub fn new(submission_id: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
            kind,
            message: message.into(),
        }
    }
}

/// 单个提交的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    Graded(GradeRecord),
    Failed(FailureRecord),
}

impl SubmissionOutcome {
    pub fn submission_id(&self) -> &str {
        match self {
            SubmissionOutcome::Graded(record) => &record.submission_id,
            SubmissionOutcome::Failed(failure) => &failure.submission_id,
        }
    }

    pub fn is_graded(&self) -> bool {
        matches!(self, SubmissionOutcome::Graded(_))
    }
}
