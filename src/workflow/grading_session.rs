//! 单个提交的评分会话
//!
//! 由执行该提交的任务独占，按维度顺序累积分数和反馈，归约后丢弃

use serde_json::Value as JsonValue;

use crate::models::{DimensionScore, FeedbackMap, GradeRecord, RubricDimension, StructuredResult};
use crate::workflow::prompt::{criteria_block, PromptTemplate};

/// 已完成维度的反馈
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEntry {
    pub dimension: String,
    pub feedback: String,
    pub grade: f64,
    pub weight: f64,
}

impl FeedbackEntry {
    pub fn new(dimension: impl Into<String>, feedback: impl Into<String>, grade: f64, weight: f64) -> Self {
        Self {
            dimension: dimension.into(),
            feedback: feedback.into(),
            grade,
            weight,
        }
    }
}

/// 评分会话
#[derive(Debug, Clone)]
pub struct GradingSession {
    submission_id: String,
    entries: Vec<FeedbackEntry>,
}

impl GradingSession {
    pub fn new(submission_id: impl Into<String>) -> Self {
        Self {
            submission_id: submission_id.into(),
            entries: Vec::new(),
        }
    }

    /// 下一个维度的提示词：要点 + 之前所有维度的反馈
    pub fn running_prompt(
        &self,
        template: &PromptTemplate,
        code: &str,
        dimension: &RubricDimension,
    ) -> String {
        template.render(code, &criteria_block(dimension), &self.entries)
    }

    /// 记录一个维度的结果
    pub fn record(&mut self, dimension: &RubricDimension, result: &StructuredResult) {
        self.entries.push(FeedbackEntry::new(
            dimension.key.clone(),
            result.error_feedback.clone(),
            result.grade,
            dimension.weight,
        ));
    }

    /// 各维度分数之和
    pub fn total_grade(&self) -> f64 {
        self.entries.iter().map(|e| e.grade).sum()
    }

    /// 归约为最终成绩
    pub fn reduce(self) -> GradeRecord {
        let total_grade = self.total_grade();

        let feedback: FeedbackMap = self
            .entries
            .iter()
            .map(|e| (e.dimension.clone(), JsonValue::String(e.feedback.clone())))
            .collect();

        let dimensions = self
            .entries
            .into_iter()
            .map(|e| DimensionScore {
                dimension: e.dimension,
                grade: e.grade,
                max_grade: e.weight,
                feedback: e.feedback,
            })
            .collect();

        GradeRecord {
            submission_id: self.submission_id,
            total_grade,
            feedback,
            dimensions,
        }
    }
}
