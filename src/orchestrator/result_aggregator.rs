//! 结果汇总
//!
//! 把评分器返回的结果序列拆成成功记录和失败记录两份列表，
//! 失败记录带类别，交给日志或重试方。

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{FailureRecord, GradeRecord, SubmissionOutcome};

/// 一批提交的汇总结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub records: Vec<GradeRecord>,
    pub failures: Vec<FailureRecord>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.records.len() + self.failures.len()
    }

    pub fn success_count(&self) -> usize {
        self.records.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// 值得重新提交的失败
    pub fn retryable(&self) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(|f| f.kind.is_retryable())
    }

    /// 各失败类别的数量
    pub fn failures_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.kind.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn record_for(&self, submission_id: &str) -> Option<&GradeRecord> {
        self.records.iter().find(|r| r.submission_id == submission_id)
    }

    pub fn failure_for(&self, submission_id: &str) -> Option<&FailureRecord> {
        self.failures.iter().find(|f| f.submission_id == submission_id)
    }
}

/// 汇总结果序列，保持各自的完成顺序
pub fn aggregate<I>(outcomes: I) -> BatchReport
where
    I: IntoIterator<Item = SubmissionOutcome>,
{
    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            SubmissionOutcome::Graded(record) => report.records.push(record),
            SubmissionOutcome::Failed(failure) => report.failures.push(failure),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FailureKind, FeedbackMap};

    fn graded(id: &str, total: f64) -> SubmissionOutcome {
        SubmissionOutcome::Graded(GradeRecord {
            submission_id: id.to_string(),
            total_grade: total,
            feedback: FeedbackMap::new(),
            dimensions: Vec::new(),
        })
    }

    fn failed(id: &str, kind: FailureKind) -> SubmissionOutcome {
        SubmissionOutcome::Failed(FailureRecord::new(id, kind, "boom"))
    }

    #[test]
    fn test_aggregate_splits_outcomes() {
        let report = aggregate(vec![
            graded("a.c", 7.5),
            failed("b.c", FailureKind::SchemaValidation),
            graded("c.c", 10.0),
            failed("d.c", FailureKind::Timeout),
        ]);

        assert_eq!(report.total(), 4);
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.records[0].submission_id, "a.c");
        assert_eq!(report.record_for("c.c").unwrap().total_grade, 10.0);
        assert_eq!(
            report.failure_for("b.c").unwrap().kind,
            FailureKind::SchemaValidation
        );
    }

    #[test]
    fn test_retryable_and_counts() {
        let report = aggregate(vec![
            failed("a.c", FailureKind::SchemaValidation),
            failed("b.c", FailureKind::ProviderCall),
            failed("c.c", FailureKind::ProviderCall),
        ]);

        let retry: Vec<_> = report.retryable().map(|f| f.submission_id.as_str()).collect();
        assert_eq!(retry, vec!["b.c", "c.c"]);
        assert_eq!(report.failures_by_kind()["provider_call"], 2);
        assert_eq!(report.failures_by_kind()["schema_validation"], 1);
    }

    #[test]
    fn test_aggregate_empty() {
        let report = aggregate(Vec::new());
        assert_eq!(report, BatchReport::default());
    }
}
