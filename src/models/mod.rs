pub mod grade;
pub mod loaders;
pub mod rubric;
pub mod submission;

pub use grade::{
    DimensionScore, FailureKind, FailureRecord, FeedbackMap, GradeRecord, StructuredResult,
    SubmissionOutcome,
};
pub use loaders::{load_rubric, load_submissions, load_template};
pub use rubric::{Rubric, RubricDimension};
pub use submission::Submission;
