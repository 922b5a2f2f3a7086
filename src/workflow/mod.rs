pub mod grading_flow;
pub mod grading_session;
pub mod prompt;

pub use grading_flow::{GradingFlow, GradingMode, OVERALL_FEEDBACK_KEY};
pub use grading_session::{FeedbackEntry, GradingSession};
pub use prompt::PromptTemplate;
