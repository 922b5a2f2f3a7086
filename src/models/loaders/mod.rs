pub mod language;
pub mod rubric_loader;
pub mod submission_loader;
pub mod template_loader;

pub use rubric_loader::load_rubric;
pub use submission_loader::load_submissions;
pub use template_loader::load_template;
