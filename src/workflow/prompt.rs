//! 提示词模板
//!
//! 模板里的标签按纯文本替换：`<CODE>`、`<RUBRIC>`、`<PLANGUAGE>`、`<FORMAT>`。
//! `<CODE>` 和 `<RUBRIC>` 一次扫描同时替换，填入的代码和评分要点里出现的标签文本不会被再次替换。

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::RubricDimension;
use crate::workflow::grading_session::FeedbackEntry;

pub const CODE_TAG: &str = "<CODE>";
pub const RUBRIC_TAG: &str = "<RUBRIC>";
pub const LANGUAGE_TAG: &str = "<PLANGUAGE>";
pub const FORMAT_TAG: &str = "<FORMAT>";

static CONTENT_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new("<CODE>|<RUBRIC>").unwrap());

/// 要求模型输出的格式名
pub const OUTPUT_FORMAT: &str = "Json";

/// 内置系统提示词
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are an expert <PLANGUAGE> programming teacher grading \
student submissions. Judge only what the rubric asks for, be strict but fair, and always answer in <FORMAT>.";

/// 内置用户提示词
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"# Instruction
Evaluate the following <PLANGUAGE> program using only the criteria below.
Give a grade inside the stated range and explain every problem you find in `error_feedback`.

# Code
```
<CODE>
```

# Rubric
<RUBRIC>
"#;

/// 提示词模板
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    language: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            language: language.into(),
        }
    }

    /// 渲染一次调用的完整提示词
    ///
    /// 评分要点替换 `<RUBRIC>`，之前维度的反馈按顺序追加在末尾。
    /// 模板里没有 `<RUBRIC>` / `<CODE>` 时，对应内容追加到末尾。
    pub fn render(&self, code: &str, rubric_block: &str, history: &[FeedbackEntry]) -> String {
        let filled = fill_static_tags(&self.template, &self.language);

        let mut prompt = CONTENT_TAGS
            .replace_all(&filled, |caps: &Captures| {
                if &caps[0] == CODE_TAG {
                    code
                } else {
                    rubric_block
                }
            })
            .into_owned();

        if !filled.contains(RUBRIC_TAG) {
            prompt.push('\n');
            prompt.push_str(rubric_block);
        }
        if !filled.contains(CODE_TAG) {
            prompt.push('\n');
            prompt.push_str(code);
        }

        for entry in history {
            prompt.push_str(&feedback_section(entry));
        }

        prompt
    }

    /// 渲染系统提示词（只替换语言和格式标签）
    pub fn render_system(system_template: &str, language: &str) -> String {
        fill_static_tags(system_template, language)
    }
}

fn fill_static_tags(text: &str, language: &str) -> String {
    text.replace(LANGUAGE_TAG, language)
        .replace(FORMAT_TAG, OUTPUT_FORMAT)
}


/// 链式评分使用的单维度要点，明确给出分数范围
pub fn criteria_block(dimension: &RubricDimension) -> String {
    let mut block = criteria_header(dimension);
    block.push_str(&format!(
        "### Weight = [0.0 - {}]\nThe grade for {} must be a number between 0.0 and {}.",
        format_score(dimension.weight),
        dimension.key,
        format_score(dimension.weight)
    ));
    block
}

/// 零样本评分使用的全部要点
pub fn full_rubric_block<'a, I>(dimensions: I) -> String
where
    I: IntoIterator<Item = &'a RubricDimension>,
{
    dimensions
        .into_iter()
        .map(|dimension| {
            let mut block = criteria_header(dimension);
            block.push_str(&format!("### Weight = {}", format_score(dimension.weight)));
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn criteria_header(dimension: &RubricDimension) -> String {
    let mut header = format!("## Criteria {}\n", dimension.key);
    for criterion in &dimension.criteria {
        header.push_str(&format!("- {}\n", criterion));
    }
    header
}

/// 前一个维度的反馈段落
pub fn feedback_section(entry: &FeedbackEntry) -> String {
    format!(
        "\n# Feedback for {}\n{}\n## Grade for {} = {}/{}",
        entry.dimension,
        entry.feedback,
        entry.dimension,
        format_score(entry.grade),
        format_score(entry.weight)
    )
}

/// 分数显示：整数也保留一位小数（`4` -> `4.0`）
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dimension(key: &str, weight: f64) -> RubricDimension {
        RubricDimension::new(
            key,
            vec!["Correct output".to_string(), "Handles bad input".to_string()],
            weight,
        )
    }

    #[test]
    fn test_criteria_block_states_range() {
        let block = criteria_block(&dimension("Functionality", 4.0));
        assert_eq!(
            block,
            "## Criteria Functionality\n- Correct output\n- Handles bad input\n\
             ### Weight = [0.0 - 4.0]\nThe grade for Functionality must be a number between 0.0 and 4.0."
        );
    }

    #[test]
    fn test_full_rubric_block_keeps_order() {
        let dims = vec![dimension("B", 2.5), dimension("A", 7.5)];
        let block = full_rubric_block(&dims);
        let b = block.find("## Criteria B").unwrap();
        let a = block.find("## Criteria A").unwrap();
        assert!(b < a);
        assert!(block.contains("### Weight = 2.5"));
        assert!(block.contains("### Weight = 7.5"));
    }

    #[test]
    fn test_render_substitutes_tags() {
        let template = PromptTemplate::new("Lang <PLANGUAGE> as <FORMAT>\n<CODE>\n<RUBRIC>", "C");
        let prompt = template.render("int main(){}", "RUBRIC-BLOCK", &[]);
        assert_eq!(prompt, "Lang C as Json\nint main(){}\nRUBRIC-BLOCK");
    }

    #[test]
    fn test_tags_inside_code_are_left_alone() {
        let template = PromptTemplate::new("<CODE>|<RUBRIC>", "C");
        let prompt = template.render("printf(\"<RUBRIC> $1 \\\\d\");", "R", &[]);
        assert_eq!(prompt, "printf(\"<RUBRIC> $1 \\\\d\");|R");
    }

    #[test]
    fn test_tags_inside_criteria_are_left_alone() {
        let docs = RubricDimension::new("Docs", vec!["Wrap snippets in <CODE> blocks".to_string()], 2.0);
        let template = PromptTemplate::new("<CODE>\n<RUBRIC>", "C");
        let prompt = template.render("int main(){}", &criteria_block(&docs), &[]);
        assert!(prompt.starts_with("int main(){}\n## Criteria Docs"));
        assert!(prompt.contains("- Wrap snippets in <CODE> blocks"));
        assert_eq!(prompt.matches("int main(){}").count(), 1);
    }

    #[test]
    fn test_missing_tags_are_appended() {
        let template = PromptTemplate::new("Grade it.", "C");
        assert_eq!(template.render("code", "rubric", &[]), "Grade it.\nrubric\ncode");
    }

    #[test]
    fn test_history_appended_in_order() {
        let template = PromptTemplate::new("<CODE>\n<RUBRIC>", "C");
        let history = vec![
            FeedbackEntry::new("Functionality", "ok", 4.0, 5.0),
            FeedbackEntry::new("Quality", "bad names", 2.5, 5.0),
        ];
        let prompt = template.render("x", "R", &history);
        assert_eq!(
            prompt,
            "x\nR\n# Feedback for Functionality\nok\n## Grade for Functionality = 4.0/5.0\
             \n# Feedback for Quality\nbad names\n## Grade for Quality = 2.5/5.0"
        );
    }

    #[test]
    fn test_render_system() {
        assert_eq!(
            PromptTemplate::render_system("Teach <PLANGUAGE>, reply in <FORMAT>", "Rust"),
            "Teach Rust, reply in Json"
        );
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(4.0), "4.0");
        assert_eq!(format_score(3.25), "3.25");
        assert_eq!(format_score(0.0), "0.0");
    }
}
