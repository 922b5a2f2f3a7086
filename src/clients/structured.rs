//! 结构化返回的解码
//!
//! 所有提供方的返回都要经过这里：去掉 markdown 代码块包裹，再按固定结构校验。
//! 解码失败返回 `ProviderError::SchemaValidation`，不会 panic。

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value as JsonValue};

use crate::error::ProviderError;
use crate::models::StructuredResult;

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```(?:json)?\n?").unwrap());

/// `StructuredResult` 的 JSON Schema
pub fn response_schema() -> JsonValue {
    json!({
        "title": "StructuredResult",
        "type": "object",
        "properties": {
            "name": { "title": "Name", "type": "string" },
            "grade": { "title": "Grade", "type": "number" },
            "error_feedback": { "title": "Error Feedback", "type": "string" }
        },
        "required": ["name", "grade", "error_feedback"]
    })
}

/// 为没有原生结构化输出的提供方，把 schema 以文字形式追加到提示词末尾
pub fn with_schema_instructions(prompt: &str) -> String {
    let schema = serde_json::to_string(&response_schema()).unwrap_or_default();
    format!(
        "{}\n\nThe response must follow the JSON schema below:\n```json\n{}\n```\n",
        prompt, schema
    )
}

/// 去掉 ``` 或 ```json 代码块包裹
pub fn strip_code_fences(text: &str) -> String {
    FENCE.replace_all(text, "").trim().to_string()
}

/// 先去掉代码块包裹再解码（云端提供方）
pub fn decode_fenced(text: &str) -> Result<StructuredResult, ProviderError> {
    decode(&strip_code_fences(text))
}

/// 解码已经是纯 JSON 的返回（本地提供方）
pub fn decode(text: &str) -> Result<StructuredResult, ProviderError> {
    let value: JsonValue = serde_json::from_str(text.trim())
        .map_err(|e| ProviderError::schema(format!("不是合法的 JSON: {}", e), text))?;

    let object = value
        .as_object()
        .ok_or_else(|| ProviderError::schema("顶层不是对象", text))?;

    Ok(StructuredResult {
        name: string_field(object, "name", text)?,
        grade: grade_field(object, text)?,
        error_feedback: string_field(object, "error_feedback", text)?,
    })
}

fn string_field(
    object: &Map<String, JsonValue>,
    field: &str,
    raw: &str,
) -> Result<String, ProviderError> {
    match object.get(field) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(other) => Err(ProviderError::schema(
            format!("字段 `{}` 应为字符串，实际为 {}", field, other),
            raw,
        )),
        None => Err(ProviderError::schema(format!("缺少字段 `{}`", field), raw)),
    }
}

// 数字字符串也接受，模型偶尔会给分数加引号
fn grade_field(object: &Map<String, JsonValue>, raw: &str) -> Result<f64, ProviderError> {
    let grade = match object.get("grade") {
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(ProviderError::schema("缺少字段 `grade`", raw)),
    };

    match grade {
        Some(g) if g.is_finite() => Ok(g),
        _ => Err(ProviderError::schema("字段 `grade` 不是有限数字", raw)),
    }
}
