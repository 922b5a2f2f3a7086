//! 云端 A 客户端（Gemini `generateContent`）
//!
//! 没有原生的结构化输出模式：schema 以文字形式追加到提示词，返回文本常带代码块包裹，
//! 解码前需要去掉。限流较严，每次调用之后还要额外等待一段时间。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::clients::provider::{ProviderConfig, StructuredChat};
use crate::clients::structured;
use crate::error::{ConfigError, ProviderError};
use crate::models::StructuredResult;
use crate::utils::logging::truncate_text;

const PROVIDER: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini 客户端
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model_name: String,
    system_context: String,
    post_call_delay: Duration,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key(PROVIDER)?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::ClientBuild {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            api_key,
            base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_name: config.model.clone(),
            system_context: config.system_context.clone(),
            post_call_delay: config.post_call_delay,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model_name
        )
    }

    fn build_request_body(&self, prompt: &str) -> JsonValue {
        let mut body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": structured::with_schema_instructions(prompt) }]
                }
            ],
            "generationConfig": { "temperature": 0.0 }
        });

        if !self.system_context.is_empty() {
            body["system_instruction"] = json!({
                "parts": [{ "text": self.system_context }]
            });
        }

        body
    }
}

/// 拼接第一个候选的所有文本片段
fn extract_text(body: &JsonValue) -> Result<String, ProviderError> {
    let parts = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = body
                .get("promptFeedback")
                .and_then(|f| f.get("blockReason"))
                .and_then(|r| r.as_str())
                .unwrap_or("返回中没有候选结果");
            ProviderError::call(PROVIDER, reason)
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderError::call(PROVIDER, "返回内容为空"));
    }

    Ok(text)
}

#[async_trait]
impl StructuredChat for GeminiClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn structured_chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError> {
        debug!("调用 Gemini，模型: {}", self.model_name);

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini 调用失败: {}", e);
                ProviderError::call(PROVIDER, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::call(
                PROVIDER,
                format!("HTTP {}: {}", status, truncate_text(&text, 200)),
            ));
        }

        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| ProviderError::call(PROVIDER, e))?;

        let text = extract_text(&body)?;
        debug!("Gemini 调用成功");

        structured::decode_fenced(&text)
    }

    fn post_call_delay(&self) -> Option<Duration> {
        Some(self.post_call_delay)
    }
}
