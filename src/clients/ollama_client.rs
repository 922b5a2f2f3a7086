/// 本地模型客户端（Ollama）
///
/// 使用原生 `/api/chat` 接口，`format` 字段直接传 JSON Schema，返回内容本身就是结构化 JSON
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use crate::clients::provider::{ProviderConfig, StructuredChat};
use crate::clients::structured;
use crate::error::{ConfigError, ProviderError};
use crate::models::StructuredResult;
use crate::utils::logging::truncate_text;

const PROVIDER: &str = "ollama";
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama 客户端
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model_name: String,
    system_context: String,
}

impl OllamaClient {
    /// 创建新的 Ollama 客户端
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::ClientBuild {
                provider: PROVIDER,
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: config
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model_name: config.model.clone(),
            system_context: config.system_context.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    /// 构建请求体（温度固定为 0）
    fn build_request_body(&self, prompt: &str) -> JsonValue {
        json!({
            "model": self.model_name,
            "messages": [
                { "role": "system", "content": self.system_context },
                { "role": "user", "content": prompt }
            ],
            "format": structured::response_schema(),
            "options": { "temperature": 0 },
            "stream": false
        })
    }
}

/// 提取 `message.content`
fn extract_content(body: &JsonValue) -> Result<String, ProviderError> {
    body.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::call(PROVIDER, "返回中缺少 message.content"))
}

#[async_trait]
impl StructuredChat for OllamaClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn structured_chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError> {
        debug!("调用 Ollama，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", prompt.len());

        let response = self
            .http
            .post(self.endpoint())
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                warn!("Ollama 调用失败: {}", e);
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

        let content = extract_content(&body)?;
        debug!("Ollama 调用成功");

        structured::decode(&content)
    }
}
