//! 云端 B 客户端（Groq，OpenAI 兼容接口）
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - `response_format` 只能请求通用的 JSON 对象，schema 以文字形式追加到提示词
//! - 模型固定，温度固定为 0

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::clients::provider::{ProviderConfig, StructuredChat};
use crate::clients::structured;
use crate::error::{ConfigError, ProviderError};
use crate::models::StructuredResult;

const PROVIDER: &str = "groq";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq 客户端
pub struct GroqClient {
    client: Client<OpenAIConfig>,
    system_context: String,
}

impl GroqClient {
    /// 固定使用的模型
    pub const MODEL: &'static str = "llama-3.3-70b-versatile";

    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key(PROVIDER)?;

        if config.model != Self::MODEL {
            warn!(
                "Groq 使用固定模型 {}，忽略配置的模型 {}",
                Self::MODEL,
                config.model
            );
        }

        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(
                config
                    .api_base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_BASE_URL),
            );

        Ok(Self {
            client: Client::with_config(openai_config),
            system_context: config.system_context.clone(),
        })
    }

    fn build_request(&self, prompt: &str) -> Result<CreateChatCompletionRequest, ProviderError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(self.system_context.as_str())
            .build()
            .map_err(|e| ProviderError::call(PROVIDER, e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(structured::with_schema_instructions(prompt))
            .build()
            .map_err(|e| ProviderError::call(PROVIDER, e))?;

        CreateChatCompletionRequestArgs::default()
            .model(Self::MODEL)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.0)
            .build()
            .map_err(|e| ProviderError::call(PROVIDER, e))
    }
}

#[async_trait]
impl StructuredChat for GroqClient {
    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn structured_chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError> {
        debug!("调用 Groq，模型: {}", Self::MODEL);

        let request = self.build_request(prompt)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("Groq 调用失败: {}", e);
            ProviderError::call(PROVIDER, e)
        })?;

        debug!("Groq 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::call(PROVIDER, "返回内容为空"))?;

        structured::decode_fenced(&content)
    }
}
