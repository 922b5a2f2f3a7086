//! 模型提供方适配层
//!
//! 三种提供方统一成一个"结构化对话"能力。模式在构造时确定一次，运行期间不切换。

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;

use crate::clients::{GeminiClient, GroqClient, OllamaClient};
use crate::error::{ConfigError, ProviderError};
use crate::models::StructuredResult;

/// 结构化对话能力
///
/// 每次调用要么返回符合结构的 `StructuredResult`，要么返回 `ProviderError`。
#[async_trait]
pub trait StructuredChat: Send + Sync {
    /// 提供方名称（用于日志和错误信息）
    fn provider_name(&self) -> &str;

    /// 发送一次提示词并解码结构化返回
    async fn structured_chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError>;

    /// 每次调用释放锁之后需要额外等待的时间
    fn post_call_delay(&self) -> Option<Duration> {
        None
    }
}

/// 提供方模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderMode {
    /// 本地模型服务（Ollama）
    Local,
    /// 云端 A（Gemini），无原生结构化模式，限流更严
    CloudA,
    /// 云端 B（Groq，OpenAI 兼容接口）
    CloudB,
}

impl ProviderMode {
    /// 未配置模型时使用的默认模型
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderMode::Local => "llama3.1:latest",
            ProviderMode::CloudA => "gemini-2.0-flash",
            ProviderMode::CloudB => GroqClient::MODEL,
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderMode::Local)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderMode::Local => "local",
            ProviderMode::CloudA => "cloud_a",
            ProviderMode::CloudB => "cloud_b",
        }
    }
}

impl FromStr for ProviderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(ProviderMode::Local),
            "cloud_a" | "google" | "genai" | "gemini" => Ok(ProviderMode::CloudA),
            "cloud_b" | "groq" => Ok(ProviderMode::CloudB),
            _ => Err(ConfigError::UnsupportedMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProviderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 提供方配置，构造适配器后不可变
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub mode: ProviderMode,
    pub model: String,
    pub api_key: Option<String>,
    /// 覆盖默认的服务地址
    pub api_base_url: Option<String>,
    /// 系统提示词
    pub system_context: String,
    /// 云端 A 每次调用后的等待时间
    pub post_call_delay: Duration,
}

impl ProviderConfig {
    /// 默认的云端 A 调用间隔
    pub const DEFAULT_POST_CALL_DELAY: Duration = Duration::from_secs(5);

    /// 由模式字符串创建配置，不支持的模式直接失败
    pub fn new(mode: &str, system_context: impl Into<String>) -> Result<Self, ConfigError> {
        let mode: ProviderMode = mode.parse()?;
        Ok(Self {
            mode,
            model: mode.default_model().to_string(),
            api_key: None,
            api_base_url: None,
            system_context: system_context.into(),
            post_call_delay: Self::DEFAULT_POST_CALL_DELAY,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = Some(api_base_url.into());
        self
    }

    pub fn with_post_call_delay(mut self, delay: Duration) -> Self {
        self.post_call_delay = delay;
        self
    }

    /// 取出 API Key，云端模式下缺失即失败
    pub(crate) fn require_api_key(&self, provider: &'static str) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey { provider })
    }
}

/// 提供方适配器
pub enum ProviderAdapter {
    Local(OllamaClient),
    CloudA(GeminiClient),
    CloudB(GroqClient),
}

impl ProviderAdapter {
    /// 按配置的模式构造唯一的适配器
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let adapter = match config.mode {
            ProviderMode::Local => ProviderAdapter::Local(OllamaClient::new(config)?),
            ProviderMode::CloudA => ProviderAdapter::CloudA(GeminiClient::new(config)?),
            ProviderMode::CloudB => ProviderAdapter::CloudB(GroqClient::new(config)?),
        };

        tracing::info!(
            "模型提供方: {} (模型: {})",
            config.mode,
            adapter.model_name()
        );

        Ok(adapter)
    }

    pub fn mode(&self) -> ProviderMode {
        match self {
            ProviderAdapter::Local(_) => ProviderMode::Local,
            ProviderAdapter::CloudA(_) => ProviderMode::CloudA,
            ProviderAdapter::CloudB(_) => ProviderMode::CloudB,
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            ProviderAdapter::Local(client) => client.model_name(),
            ProviderAdapter::CloudA(client) => client.model_name(),
            ProviderAdapter::CloudB(_) => GroqClient::MODEL,
        }
    }
}

#[async_trait]
impl StructuredChat for ProviderAdapter {
    fn provider_name(&self) -> &str {
        self.mode().as_str()
    }

    async fn structured_chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError> {
        match self {
            ProviderAdapter::Local(client) => client.structured_chat(prompt).await,
            ProviderAdapter::CloudA(client) => client.structured_chat(prompt).await,
            ProviderAdapter::CloudB(client) => client.structured_chat(prompt).await,
        }
    }

    fn post_call_delay(&self) -> Option<Duration> {
        match self {
            ProviderAdapter::CloudA(client) => client.post_call_delay(),
            _ => None,
        }
    }
}
