use std::time::Duration;

use crate::clients::{ProviderConfig, ProviderMode};
use crate::error::ConfigError;
use crate::workflow::GradingMode;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 模型提供方 ---
    /// local / cloud_a / cloud_b（以及别名）
    pub provider_mode: String,
    pub llm_model_name: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: Option<String>,
    // --- 评分 ---
    /// 同时评分的提交数量
    pub max_workers: usize,
    /// cot / zero_shot
    pub grading_mode: String,
    /// 单次模型调用的截止时间（秒）
    pub call_timeout_secs: u64,
    /// 云端 A 每次调用后的等待时间（毫秒）
    pub cloud_a_delay_ms: u64,
    /// 评分标准权重之和的期望值，未设置则不检查
    pub expected_max_grade: Option<f64>,
    // --- 输入输出 ---
    pub rubric_path: String,
    pub submissions_folder: String,
    pub prompt_template_path: Option<String>,
    pub system_template_path: Option<String>,
    /// 源文件扩展名
    pub prog_language: String,
    pub output_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_mode: "local".to_string(),
            llm_model_name: None,
            llm_api_key: None,
            llm_api_base_url: None,
            max_workers: 3,
            grading_mode: "cot".to_string(),
            call_timeout_secs: 120,
            cloud_a_delay_ms: 5000,
            expected_max_grade: None,
            rubric_path: "resources/rubric.json".to_string(),
            submissions_folder: "submissions".to_string(),
            prompt_template_path: None,
            system_template_path: None,
            prog_language: "c".to_string(),
            output_dir: "output".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量加载，已设置但无法解析的值直接报错
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();
        Ok(Self {
            provider_mode: std::env::var("PROVIDER_MODE").unwrap_or(default.provider_mode),
            llm_model_name: env_opt("LLM_MODEL_NAME"),
            llm_api_key: env_opt("LLM_API_KEY"),
            llm_api_base_url: env_opt("LLM_API_BASE_URL"),
            max_workers: env_parse("MAX_WORKERS", "大于 0 的整数")?.unwrap_or(default.max_workers),
            grading_mode: std::env::var("GRADING_MODE").unwrap_or(default.grading_mode),
            call_timeout_secs: env_parse("CALL_TIMEOUT_SECS", "大于 0 的秒数")?
                .unwrap_or(default.call_timeout_secs),
            cloud_a_delay_ms: env_parse("CLOUD_A_DELAY_MS", "毫秒数")?
                .unwrap_or(default.cloud_a_delay_ms),
            expected_max_grade: env_parse("EXPECTED_MAX_GRADE", "大于 0 的数")?,
            rubric_path: std::env::var("RUBRIC_PATH").unwrap_or(default.rubric_path),
            submissions_folder: std::env::var("SUBMISSIONS_FOLDER").unwrap_or(default.submissions_folder),
            prompt_template_path: env_opt("PROMPT_TEMPLATE_PATH"),
            system_template_path: env_opt("SYSTEM_TEMPLATE_PATH"),
            prog_language: std::env::var("PROG_LANGUAGE").unwrap_or(default.prog_language),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            verbose_logging: env_parse("VERBOSE_LOGGING", "true | false")?
                .unwrap_or(default.verbose_logging),
        })
    }

    /// 启动前检查，任何一项不合法都不会开始评分
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mode = self.provider_mode()?;
        self.grading_mode()?;

        let has_key = self.llm_api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
        if mode.requires_api_key() && !has_key {
            return Err(ConfigError::MissingApiKey {
                provider: mode.as_str(),
            });
        }

        if self.max_workers == 0 {
            return Err(invalid("MAX_WORKERS", self.max_workers, "大于 0 的整数"));
        }
        if self.call_timeout_secs == 0 {
            return Err(invalid("CALL_TIMEOUT_SECS", self.call_timeout_secs, "大于 0 的秒数"));
        }
        if let Some(expected) = self.expected_max_grade {
            if !expected.is_finite() || expected <= 0.0 {
                return Err(invalid("EXPECTED_MAX_GRADE", expected, "大于 0 的数"));
            }
        }
        if self.prog_language.trim().is_empty() {
            return Err(invalid("PROG_LANGUAGE", &self.prog_language, "源文件扩展名，例如 c"));
        }

        Ok(())
    }

    pub fn provider_mode(&self) -> Result<ProviderMode, ConfigError> {
        self.provider_mode.parse()
    }

    pub fn grading_mode(&self) -> Result<GradingMode, ConfigError> {
        self.grading_mode.parse()
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// 构造提供方配置
    pub fn provider_config(&self, system_context: impl Into<String>) -> Result<ProviderConfig, ConfigError> {
        let mut config = ProviderConfig::new(&self.provider_mode, system_context)?
            .with_post_call_delay(Duration::from_millis(self.cloud_a_delay_ms));

        if let Some(model) = &self.llm_model_name {
            config = config.with_model(model.clone());
        }
        if let Some(api_key) = &self.llm_api_key {
            config = config.with_api_key(api_key.clone());
        }
        if let Some(base_url) = &self.llm_api_base_url {
            config = config.with_api_base_url(base_url.clone());
        }

        Ok(config)
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// 未设置返回 `None`，设置了但解析失败返回 `InvalidValue`
fn env_parse<T: std::str::FromStr>(name: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    env_opt(name)
        .map(|raw| parse_value(name, &raw, expected))
        .transpose()
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str, expected: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(name, raw, expected))
}

fn invalid(name: &str, value: impl std::fmt::Display, expected: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}
