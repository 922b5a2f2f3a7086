use std::time::Duration;

use thiserror::Error;

use crate::models::grade::FailureKind;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（启动阶段，整批失败）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 评分标准错误（启动阶段，整批失败）
    #[error("评分标准错误: {0}")]
    Rubric(#[from] RubricError),
    /// 模型调用错误（只影响单个提交）
    #[error("模型调用错误: {0}")]
    Provider(#[from] ProviderError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 不支持的模型提供方模式
    #[error("不支持的执行模式: '{mode}' (可选: local, cloud_a, cloud_b)")]
    UnsupportedMode { mode: String },
    /// 云端模式缺少 API Key
    #[error("{provider} 需要 API Key，请设置 LLM_API_KEY")]
    MissingApiKey { provider: &'static str },
    /// 配置值非法
    #[error("配置项 {name} 的值 '{value}' 非法，期望: {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: String,
    },
    /// HTTP 客户端创建失败
    #[error("{provider} 客户端创建失败: {message}")]
    ClientBuild {
        provider: &'static str,
        message: String,
    },
}

/// 评分标准错误
#[derive(Debug, Error)]
pub enum RubricError {
    /// 评分标准必须是以维度名为键的对象
    #[error("评分标准顶层必须是以维度名为键的对象")]
    NotAnObject,
    /// 评分标准为空
    #[error("评分标准不包含任何维度")]
    Empty,
    /// 维度缺少字段
    #[error("维度 '{dimension}' 缺少字段 '{field}'")]
    MissingField {
        dimension: String,
        field: &'static str,
    },
    /// 维度字段类型错误
    #[error("维度 '{dimension}' 的字段 '{field}' 非法: {reason}")]
    InvalidField {
        dimension: String,
        field: &'static str,
        reason: String,
    },
    /// 权重非法
    #[error("维度 '{dimension}' 的权重 {weight} 非法 (必须是非负有限数)")]
    InvalidWeight { dimension: String, weight: f64 },
    /// 维度重复
    #[error("维度 '{key}' 重复出现")]
    DuplicateDimension { key: String },
    /// 权重之和与期望总分不符
    #[error("评分标准权重之和为 {actual}，期望为 {expected}")]
    WeightSumMismatch { expected: f64, actual: f64 },
    /// 文档解析失败
    #[error("评分标准解析失败: {reason}")]
    Parse { reason: String },
}

/// 模型调用错误
///
/// `Call` 表示网络/鉴权/服务端问题，`SchemaValidation` 表示提示词或模型输出问题，
/// 调用方需要区分这两类。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 网络、鉴权或服务端失败
    #[error("{provider} 调用失败: {message}")]
    Call { provider: String, message: String },
    /// 返回内容不符合结构化格式
    #[error("返回内容不符合结构化格式: {reason}")]
    SchemaValidation { reason: String, raw: String },
    /// 单次调用超时
    #[error("{provider} 调用超时 ({after:?})")]
    Timeout { provider: String, after: Duration },
    /// 批处理已取消
    #[error("调用已取消")]
    Cancelled,
}

impl ProviderError {
    /// 对应的失败类别
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Call { .. } => FailureKind::ProviderCall,
            ProviderError::SchemaValidation { .. } => FailureKind::SchemaValidation,
            ProviderError::Timeout { .. } => FailureKind::Timeout,
            ProviderError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn call(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ProviderError::Call {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    pub fn schema(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        ProviderError::SchemaValidation {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON 序列化失败: {}", err))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_map_to_distinct_kinds() {
        assert_eq!(
            ProviderError::call("groq", "503").kind(),
            FailureKind::ProviderCall
        );
        assert_eq!(
            ProviderError::schema("missing field `grade`", "{}").kind(),
            FailureKind::SchemaValidation
        );
        assert_eq!(ProviderError::Cancelled.kind(), FailureKind::Cancelled);
    }

    #[test]
    fn test_unsupported_mode_message_names_the_mode() {
        let err = AppError::from(ConfigError::UnsupportedMode {
            mode: "unknown".to_string(),
        });
        assert!(err.to_string().contains("unknown"));
    }
}
