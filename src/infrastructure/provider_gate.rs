//! 模型调用闸门 - 基础设施层
//!
//! 持有唯一的提供方资源，只暴露"发一次结构化调用"的能力

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::clients::StructuredChat;
use crate::error::ProviderError;
use crate::models::StructuredResult;

/// 模型调用闸门
///
/// 职责：
/// - 全局同一时刻最多一个调用在途（所有工作任务共用一把锁）
/// - 每次调用有截止时间，等锁和调用本身都响应取消
/// - 云端 A 在释放锁之后由发起调用的任务自己等待一段时间，不阻塞其他任务
/// - 不认识 Submission / Rubric
pub struct ProviderGate {
    provider: Arc<dyn StructuredChat>,
    lock: Mutex<()>,
    call_timeout: Duration,
    cancel: CancellationToken,
}

impl ProviderGate {
    /// 创建新的调用闸门
    pub fn new(
        provider: Arc<dyn StructuredChat>,
        call_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            provider,
            lock: Mutex::new(()),
            call_timeout,
            cancel,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// 串行地发送一次结构化调用
    pub async fn chat(&self, prompt: &str) -> Result<StructuredResult, ProviderError> {
        let guard = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ProviderError::Cancelled),
            guard = self.lock.lock() => guard,
        };

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ProviderError::Cancelled),
            outcome = tokio::time::timeout(self.call_timeout, self.provider.structured_chat(prompt)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout {
                        provider: self.provider.provider_name().to_string(),
                        after: self.call_timeout,
                    }),
                }
            }
        };

        drop(guard);

        if matches!(result, Err(ProviderError::Cancelled)) {
            return result;
        }

        if let Some(delay) = self.provider.post_call_delay().filter(|d| !d.is_zero()) {
            debug!("{} 调用后等待 {:?}", self.provider.provider_name(), delay);
            tokio::select! {
                _ = self.cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }

        result
    }
}
