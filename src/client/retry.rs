//! 指数退避重试
//!
//! 远程调用的统一重试循环：可重试错误按 `初始延迟 × 2^尝试次数`
//! 退避，叠加随机抖动避免并发重试同步化；终止性错误立即上抛。
//! 整个循环受可选的截止时间约束，超出后以 `Timeout` 中止。
//! [`RetryingProvider`] 把该循环套在任意翻译服务实现之上。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time::Instant;

use crate::client::{
    DeeplApi, GlossaryRecord, GlossaryTermPair, LanguageInfo, TranslationRequest,
};
use crate::config::manager::EngineConfig;
use crate::error::{TranslationError, TranslationResult};

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次）
    pub max_attempts: usize,
    pub initial_delay: Duration,
    /// 在退避延迟上叠加 [0.5, 1.0) 的随机缩放
    pub jitter: bool,
    /// 整体截止时间，None表示不限制
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts,
            initial_delay: config.retry_initial_delay(),
            jitter: config.retry_jitter,
            deadline: config.call_deadline(),
        }
    }

    /// 第 `attempt` 次失败后的退避延迟（attempt从0开始）
    pub fn backoff_delay(&self, attempt: usize) -> Duration {
        let base = self.initial_delay.saturating_mul(1u32 << attempt.min(16));
        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..1.0);
            base.mul_f64(factor)
        } else {
            base
        }
    }
}

/// 以退避方式重复执行远程操作
///
/// - 终止性错误（验证失败、4xx等）立即返回，不消耗剩余尝试；
/// - 达到最大尝试次数后原样返回最后一次的错误；
/// - 每次休眠前检查截止时间，不足以等待下一次尝试时返回 `Timeout`。
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> TranslationResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TranslationResult<T>>,
{
    let started = Instant::now();

    for attempt in 0..policy.max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "重试后成功"
                    );
                }
                return Ok(value);
            }
            Err(error) if !error.is_retryable() => {
                tracing::debug!(
                    operation = operation_name,
                    error = %error,
                    "终止性错误，放弃重试"
                );
                return Err(error);
            }
            Err(error) => {
                let is_last = attempt + 1 >= policy.max_attempts;
                if is_last {
                    tracing::warn!(
                        operation = operation_name,
                        attempts = policy.max_attempts,
                        error = %error,
                        "重试次数耗尽"
                    );
                    return Err(error);
                }

                let delay = policy.backoff_delay(attempt);
                if let Some(deadline) = policy.deadline {
                    if started.elapsed() + delay >= deadline {
                        tracing::warn!(
                            operation = operation_name,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "截止时间不足以等待下一次尝试"
                        );
                        return Err(TranslationError::Timeout(format!(
                            "{} 在截止时间内未能完成",
                            operation_name
                        )));
                    }
                }

                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "操作失败，退避后重试"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    // max_attempts经过配置验证不为0，循环必定返回
    Err(TranslationError::Internal(format!(
        "{} 重试循环异常退出",
        operation_name
    )))
}

/// 为任意翻译服务实现叠加统一重试的装饰器
///
/// 引擎只面对这个包装后的句柄，重试语义与具体实现解耦，
/// 注入mock时同样生效。
pub struct RetryingProvider {
    inner: Arc<dyn DeeplApi>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn DeeplApi>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl DeeplApi for RetryingProvider {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        retry_with_backoff(&self.policy, "translate", || self.inner.translate(request)).await
    }

    async fn list_target_languages(&self) -> TranslationResult<Vec<LanguageInfo>> {
        retry_with_backoff(&self.policy, "list_target_languages", || {
            self.inner.list_target_languages()
        })
        .await
    }

    async fn list_glossaries(&self) -> TranslationResult<Vec<GlossaryRecord>> {
        retry_with_backoff(&self.policy, "list_glossaries", || {
            self.inner.list_glossaries()
        })
        .await
    }

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[GlossaryTermPair],
    ) -> TranslationResult<GlossaryRecord> {
        retry_with_backoff(&self.policy, "create_glossary", || {
            self.inner
                .create_glossary(name, source_lang, target_lang, entries)
        })
        .await
    }

    async fn delete_glossary(&self, glossary_id: &str) -> TranslationResult<()> {
        retry_with_backoff(&self.policy, "delete_glossary", || {
            self.inner.delete_glossary(glossary_id)
        })
        .await
    }
}
