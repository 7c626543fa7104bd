//! 批量翻译驱动
//!
//! 先验证整个批次（大小上限、ID、模型、语言环境），再以有界并发
//! 逐实体翻译。单个实体的失败被隔离为结果条目，不影响批内其他
//! 实体；结果顺序与输入顺序一致。

use std::sync::Arc;
use std::sync::OnceLock;

use futures::future::join_all;
use regex::Regex;
use serde::Serialize;
use tokio::sync::Semaphore;

use crate::client::DeeplApi;
use crate::config::constants;
use crate::config::manager::EngineConfig;
use crate::engine::resolver::UpsertResolver;
use crate::error::{TranslationError, TranslationResult};
use crate::settings::PluginSettings;
use crate::store::{Entity, EntityId, EntityStore};

/// 批量调用的总体结果
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// 与输入顺序一一对应的条目结果
    pub results: Vec<BatchItemResult>,
}

/// 单个实体的批内结果
#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub id: EntityId,
    #[serde(flatten)]
    pub status: BatchItemStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItemStatus {
    Success { data: Entity },
    Failed { error: String },
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, BatchItemStatus::Success { .. })
    }
}

fn model_uid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(api|plugin)::[a-z0-9-]+\.[a-z0-9-]+$").unwrap())
}

fn locale_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[A-Z]{2})?$").unwrap())
}

/// 验证实体ID为正整数
pub fn validate_id(id: EntityId) -> TranslationResult<()> {
    if id == 0 {
        return Err(TranslationError::Validation(
            "实体ID必须为正整数".to_string(),
        ));
    }
    Ok(())
}

/// 验证语言环境代码格式，如 `de` 或 `pt-BR`
pub fn validate_locale(locale: &str) -> TranslationResult<()> {
    if !locale_regex().is_match(locale) {
        return Err(TranslationError::Validation(format!(
            "语言环境代码格式非法: {}",
            locale
        )));
    }
    Ok(())
}

/// 验证模型标识格式并确认模型已注册且启用了多语言环境
pub fn validate_model(model: &str, entities: &dyn EntityStore) -> TranslationResult<()> {
    if !model_uid_regex().is_match(model) {
        return Err(TranslationError::Validation(format!(
            "模型标识格式非法: {}",
            model
        )));
    }

    let schema = entities.schema(model).ok_or_else(|| {
        TranslationError::Validation(format!("模型未注册: {}", model))
    })?;

    if !schema.localized {
        return Err(TranslationError::Validation(format!(
            "模型未启用多语言环境: {}",
            model
        )));
    }

    Ok(())
}

/// 验证整个批次的参数
pub fn validate_batch(
    model: &str,
    ids: &[EntityId],
    target_locale: &str,
    source_locale: Option<&str>,
    entities: &dyn EntityStore,
) -> TranslationResult<()> {
    if ids.is_empty() {
        return Err(TranslationError::Validation("批次不能为空".to_string()));
    }

    if ids.len() > constants::MAX_BATCH_SIZE {
        return Err(TranslationError::Validation(format!(
            "批次大小超过上限: {} > {}",
            ids.len(),
            constants::MAX_BATCH_SIZE
        )));
    }

    for id in ids {
        validate_id(*id)?;
    }

    validate_model(model, entities)?;
    validate_locale(target_locale)?;
    if let Some(source) = source_locale {
        validate_locale(source)?;
    }

    Ok(())
}

/// 批量翻译驱动器
pub struct BatchDriver<'a> {
    provider: &'a dyn DeeplApi,
    entities: &'a dyn EntityStore,
    config: &'a EngineConfig,
}

impl<'a> BatchDriver<'a> {
    pub fn new(
        provider: &'a dyn DeeplApi,
        entities: &'a dyn EntityStore,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            provider,
            entities,
            config,
        }
    }

    /// 翻译一个批次
    ///
    /// 验证失败时整体拒绝，任何实体都不开始翻译；验证通过后
    /// 单实体失败只影响对应条目。
    pub async fn translate_batch(
        &self,
        model: &str,
        ids: &[EntityId],
        target_locale: &str,
        source_locale: Option<&str>,
        settings: &PluginSettings,
    ) -> TranslationResult<BatchResult> {
        validate_batch(model, ids, target_locale, source_locale, self.entities)?;

        tracing::info!(
            model,
            count = ids.len(),
            locale = target_locale,
            "开始批量翻译"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_translations));
        let resolver = UpsertResolver::new(self.provider, self.entities, self.config);

        // join_all按顺序收集，结果与输入一一对应
        let futures = ids.iter().map(|&id| {
            let semaphore = Arc::clone(&semaphore);
            let resolver = &resolver;
            async move {
                // Semaphore只会在关闭时acquire失败，这里从不关闭
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| TranslationError::Internal(e.to_string()))?;
                resolver
                    .translate_content(model, id, target_locale, source_locale, settings)
                    .await
            }
        });

        let outcomes = join_all(futures).await;

        let results: Vec<BatchItemResult> = ids
            .iter()
            .zip(outcomes)
            .map(|(&id, outcome)| match outcome {
                Ok(entity) => BatchItemResult {
                    id,
                    status: BatchItemStatus::Success { data: entity },
                },
                Err(error) => {
                    tracing::warn!(model, id, error = %error, "批内实体翻译失败");
                    BatchItemResult {
                        id,
                        status: BatchItemStatus::Failed {
                            error: error.to_string(),
                        },
                    }
                }
            })
            .collect();

        let successful = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - successful;

        tracing::info!(model, total = results.len(), successful, failed, "批量翻译完成");

        Ok(BatchResult {
            total: results.len(),
            successful,
            failed,
            results,
        })
    }
}
