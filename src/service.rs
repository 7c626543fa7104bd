//! 翻译编排服务
//!
//! 对外的统一门面：持有全部协作方的注入句柄，负责输入验证、
//! 设置快照的获取，并把调用分派到引擎各层。服务自身无可变
//! 状态，可安全地跨任务共享。

use std::sync::Arc;

use crate::client::retry::{RetryPolicy, RetryingProvider};
use crate::client::{DeeplApi, DeeplClient, LanguageInfo};
use crate::config::manager::EngineConfig;
use crate::engine::batch::{self, BatchDriver, BatchResult};
use crate::engine::glossary::{GlossaryReconciler, SyncReport};
use crate::engine::resolver::UpsertResolver;
use crate::error::{TranslationError, TranslationResult};
use crate::store::{Entity, EntityId, EntityStore, LocaleRegistry, Populate, SettingsStore};

/// 语言环境扇出中单个目标的结果
#[derive(Debug)]
pub struct LocaleOutcome {
    pub locale: String,
    pub result: TranslationResult<Entity>,
}

/// 翻译编排服务
pub struct LocalizeService {
    provider: Arc<dyn DeeplApi>,
    entities: Arc<dyn EntityStore>,
    settings: Arc<dyn SettingsStore>,
    locales: Arc<dyn LocaleRegistry>,
    config: EngineConfig,
    reconciler: GlossaryReconciler,
}

impl LocalizeService {
    /// 以注入的翻译服务构造（测试和自定义提供方）
    ///
    /// 注入的提供方被统一套上重试装饰，可重试错误按配置的退避
    /// 策略自动重试。
    pub fn new(
        provider: Arc<dyn DeeplApi>,
        entities: Arc<dyn EntityStore>,
        settings: Arc<dyn SettingsStore>,
        locales: Arc<dyn LocaleRegistry>,
        config: EngineConfig,
    ) -> Self {
        let provider: Arc<dyn DeeplApi> = Arc::new(RetryingProvider::new(
            provider,
            RetryPolicy::from_config(&config),
        ));
        let reconciler = GlossaryReconciler::new(
            Arc::clone(&provider),
            Arc::clone(&settings),
            config.glossary_source_lang.clone(),
        );
        Self {
            provider,
            entities,
            settings,
            locales,
            config,
            reconciler,
        }
    }

    /// 从设置中的凭证构建DeepL客户端并组装服务
    pub async fn connect(
        entities: Arc<dyn EntityStore>,
        settings: Arc<dyn SettingsStore>,
        locales: Arc<dyn LocaleRegistry>,
        config: EngineConfig,
    ) -> TranslationResult<Self> {
        let snapshot = settings.get_settings().await?;
        let client = DeeplClient::new(snapshot.api_key, &config)?;
        Ok(Self::new(
            Arc::new(client),
            entities,
            settings,
            locales,
            config,
        ))
    }

    /// 把单个实体翻译到目标语言环境并幂等落库
    ///
    /// `source_locale` 未指定时按默认源语言环境读取源实体。
    pub async fn translate_content(
        &self,
        model: &str,
        id: EntityId,
        target_locale: &str,
        source_locale: Option<&str>,
    ) -> TranslationResult<Entity> {
        batch::validate_id(id)?;
        batch::validate_model(model, self.entities.as_ref())?;
        batch::validate_locale(target_locale)?;
        if let Some(source) = source_locale {
            batch::validate_locale(source)?;
        }

        let settings = self.settings.get_settings().await?;
        let resolver =
            UpsertResolver::new(self.provider.as_ref(), self.entities.as_ref(), &self.config);
        resolver
            .translate_content(model, id, target_locale, source_locale, &settings)
            .await
    }

    /// 批量翻译，失败隔离，结果顺序与输入一致
    pub async fn translate_batch(
        &self,
        model: &str,
        ids: &[EntityId],
        target_locale: &str,
        source_locale: Option<&str>,
    ) -> TranslationResult<BatchResult> {
        let settings = self.settings.get_settings().await?;
        let driver =
            BatchDriver::new(self.provider.as_ref(), self.entities.as_ref(), &self.config);
        driver
            .translate_batch(model, ids, target_locale, source_locale, &settings)
            .await
    }

    /// 把实体翻译到除源语言环境外的全部已注册语言环境
    ///
    /// 每个目标独立成败，单个目标的失败不影响其余目标。
    pub async fn translate_to_all_locales(
        &self,
        model: &str,
        id: EntityId,
    ) -> TranslationResult<Vec<LocaleOutcome>> {
        batch::validate_id(id)?;
        batch::validate_model(model, self.entities.as_ref())?;

        let source = self
            .entities
            .find_one(model, id, None, Populate::Localizations)
            .await?
            .ok_or_else(|| TranslationError::NotFound {
                model: model.to_string(),
                id,
            })?;

        let settings = self.settings.get_settings().await?;
        let resolver =
            UpsertResolver::new(self.provider.as_ref(), self.entities.as_ref(), &self.config);

        let mut outcomes = Vec::new();
        for locale in self.locales.list_locales().await? {
            if locale.code == source.locale {
                continue;
            }
            let result = resolver
                .translate_content(model, id, &locale.code, Some(&source.locale), &settings)
                .await;
            if let Err(error) = &result {
                tracing::warn!(
                    model,
                    id,
                    locale = %locale.code,
                    error = %error,
                    "目标语言环境翻译失败"
                );
            }
            outcomes.push(LocaleOutcome {
                locale: locale.code,
                result,
            });
        }

        Ok(outcomes)
    }

    /// 查询翻译服务支持的目标语言
    pub async fn available_languages(&self) -> TranslationResult<Vec<LanguageInfo>> {
        self.provider.list_target_languages().await
    }

    /// 同步词汇表到远程服务
    pub async fn sync_glossaries(&self) -> TranslationResult<SyncReport> {
        self.reconciler.sync().await
    }

    /// 列出远程词汇表；失败时降级为空列表
    pub async fn list_glossaries(&self) -> Vec<crate::client::GlossaryRecord> {
        match self.provider.list_glossaries().await {
            Ok(glossaries) => glossaries,
            Err(error) => {
                tracing::warn!(error = %error, "获取词汇表列表失败，返回空列表");
                Vec::new()
            }
        }
    }

    /// 当前生效的引擎配置
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
