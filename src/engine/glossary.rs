//! 词汇表同步
//!
//! 把设置中的术语表协调到远程服务：按语言对分组，删除旧的同名
//! 词汇表后重建，最后把语言对到远程ID的映射整体写回设置。
//! 同一时刻只允许一次同步在途。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::client::{DeeplApi, GlossaryRecord, GlossaryTermPair};
use crate::config::constants;
use crate::error::TranslationResult;
use crate::settings::{lang_pair_key, GlossaryIdMap};
use crate::store::SettingsStore;

/// 一次同步的结果汇总
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// 新建的词汇表数量（目标语言此前没有对应词汇表）
    pub created: usize,
    /// 重建的词汇表数量（删除旧表后新建）
    pub replaced: usize,
    /// 创建失败的语言对数量
    pub failed: usize,
    /// 成功同步的语言对键列表
    pub pairs: Vec<String>,
}

/// 词汇表协调器
pub struct GlossaryReconciler {
    provider: Arc<dyn DeeplApi>,
    settings_store: Arc<dyn SettingsStore>,
    source_lang: String,
    /// 同步互斥锁，保证单飞
    sync_lock: Mutex<()>,
}

impl GlossaryReconciler {
    pub fn new(
        provider: Arc<dyn DeeplApi>,
        settings_store: Arc<dyn SettingsStore>,
        source_lang: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            settings_store,
            source_lang: source_lang.into(),
            sync_lock: Mutex::new(()),
        }
    }

    /// 词汇表的确定性命名
    pub fn glossary_name(source_lang: &str, target_lang: &str) -> String {
        format!(
            "{} ({}-{})",
            constants::GLOSSARY_NAME_PREFIX,
            source_lang,
            target_lang
        )
    }

    /// 执行一次完整同步
    ///
    /// 术语表为空时直接返回空报告，不发起任何远程调用。
    /// 单个语言对的失败不影响其余语言对，失败的对不进入ID映射。
    pub async fn sync(&self) -> TranslationResult<SyncReport> {
        // 并发调用在此排队，后到者在前一次完成后执行
        let _guard = self.sync_lock.lock().await;

        let mut settings = self.settings_store.get_settings().await?;

        let target_langs = self.target_langs(&settings);
        if target_langs.is_empty() {
            tracing::debug!("术语表为空，跳过同步");
            return Ok(SyncReport::default());
        }

        // 列表失败降级为空列表：同步继续，只是无法删除旧表
        let existing = match self.provider.list_glossaries().await {
            Ok(glossaries) => glossaries,
            Err(error) => {
                tracing::warn!(error = %error, "获取远程词汇表列表失败，按空列表处理");
                Vec::new()
            }
        };

        let mut report = SyncReport::default();
        let mut new_ids = GlossaryIdMap::new();

        for target_lang in target_langs {
            let terms = settings.glossary_terms_for_pair(&target_lang);
            if terms.is_empty() {
                continue;
            }

            let entries: Vec<GlossaryTermPair> = terms
                .into_iter()
                .map(|(source, target)| GlossaryTermPair { source, target })
                .collect();

            let name = Self::glossary_name(&self.source_lang, &target_lang);
            let had_existing = self
                .delete_matching(&existing, &name, &target_lang)
                .await;

            match self
                .provider
                .create_glossary(&name, &self.source_lang, &target_lang, &entries)
                .await
            {
                Ok(record) => {
                    let pair = lang_pair_key(&self.source_lang, &target_lang);
                    tracing::info!(
                        pair = %pair,
                        glossary_id = %record.glossary_id,
                        entries = entries.len(),
                        replaced = had_existing,
                        "词汇表已同步"
                    );
                    new_ids.insert(pair.clone(), record.glossary_id);
                    report.pairs.push(pair);
                    if had_existing {
                        report.replaced += 1;
                    } else {
                        report.created += 1;
                    }
                }
                Err(error) => {
                    tracing::error!(
                        target_lang = %target_lang,
                        error = %error,
                        "词汇表创建失败，该语言对不进入映射"
                    );
                    report.failed += 1;
                }
            }
        }

        // 映射整体替换：失败或已移除的语言对自然从映射中消失
        settings.glossary_ids = new_ids;
        self.settings_store.update_settings(settings).await?;

        Ok(report)
    }

    /// 术语表覆盖的全部目标语言（排除基准源语言，按字典序去重）
    fn target_langs(&self, settings: &crate::settings::PluginSettings) -> Vec<String> {
        let mut langs: Vec<String> = settings
            .glossary
            .iter()
            .flat_map(|entry| entry.translations.keys().cloned())
            .filter(|lang| lang != &self.source_lang)
            .collect();
        langs.sort();
        langs.dedup();
        // 只保留至少有一条非空译文的语言
        langs.retain(|lang| !settings.glossary_terms_for_pair(lang).is_empty());
        langs
    }

    /// 删除与目标语言对同名的旧词汇表，返回是否存在旧表
    ///
    /// 删除失败只记录告警，随后的创建照常进行。
    async fn delete_matching(
        &self,
        existing: &[GlossaryRecord],
        name: &str,
        target_lang: &str,
    ) -> bool {
        let matches: Vec<&GlossaryRecord> = existing
            .iter()
            .filter(|record| {
                record.name == name
                    && record.source_lang.eq_ignore_ascii_case(&self.source_lang)
                    && record.target_lang.eq_ignore_ascii_case(target_lang)
            })
            .collect();

        let found = !matches.is_empty();
        for record in matches {
            if let Err(error) = self.provider.delete_glossary(&record.glossary_id).await {
                tracing::warn!(
                    glossary_id = %record.glossary_id,
                    error = %error,
                    "旧词汇表删除失败，继续创建新表"
                );
            }
        }
        found
    }
}
