//! 插件设置快照类型
//!
//! 这些类型由设置存储协作方持久化，引擎在每次编排调用开始时
//! 获取一份快照并在整个调用期间把它当作不可变数据使用。
//! 字段名采用camelCase以匹配管理端的线上格式。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 语言对到远程词汇表ID的映射，键形如 `"en_de"`
///
/// 每次词汇表同步都会整体重建该映射，从不部分修补。
pub type GlossaryIdMap = BTreeMap<String, String>;

/// 构造语言对键，例如 `("en", "DE")` → `"en_de"`
pub fn lang_pair_key(source_lang: &str, target_lang: &str) -> String {
    format!(
        "{}_{}",
        source_lang.to_lowercase(),
        target_lang.to_lowercase()
    )
}

/// 插件设置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginSettings {
    /// DeepL API凭证；以 `:fx` 结尾表示受限层级（免费）凭证
    pub api_key: String,

    /// 全局自动翻译开关
    pub auto_translate: bool,

    /// 各内容类型的独立配置，键为模型标识（如 `api::article.article`）
    pub content_types: BTreeMap<String, ContentTypeConfig>,

    /// 期望的词汇表条目列表
    pub glossary: Vec<GlossaryEntry>,

    /// 最近一次词汇表同步产出的远程ID映射
    pub glossary_ids: GlossaryIdMap,
}

impl PluginSettings {
    /// 获取指定内容类型的配置，未配置时返回默认值
    pub fn content_type(&self, model: &str) -> ContentTypeConfig {
        self.content_types.get(model).cloned().unwrap_or_default()
    }

    /// 查询某语言对对应的远程词汇表ID
    pub fn glossary_id_for_pair(&self, source_lang: &str, target_lang: &str) -> Option<&str> {
        self.glossary_ids
            .get(&lang_pair_key(source_lang, target_lang))
            .map(String::as_str)
    }

    /// 按目标语言提取术语映射（term → translation），跳过空译文
    pub fn glossary_terms_for_pair(&self, target_lang: &str) -> BTreeMap<String, String> {
        let mut terms = BTreeMap::new();
        for entry in &self.glossary {
            if let Some(translation) = entry.translations.get(target_lang) {
                if !translation.trim().is_empty() {
                    terms.insert(entry.term.clone(), translation.clone());
                }
            }
        }
        terms
    }
}

/// 单个内容类型的翻译配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentTypeConfig {
    /// 是否为该内容类型启用翻译
    pub enabled: bool,

    /// 用户配置的排除字段列表，与系统字段合并后生效
    pub ignored_fields: Vec<String>,

    /// 是否在实体变更时自动翻译
    pub auto_translate: bool,
}

/// 词汇表条目：一个术语及其到各目标语言的固定译法
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    /// 目标语言代码 → 译文
    #[serde(default)]
    pub translations: BTreeMap<String, String>,
}
