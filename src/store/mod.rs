//! 协作方边界
//!
//! 引擎通过这里定义的trait与外部世界交互：实体存储、设置存储和
//! 语言环境注册表。引擎不持有任何隐式全局状态，所有协作方都以
//! 注入的trait对象出现，便于用内存实现进行测试。

pub mod memory;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TranslationResult;
use crate::settings::PluginSettings;

/// 实体的稳定标识
pub type EntityId = u64;

/// 一条结构化内容记录：字段树加上语言环境标签和稳定标识
///
/// 引擎只读取实体并产出派生副本，从不原地修改源实体。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub locale: String,
    /// 内容字段树；键顺序在整个流水线中保持不变
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// 提取跨语言环境链接集合中引用的实体ID
    ///
    /// 兼容两种存储形态：裸ID数组和 `{id, locale}` 对象数组。
    pub fn localization_ids(&self) -> Vec<EntityId> {
        let Some(Value::Array(items)) = self.fields.get("localizations") else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::Number(n) => n.as_u64(),
                Value::Object(map) => map.get("id").and_then(Value::as_u64),
                _ => None,
            })
            .collect()
    }
}

/// 字段属性的类型
///
/// 穷尽列出模型注册表可能声明的字段种类，新增种类时编译器会
/// 强制所有match点补齐分支。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Json,
    Component,
    Media,
    Relation,
}

impl AttributeKind {
    pub fn is_relation(&self) -> bool {
        matches!(self, AttributeKind::Relation)
    }
}

/// 内容类型的模式描述
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSchema {
    /// 模型标识，形如 `api::article.article`
    pub uid: String,
    /// 该内容类型是否启用了多语言环境
    pub localized: bool,
    pub attributes: BTreeMap<String, AttributeKind>,
}

impl ModelSchema {
    /// 列出所有关系类型的字段名
    pub fn relation_fields(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, kind)| kind.is_relation())
            .map(|(name, _)| name.as_str())
    }
}

/// 查询时的关联展开级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Populate {
    /// 不展开任何关联
    None,
    /// 仅展开跨语言环境链接
    Localizations,
    /// 深度展开全部关联
    Deep,
}

/// 实体存储协作方
///
/// 对应持久化层的最小读写接口。模式注册表也挂在这里，因为
/// 实体的字段种类由存储方声明。
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 按ID查找实体；`locale` 给定时要求语言环境匹配
    async fn find_one(
        &self,
        model: &str,
        id: EntityId,
        locale: Option<&str>,
        populate: Populate,
    ) -> TranslationResult<Option<Entity>>;

    /// 列出某语言环境下的全部实体
    async fn find_many(
        &self,
        model: &str,
        locale: &str,
        populate: Populate,
    ) -> TranslationResult<Vec<Entity>>;

    /// 创建实体，返回带新ID的完整记录
    async fn create(&self, model: &str, data: Map<String, Value>) -> TranslationResult<Entity>;

    /// 更新实体，返回更新后的完整记录
    async fn update(
        &self,
        model: &str,
        id: EntityId,
        data: Map<String, Value>,
    ) -> TranslationResult<Entity>;

    /// 查询模型的模式描述，未注册的模型返回None
    fn schema(&self, model: &str) -> Option<ModelSchema>;
}

/// 设置存储协作方
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self) -> TranslationResult<PluginSettings>;
    async fn update_settings(&self, settings: PluginSettings) -> TranslationResult<()>;
}

/// 一个已注册的语言环境
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locale {
    pub code: String,
    pub name: String,
}

/// 语言环境注册表协作方
#[async_trait]
pub trait LocaleRegistry: Send + Sync {
    async fn list_locales(&self) -> TranslationResult<Vec<Locale>>;
}
