//! 内存版协作方实现
//!
//! 供测试和嵌入式场景使用。实体存储支持跨语言环境链接的维护，
//! 但关联展开只实现 `localizations` 一层：深度展开由真实的
//! 持久化层负责，测试数据可以直接以展开后的形态写入。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::error::{TranslationError, TranslationResult};
use crate::settings::PluginSettings;
use crate::store::{
    Entity, EntityId, EntityStore, Locale, LocaleRegistry, ModelSchema, Populate, SettingsStore,
};

/// 内存实体存储
#[derive(Default)]
pub struct MemoryEntityStore {
    schemas: DashMap<String, ModelSchema>,
    /// (模型, 实体ID) → 实体
    entities: DashMap<(String, EntityId), Entity>,
    next_id: AtomicU64,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
            entities: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// 注册内容类型的模式
    pub fn register_model(&self, schema: ModelSchema) {
        self.schemas.insert(schema.uid.clone(), schema);
    }

    /// 以固定ID写入实体（测试数据播种用）
    pub fn seed(&self, model: &str, entity: Entity) {
        // 保证后续create分配的ID不与播种数据冲突
        self.next_id.fetch_max(entity.id + 1, Ordering::SeqCst);
        self.entities
            .insert((model.to_string(), entity.id), entity);
    }

    /// 将一组实体互相登记为同一内容的不同语言环境版本
    ///
    /// 模拟真实持久化层对跨语言环境链接的维护：每个成员的
    /// `localizations` 字段被设置为其余成员的 `{id, locale}` 列表。
    pub fn link_localizations(&self, model: &str, ids: &[EntityId]) {
        let members: Vec<(EntityId, String)> = ids
            .iter()
            .filter_map(|id| {
                self.entities
                    .get(&(model.to_string(), *id))
                    .map(|e| (e.id, e.locale.clone()))
            })
            .collect();

        for id in ids {
            if let Some(mut entry) = self.entities.get_mut(&(model.to_string(), *id)) {
                let links: Vec<Value> = members
                    .iter()
                    .filter(|(other, _)| other != id)
                    .map(|(other, locale)| {
                        serde_json::json!({ "id": other, "locale": locale })
                    })
                    .collect();
                entry.fields.insert(
                    "localizations".to_string(),
                    Value::Array(links),
                );
            }
        }
    }

    /// 某模型在指定语言环境下的实体数量
    pub fn count(&self, model: &str, locale: &str) -> usize {
        self.entities
            .iter()
            .filter(|entry| entry.key().0 == model && entry.value().locale == locale)
            .count()
    }

    fn build_entity(id: EntityId, mut data: Map<String, Value>) -> Entity {
        let locale = data
            .remove("locale")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Entity {
            id,
            locale,
            fields: data,
        }
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn find_one(
        &self,
        model: &str,
        id: EntityId,
        locale: Option<&str>,
        _populate: Populate,
    ) -> TranslationResult<Option<Entity>> {
        let entity = self.entities.get(&(model.to_string(), id));
        Ok(entity
            .map(|e| e.clone())
            .filter(|e| locale.map_or(true, |l| e.locale == l)))
    }

    async fn find_many(
        &self,
        model: &str,
        locale: &str,
        _populate: Populate,
    ) -> TranslationResult<Vec<Entity>> {
        let mut found: Vec<Entity> = self
            .entities
            .iter()
            .filter(|entry| entry.key().0 == model && entry.value().locale == locale)
            .map(|entry| entry.value().clone())
            .collect();
        // DashMap迭代顺序不稳定，按ID排序保证确定性
        found.sort_by_key(|e| e.id);
        Ok(found)
    }

    async fn create(&self, model: &str, data: Map<String, Value>) -> TranslationResult<Entity> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entity = Self::build_entity(id, data);
        self.entities
            .insert((model.to_string(), id), entity.clone());
        Ok(entity)
    }

    async fn update(
        &self,
        model: &str,
        id: EntityId,
        data: Map<String, Value>,
    ) -> TranslationResult<Entity> {
        let mut entry = self
            .entities
            .get_mut(&(model.to_string(), id))
            .ok_or_else(|| TranslationError::NotFound {
                model: model.to_string(),
                id,
            })?;

        for (key, value) in data {
            if key == "locale" {
                if let Some(locale) = value.as_str() {
                    entry.locale = locale.to_string();
                }
            } else {
                entry.fields.insert(key, value);
            }
        }
        Ok(entry.clone())
    }

    fn schema(&self, model: &str) -> Option<ModelSchema> {
        self.schemas.get(model).map(|s| s.clone())
    }
}

/// 内存设置存储
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<PluginSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: PluginSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_settings(&self) -> TranslationResult<PluginSettings> {
        Ok(self.settings.lock().await.clone())
    }

    async fn update_settings(&self, settings: PluginSettings) -> TranslationResult<()> {
        *self.settings.lock().await = settings;
        Ok(())
    }
}

/// 内存语言环境注册表
pub struct MemoryLocaleRegistry {
    locales: Vec<Locale>,
}

impl MemoryLocaleRegistry {
    pub fn new(codes: &[(&str, &str)]) -> Self {
        Self {
            locales: codes
                .iter()
                .map(|(code, name)| Locale {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LocaleRegistry for MemoryLocaleRegistry {
    async fn list_locales(&self) -> TranslationResult<Vec<Locale>> {
        Ok(self.locales.clone())
    }
}
