//! 单实体翻译与幂等落库
//!
//! 把一个源实体翻译到目标语言环境并写回存储：目标语言环境下
//! 已存在与源链接的记录时更新，否则创建。重复调用收敛到同一条
//! 目标记录，不产生重复。

use std::time::Instant;

use serde_json::{Map, Value};

use crate::client::DeeplApi;
use crate::config::constants;
use crate::config::manager::EngineConfig;
use crate::engine::exclusion::FieldExclusionSet;
use crate::engine::fields::FieldTranslator;
use crate::error::{TranslationError, TranslationResult};
use crate::settings::PluginSettings;
use crate::store::{Entity, EntityId, EntityStore, ModelSchema, Populate};

/// 幂等翻译落库器
pub struct UpsertResolver<'a> {
    provider: &'a dyn DeeplApi,
    entities: &'a dyn EntityStore,
    config: &'a EngineConfig,
}

impl<'a> UpsertResolver<'a> {
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

    /// 把源实体翻译到目标语言环境并落库
    ///
    /// 源语言环境未指定时按默认值读取，实体在该语言环境下不存在
    /// 即为NotFound。流程：取源实体 → 构造排除集合 → 结构保持翻译 →
    /// 从未翻译的源字段重建关系引用 → 按跨语言环境链接查找既有目标 →
    /// 更新或创建。
    pub async fn translate_content(
        &self,
        model: &str,
        id: EntityId,
        target_locale: &str,
        source_locale: Option<&str>,
        settings: &PluginSettings,
    ) -> TranslationResult<Entity> {
        let started = Instant::now();

        let source_locale = source_locale.unwrap_or(constants::DEFAULT_SOURCE_LOCALE);
        if source_locale == target_locale {
            return Err(TranslationError::Validation(format!(
                "目标语言环境与源相同: {}",
                target_locale
            )));
        }

        let source = self
            .entities
            .find_one(model, id, Some(source_locale), Populate::Deep)
            .await?
            .ok_or_else(|| TranslationError::NotFound {
                model: model.to_string(),
                id,
            })?;

        let glossary_id = settings
            .glossary_id_for_pair(source_locale, target_locale)
            .map(str::to_string);

        let exclusions = FieldExclusionSet::from_settings(settings, model);
        let translator = FieldTranslator::new(
            self.provider,
            target_locale,
            Some(source_locale),
            glossary_id.as_deref(),
            &exclusions,
            self.config.array_concurrency,
        );

        let mut payload = translator.translate_map(&source.fields).await?;

        // 标识与跨语言环境链接不得写入新记录：标识由存储分配，
        // 链接由持久化层维护
        payload.remove("id");
        payload.remove("localizations");

        if let Some(schema) = self.entities.schema(model) {
            rebuild_relations(&mut payload, &source.fields, &schema);
        }

        payload.insert(
            "locale".to_string(),
            Value::String(target_locale.to_string()),
        );

        let existing = self.find_linked_target(model, id, target_locale).await?;

        let result = match existing {
            Some(target) => {
                tracing::debug!(
                    model,
                    source_id = id,
                    target_id = target.id,
                    locale = target_locale,
                    "更新既有目标记录"
                );
                self.entities.update(model, target.id, payload).await?
            }
            None => {
                tracing::debug!(model, source_id = id, locale = target_locale, "创建目标记录");
                self.entities.create(model, payload).await?
            }
        };

        tracing::info!(
            model,
            source_id = id,
            target_id = result.id,
            locale = target_locale,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "实体翻译完成"
        );

        Ok(result)
    }

    /// 在目标语言环境中查找与源实体链接的既有记录
    async fn find_linked_target(
        &self,
        model: &str,
        source_id: EntityId,
        target_locale: &str,
    ) -> TranslationResult<Option<Entity>> {
        let candidates = self
            .entities
            .find_many(model, target_locale, Populate::Localizations)
            .await?;
        Ok(candidates
            .into_iter()
            .find(|entity| entity.localization_ids().contains(&source_id)))
    }
}

/// 用未翻译的源字段重建关系引用
///
/// 关系指向的是语言环境无关的记录，译文中的关系值一律替换为
/// 源实体中的裸ID形式，防止展开后的对象被当作新内容写入。
fn rebuild_relations(
    payload: &mut Map<String, Value>,
    source_fields: &Map<String, Value>,
    schema: &ModelSchema,
) {
    for field in schema.relation_fields() {
        let Some(source_value) = source_fields.get(field) else {
            payload.remove(field);
            continue;
        };
        match relation_as_ids(source_value) {
            Some(ids) => {
                payload.insert(field.to_string(), ids);
            }
            None => {
                payload.remove(field);
            }
        }
    }
}

/// 把关系值规整为裸ID形式
///
/// 单值关系产出数字，多值关系产出数字数组；无法辨认的形态返回None。
fn relation_as_ids(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::Object(map) => map.get("id").cloned().filter(Value::is_number),
        Value::Array(items) => {
            let ids: Vec<Value> = items.iter().filter_map(relation_as_ids).collect();
            Some(Value::Array(ids))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    use crate::store::AttributeKind;

    fn article_schema() -> ModelSchema {
        let mut attributes = BTreeMap::new();
        attributes.insert("title".to_string(), AttributeKind::String);
        attributes.insert("author".to_string(), AttributeKind::Relation);
        attributes.insert("tags".to_string(), AttributeKind::Relation);
        ModelSchema {
            uid: "api::article.article".to_string(),
            localized: true,
            attributes,
        }
    }

    #[test]
    fn relations_collapse_to_bare_ids() {
        let schema = article_schema();
        let source = match json!({
            "title": "Hello",
            "author": { "id": 7, "__type": "api::author.author", "name": "Ada" },
            "tags": [ { "id": 1 }, 2, { "name": "no id" } ]
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut payload = source.clone();

        rebuild_relations(&mut payload, &source, &schema);

        assert_eq!(payload["author"], json!(7));
        assert_eq!(payload["tags"], json!([1, 2]));
        assert_eq!(payload["title"], "Hello");
    }

    #[test]
    fn absent_relations_are_dropped_from_the_payload() {
        let schema = article_schema();
        let source = match json!({ "title": "Hello" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let mut payload = source.clone();
        payload.insert("author".to_string(), json!({ "stale": true }));

        rebuild_relations(&mut payload, &source, &schema);

        assert!(payload.get("author").is_none());
    }
}
