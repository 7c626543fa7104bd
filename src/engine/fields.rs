//! 结构保持的字段翻译
//!
//! 递归遍历内容字段树，只替换字符串叶子的文本，其余一切——
//! 键名、键顺序、数组顺序、嵌套层级、非字符串标量——原样保留。
//! 关系引用对象整体跳过，数组元素以有界并发翻译。

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{Map, Value};

use crate::client::{DeeplApi, TranslationRequest};
use crate::config::constants;
use crate::engine::exclusion::FieldExclusionSet;
use crate::error::TranslationResult;

/// 字段翻译器
///
/// 持有一次编排调用期间不变的翻译参数，对字段树做结构保持的
/// 深度翻译。
pub struct FieldTranslator<'a> {
    provider: &'a dyn DeeplApi,
    target_lang: &'a str,
    source_lang: Option<&'a str>,
    glossary_id: Option<&'a str>,
    exclusions: &'a FieldExclusionSet,
    array_concurrency: usize,
}

impl<'a> FieldTranslator<'a> {
    pub fn new(
        provider: &'a dyn DeeplApi,
        target_lang: &'a str,
        source_lang: Option<&'a str>,
        glossary_id: Option<&'a str>,
        exclusions: &'a FieldExclusionSet,
        array_concurrency: usize,
    ) -> Self {
        Self {
            provider,
            target_lang,
            source_lang,
            glossary_id,
            exclusions,
            array_concurrency: array_concurrency.max(1),
        }
    }

    /// 翻译顶层字段映射
    ///
    /// 逐键处理以保持键顺序；排除字段和关系引用原样拷贝。
    pub async fn translate_map(
        &self,
        fields: &Map<String, Value>,
    ) -> TranslationResult<Map<String, Value>> {
        let mut output = Map::with_capacity(fields.len());
        for (key, value) in fields {
            if self.exclusions.contains(key) {
                output.insert(key.clone(), value.clone());
                continue;
            }
            output.insert(key.clone(), self.translate_value(value).await?);
        }
        Ok(output)
    }

    /// 递归翻译单个值
    ///
    /// 异步递归需要装箱的Future，Box::pin在此处拆开递归环。
    pub fn translate_value<'b>(
        &'b self,
        value: &'b Value,
    ) -> BoxFuture<'b, TranslationResult<Value>> {
        Box::pin(async move {
            match value {
                Value::String(text) => self.translate_text(text).await,
                Value::Array(items) => {
                    // 先收集装箱的future再buffered，保证输出顺序与输入一致
                    let futures: Vec<_> = items
                        .iter()
                        .map(|item| self.translate_value(item))
                        .collect();
                    let translated: Vec<Value> = stream::iter(futures)
                        .buffered(self.array_concurrency)
                        .try_collect()
                        .await?;
                    Ok(Value::Array(translated))
                }
                Value::Object(map) => {
                    if is_relation_reference(map) {
                        return Ok(Value::Object(map.clone()));
                    }
                    let translated = self.translate_map(map).await?;
                    Ok(Value::Object(translated))
                }
                // 数字、布尔和null不含可翻译文本
                other => Ok(other.clone()),
            }
        })
    }

    /// 翻译字符串叶子；去除首尾空白后为空的串不发起远程调用
    async fn translate_text(&self, text: &str) -> TranslationResult<Value> {
        if text.trim().is_empty() {
            return Ok(Value::String(text.to_string()));
        }

        let request = TranslationRequest {
            text: text.to_string(),
            target_lang: self.target_lang.to_string(),
            source_lang: self.source_lang.map(str::to_string),
            glossary_id: self.glossary_id.map(str::to_string),
        };
        let translated = self.provider.translate(&request).await?;
        Ok(Value::String(translated))
    }
}

/// 判断对象是否为关系引用
///
/// 同时带有标识字段和类型判别字段的对象指向另一条记录，
/// 其内容属于被引用方，不在此处翻译。
pub fn is_relation_reference(map: &Map<String, Value>) -> bool {
    map.contains_key(constants::RELATION_ID_FIELD)
        && map.contains_key(constants::RELATION_TYPE_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockProvider;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {:?}", other),
        }
    }

    fn translator<'a>(
        provider: &'a MockProvider,
        exclusions: &'a FieldExclusionSet,
    ) -> FieldTranslator<'a> {
        FieldTranslator::new(provider, "de", Some("en"), None, exclusions, 4)
    }

    #[tokio::test]
    async fn strings_are_translated_and_scalars_kept() {
        let provider = MockProvider::new();
        let exclusions = FieldExclusionSet::system_only();
        let fields = as_map(json!({
            "title": "Hello",
            "views": 42,
            "published": true,
            "subtitle": null
        }));

        let result = translator(&provider, &exclusions)
            .translate_map(&fields)
            .await
            .unwrap();

        assert_eq!(result["title"], "[de] Hello");
        assert_eq!(result["views"], 42);
        assert_eq!(result["published"], true);
        assert_eq!(result["subtitle"], Value::Null);
    }

    #[tokio::test]
    async fn key_order_and_array_order_are_preserved() {
        let provider = MockProvider::new();
        let exclusions = FieldExclusionSet::system_only();
        let fields = as_map(json!({
            "zeta": "one",
            "alpha": "two",
            "items": ["a", "b", "c"]
        }));

        let result = translator(&provider, &exclusions)
            .translate_map(&fields)
            .await
            .unwrap();

        let keys: Vec<&String> = result.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "items"]);
        assert_eq!(result["items"], json!(["[de] a", "[de] b", "[de] c"]));
    }

    #[tokio::test]
    async fn excluded_fields_pass_through_at_any_depth() {
        let provider = MockProvider::new();
        let mut exclusions = FieldExclusionSet::system_only();
        exclusions.insert("slug");

        let fields = as_map(json!({
            "title": "Hello",
            "slug": "hello-world",
            "nested": { "slug": "inner-slug", "body": "Text" }
        }));

        let result = translator(&provider, &exclusions)
            .translate_map(&fields)
            .await
            .unwrap();

        assert_eq!(result["slug"], "hello-world");
        assert_eq!(result["nested"]["slug"], "inner-slug");
        assert_eq!(result["nested"]["body"], "[de] Text");
    }

    #[tokio::test]
    async fn arrays_of_objects_recurse_with_order_intact() {
        let provider = MockProvider::new();
        let exclusions = FieldExclusionSet::system_only();
        let fields = as_map(json!({
            "sections": [
                { "heading": "First", "items": ["a", ["nested", "deeper"]] },
                { "heading": "Second", "items": [] }
            ]
        }));

        let result = translator(&provider, &exclusions)
            .translate_map(&fields)
            .await
            .unwrap();

        let sections = &result["sections"];
        assert_eq!(sections[0]["heading"], "[de] First");
        assert_eq!(
            sections[0]["items"],
            json!(["[de] a", ["[de] nested", "[de] deeper"]])
        );
        assert_eq!(sections[1]["items"], json!([]));
    }

    #[tokio::test]
    async fn blank_strings_skip_the_remote_call() {
        let provider = MockProvider::new();
        let exclusions = FieldExclusionSet::system_only();
        let fields = as_map(json!({ "title": "", "subtitle": "   " }));

        let result = translator(&provider, &exclusions)
            .translate_map(&fields)
            .await
            .unwrap();

        assert_eq!(result["title"], "");
        assert_eq!(result["subtitle"], "   ");
        assert!(provider.translated_texts().is_empty());
    }

    #[tokio::test]
    async fn relation_references_are_skipped_wholesale() {
        let provider = MockProvider::new();
        let exclusions = FieldExclusionSet::system_only();
        let fields = as_map(json!({
            "author": { "id": 7, "__type": "api::author.author", "name": "Ada" },
            "body": "Text"
        }));

        let result = translator(&provider, &exclusions)
            .translate_map(&fields)
            .await
            .unwrap();

        assert_eq!(result["author"]["name"], "Ada");
        assert_eq!(result["body"], "[de] Text");
        assert_eq!(provider.translated_texts(), vec!["Text"]);
    }

    #[tokio::test]
    async fn glossary_id_rides_along_on_every_request() {
        let provider = MockProvider::new();
        let exclusions = FieldExclusionSet::system_only();
        let translator =
            FieldTranslator::new(&provider, "de", Some("en"), Some("g-1"), &exclusions, 4);

        let fields = as_map(json!({ "title": "Hello" }));
        translator.translate_map(&fields).await.unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].glossary_id.as_deref(), Some("g-1"));
        assert_eq!(calls[0].source_lang.as_deref(), Some("en"));
    }
}
