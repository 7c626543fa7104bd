// 集成测试公共模块
//
// 提供测试环境组装和数据播种辅助

use std::sync::Arc;

use serde_json::{Map, Value};

use localize::client::mock::MockProvider;
use localize::config::EngineConfig;
use localize::service::LocalizeService;
use localize::settings::{ContentTypeConfig, GlossaryEntry, PluginSettings};
use localize::store::memory::{MemoryEntityStore, MemoryLocaleRegistry, MemorySettingsStore};
use localize::store::{AttributeKind, Entity, EntityId, ModelSchema};

pub const ARTICLE: &str = "api::article.article";

/// 测试用文章模型：标题、正文、slug为普通字段，author和tags为关系
pub fn article_schema() -> ModelSchema {
    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert("title".to_string(), AttributeKind::String);
    attributes.insert("body".to_string(), AttributeKind::Text);
    attributes.insert("slug".to_string(), AttributeKind::String);
    attributes.insert("views".to_string(), AttributeKind::Integer);
    attributes.insert("author".to_string(), AttributeKind::Relation);
    attributes.insert("tags".to_string(), AttributeKind::Relation);
    ModelSchema {
        uid: ARTICLE.to_string(),
        localized: true,
        attributes,
    }
}

/// 把JSON字面量转为字段映射
pub fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {:?}", other),
    }
}

/// 默认测试设置：文章类型启用翻译，slug排除在外
pub fn default_settings() -> PluginSettings {
    let mut settings = PluginSettings {
        api_key: "test-key:fx".to_string(),
        auto_translate: true,
        ..Default::default()
    };
    settings.content_types.insert(
        ARTICLE.to_string(),
        ContentTypeConfig {
            enabled: true,
            ignored_fields: vec!["slug".to_string()],
            auto_translate: true,
        },
    );
    settings
}

/// 构造术语表条目
pub fn glossary_entry(term: &str, translations: &[(&str, &str)]) -> GlossaryEntry {
    GlossaryEntry {
        term: term.to_string(),
        translations: translations
            .iter()
            .map(|(lang, text)| (lang.to_string(), text.to_string()))
            .collect(),
    }
}

/// 组装好的测试环境
///
/// 服务通过trait对象持有各协作方，这里额外保留具体类型的句柄
/// 便于断言内部状态。
pub struct TestEnvironment {
    pub service: LocalizeService,
    pub entities: Arc<MemoryEntityStore>,
    pub settings: Arc<MemorySettingsStore>,
    pub provider: Arc<MockProvider>,
}

/// 初始化测试日志输出（整个进程只执行一次）
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_settings(default_settings())
    }

    pub fn with_settings(settings: PluginSettings) -> Self {
        init_tracing();
        let entities = Arc::new(MemoryEntityStore::new());
        entities.register_model(article_schema());

        let provider = Arc::new(MockProvider::new());
        let settings_store = Arc::new(MemorySettingsStore::new(settings));
        let locales = Arc::new(MemoryLocaleRegistry::new(&[
            ("en", "English"),
            ("de", "German"),
            ("fr", "French"),
        ]));

        let mut config = EngineConfig::default();
        // 测试中关闭抖动并缩短退避，保持确定性和速度
        config.retry_jitter = false;
        config.retry_initial_delay_ms = 1;

        let service = LocalizeService::new(
            provider.clone(),
            entities.clone(),
            settings_store.clone(),
            locales,
            config,
        );

        Self {
            service,
            entities,
            settings: settings_store,
            provider,
        }
    }

    /// 播种一篇文章
    pub fn seed_article(&self, id: EntityId, locale: &str, data: Value) {
        self.entities.seed(
            ARTICLE,
            Entity {
                id,
                locale: locale.to_string(),
                fields: fields(data),
            },
        );
    }
}
