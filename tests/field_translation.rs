//! 字段翻译集成测试
//!
//! 通过服务门面验证结构保持翻译、字段排除和远程调用重试。

use serde_json::json;

mod common {
    include!("common/mod.rs");
}

use common::{TestEnvironment, ARTICLE};

#[tokio::test]
async fn article_translates_with_slug_kept_verbatim() {
    let env = TestEnvironment::new();
    env.seed_article(
        1,
        "en",
        json!({
            "title": "Hello World",
            "slug": "hello-world",
            "body": "This is the body.",
            "views": 42
        }),
    );

    let translated = env
        .service
        .translate_content(ARTICLE, 1, "de", None)
        .await
        .expect("translation should succeed");

    assert_eq!(translated.locale, "de");
    assert_eq!(translated.field("title").unwrap(), "[de] Hello World");
    assert_eq!(translated.field("body").unwrap(), "[de] This is the body.");
    // slug在内容类型配置中被排除，原样保留
    assert_eq!(translated.field("slug").unwrap(), "hello-world");
    assert_eq!(translated.field("views").unwrap(), 42);
    assert_ne!(translated.id, 1, "target gets its own identity");
}

#[tokio::test]
async fn nested_structures_keep_their_shape() {
    let env = TestEnvironment::new();
    env.seed_article(
        1,
        "en",
        json!({
            "title": "Guide",
            "body": "Intro",
            "sections": [
                { "heading": "First", "paragraphs": ["one", "two"] },
                { "heading": "Second", "paragraphs": ["three"] }
            ]
        }),
    );

    let translated = env
        .service
        .translate_content(ARTICLE, 1, "de", None)
        .await
        .unwrap();

    let sections = translated.field("sections").unwrap();
    assert_eq!(sections[0]["heading"], "[de] First");
    assert_eq!(sections[0]["paragraphs"], json!(["[de] one", "[de] two"]));
    assert_eq!(sections[1]["paragraphs"], json!(["[de] three"]));
}

#[tokio::test]
async fn transient_provider_failures_are_retried() {
    let env = TestEnvironment::new();
    env.seed_article(1, "en", json!({ "title": "Hello" }));
    env.provider.inject_transient_failures(2);

    let translated = env
        .service
        .translate_content(ARTICLE, 1, "de", None)
        .await
        .expect("should succeed after retries");

    assert_eq!(translated.field("title").unwrap(), "[de] Hello");
    // 两次失败加一次成功
    assert_eq!(
        env.provider
            .translate_count
            .load(std::sync::atomic::Ordering::SeqCst),
        3
    );
}

#[tokio::test]
async fn terminal_provider_errors_fail_fast() {
    let env = TestEnvironment::new();
    env.seed_article(1, "en", json!({ "title": "Forbidden text" }));
    env.provider.fail_text("Forbidden text", 456);

    let error = env
        .service
        .translate_content(ARTICLE, 1, "de", None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        localize::TranslationError::Provider { status: 456, .. }
    ));
    // 终止性错误不重试
    assert_eq!(
        env.provider
            .translate_count
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn glossary_id_is_attached_when_the_pair_is_mapped() {
    let mut settings = common::default_settings();
    settings
        .glossary_ids
        .insert("en_de".to_string(), "g-42".to_string());
    let env = TestEnvironment::with_settings(settings);
    env.seed_article(1, "en", json!({ "title": "Hello" }));

    env.service
        .translate_content(ARTICLE, 1, "de", None)
        .await
        .unwrap();

    let calls = env.provider.calls.lock().unwrap();
    assert_eq!(calls[0].glossary_id.as_deref(), Some("g-42"));
    assert_eq!(calls[0].source_lang.as_deref(), Some("en"));
    assert_eq!(calls[0].target_lang, "de");
}
