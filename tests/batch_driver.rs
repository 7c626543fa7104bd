//! 批量翻译集成测试
//!
//! 验证批次验证、失败隔离和结果顺序。

use serde_json::json;

mod common {
    include!("common/mod.rs");
}

use common::{TestEnvironment, ARTICLE};
use localize::store::EntityId;
use localize::TranslationError;

#[tokio::test]
async fn empty_batches_are_rejected_wholesale() {
    let env = TestEnvironment::new();

    let error = env
        .service
        .translate_batch(ARTICLE, &[], "de", None)
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::Validation(_)));
    assert!(env.provider.translated_texts().is_empty());
}

#[tokio::test]
async fn batches_over_the_cap_are_rejected() {
    let env = TestEnvironment::new();
    let ids: Vec<EntityId> = (1..=51).collect();

    let error = env
        .service
        .translate_batch(ARTICLE, &ids, "de", None)
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::Validation(_)));
}

#[tokio::test]
async fn a_full_batch_at_the_cap_is_processed() {
    let env = TestEnvironment::new();
    for id in 1..=50u64 {
        env.seed_article(id, "en", json!({ "title": format!("Post {}", id) }));
    }

    let result = env
        .service
        .translate_batch(ARTICLE, &(1..=50).collect::<Vec<_>>(), "de", None)
        .await
        .unwrap();

    assert_eq!(result.total, 50);
    assert_eq!(result.successful, 50);
    assert_eq!(result.failed, 0);
    assert_eq!(env.entities.count(ARTICLE, "de"), 50);
}

#[tokio::test]
async fn invalid_locale_rejects_before_any_work() {
    let env = TestEnvironment::new();
    env.seed_article(1, "en", json!({ "title": "Hello" }));

    let error = env
        .service
        .translate_batch(ARTICLE, &[1], "German", None)
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::Validation(_)));
    assert!(env.provider.translated_texts().is_empty());
}

#[tokio::test]
async fn failures_are_isolated_and_order_is_kept() {
    let env = TestEnvironment::new();
    env.seed_article(1, "en", json!({ "title": "First" }));
    // id 2 不存在
    env.seed_article(3, "en", json!({ "title": "Third" }));

    let result = env
        .service
        .translate_batch(ARTICLE, &[1, 2, 3], "de", None)
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 1);

    let ids: Vec<u64> = result.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3], "results follow the input order");

    assert!(result.results[0].is_success());
    assert!(!result.results[1].is_success());
    assert!(result.results[2].is_success());

    // 失败实体不影响其余实体落库
    assert_eq!(env.entities.count(ARTICLE, "de"), 2);
}

#[tokio::test]
async fn unknown_model_is_rejected() {
    let env = TestEnvironment::new();

    let error = env
        .service
        .translate_batch("api::missing.missing", &[1], "de", None)
        .await
        .unwrap_err();

    assert!(matches!(error, TranslationError::Validation(_)));
}
