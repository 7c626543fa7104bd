//! 翻译服务的内存mock
//!
//! 确定性地模拟远程行为：译文带目标语言标签便于断言，词汇表
//! 保存在内存中，并支持按需注入瞬时故障、终止性故障和列表
//! 失败，用于测试重试、隔离和降级路径。

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{
    DeeplApi, GlossaryRecord, GlossaryTermPair, LanguageInfo, TranslationRequest,
};
use crate::error::{TranslationError, TranslationResult};

/// 内存mock翻译服务
#[derive(Default)]
pub struct MockProvider {
    /// 记录收到的全部翻译请求
    pub calls: Mutex<Vec<TranslationRequest>>,
    glossaries: Mutex<Vec<GlossaryRecord>>,
    next_glossary_id: AtomicUsize,

    // 故障注入
    transient_failures: AtomicUsize,
    fail_texts: Mutex<HashMap<String, u16>>,
    fail_glossary_targets: Mutex<HashSet<String>>,
    fail_glossary_list: AtomicUsize,

    // 调用计数
    pub translate_count: AtomicUsize,
    pub list_glossaries_count: AtomicUsize,
    pub create_glossary_count: AtomicUsize,
    pub delete_glossary_count: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让接下来的 `count` 次翻译调用返回503
    pub fn inject_transient_failures(&self, count: usize) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    /// 让指定文本的翻译始终以给定状态码失败
    pub fn fail_text(&self, text: &str, status: u16) {
        self.fail_texts
            .lock()
            .unwrap()
            .insert(text.to_string(), status);
    }

    /// 让指定目标语言的词汇表创建失败
    pub fn fail_glossary_creation_for(&self, target_lang: &str) {
        self.fail_glossary_targets
            .lock()
            .unwrap()
            .insert(target_lang.to_lowercase());
    }

    /// 让接下来的 `count` 次词汇表列表调用失败
    pub fn fail_glossary_listing(&self, count: usize) {
        self.fail_glossary_list.store(count, Ordering::SeqCst);
    }

    /// 预置一条已存在的远程词汇表记录
    pub fn seed_glossary(&self, name: &str, source_lang: &str, target_lang: &str) -> String {
        let id = format!(
            "mock-glossary-{}",
            self.next_glossary_id.fetch_add(1, Ordering::SeqCst)
        );
        self.glossaries.lock().unwrap().push(GlossaryRecord {
            glossary_id: id.clone(),
            name: name.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            entry_count: 0,
            creation_time: None,
        });
        id
    }

    /// 当前内存中的词汇表快照
    pub fn glossary_snapshot(&self) -> Vec<GlossaryRecord> {
        self.glossaries.lock().unwrap().clone()
    }

    /// 收到的翻译请求文本列表
    pub fn translated_texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DeeplApi for MockProvider {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        self.translate_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(request.clone());

        if Self::take_one(&self.transient_failures) {
            return Err(TranslationError::from_status(503, "mock transient failure"));
        }

        if let Some(status) = self.fail_texts.lock().unwrap().get(&request.text) {
            return Err(TranslationError::from_status(*status, "mock failure"));
        }

        Ok(format!(
            "[{}] {}",
            request.target_lang.to_lowercase(),
            request.text
        ))
    }

    async fn list_target_languages(&self) -> TranslationResult<Vec<LanguageInfo>> {
        Ok(vec![
            LanguageInfo {
                language: "DE".to_string(),
                name: "German".to_string(),
            },
            LanguageInfo {
                language: "FR".to_string(),
                name: "French".to_string(),
            },
            LanguageInfo {
                language: "ZH".to_string(),
                name: "Chinese".to_string(),
            },
        ])
    }

    async fn list_glossaries(&self) -> TranslationResult<Vec<GlossaryRecord>> {
        self.list_glossaries_count.fetch_add(1, Ordering::SeqCst);
        if Self::take_one(&self.fail_glossary_list) {
            return Err(TranslationError::from_status(500, "mock list failure"));
        }
        Ok(self.glossary_snapshot())
    }

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[GlossaryTermPair],
    ) -> TranslationResult<GlossaryRecord> {
        self.create_glossary_count.fetch_add(1, Ordering::SeqCst);

        if self
            .fail_glossary_targets
            .lock()
            .unwrap()
            .contains(&target_lang.to_lowercase())
        {
            return Err(TranslationError::from_status(400, "mock creation failure"));
        }

        let record = GlossaryRecord {
            glossary_id: format!(
                "mock-glossary-{}",
                self.next_glossary_id.fetch_add(1, Ordering::SeqCst)
            ),
            name: name.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            entry_count: entries.len(),
            creation_time: Some(chrono::Utc::now()),
        };
        self.glossaries.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn delete_glossary(&self, glossary_id: &str) -> TranslationResult<()> {
        self.delete_glossary_count.fetch_add(1, Ordering::SeqCst);
        let mut glossaries = self.glossaries.lock().unwrap();
        let before = glossaries.len();
        glossaries.retain(|g| g.glossary_id != glossary_id);
        if glossaries.len() == before {
            return Err(TranslationError::from_status(404, "glossary not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, target: &str) -> TranslationRequest {
        TranslationRequest {
            text: text.to_string(),
            target_lang: target.to_string(),
            source_lang: Some("en".to_string()),
            glossary_id: None,
        }
    }

    #[tokio::test]
    async fn translations_are_tagged_with_the_target_lang() {
        let mock = MockProvider::new();
        let result = mock.translate(&request("Hello", "DE")).await.unwrap();
        assert_eq!(result, "[de] Hello");
        assert_eq!(mock.translated_texts(), vec!["Hello"]);
    }

    #[tokio::test]
    async fn transient_failures_clear_after_the_budget() {
        let mock = MockProvider::new();
        mock.inject_transient_failures(2);

        assert!(mock.translate(&request("a", "de")).await.is_err());
        assert!(mock.translate(&request("a", "de")).await.is_err());
        assert!(mock.translate(&request("a", "de")).await.is_ok());
    }

    #[tokio::test]
    async fn glossaries_round_trip_through_the_mock() {
        let mock = MockProvider::new();
        let created = mock
            .create_glossary(
                "Test Glossary (en-de)",
                "en",
                "de",
                &[GlossaryTermPair {
                    source: "CPU".into(),
                    target: "Prozessor".into(),
                }],
            )
            .await
            .unwrap();

        let listed = mock.list_glossaries().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entry_count, 1);

        mock.delete_glossary(&created.glossary_id).await.unwrap();
        assert!(mock.list_glossaries().await.unwrap().is_empty());
    }
}
