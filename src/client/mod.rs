//! DeepL翻译服务客户端
//!
//! 封装对翻译服务的全部远程调用：文本翻译、目标语言列表和
//! 词汇表的增删查。端点根据凭证形态自动选择。客户端本身只做
//! 单次请求；重试由 [`retry::RetryingProvider`] 装饰器叠加，
//! 服务组装时统一套在提供方之上。

pub mod mock;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::constants;
use crate::config::manager::EngineConfig;
use crate::error::{TranslationError, TranslationResult};

/// 单次文本翻译请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub target_lang: String,
    pub source_lang: Option<String>,
    pub glossary_id: Option<String>,
}

/// 服务端支持的目标语言
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageInfo {
    pub language: String,
    pub name: String,
}

/// 远程词汇表记录
#[derive(Debug, Clone, Deserialize)]
pub struct GlossaryRecord {
    pub glossary_id: String,
    pub name: String,
    pub source_lang: String,
    pub target_lang: String,
    #[serde(default)]
    pub entry_count: usize,
    #[serde(default)]
    pub creation_time: Option<DateTime<Utc>>,
}

/// 词汇表术语对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryTermPair {
    pub source: String,
    pub target: String,
}

/// 翻译服务协作方
///
/// 引擎只依赖这个trait，生产环境注入 [`DeeplClient`]，
/// 测试注入内存mock。
#[async_trait]
pub trait DeeplApi: Send + Sync {
    /// 翻译单段文本
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String>;

    /// 列出服务端支持的目标语言
    async fn list_target_languages(&self) -> TranslationResult<Vec<LanguageInfo>>;

    /// 列出账号下的全部词汇表
    async fn list_glossaries(&self) -> TranslationResult<Vec<GlossaryRecord>>;

    /// 创建词汇表，返回远程记录
    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[GlossaryTermPair],
    ) -> TranslationResult<GlossaryRecord>;

    /// 删除词汇表
    async fn delete_glossary(&self, glossary_id: &str) -> TranslationResult<()>;
}

/// 判断凭证是否属于受限层级（免费）账号
pub fn is_free_api_key(api_key: &str) -> bool {
    api_key.ends_with(constants::FREE_KEY_SUFFIX)
}

/// 根据凭证形态选择服务端点
pub fn resolve_base_url(api_key: &str) -> &'static str {
    if is_free_api_key(api_key) {
        constants::DEEPL_FREE_API_URL
    } else {
        constants::DEEPL_API_URL
    }
}

#[derive(Serialize)]
struct TranslateBody<'a> {
    text: Vec<&'a str>,
    target_lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    glossary_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedSegment>,
}

#[derive(Deserialize)]
struct TranslatedSegment {
    text: String,
}

#[derive(Serialize)]
struct CreateGlossaryBody<'a> {
    name: &'a str,
    source_lang: String,
    target_lang: String,
    entries: String,
    entries_format: &'static str,
}

#[derive(Deserialize)]
struct GlossaryListResponse {
    glossaries: Vec<GlossaryRecord>,
}

/// DeepL HTTP客户端
pub struct DeeplClient {
    http: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl DeeplClient {
    /// 创建客户端
    ///
    /// 凭证为空时立即返回配置错误，不会发起任何远程调用。
    pub fn new(api_key: impl Into<String>, config: &EngineConfig) -> TranslationResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TranslationError::Config("API密钥未配置".to_string()));
        }

        let base_url = Url::parse(resolve_base_url(&api_key))
            .map_err(|e| TranslationError::Config(format!("端点URL非法: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::Config(format!("HTTP客户端初始化失败: {}", e)))?;

        tracing::info!(
            endpoint = %base_url,
            free_tier = is_free_api_key(&api_key),
            "DeepL客户端已初始化"
        );

        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> TranslationResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| TranslationError::Internal(format!("端点拼接失败: {}", e)))
    }

    fn auth_header(&self) -> String {
        format!("DeepL-Auth-Key {}", self.api_key)
    }

    /// 读取响应，非2xx状态码映射为相应错误变体
    async fn parse_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> TranslationResult<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(TranslationError::from_status(status.as_u16(), message))
        }
    }

    async fn check_response(response: reqwest::Response) -> TranslationResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(TranslationError::from_status(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl DeeplApi for DeeplClient {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        let url = self.endpoint("/v2/translate")?;
        let body = TranslateBody {
            text: vec![request.text.as_str()],
            target_lang: request.target_lang.to_uppercase(),
            source_lang: request.source_lang.as_deref().map(str::to_uppercase),
            glossary_id: request.glossary_id.as_deref(),
        };

        let resp = self
            .http
            .post(url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        let response = Self::parse_response::<TranslateResponse>(resp).await?;

        response
            .translations
            .into_iter()
            .next()
            .map(|segment| segment.text)
            .ok_or_else(|| TranslationError::Serialization("响应中没有译文".to_string()))
    }

    async fn list_target_languages(&self) -> TranslationResult<Vec<LanguageInfo>> {
        let mut url = self.endpoint("/v2/languages")?;
        url.query_pairs_mut().append_pair("type", "target");

        let resp = self
            .http
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::parse_response::<Vec<LanguageInfo>>(resp).await
    }

    async fn list_glossaries(&self) -> TranslationResult<Vec<GlossaryRecord>> {
        let url = self.endpoint("/v2/glossaries")?;

        let resp = self
            .http
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        let response = Self::parse_response::<GlossaryListResponse>(resp).await?;

        Ok(response.glossaries)
    }

    async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &[GlossaryTermPair],
    ) -> TranslationResult<GlossaryRecord> {
        let url = self.endpoint("/v2/glossaries")?;

        // 术语对以TSV形式上传，每行 "源术语\t译文"
        let tsv: String = entries
            .iter()
            .map(|pair| format!("{}\t{}", pair.source, pair.target))
            .collect::<Vec<_>>()
            .join("\n");

        let body = CreateGlossaryBody {
            name,
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
            entries: tsv,
            entries_format: "tsv",
        };

        let resp = self
            .http
            .post(url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;
        Self::parse_response::<GlossaryRecord>(resp).await
    }

    async fn delete_glossary(&self, glossary_id: &str) -> TranslationResult<()> {
        let url = self.endpoint(&format!("/v2/glossaries/{}", glossary_id))?;

        let resp = self
            .http
            .delete(url)
            .header("Authorization", self.auth_header())
            .send()
            .await?;
        Self::check_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_key_suffix_selects_the_free_endpoint() {
        assert!(is_free_api_key("abcd-1234:fx"));
        assert!(!is_free_api_key("abcd-1234"));

        assert_eq!(resolve_base_url("key:fx"), "https://api-free.deepl.com");
        assert_eq!(resolve_base_url("key"), "https://api.deepl.com");
    }

    #[test]
    fn empty_api_key_is_rejected_before_any_call() {
        let config = EngineConfig::default();
        assert!(matches!(
            DeeplClient::new("", &config),
            Err(TranslationError::Config(_))
        ));
        assert!(matches!(
            DeeplClient::new("   ", &config),
            Err(TranslationError::Config(_))
        ));
    }

    #[test]
    fn translate_body_uppercases_langs_and_omits_absent_fields() {
        let body = TranslateBody {
            text: vec!["hello"],
            target_lang: "de".to_uppercase(),
            source_lang: None,
            glossary_id: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["target_lang"], "DE");
        assert!(json.get("source_lang").is_none());
        assert!(json.get("glossary_id").is_none());
    }

    #[test]
    fn glossary_entries_serialize_as_tsv() {
        let entries = [
            GlossaryTermPair {
                source: "CPU".into(),
                target: "Prozessor".into(),
            },
            GlossaryTermPair {
                source: "firmware".into(),
                target: "Firmware".into(),
            },
        ];
        let tsv: String = entries
            .iter()
            .map(|pair| format!("{}\t{}", pair.source, pair.target))
            .collect::<Vec<_>>()
            .join("\n");
        assert_eq!(tsv, "CPU\tProzessor\nfirmware\tFirmware");
    }
}
