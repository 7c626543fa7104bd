//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::error::{TranslationError, TranslationResult};

/// 引擎运行配置
///
/// 所有字段都有经过验证的默认值，可整体从TOML/JSON文件反序列化，
/// 并允许 `LOCALIZE_*` 环境变量逐项覆盖。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    // 重试策略
    pub max_retry_attempts: usize,
    pub retry_initial_delay_ms: u64,
    /// 是否在指数退避上叠加随机抖动，避免并发重试同步化
    pub retry_jitter: bool,
    pub request_timeout_secs: u64,
    /// 单次编排调用的截止时间（秒），0 表示不限制
    pub call_deadline_secs: u64,

    // 并发控制
    pub max_concurrent_translations: usize,
    pub array_concurrency: usize,

    // 语言环境
    pub default_source_locale: String,
    pub glossary_source_lang: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_initial_delay_ms: constants::DEFAULT_RETRY_INITIAL_DELAY.as_millis() as u64,
            retry_jitter: true,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            call_deadline_secs: constants::DEFAULT_CALL_DEADLINE.as_secs(),
            max_concurrent_translations: constants::DEFAULT_MAX_CONCURRENT_TRANSLATIONS,
            array_concurrency: constants::DEFAULT_ARRAY_CONCURRENCY,
            default_source_locale: constants::DEFAULT_SOURCE_LOCALE.to_string(),
            glossary_source_lang: constants::DEFAULT_GLOSSARY_SOURCE_LANG.to_string(),
        }
    }
}

impl EngineConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_retry_attempts == 0 {
            return Err(TranslationError::Config("重试次数不能为0".to_string()));
        }

        if self.max_concurrent_translations == 0 {
            return Err(TranslationError::Config("最大并发数不能为0".to_string()));
        }

        if self.array_concurrency == 0 {
            return Err(TranslationError::Config(
                "数组并发度不能为0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::Config("请求超时不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_parse::<usize>("LOCALIZE_MAX_RETRY_ATTEMPTS") {
            self.max_retry_attempts = v;
        }
        if let Some(v) = env_parse::<u64>("LOCALIZE_RETRY_INITIAL_DELAY_MS") {
            self.retry_initial_delay_ms = v;
        }
        if let Some(v) = env_parse::<bool>("LOCALIZE_RETRY_JITTER") {
            self.retry_jitter = v;
        }
        if let Some(v) = env_parse::<u64>("LOCALIZE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("LOCALIZE_CALL_DEADLINE_SECS") {
            self.call_deadline_secs = v;
        }
        if let Some(v) = env_parse::<usize>("LOCALIZE_MAX_CONCURRENT_TRANSLATIONS") {
            self.max_concurrent_translations = v;
        }
        if let Some(v) = env_parse::<usize>("LOCALIZE_ARRAY_CONCURRENCY") {
            self.array_concurrency = v;
        }
        if let Ok(v) = std::env::var("LOCALIZE_DEFAULT_SOURCE_LOCALE") {
            self.default_source_locale = v;
        }
        if let Ok(v) = std::env::var("LOCALIZE_GLOSSARY_SOURCE_LANG") {
            self.glossary_source_lang = v;
        }
    }

    /// 转换为Duration类型
    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 截止时间，配置为0时表示不限制
    pub fn call_deadline(&self) -> Option<Duration> {
        if self.call_deadline_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.call_deadline_secs))
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: EngineConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    ///
    /// 依次执行：加载 .env 文件 → 搜索配置文件 → 应用环境变量覆盖 → 验证。
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    /// 取得配置的所有权副本
    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<EngineConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::debug!("未找到配置文件，使用默认配置");
        Ok(EngineConfig::default())
    }

    /// 从指定文件加载配置
    ///
    /// 文件格式（TOML/JSON）由扩展名决定，缺失字段落回默认值。
    fn load_from_file(path: &str) -> TranslationResult<EngineConfig> {
        let loaded = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;
        Ok(loaded.try_deserialize()?)
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env.development", ".env.production", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() {
                if dotenv::from_filename(env_file).is_ok() {
                    tracing::debug!("已加载环境变量文件: {}", env_file);
                    break;
                }
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = EngineConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
