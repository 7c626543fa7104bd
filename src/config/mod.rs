//! 引擎配置管理模块
//!
//! 提供运行参数配置，支持环境变量、配置文件和默认值。
//! 凭证与词汇表等业务设置由设置存储协作方持有（见 `crate::settings`），
//! 本模块只管理引擎自身的运行旋钮。

pub mod manager;

pub use manager::{ConfigManager, EngineConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // DeepL API端点
    pub const DEEPL_API_URL: &str = "https://api.deepl.com";
    pub const DEEPL_FREE_API_URL: &str = "https://api-free.deepl.com";
    /// 受限层级（免费）凭证的固定后缀标记
    pub const FREE_KEY_SUFFIX: &str = ":fx";

    // 重试策略
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 3;
    pub const DEFAULT_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(1000);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// 单次编排调用的整体截止时间，超过后重试循环提前中止
    pub const DEFAULT_CALL_DEADLINE: Duration = Duration::from_secs(120);

    // 批次处理
    /// 单个批次允许的最大实体数量
    pub const MAX_BATCH_SIZE: usize = 50;
    pub const DEFAULT_MAX_CONCURRENT_TRANSLATIONS: usize = 5;
    /// 数组字段内部元素翻译的并发上限
    pub const DEFAULT_ARRAY_CONCURRENCY: usize = 4;

    // 语言环境
    pub const DEFAULT_SOURCE_LOCALE: &str = "en";
    /// 词汇表固定以该基准语言作为源语言
    pub const DEFAULT_GLOSSARY_SOURCE_LANG: &str = "en";
    /// 远程词汇表的确定性命名前缀
    pub const GLOSSARY_NAME_PREFIX: &str = "Localize Glossary";

    /// 系统字段：无论内容类型如何配置，这些字段始终被排除在翻译之外
    pub const SYSTEM_FIELDS: &[&str] = &[
        "id",
        "createdAt",
        "updatedAt",
        "publishedAt",
        "createdBy",
        "updatedBy",
        "locale",
        "localizations",
    ];

    /// 关系引用对象的标识字段与类型判别字段
    pub const RELATION_ID_FIELD: &str = "id";
    pub const RELATION_TYPE_FIELD: &str = "__type";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "localize.toml",
        "config.toml",
        ".localize.toml",
        "~/.config/localize/config.toml",
        "/etc/localize/config.toml",
    ];
}
