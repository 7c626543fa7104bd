//! # Localize
//!
//! 结构化内容的翻译编排引擎：把内容管理系统中的实体翻译到其他
//! 语言环境，并以幂等的方式写回存储。支持批量翻译、字段排除、
//! 关系引用保持和词汇表同步。
//!
//! ## 模块组织
//!
//! - `client` - DeepL翻译服务客户端（重试、端点选择、mock）
//! - `config` - 引擎运行配置（文件、环境变量、默认值）
//! - `engine` - 核心编排语义（字段翻译、幂等落库、批量、词汇表）
//! - `error` - 统一错误类型与可重试性分类
//! - `settings` - 插件设置快照（凭证、术语表、内容类型配置）
//! - `store` - 协作方trait边界与内存实现
//! - `service` - 对外统一门面

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod settings;
pub mod store;

// Re-export commonly used items for convenience
pub use client::{DeeplApi, DeeplClient, TranslationRequest};
pub use config::{ConfigManager, EngineConfig};
pub use engine::{BatchResult, SyncReport};
pub use error::{TranslationError, TranslationResult};
pub use service::LocalizeService;
pub use settings::PluginSettings;
pub use store::{Entity, EntityId, EntityStore, LocaleRegistry, SettingsStore};
