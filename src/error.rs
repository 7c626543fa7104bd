//! 统一错误处理
//!
//! 定义翻译编排过程中可能出现的所有错误类型，并提供
//! 可重试性判断、错误类别和严重程度分类。

use thiserror::Error;

/// 翻译编排错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误（缺少凭证、配置值非法等），不可重试
    #[error("配置错误: {0}")]
    Config(String),

    /// 输入验证错误（批次参数、语言代码、模型标识等），在任何工作开始前拒绝
    #[error("输入无效: {0}")]
    Validation(String),

    /// 源实体不存在，对单个实体而言是终止性错误
    #[error("未找到实体: model={model}, id={id}")]
    NotFound { model: String, id: u64 },

    /// 翻译服务返回的HTTP错误；4xx（429除外）不可重试，5xx可重试
    #[error("翻译服务错误 (status {status}): {message}")]
    Provider { status: u16, message: String },

    /// 请求速率已达到服务端限制（429），可重试
    #[error("请求速率过快，已达到限制")]
    RateLimited,

    /// 网络层错误（连接失败、单次请求超时等），可重试
    #[error("网络错误: {0}")]
    Network(String),

    /// 整体调用超出截止时间，重试循环被提前中止
    #[error("操作超时: {0}")]
    Timeout(String),

    /// 持久化协作方（实体存储、设置存储）返回的错误
    #[error("存储错误: {0}")]
    Store(String),

    /// 序列化/反序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

impl TranslationError {
    /// 根据HTTP状态码构造相应的错误变体
    ///
    /// 429 映射为 `RateLimited`，其余状态码映射为 `Provider`。
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 429 {
            TranslationError::RateLimited
        } else {
            TranslationError::Provider {
                status,
                message: message.into(),
            }
        }
    }

    /// 检查错误是否可重试
    ///
    /// [400, 500) 区间内除429外的状态码为终止性错误；
    /// 5xx、429和网络层错误允许退避重试。
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Provider { status, .. } => *status >= 500 || *status == 429,
            TranslationError::RateLimited => true,
            TranslationError::Network(_) => true,
            TranslationError::Config(_) => false,
            TranslationError::Validation(_) => false,
            TranslationError::NotFound { .. } => false,
            TranslationError::Timeout(_) => false, // 截止时间已耗尽，不再重试
            TranslationError::Store(_) => false,
            TranslationError::Serialization(_) => false,
            TranslationError::Internal(_) => false,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::Config(_) => ErrorCategory::Configuration,
            TranslationError::Validation(_) => ErrorCategory::Input,
            TranslationError::NotFound { .. } => ErrorCategory::NotFound,
            TranslationError::Provider { .. } => ErrorCategory::Provider,
            TranslationError::RateLimited => ErrorCategory::RateLimit,
            TranslationError::Network(_) => ErrorCategory::Network,
            TranslationError::Timeout(_) => ErrorCategory::Timeout,
            TranslationError::Store(_) => ErrorCategory::Store,
            TranslationError::Serialization(_) => ErrorCategory::Serialization,
            TranslationError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::Config(_) => ErrorSeverity::Critical,
            TranslationError::Internal(_) => ErrorSeverity::Critical,
            TranslationError::Validation(_) => ErrorSeverity::Info,
            TranslationError::RateLimited => ErrorSeverity::Warning,
            TranslationError::Network(_) => ErrorSeverity::Warning,
            TranslationError::Timeout(_) => ErrorSeverity::Warning,
            TranslationError::NotFound { .. } => ErrorSeverity::Error,
            TranslationError::Provider { .. } => ErrorSeverity::Error,
            TranslationError::Store(_) => ErrorSeverity::Error,
            TranslationError::Serialization(_) => ErrorSeverity::Error,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Input,
    NotFound,
    Provider,
    RateLimit,
    Network,
    Timeout,
    Store,
    Serialization,
    Internal,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        // reqwest错误不携带响应体；状态码分类在客户端读取响应时完成，
        // 这里只处理传输层面的失败
        if error.is_timeout() {
            TranslationError::Network(format!("请求超时: {}", error))
        } else if error.is_connect() {
            TranslationError::Network(format!("连接失败: {}", error))
        } else {
            TranslationError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::Serialization(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for TranslationError {
    fn from(error: config::ConfigError) -> Self {
        TranslationError::Config(format!("配置错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;
