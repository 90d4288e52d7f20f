use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Fetch error: {0}")]
    FetchError(String),

    #[error("Malformed layout: block starting at row {block_start} has {trailing} trailing rows, expected 5")]
    MalformedLayoutError { block_start: usize, trailing: usize },

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Arrow error: {0}")]
    ArrowError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl NotifierError {
    /// 页面结构异常时对应的起始行号
    pub fn block_start(&self) -> Option<usize> {
        match self {
            NotifierError::MalformedLayoutError { block_start, .. } => Some(*block_start),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifierError>;

// 用于从字符串创建错误
impl From<String> for NotifierError {
    fn from(s: String) -> Self {
        NotifierError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for NotifierError {
    fn from(s: &str) -> Self {
        NotifierError::Unknown(s.to_string())
    }
}

/// 文本解码失败时的警告，不会中断运行
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Encoding warning: could not decode {len} bytes as {encoding}, keeping original text")]
pub struct EncodingWarning {
    pub encoding: &'static str,
    pub len: usize,
}
