use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),

    /// 失敗したAPI呼び出し（メソッド・URL・ステータス・レスポンス本文を保持）
    #[error("API error: {method} {url} -> {status} - {message}")]
    ApiError {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    #[error("Multi-resource fetch failed for {} request(s): {}", failed.len(), failed.join(", "))]
    BatchFailed { failed: Vec<String> },

    #[error("Field \"{field}\" is already used in the \"{section}\" section")]
    ConflictingFieldUsage { field: String, section: String },

    #[error("Unexpected response format: {0}")]
    UnexpectedFormat(String),

    #[error("Invalid date-time \"{value}\": {message}")]
    DateTimeParse { value: String, message: String },

    #[error("Invalid issue key: {0}")]
    InvalidIssueKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    /// HTTP層で発生したエラーかどうか
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::ApiError { .. } | Error::RequestFailed(_) | Error::BatchFailed { .. }
        )
    }

    /// APIエラーの場合はHTTPステータスを返す
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ApiError { status, .. } => Some(*status),
            Error::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
