use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Price source {source_name} failed: {message}")]
    PriceSource {
        source_name: String,
        message: String,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Submission failed: {0}")]
    Submission(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SwapError {
    pub fn price_source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PriceSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;

impl From<reqwest::Error> for SwapError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(value.to_string())
        }
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

impl From<rust_decimal::Error> for SwapError {
    fn from(value: rust_decimal::Error) -> Self {
        Self::InvalidAmount(value.to_string())
    }
}
