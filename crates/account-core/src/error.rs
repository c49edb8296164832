//! Error types for account operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Identity decode error: {0}")]
    IdentityDecode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<::config::ConfigError> for AccountError {
    fn from(err: ::config::ConfigError) -> Self {
        AccountError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AccountError>;
