//! Error types for the publisher

use serde::Serialize;
use thiserror::Error;

/// Main error type for the publisher
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Credential error: {0}")]
    CredentialError(String),

    #[error("System credential quota exhausted: {used} of {limit} deployments used")]
    QuotaExceeded { limit: u32, used: u32 },

    #[error("{provider} error: {message}")]
    ProviderError { provider: String, message: String },

    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classification exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Credential,
    Provider,
    Persistence,
    Internal,
}

impl PublishError {
    /// Shorthand for a provider failure
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        PublishError::ProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::ValidationError(_) | PublishError::NotFound(_) => ErrorKind::Validation,
            PublishError::CredentialError(_) | PublishError::QuotaExceeded { .. } => {
                ErrorKind::Credential
            }
            PublishError::ProviderError { .. } | PublishError::HttpError(_) => ErrorKind::Provider,
            PublishError::PersistenceError(_) => ErrorKind::Persistence,
            PublishError::IoError(_)
            | PublishError::JsonError(_)
            | PublishError::ConfigError(_)
            | PublishError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller should be offered the personal-credential path
    pub fn is_credential_error(&self) -> bool {
        self.kind() == ErrorKind::Credential
    }
}
