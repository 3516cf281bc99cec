//! Error types shared across proxygen crates.

use std::path::PathBuf;

/// Top-level error type for proxygen operations.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Metadata error: {message}")]
    Metadata { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using ProxyError.
pub type ProxygenResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error must abort the whole batch rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotADirectory { .. } | Self::Config { .. } | Self::Unsupported { .. }
        )
    }
}
