use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoboothError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("cannot fingerprint {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{service} failed: {detail}")]
    Collaborator {
        service: &'static str,
        detail: String,
    },

    #[error("{service} rate limited: {detail}")]
    RateLimited {
        service: &'static str,
        detail: String,
    },

    #[error("publish failed for {}: {source}", path.display())]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl PhotoboothError {
    /// Whether the error came from an external collaborator (analysis/generation).
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            PhotoboothError::Collaborator { .. } | PhotoboothError::RateLimited { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PhotoboothError>;
