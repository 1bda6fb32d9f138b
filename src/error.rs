use thiserror::Error;

use crate::domain::AccountCode;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid base URL {0}")]
    InvalidUrl(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("No opening balance recorded for account {0}")]
    NotFound(AccountCode),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unable to load bank statements")]
    Movements(#[source] SourceError),
}

pub type Result<T> = std::result::Result<T, SourceError>;
