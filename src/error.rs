//! Error types for rankeval

use thiserror::Error;

/// Main error type for metric evaluation
#[derive(Error, Debug)]
pub enum RankingError {
    /// Caller passed an argument outside the metric's contract (e.g. k = 0)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Evaluation configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input dataset could not be interpreted
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RankingError {
    pub(crate) fn non_positive_k(metric: &str) -> Self {
        Self::InvalidArgument(format!("{metric}: k must be positive, got 0"))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RankingError>;
