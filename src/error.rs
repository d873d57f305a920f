use thiserror::Error;

/// Errors surfaced by the provider client, repository and aggregation layer.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network failure, non-2xx status, provider-reported error or undecodable body.
    #[error("Provider fetch failed: {0}")]
    Fetch(String),

    /// Provider payload decoded but did not have the expected shape.
    #[error("Invalid provider payload: {0}")]
    InvalidPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::Fetch(e.to_string())
    }
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;
