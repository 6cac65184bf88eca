use thiserror::Error;

/// Errors returned by the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("Client configuration error: {0}")]
    Config(String),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
