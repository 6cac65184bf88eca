use std::time::Duration;

use thiserror::Error;

use crate::platform::PlatformError;
use crate::store::StoreError;

/// Fatal errors that abort a sync run.
///
/// Per-item problems are not errors; they are collected as
/// [`SyncFailure`](super::SyncFailure)s in the report.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Document store unreachable: {0}")]
    StoreUnreachable(#[source] StoreError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Authentication failed for {login}: {source}")]
    Auth {
        login: String,
        #[source]
        source: PlatformError,
    },

    #[error("Failed to look up account {login}: {source}")]
    AccountLookup {
        login: String,
        #[source]
        source: PlatformError,
    },

    #[error("Sync timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("Sync worker failed: {0}")]
    Worker(String),
}

impl SyncError {
    /// Classify a failed profile lookup.
    pub fn from_lookup(login: &str, source: PlatformError) -> Self {
        match source {
            PlatformError::NotFound { .. } => Self::AccountNotFound(login.to_string()),
            PlatformError::AuthRequired => Self::Auth {
                login: login.to_string(),
                source,
            },
            source => Self::AccountLookup {
                login: login.to_string(),
                source,
            },
        }
    }
}
