//! Geronimo - mirrors a GitHub account into Elasticsearch.
//!
//! A run fetches the account's profile and owned repositories from GitHub and
//! upserts one document per item into Elasticsearch, so the metadata can be
//! searched and aggregated there.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geronimo::{ElasticsearchClient, GitHubClient, SyncEngine, SyncOptions};
//!
//! let github = GitHubClient::new(geronimo::github::GITHUB_API_URL, Some(&token))?;
//! let store = ElasticsearchClient::new("localhost:9200", true)?;
//!
//! let report = SyncEngine::new(Arc::new(github), Arc::new(store), SyncOptions::default())
//!     .run("alice")
//!     .await?;
//! ```

pub mod document;
pub mod github;
pub mod http;
pub mod platform;
pub mod store;
pub mod sync;

pub use document::ToDocument;
pub use github::{GitHubClient, GitHubError};
pub use platform::{
    ApiRateLimiter, PlatformClient, PlatformError, PlatformRepo, RateLimitedClient, RepoPage,
    UserProfile, rate_limits,
};
pub use store::{DocumentStore, ElasticsearchClient, IndexManager, StoreError};
pub use sync::{
    FailureKind, ProgressCallback, SyncEngine, SyncError, SyncFailure, SyncOptions, SyncProgress,
    SyncReport, SyncStage,
};
