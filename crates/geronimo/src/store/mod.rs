//! Document store abstraction and the Elasticsearch implementation.

mod elasticsearch;
mod errors;
mod index;

use async_trait::async_trait;
use serde::Deserialize;

pub use elasticsearch::{ElasticsearchClient, normalize_host};
pub use errors::{Result, StoreError};
pub use index::{IndexManager, account_index, repository_index};

/// Identity of the store returned by a health check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreInfo {
    pub version: String,
    pub cluster_name: String,
}

/// Acknowledgement of a document write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IndexAck {
    #[serde(rename = "_index", default)]
    pub index: String,
    #[serde(rename = "_id", default)]
    pub id: String,
    /// `created` or `updated`.
    #[serde(default)]
    pub result: String,
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
}

/// A document-oriented store addressed by index, type and id.
///
/// Implementations must be safe to share between the engine and its
/// index worker.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Health check.
    async fn ping(&self) -> Result<StoreInfo>;

    async fn index_exists(&self, name: &str) -> Result<bool>;

    /// Create an index. Fails with [`StoreError::IndexAlreadyExists`] when
    /// another writer created it first.
    async fn create_index(&self, name: &str) -> Result<()>;

    /// Full replace of the document at `index/doc_type/id`.
    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &serde_json::Value,
    ) -> Result<IndexAck>;
}
