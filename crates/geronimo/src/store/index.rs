//! Index existence tracking and document writes.

use std::collections::HashSet;
use std::sync::Arc;

use super::errors::{Result, StoreError};
use super::{DocumentStore, IndexAck};

/// Index holding an account's documents.
pub fn account_index(login: &str) -> String {
    login.to_lowercase()
}

/// Per-repository index, `<login>_<repo>` lowercased.
pub fn repository_index(login: &str, repo: &str) -> String {
    format!("{login}_{repo}").to_lowercase()
}

/// Ensures indices exist and writes documents into them.
///
/// Indices confirmed during the run are remembered so later calls for the
/// same name do not hit the store again. Owned by a single worker.
pub struct IndexManager {
    store: Arc<dyn DocumentStore>,
    known: HashSet<String>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            known: HashSet::new(),
        }
    }

    /// Make sure `name` exists, creating it when missing.
    ///
    /// A concurrent creation by another writer counts as success.
    pub async fn ensure_index(&mut self, name: &str) -> Result<()> {
        if self.known.contains(name) {
            return Ok(());
        }

        if !self.store.index_exists(name).await? {
            match self.store.create_index(name).await {
                Ok(()) => tracing::info!(index = name, "Created index"),
                Err(StoreError::IndexAlreadyExists(_)) => {
                    tracing::debug!(index = name, "Index created concurrently");
                }
                Err(e) => return Err(e),
            }
        }

        self.known.insert(name.to_string());
        Ok(())
    }

    /// Replace the document at `index/doc_type/id`.
    pub async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &serde_json::Value,
    ) -> Result<IndexAck> {
        self.store.upsert(index, doc_type, id, document).await
    }
}
