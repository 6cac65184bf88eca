//! Index worker: writes repositories received from the fetch worker.
//!
//! ```text
//! Paginator → fetch worker → repo channel → index worker → DocumentStore
//! ```
//!
//! Each repository gets its own index ensured and its document upserted
//! exactly once. Failures are recorded and the repository skipped; nothing
//! is retried within a run.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::document::ToDocument;
use crate::platform::PlatformRepo;
use crate::store::{IndexManager, account_index, repository_index};

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::stop::StopSignal;
use super::types::{FailureKind, SyncFailure};

/// What the index worker did.
#[derive(Debug, Default)]
#[must_use = "IndexTaskResult may contain failures that should be checked"]
pub(crate) struct IndexTaskResult {
    pub indexed: usize,
    pub failures: Vec<SyncFailure>,
    /// Stopped by a shutdown request with items still queued.
    pub interrupted: bool,
}

async fn index_one(
    manager: &mut IndexManager,
    login: &str,
    repo: &PlatformRepo,
) -> Result<String, SyncFailure> {
    let repo_index = repository_index(login, &repo.name);
    manager
        .ensure_index(&repo_index)
        .await
        .map_err(|e| SyncFailure::new(FailureKind::IndexEnsure, repo.full_name(), e.to_string()))?;

    let target = account_index(login);
    let document = repo
        .to_json()
        .map_err(|e| SyncFailure::new(FailureKind::Upsert, repo.full_name(), e.to_string()))?;
    manager
        .upsert(&target, repo.doc_type(), &repo.doc_id(), &document)
        .await
        .map_err(|e| SyncFailure::new(FailureKind::Upsert, repo.full_name(), e.to_string()))?;

    Ok(target)
}

/// Spawn the index worker.
///
/// Runs until the channel is closed and drained, or a stop is requested.
pub(crate) fn spawn_index_task(
    mut manager: IndexManager,
    login: String,
    mut rx: mpsc::Receiver<PlatformRepo>,
    stop: StopSignal,
    on_progress: Option<Arc<ProgressCallback>>,
) -> JoinHandle<IndexTaskResult> {
    tokio::spawn(async move {
        let mut result = IndexTaskResult::default();
        let task_start = std::time::Instant::now();

        tracing::debug!("Index worker started, waiting for repositories");

        while let Some(repo) = rx.recv().await {
            if stop.should_stop() {
                result.interrupted = stop.shutdown_requested();
                tracing::debug!(
                    interrupted = result.interrupted,
                    "Index worker stopping early"
                );
                break;
            }

            match index_one(&mut manager, &login, &repo).await {
                Ok(index) => {
                    result.indexed += 1;
                    tracing::debug!(repo = %repo.full_name(), id = repo.id, "Indexed repository");
                    emit(
                        on_progress.as_deref(),
                        SyncProgress::Indexed {
                            name: repo.name,
                            index,
                        },
                    );
                }
                Err(failure) => {
                    tracing::warn!(
                        repo = %repo.full_name(),
                        id = repo.id,
                        kind = %failure.kind,
                        error = %failure.message,
                        "Failed to index repository"
                    );
                    emit(
                        on_progress.as_deref(),
                        SyncProgress::IndexError {
                            name: repo.name,
                            error: failure.message.clone(),
                        },
                    );
                    result.failures.push(failure);
                }
            }
        }

        emit(
            on_progress.as_deref(),
            SyncProgress::IndexComplete {
                indexed: result.indexed,
                failed: result.failures.len(),
            },
        );
        tracing::debug!(
            indexed = result.indexed,
            failed = result.failures.len(),
            elapsed_ms = task_start.elapsed().as_millis(),
            "Index worker completed"
        );
        result
    })
}

fn describe_join_error(e: JoinError) -> String {
    if e.is_panic() {
        let payload = e.into_panic();
        if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        }
    } else if e.is_cancelled() {
        "Task was cancelled".to_string()
    } else {
        format!("Task failed: {e}")
    }
}

/// Await a worker, turning a panic or cancellation into its message.
pub(crate) async fn await_worker<T>(handle: JoinHandle<T>, worker: &str) -> Result<T, String> {
    handle.await.map_err(|e| {
        let info = describe_join_error(e);
        tracing::error!(worker, panic_info = %info, "Sync worker failed");
        format!("{worker} worker: {info}")
    })
}
