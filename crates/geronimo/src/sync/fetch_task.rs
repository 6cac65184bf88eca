//! Fetch worker: drives the paginator and feeds the index worker.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::platform::PlatformRepo;

use super::paginator::{PageOutcome, Paginator};
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::stop::StopSignal;
use super::types::{FailureKind, SyncFailure};

/// What the fetch worker did.
#[derive(Debug, Default)]
pub(crate) struct FetchTaskResult {
    pub pages_requested: u32,
    pub fetched: usize,
    pub failures: Vec<SyncFailure>,
    /// Stopped by a shutdown request before pagination ended.
    pub interrupted: bool,
}

/// Spawn the fetch worker.
///
/// The sender is dropped when pagination ends, which closes the channel and
/// lets the index worker finish. If the index worker goes away first, the
/// failed send stops pagination.
pub(crate) fn spawn_fetch_task(
    mut paginator: Paginator,
    tx: mpsc::Sender<PlatformRepo>,
    stop: StopSignal,
    on_progress: Option<Arc<ProgressCallback>>,
) -> JoinHandle<FetchTaskResult> {
    tokio::spawn(async move {
        let mut result = FetchTaskResult::default();

        'pages: loop {
            if stop.should_stop() {
                result.interrupted = stop.shutdown_requested();
                tracing::debug!(
                    interrupted = result.interrupted,
                    "Fetch worker stopping early"
                );
                break;
            }

            let Some(outcome) = paginator.next_page().await else {
                break;
            };

            match outcome {
                PageOutcome::Fetched {
                    page,
                    repos,
                    last_page,
                } => {
                    result.fetched += repos.len();
                    emit(
                        on_progress.as_deref(),
                        SyncProgress::FetchedPage {
                            page,
                            count: repos.len(),
                            total_so_far: result.fetched,
                            last_page,
                        },
                    );

                    for repo in repos {
                        if tx.send(repo).await.is_err() {
                            tracing::debug!(page, "Index worker closed the channel");
                            break 'pages;
                        }
                    }
                }
                PageOutcome::Failed { page, error } => {
                    let error = error.to_string();
                    emit(
                        on_progress.as_deref(),
                        SyncProgress::PageFailed {
                            page,
                            error: error.clone(),
                        },
                    );
                    result
                        .failures
                        .push(SyncFailure::new(FailureKind::PageFetch, format!("page {page}"), error));
                }
            }
        }

        result.pages_requested = paginator.pages_requested();
        emit(
            on_progress.as_deref(),
            SyncProgress::FetchComplete {
                total: result.fetched,
                failed_pages: result.failures.len(),
            },
        );
        tracing::debug!(
            pages = result.pages_requested,
            fetched = result.fetched,
            failed_pages = result.failures.len(),
            "Fetch worker completed"
        );
        result
    })
}
