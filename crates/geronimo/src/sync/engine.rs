//! Sync engine: mirrors one account's profile and repositories.
//!
//! A run checks the store, resolves the profile, writes the profile document,
//! then streams repositories from a fetch worker to an index worker over a
//! bounded channel.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geronimo::sync::{SyncEngine, SyncOptions};
//!
//! let engine = SyncEngine::new(Arc::new(github), Arc::new(elasticsearch), SyncOptions::default());
//! let report = engine.run("alice").await?;
//! println!("Indexed {} of {} repositories", report.indexed, report.fetched);
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::document::ToDocument;
use crate::platform::PlatformClient;
use crate::store::{DocumentStore, IndexManager, account_index};

use super::errors::SyncError;
use super::fetch_task::spawn_fetch_task;
use super::index_task::{await_worker, spawn_index_task};
use super::paginator::Paginator;
use super::progress::{ProgressCallback, SyncProgress, emit};
use super::stop::StopSignal;
use super::types::{FailureKind, SyncFailure, SyncOptions, SyncReport, SyncStage};

/// Run `fut` to completion, or until `deadline` passes.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Synchronizes a remote account into a document store.
pub struct SyncEngine {
    remote: Arc<dyn PlatformClient>,
    store: Arc<dyn DocumentStore>,
    options: SyncOptions,
    on_progress: Option<Arc<ProgressCallback>>,
    shutdown: Option<Arc<AtomicBool>>,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn PlatformClient>,
        store: Arc<dyn DocumentStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            remote,
            store,
            options,
            on_progress: None,
            shutdown: None,
        }
    }

    /// Report progress events to `callback`.
    pub fn with_progress(mut self, callback: Arc<ProgressCallback>) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Stop early once `flag` is set. Checked before each page and each item.
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    fn progress(&self) -> Option<&ProgressCallback> {
        self.on_progress.as_deref()
    }

    fn transition(&self, stage: &mut SyncStage, to: SyncStage) {
        tracing::debug!(from = %stage, to = %to, "Sync stage");
        emit(self.progress(), SyncProgress::StageChanged { from: *stage, to });
        *stage = to;
    }

    fn abort(&self, stage: &mut SyncStage, err: SyncError) -> SyncError {
        tracing::error!(stage = %stage, error = %err, "Sync aborted");
        self.transition(stage, SyncStage::Aborted);
        err
    }

    fn timed_out(&self) -> SyncError {
        SyncError::TimedOut(self.options.timeout.unwrap_or_default())
    }

    /// Mirror `login` into the store.
    ///
    /// Store, profile and timeout problems abort the run. Page, index and
    /// upsert problems are recorded in the report and the run carries on.
    #[tracing::instrument(
        skip(self),
        fields(
            page_size = self.options.effective_page_size(),
            offset = self.options.offset
        )
    )]
    pub async fn run(&self, login: &str) -> Result<SyncReport, SyncError> {
        let mut stage = SyncStage::Init;
        let login = login.trim();
        if login.is_empty() {
            return Err(self.abort(
                &mut stage,
                SyncError::Configuration("login must not be empty".to_string()),
            ));
        }

        let deadline = self.options.timeout.map(|t| Instant::now() + t);

        let info = match within(deadline, self.store.ping()).await {
            None => return Err(self.abort(&mut stage, self.timed_out())),
            Some(Err(e)) => return Err(self.abort(&mut stage, SyncError::StoreUnreachable(e))),
            Some(Ok(info)) => info,
        };
        tracing::info!(
            version = %info.version,
            cluster = %info.cluster_name,
            "Document store reachable"
        );
        emit(
            self.progress(),
            SyncProgress::StoreReady {
                version: info.version,
                cluster_name: info.cluster_name,
            },
        );

        self.transition(&mut stage, SyncStage::ProfileSync);
        let profile = match within(deadline, self.remote.get_user(login)).await {
            None => return Err(self.abort(&mut stage, self.timed_out())),
            Some(Err(e)) => return Err(self.abort(&mut stage, SyncError::from_lookup(login, e))),
            Some(Ok(profile)) => profile,
        };
        emit(
            self.progress(),
            SyncProgress::ProfileResolved {
                login: profile.login.clone(),
                id: profile.id,
            },
        );

        let mut report = SyncReport {
            login: profile.login.clone(),
            ..Default::default()
        };

        let manager = IndexManager::new(Arc::clone(&self.store));
        let index = account_index(&profile.login);
        let written = match profile.to_json() {
            Ok(document) => within(
                deadline,
                manager.upsert(&index, profile.doc_type(), &profile.doc_id(), &document),
            )
            .await
            .map(|r| r.map_err(|e| e.to_string())),
            Err(e) => Some(Err(e.to_string())),
        };
        match written {
            None => return Err(self.abort(&mut stage, self.timed_out())),
            Some(Ok(_)) => {
                report.profile_indexed = true;
                tracing::info!(login = %profile.login, index = %index, "Indexed profile");
                emit(
                    self.progress(),
                    SyncProgress::ProfileIndexed {
                        login: profile.login.clone(),
                        index,
                    },
                );
            }
            Some(Err(message)) => {
                tracing::warn!(login = %profile.login, error = %message, "Failed to index profile");
                report.failures.push(SyncFailure::new(
                    FailureKind::ProfileIndex,
                    profile.login.clone(),
                    message,
                ));
            }
        }

        self.transition(&mut stage, SyncStage::CollectionFetch);
        let stop = StopSignal::new(self.shutdown.clone());
        let paginator = Paginator::new(Arc::clone(&self.remote), profile.login.clone(), &self.options)
            .with_stop(stop.clone());
        emit(
            self.progress(),
            SyncProgress::FetchingRepos {
                login: profile.login.clone(),
                start_page: self.options.start_page(),
                page_size: paginator.page_size(),
            },
        );
        tracing::debug!(
            channel_capacity = self.options.channel_capacity(),
            index_concurrency = self.options.index_concurrency,
            "Starting fetch and index workers"
        );

        let (tx, rx) = mpsc::channel(self.options.channel_capacity());
        let fetch_handle = spawn_fetch_task(paginator, tx, stop.clone(), self.on_progress.clone());
        let index_handle = spawn_index_task(
            manager,
            profile.login.clone(),
            rx,
            stop.clone(),
            self.on_progress.clone(),
        );

        let workers = async {
            let fetch = await_worker(fetch_handle, "fetch").await;
            emit(
                self.progress(),
                SyncProgress::StageChanged {
                    from: SyncStage::CollectionFetch,
                    to: SyncStage::CollectionIndexing,
                },
            );
            let index = await_worker(index_handle, "index").await;
            (fetch, index)
        };
        tokio::pin!(workers);

        let mut timed_out = false;
        let (fetch, indexed) = match deadline {
            Some(deadline) => tokio::select! {
                out = &mut workers => out,
                () = tokio::time::sleep_until(deadline) => {
                    tracing::warn!("Sync deadline reached, stopping workers");
                    stop.cancel();
                    timed_out = true;
                    workers.await
                }
            },
            None => workers.await,
        };
        stage = SyncStage::CollectionIndexing;

        if timed_out {
            return Err(self.abort(&mut stage, self.timed_out()));
        }
        let fetch = fetch.map_err(|e| self.abort(&mut stage, SyncError::Worker(e)))?;
        let indexed = indexed.map_err(|e| self.abort(&mut stage, SyncError::Worker(e)))?;

        report.pages_requested = fetch.pages_requested;
        report.fetched = fetch.fetched;
        report.indexed = indexed.indexed;
        report.failures.extend(fetch.failures);
        report.failures.extend(indexed.failures);
        report.interrupted = fetch.interrupted || indexed.interrupted;

        if report.interrupted {
            tracing::warn!(
                fetched = report.fetched,
                indexed = report.indexed,
                "Sync interrupted by shutdown request"
            );
            emit(self.progress(), SyncProgress::Interrupted);
        }

        self.transition(&mut stage, SyncStage::Done);
        tracing::info!(
            pages = report.pages_requested,
            fetched = report.fetched,
            indexed = report.indexed,
            failures = report.failures.len(),
            "Sync complete"
        );
        Ok(report)
    }
}
