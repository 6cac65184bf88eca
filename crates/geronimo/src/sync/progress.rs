//! Progress events emitted during a sync run.

use super::types::SyncStage;

/// Progress events emitted during a sync run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// The run moved to a new stage.
    StageChanged {
        from: SyncStage,
        to: SyncStage,
    },

    /// The document store answered the health check.
    StoreReady {
        /// Store version string.
        version: String,
        cluster_name: String,
    },

    /// The account profile was resolved.
    ProfileResolved {
        login: String,
        id: i64,
    },

    /// The profile document was written.
    ProfileIndexed {
        login: String,
        index: String,
    },

    /// Starting to fetch repositories.
    FetchingRepos {
        login: String,
        /// First page requested (1-indexed).
        start_page: u32,
        page_size: u32,
    },

    /// Fetched a page of repositories.
    FetchedPage {
        /// Page number (1-indexed).
        page: u32,
        /// Number of repos on this page.
        count: usize,
        /// Running total of repos fetched so far.
        total_so_far: usize,
        /// Last page, when the remote reports it.
        last_page: Option<u32>,
    },

    /// A page request failed; pagination continues with the next page.
    PageFailed {
        page: u32,
        error: String,
    },

    /// Finished fetching.
    FetchComplete {
        /// Total number of repositories fetched.
        total: usize,
        failed_pages: usize,
    },

    /// A repository document was written.
    Indexed {
        /// Repository name.
        name: String,
        index: String,
    },

    /// A repository could not be indexed and was skipped.
    IndexError {
        name: String,
        error: String,
    },

    /// The index worker finished.
    IndexComplete {
        indexed: usize,
        failed: usize,
    },

    /// A shutdown request stopped the run early.
    Interrupted,
}

/// Callback for progress updates during a run.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
