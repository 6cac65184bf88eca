use geronimo::sync::{SyncProgress, SyncStage};

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::StageChanged { from, to } => {
                if to == SyncStage::Aborted {
                    tracing::warn!(from = %from, "Sync aborted");
                } else {
                    tracing::debug!(from = %from, to = %to, "Stage changed");
                }
            }

            SyncProgress::StoreReady {
                version,
                cluster_name,
            } => {
                tracing::info!(version = %version, cluster = %cluster_name, "Elasticsearch ready");
            }

            SyncProgress::ProfileResolved { login, id } => {
                tracing::debug!(login = %login, id, "Profile resolved");
            }

            SyncProgress::ProfileIndexed { login, index } => {
                tracing::info!(login = %login, index = %index, "Profile indexed");
            }

            SyncProgress::FetchingRepos {
                login,
                start_page,
                page_size,
            } => {
                tracing::info!(login = %login, start_page, page_size, "Fetching repositories");
            }

            SyncProgress::FetchedPage {
                page,
                count,
                total_so_far,
                last_page,
            } => {
                tracing::debug!(page, count, total_so_far, last_page = ?last_page, "Fetched page");
            }

            SyncProgress::PageFailed { page, error } => {
                tracing::warn!(page, error = %error, "Page fetch failed");
            }

            SyncProgress::FetchComplete {
                total,
                failed_pages,
            } => {
                tracing::info!(total, failed_pages, "Fetch complete");
            }

            SyncProgress::Indexed { name, index } => {
                tracing::debug!(repo = %name, index = %index, "Indexed");
            }

            SyncProgress::IndexError { name, error } => {
                tracing::warn!(repo = %name, error = %error, "Failed to index");
            }

            SyncProgress::IndexComplete { indexed, failed } => {
                tracing::info!(indexed, failed, "Indexing complete");
            }

            SyncProgress::Interrupted => {
                tracing::warn!("Sync interrupted, partial results kept");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
