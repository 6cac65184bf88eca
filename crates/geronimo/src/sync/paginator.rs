//! Page-by-page retrieval of a user's repositories.

use std::sync::Arc;
use std::time::Duration;

use crate::platform::{PlatformClient, PlatformError, PlatformRepo};

use super::stop::StopSignal;
use super::types::{MAX_CONSECUTIVE_PAGE_FAILURES, SyncOptions};

/// Result of one page request.
#[derive(Debug)]
pub enum PageOutcome {
    Fetched {
        page: u32,
        repos: Vec<PlatformRepo>,
        last_page: Option<u32>,
    },
    Failed {
        page: u32,
        error: PlatformError,
    },
}

/// Everything a full pagination produced.
#[derive(Debug, Default)]
pub struct PaginatedRepos {
    /// Repositories in remote order.
    pub repos: Vec<PlatformRepo>,
    /// Pages that failed, with their errors.
    pub failed_pages: Vec<(u32, PlatformError)>,
}

/// Cursor over the pages of a user's repository listing.
///
/// Stops when the remote reports no next page. A failed page is skipped and
/// the following page requested. Once the remote has reported its last page,
/// failures stop pagination only at that page; before that, too many failures
/// in a row end it.
pub struct Paginator {
    client: Arc<dyn PlatformClient>,
    login: String,
    page_size: u32,
    page_delay: Duration,
    next: Option<u32>,
    last_page: Option<u32>,
    requested: u32,
    consecutive_failures: u32,
    stop: Option<StopSignal>,
}

impl Paginator {
    pub fn new(client: Arc<dyn PlatformClient>, login: impl Into<String>, options: &SyncOptions) -> Self {
        Self {
            client,
            login: login.into(),
            page_size: options.effective_page_size(),
            page_delay: options.page_delay,
            next: Some(options.start_page()),
            last_page: None,
            requested: 0,
            consecutive_failures: 0,
            stop: None,
        }
    }

    /// Cut the inter-page delay short when the run is cancelled.
    pub(crate) fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Number of page requests issued so far.
    pub fn pages_requested(&self) -> u32 {
        self.requested
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Request the next page. Returns `None` once pagination is over.
    pub async fn next_page(&mut self) -> Option<PageOutcome> {
        let page = self.next?;

        if self.requested > 0 && !self.page_delay.is_zero() {
            match &self.stop {
                Some(stop) => {
                    tokio::select! {
                        () = tokio::time::sleep(self.page_delay) => {}
                        () = stop.cancelled_wait() => {
                            tracing::debug!(page, "Cancelled while waiting between pages");
                            self.next = None;
                            return None;
                        }
                    }
                }
                None => tokio::time::sleep(self.page_delay).await,
            }
        }
        self.requested += 1;

        match self
            .client
            .list_user_repos_page(&self.login, page, self.page_size)
            .await
        {
            Ok(result) => {
                self.consecutive_failures = 0;
                if result.last_page.is_some() {
                    self.last_page = result.last_page;
                }

                self.next = match result.next_page {
                    0 => None,
                    next if next <= page => {
                        tracing::warn!(
                            login = %self.login,
                            page,
                            next,
                            "Remote reported a next page that does not advance, stopping"
                        );
                        None
                    }
                    next => Some(next),
                };

                Some(PageOutcome::Fetched {
                    page,
                    repos: result.repos,
                    last_page: self.last_page,
                })
            }
            Err(error) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    login = %self.login,
                    page,
                    consecutive = self.consecutive_failures,
                    error = %error,
                    "Failed to fetch repository page"
                );

                // A known last page bounds the loop; otherwise cap the streak.
                self.next = match self.last_page {
                    Some(last) if page >= last => None,
                    Some(_) => page.checked_add(1),
                    None if self.consecutive_failures >= MAX_CONSECUTIVE_PAGE_FAILURES => None,
                    None => page.checked_add(1),
                };

                Some(PageOutcome::Failed { page, error })
            }
        }
    }

    /// Drain every remaining page.
    pub async fn fetch_all(mut self) -> PaginatedRepos {
        let mut all = PaginatedRepos::default();
        while let Some(outcome) = self.next_page().await {
            match outcome {
                PageOutcome::Fetched { repos, .. } => all.repos.extend(repos),
                PageOutcome::Failed { page, error } => all.failed_pages.push((page, error)),
            }
        }
        all
    }
}
