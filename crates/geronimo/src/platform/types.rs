use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::Result;

/// Largest page size the remote API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Profile of the account being mirrored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Platform-specific numeric ID.
    pub id: i64,
    /// Username/login.
    pub login: String,
    /// Display name (if available).
    pub name: Option<String>,
    /// Company (if available).
    pub company: Option<String>,
    /// Public email (if available).
    pub email: Option<String>,
    /// Location (if available).
    pub location: Option<String>,
}

/// A repository owned by the mirrored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRepo {
    /// Platform-specific numeric ID.
    pub id: i64,
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// Repository description.
    pub description: Option<String>,
    /// When the repo was created.
    pub created_at: Option<DateTime<Utc>>,
    /// Primary programming language.
    pub language: Option<String>,
    /// Fork count.
    pub forks: Option<u32>,
    /// Star count.
    pub stars: Option<u32>,
    /// Subscriber count. The list endpoint usually omits it.
    pub subscribers: Option<u32>,
    /// Watcher count.
    pub watchers: Option<u32>,
    /// Open issue count.
    pub open_issues: Option<u32>,
}

impl PlatformRepo {
    /// Get the full name (owner/name).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// One page of a user's repository listing.
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    /// Repositories on this page, in API order.
    pub repos: Vec<PlatformRepo>,
    /// Next page number, or 0 when the listing is exhausted.
    pub next_page: u32,
    /// Last page number, when the API reports it.
    pub last_page: Option<u32>,
}

impl RepoPage {
    /// Whether this was the final page.
    #[inline]
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_page == 0
    }
}

/// Client for the remote collection API.
///
/// Implementations must be safe to share across tasks; the sync engine hands
/// one instance to the fetch worker after resolving the profile.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Get a user's profile by login.
    async fn get_user(&self, login: &str) -> Result<UserProfile>;

    /// Fetch one page of repositories owned by `login`.
    ///
    /// `page` is 1-indexed. `per_page` must not exceed [`MAX_PAGE_SIZE`].
    async fn list_user_repos_page(&self, login: &str, page: u32, per_page: u32)
    -> Result<RepoPage>;
}
