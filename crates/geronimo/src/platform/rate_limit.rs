use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::errors::Result;
use super::types::{PlatformClient, RepoPage, UserProfile};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default client-side rate limits (requests per second).
pub mod rate_limits {
    /// GitHub: 5000 requests/hour authenticated, we allow bursts of 10/sec.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
    /// Unauthenticated GitHub access only gets 60 requests/hour.
    pub const GITHUB_ANONYMOUS_RPS: u32 = 1;
}

fn quota(requests_per_second: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN))
}

/// A standalone API rate limiter using the governor crate.
///
/// # Example
///
/// ```ignore
/// use geronimo::platform::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
///
/// limiter.wait().await;
/// client.get_user("alice").await?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A value of 0 is treated as 1.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            inner: Arc::new(RateLimiter::direct(quota(requests_per_second))),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

/// A rate-limited wrapper around any `PlatformClient`.
///
/// Every trait method waits for the limiter before delegating.
///
/// ```ignore
/// let client = GitHubClient::new(api_url, token)?;
/// let client = RateLimitedClient::new(client, rate_limits::GITHUB_DEFAULT_RPS);
/// ```
pub struct RateLimitedClient<C> {
    inner: C,
    limiter: ApiRateLimiter,
}

impl<C> RateLimitedClient<C> {
    /// Create a new rate-limited client wrapper.
    pub fn new(inner: C, requests_per_second: u32) -> Self {
        Self {
            inner,
            limiter: ApiRateLimiter::new(requests_per_second),
        }
    }

    /// Get a reference to the inner client.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Clone> Clone for RateLimitedClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

#[async_trait]
impl<C: PlatformClient> PlatformClient for RateLimitedClient<C> {
    async fn get_user(&self, login: &str) -> Result<UserProfile> {
        self.limiter.wait().await;
        self.inner.get_user(login).await
    }

    async fn list_user_repos_page(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> Result<RepoPage> {
        self.limiter.wait().await;
        self.inner.list_user_repos_page(login, page, per_page).await
    }
}
