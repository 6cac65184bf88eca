//! Platform-agnostic interface to the remote collection API.
//!
//! The sync engine only sees [`PlatformClient`]; the GitHub implementation
//! lives in [`crate::github`].
//!
//! # Example
//!
//! ```ignore
//! use geronimo::platform::PlatformClient;
//!
//! async fn first_page<C: PlatformClient>(client: &C) -> Result<(), PlatformError> {
//!     let page = client.list_user_repos_page("alice", 1, 100).await?;
//!     for repo in &page.repos {
//!         println!("{}", repo.full_name());
//!     }
//!     Ok(())
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result};
pub use rate_limit::{ApiRateLimiter, RateLimitedClient, rate_limits};
pub use types::{MAX_PAGE_SIZE, PlatformClient, PlatformRepo, RepoPage, UserProfile};
