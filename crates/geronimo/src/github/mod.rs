//! GitHub remote client.
//!
//! Implements [`PlatformClient`](crate::platform::PlatformClient) against the
//! GitHub REST API, plus the public-events listing used by the CLI.

mod client;
mod convert;
mod error;
mod types;

pub use client::{GITHUB_API_URL, GitHubClient, LinkPagination, parse_link_header};
pub use error::GitHubError;
pub use types::{GitHubEvent, GitHubEventRepo, GitHubOwner, GitHubRepo, GitHubUser};
