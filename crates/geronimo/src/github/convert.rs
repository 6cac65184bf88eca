//! Conversion from GitHub payloads to platform types.

use super::types::{GitHubRepo, GitHubUser};
use crate::platform::{PlatformRepo, UserProfile};

/// Convert a GitHub user to a platform-agnostic profile.
pub fn to_user_profile(user: GitHubUser) -> UserProfile {
    UserProfile {
        id: user.id,
        login: user.login,
        name: non_empty(user.name),
        company: non_empty(user.company),
        email: non_empty(user.email),
        location: non_empty(user.location),
    }
}

/// Convert a GitHub repository to a platform-agnostic repository.
///
/// `fallback_owner` is used when the payload carries no owner object.
pub fn to_platform_repo(repo: GitHubRepo, fallback_owner: &str) -> PlatformRepo {
    let owner = repo
        .owner
        .map(|o| o.login)
        .unwrap_or_else(|| fallback_owner.to_string());

    PlatformRepo {
        id: repo.id,
        owner,
        name: repo.name,
        description: non_empty(repo.description),
        created_at: repo.created_at,
        language: non_empty(repo.language),
        forks: repo.forks_count,
        stars: repo.stargazers_count,
        subscribers: repo.subscribers_count,
        watchers: repo.watchers_count,
        open_issues: repo.open_issues_count,
    }
}

// GitHub returns "" for cleared profile fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
