//! GitHub REST API payloads.
//!
//! Only the fields the mirror stores are deserialized; everything else in the
//! response is ignored.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /users/{login}`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

/// An entry of `GET /users/{login}/repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub owner: Option<GitHubOwner>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub forks_count: Option<u32>,
    #[serde(default)]
    pub stargazers_count: Option<u32>,
    #[serde(default)]
    pub subscribers_count: Option<u32>,
    #[serde(default)]
    pub watchers_count: Option<u32>,
    #[serde(default)]
    pub open_issues_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEventRepo {
    pub name: String,
}

/// An entry of `GET /users/{login}/events/public`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub repo: GitHubEventRepo,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
