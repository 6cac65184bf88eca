//! Storage documents built from remote items.
//!
//! Mapping is pure and total: every absent field is replaced by the value in
//! [`defaults`], so stored documents never contain nulls.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::platform::{PlatformRepo, UserProfile};

/// Values substituted for absent fields.
pub mod defaults {
    /// Language of a repository with no detected language.
    pub const LANGUAGE: &str = "None";
    /// Absent free-text fields.
    pub const TEXT: &str = "";
    /// Absent creation timestamp.
    pub const CREATED: &str = "";
    /// Absent counters.
    pub const COUNT: u32 = 0;
}

/// Document type of a user profile.
pub const USER_DOC_TYPE: &str = "user";
/// Document type of a repository.
pub const REPOSITORY_DOC_TYPE: &str = "repository";

/// An item that can be written to the document store.
pub trait ToDocument {
    type Document: Serialize;

    /// Build the storage document.
    fn to_document(&self) -> Self::Document;

    /// Document type the item is stored under.
    fn doc_type(&self) -> &'static str;

    /// Document id within its index.
    fn doc_id(&self) -> String;

    /// The document as JSON.
    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self.to_document())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDocument {
    pub user: String,
    pub name: String,
    pub company: String,
    pub email: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryDocument {
    pub name: String,
    pub description: String,
    pub created: String,
    pub language: String,
    pub fork_count: u32,
    pub star_count: u32,
    pub subscriber_count: u32,
    pub watcher_count: u32,
    pub open_issue_count: u32,
}

fn text(value: &Option<String>) -> String {
    value.as_deref().unwrap_or(defaults::TEXT).to_string()
}

fn count(value: Option<u32>) -> u32 {
    value.unwrap_or(defaults::COUNT)
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || defaults::CREATED.to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

impl ToDocument for UserProfile {
    type Document = UserDocument;

    fn to_document(&self) -> UserDocument {
        UserDocument {
            user: self.login.clone(),
            name: text(&self.name),
            company: text(&self.company),
            email: text(&self.email),
            location: text(&self.location),
        }
    }

    fn doc_type(&self) -> &'static str {
        USER_DOC_TYPE
    }

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}

impl ToDocument for PlatformRepo {
    type Document = RepositoryDocument;

    fn to_document(&self) -> RepositoryDocument {
        RepositoryDocument {
            name: self.name.clone(),
            description: text(&self.description),
            created: timestamp(self.created_at),
            language: self
                .language
                .as_deref()
                .unwrap_or(defaults::LANGUAGE)
                .to_string(),
            fork_count: count(self.forks),
            star_count: count(self.stars),
            subscriber_count: count(self.subscribers),
            watcher_count: count(self.watchers),
            open_issue_count: count(self.open_issues),
        }
    }

    fn doc_type(&self) -> &'static str {
        REPOSITORY_DOC_TYPE
    }

    fn doc_id(&self) -> String {
        self.id.to_string()
    }
}
