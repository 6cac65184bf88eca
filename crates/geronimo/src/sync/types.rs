//! Run options, report and failure types.

use std::fmt;
use std::time::Duration;

use crate::platform::MAX_PAGE_SIZE;

/// Default capacity of the fetch-to-index channel.
pub const DEFAULT_FETCH_CONCURRENCY: usize = 10;

/// Default index concurrency hint.
pub const DEFAULT_INDEX_CONCURRENCY: usize = 4;

/// Default repositories per page.
pub const DEFAULT_PAGE_SIZE: u32 = MAX_PAGE_SIZE;

/// Consecutive failed pages after which pagination gives up.
pub const MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Options for a single sync run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Capacity of the bounded channel between the fetch and index workers.
    pub fetch_concurrency: usize,
    /// Index concurrency hint. A run uses one index worker regardless.
    pub index_concurrency: usize,
    /// Number of repositories to skip, rounded down to a page boundary.
    pub offset: u32,
    /// Repositories per page, clamped to `1..=100`.
    pub page_size: u32,
    /// Pause between successive page requests.
    pub page_delay: Duration,
    /// Deadline for the whole run.
    pub timeout: Option<Duration>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            index_concurrency: DEFAULT_INDEX_CONCURRENCY,
            offset: 0,
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: Duration::ZERO,
            timeout: None,
        }
    }
}

impl SyncOptions {
    /// Page size actually sent to the remote.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// First page to request (1-indexed).
    pub fn start_page(&self) -> u32 {
        (self.offset / self.effective_page_size()).saturating_add(1)
    }

    /// Capacity of the handoff channel.
    pub fn channel_capacity(&self) -> usize {
        self.fetch_concurrency.max(1)
    }
}

/// Kind of a non-fatal failure recorded during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A repository page could not be fetched.
    PageFetch,
    /// The profile document could not be written.
    ProfileIndex,
    /// A repository index could not be checked or created.
    IndexEnsure,
    /// A repository document could not be written.
    Upsert,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PageFetch => "page fetch",
            Self::ProfileIndex => "profile index",
            Self::IndexEnsure => "index ensure",
            Self::Upsert => "upsert",
        };
        f.write_str(s)
    }
}

/// A non-fatal failure. The affected item is skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub kind: FailureKind,
    /// What failed: a page number, a login or a repository name.
    pub subject: String,
    pub message: String,
}

impl SyncFailure {
    pub fn new(kind: FailureKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.kind, self.subject, self.message)
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[must_use = "SyncReport may contain failures that should be reported"]
pub struct SyncReport {
    pub login: String,
    /// Whether the profile document was written.
    pub profile_indexed: bool,
    /// Page requests issued, including failed ones.
    pub pages_requested: u32,
    /// Repositories received from the remote.
    pub fetched: usize,
    /// Repository documents written.
    pub indexed: usize,
    pub failures: Vec<SyncFailure>,
    /// Stopped early by a shutdown request.
    pub interrupted: bool,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Failures of the given kind.
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &SyncFailure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }
}

/// Stages of a run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Init,
    ProfileSync,
    CollectionFetch,
    CollectionIndexing,
    Done,
    Aborted,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::ProfileSync => "profile sync",
            Self::CollectionFetch => "collection fetch",
            Self::CollectionIndexing => "collection indexing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
