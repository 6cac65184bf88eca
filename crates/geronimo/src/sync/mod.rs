//! Sync pipeline.
//!
//! # Module Structure
//!
//! - [`types`] - `SyncOptions`, `SyncReport`, failures, stages, constants
//! - [`progress`] - `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`paginator`] - page cursor over a user's repositories
//! - [`engine`] - `SyncEngine`, which runs the whole pipeline

pub mod engine;
mod errors;
mod fetch_task;
mod index_task;
pub mod paginator;
mod progress;
mod stop;
mod types;

pub use engine::SyncEngine;
pub use errors::SyncError;
pub use paginator::{PageOutcome, PaginatedRepos, Paginator};
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use types::{FailureKind, SyncFailure, SyncOptions, SyncReport, SyncStage};

pub use types::{
    DEFAULT_FETCH_CONCURRENCY, DEFAULT_INDEX_CONCURRENCY, DEFAULT_PAGE_SIZE,
    MAX_CONSECUTIVE_PAGE_FAILURES,
};
