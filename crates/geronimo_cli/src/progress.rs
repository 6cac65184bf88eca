//! Progress reporting for sync runs.
//!
//! Two modes:
//! - Interactive (TTY): indicatif spinners and a counter for indexed documents
//! - Logging (non-TTY): structured tracing events

mod interactive;
mod logging;

use std::sync::Arc;

use console::Term;
use geronimo::sync::{ProgressCallback, SyncProgress};

pub use interactive::InteractiveReporter;
pub use logging::LoggingReporter;

/// Progress reporter that handles both interactive and logging modes.
pub enum ProgressReporter {
    /// Interactive progress bars for TTY.
    Interactive(InteractiveReporter),
    /// Structured logging for non-TTY (CI, pipes).
    Logging(LoggingReporter),
}

impl ProgressReporter {
    /// Create a new progress reporter, auto-detecting TTY mode.
    pub fn new() -> Self {
        if Term::stdout().is_term() {
            Self::Interactive(InteractiveReporter::new())
        } else {
            Self::Logging(LoggingReporter::new())
        }
    }

    /// Handle a progress event.
    pub fn handle(&self, event: SyncProgress) {
        match self {
            Self::Interactive(r) => r.handle(event),
            Self::Logging(r) => r.handle(event),
        }
    }

    /// Convert to a ProgressCallback for the library.
    pub fn as_callback(self: &Arc<Self>) -> Arc<ProgressCallback> {
        let reporter = Arc::clone(self);
        Arc::new(Box::new(move |event| {
            reporter.handle(event);
        }))
    }

    /// Finish all progress bars (interactive mode only).
    pub fn finish(&self) {
        if let Self::Interactive(r) = self {
            r.finish();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geronimo::sync::SyncStage;

    #[test]
    fn logging_reporter_accepts_every_event() {
        let reporter = Arc::new(ProgressReporter::Logging(LoggingReporter::new()));
        let callback = reporter.as_callback();

        callback(SyncProgress::StageChanged {
            from: SyncStage::Init,
            to: SyncStage::ProfileSync,
        });
        callback(SyncProgress::FetchedPage {
            page: 1,
            count: 2,
            total_so_far: 2,
            last_page: Some(2),
        });
        callback(SyncProgress::IndexComplete {
            indexed: 2,
            failed: 0,
        });
        reporter.finish();
    }

    #[test]
    fn interactive_reporter_tracks_counts() {
        let reporter = InteractiveReporter::hidden();
        reporter.handle(SyncProgress::FetchingRepos {
            login: "alice".to_string(),
            start_page: 1,
            page_size: 2,
        });
        reporter.handle(SyncProgress::FetchedPage {
            page: 1,
            count: 2,
            total_so_far: 2,
            last_page: Some(2),
        });
        reporter.handle(SyncProgress::Indexed {
            name: "r1".to_string(),
            index: "alice".to_string(),
        });
        reporter.handle(SyncProgress::IndexError {
            name: "r2".to_string(),
            error: "boom".to_string(),
        });

        assert_eq!(reporter.counts(), (2, 1, 1));
        reporter.finish();
    }
}
