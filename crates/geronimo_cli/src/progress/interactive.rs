use std::sync::Mutex;
use std::time::Duration;

use geronimo::sync::{SyncProgress, SyncStage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const TICK: Duration = Duration::from_millis(100);

/// All mutable progress state, under one lock.
#[derive(Default)]
struct ProgressState {
    /// Spinner for store and profile setup.
    setup_bar: Option<ProgressBar>,
    /// Page fetching; becomes a bar once the last page is known.
    fetch_bar: Option<ProgressBar>,
    /// Counter of indexed documents.
    index_bar: Option<ProgressBar>,
    fetched: usize,
    indexed: usize,
    failed: usize,
}

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    state: Mutex<ProgressState>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// A reporter that draws nothing.
    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(indicatif::ProgressDrawTarget::hidden()),
            state: Mutex::new(ProgressState::default()),
        }
    }

    /// Repositories fetched, indexed, and failed so far.
    #[cfg(test)]
    pub fn counts(&self) -> (usize, usize, usize) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (state.fetched, state.indexed, state.failed)
    }

    fn spinner(&self, prefix: &str, style: ProgressStyle) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(style);
        pb.set_prefix(format!("{:12}", prefix));
        pb.enable_steady_tick(TICK);
        pb
    }

    fn index_bar(&self, state: &mut ProgressState) -> ProgressBar {
        state
            .index_bar
            .get_or_insert_with(|| self.spinner("Indexing", Self::counter_style()))
            .clone()
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            SyncProgress::StageChanged {
                to: SyncStage::Aborted,
                ..
            } => {
                for pb in [&state.setup_bar, &state.fetch_bar, &state.index_bar]
                    .into_iter()
                    .flatten()
                {
                    if !pb.is_finished() {
                        pb.abandon();
                    }
                }
            }

            SyncProgress::StoreReady {
                version,
                cluster_name,
            } => {
                let pb = self.spinner("Setup", Self::spinner_style());
                pb.set_message(format!(
                    "Connected to {} (Elasticsearch {})",
                    cluster_name, version
                ));
                state.setup_bar = Some(pb);
            }

            SyncProgress::ProfileResolved { login, .. } => {
                if let Some(ref pb) = state.setup_bar {
                    pb.set_message(format!("Indexing profile of {}...", login));
                }
            }

            SyncProgress::ProfileIndexed { login, index } => {
                if let Some(pb) = state.setup_bar.take() {
                    pb.finish_with_message(format!("Profile {} indexed into {}", login, index));
                }
            }

            SyncProgress::FetchingRepos {
                login, start_page, ..
            } => {
                if let Some(pb) = state.setup_bar.take()
                    && !pb.is_finished()
                {
                    pb.finish_with_message(format!("Profile of {} resolved", login));
                }
                let pb = self.spinner("Fetching", Self::spinner_style());
                pb.set_message(format!("Fetching repositories from page {}...", start_page));
                state.fetch_bar = Some(pb);
            }

            SyncProgress::FetchedPage {
                page,
                total_so_far,
                last_page,
                ..
            } => {
                state.fetched = total_so_far;
                if let Some(ref pb) = state.fetch_bar {
                    if let Some(last) = last_page
                        && pb.length() != Some(last as u64)
                    {
                        pb.disable_steady_tick();
                        pb.set_length(last as u64);
                        pb.set_style(Self::bar_style());
                    }
                    pb.set_position(page as u64);
                    pb.set_message(format!("{} repos", total_so_far));
                }
            }

            SyncProgress::PageFailed { page, error } => {
                if let Some(ref pb) = state.fetch_bar {
                    pb.println(format!("  page {} failed: {}", page, error));
                }
            }

            SyncProgress::FetchComplete {
                total,
                failed_pages,
            } => {
                state.fetched = total;
                if let Some(ref pb) = state.fetch_bar {
                    let msg = if failed_pages > 0 {
                        format!("Fetched {} repos ({} pages failed)", total, failed_pages)
                    } else {
                        format!("Fetched {} repos", total)
                    };
                    pb.finish_with_message(msg);
                }
            }

            SyncProgress::Indexed { name, .. } => {
                state.indexed += 1;
                let pb = self.index_bar(&mut state);
                pb.inc(1);
                pb.set_message(name);
            }

            SyncProgress::IndexError { name, error } => {
                state.failed += 1;
                let pb = self.index_bar(&mut state);
                pb.println(format!("  {} skipped: {}", name, error));
            }

            SyncProgress::IndexComplete { indexed, failed } => {
                let pb = self.index_bar(&mut state);
                let msg = if failed > 0 {
                    format!("documents indexed, {} failed", failed)
                } else {
                    "documents indexed".to_string()
                };
                pb.set_position(indexed as u64);
                pb.finish_with_message(msg);
            }

            SyncProgress::Interrupted => {
                let _ = self.multi.println("Interrupted, partial results kept");
            }

            _ => {}
        }
    }

    /// Finish all progress bars.
    pub fn finish(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for pb in [&state.setup_bar, &state.fetch_bar, &state.index_bar]
            .into_iter()
            .flatten()
        {
            if !pb.is_finished() {
                pb.finish();
            }
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn counter_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.cyan} {spinner:.green} {pos:>4} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
