use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use console::{Term, style};
use geronimo::{ElasticsearchClient, SyncEngine, SyncReport};

use crate::commands::shared::{build_github_client, display_failures, into_platform_client};
use crate::config::Config;
use crate::progress::ProgressReporter;

/// Flags of the `sync` command. Each one overrides its config value.
#[derive(Debug, Clone, Default, clap::Args)]
pub(crate) struct SyncArgs {
    /// GitHub account to mirror (github.user)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Elasticsearch host, e.g. localhost:9200 (elasticsearch.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Repositories per page, at most 100
    #[arg(short = 'p', long)]
    pub page_size: Option<u32>,

    /// Repositories to skip before the first page
    #[arg(short, long)]
    pub offset: Option<u32>,

    /// Pause between page requests, in milliseconds
    #[arg(long)]
    pub page_delay_ms: Option<u64>,

    /// Repositories buffered between the fetch and index workers
    #[arg(short = 'c', long)]
    pub fetch_concurrency: Option<usize>,

    /// Index worker concurrency hint
    #[arg(long)]
    pub index_concurrency: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Disable proactive rate limiting (may cause API throttling)
    #[arg(short = 'R', long)]
    pub no_rate_limit: bool,

    /// Write documents without a mapping type (Elasticsearch 7+)
    #[arg(long)]
    pub typeless: bool,
}

impl SyncArgs {
    /// Fold command-line overrides into the loaded configuration.
    pub(crate) fn apply(self, config: &mut Config) {
        if let Some(user) = self.user {
            config.github.user = Some(user);
        }
        if let Some(host) = self.host {
            config.elasticsearch.host = Some(host);
        }
        if self.typeless {
            config.elasticsearch.typeless = true;
        }

        let sync = &mut config.sync;
        if let Some(v) = self.page_size {
            sync.page_size = v;
        }
        if let Some(v) = self.offset {
            sync.offset = v;
        }
        if let Some(v) = self.page_delay_ms {
            sync.page_delay_ms = v;
        }
        if let Some(v) = self.fetch_concurrency {
            sync.fetch_concurrency = v;
        }
        if let Some(v) = self.index_concurrency {
            sync.index_concurrency = v;
        }
        if let Some(v) = self.timeout {
            sync.timeout_secs = Some(v);
        }
        if self.no_rate_limit {
            sync.no_rate_limit = true;
        }
    }
}

pub(crate) async fn handle_sync(
    args: SyncArgs,
    mut config: Config,
    shutdown: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error>> {
    args.apply(&mut config);

    let login = config.github_user()?.to_string();
    let host = config.elasticsearch_host()?.to_string();
    let options = config.sync.to_options();
    let is_tty = Term::stdout().is_term();

    let (github, rps) = build_github_client(&config)?;
    let platform = into_platform_client(github, rps);
    let store = Arc::new(ElasticsearchClient::new(&host, config.elasticsearch.typeless)?);

    if is_tty {
        println!(
            "Mirroring {} into {}...\n",
            style(&login).bold(),
            style(store.host()).cyan()
        );
    } else {
        tracing::info!(
            login = %login,
            host = %store.host(),
            typeless = store.is_typeless(),
            "Starting sync"
        );
    }

    let reporter = Arc::new(ProgressReporter::new());
    let engine = SyncEngine::new(platform, store, options)
        .with_progress(reporter.as_callback())
        .with_shutdown_flag(shutdown);

    let start = Instant::now();
    let result = engine.run(&login).await;
    reporter.finish();

    let report = result?;
    display_report(&report, start.elapsed(), is_tty);
    display_failures(&report.failures, is_tty);

    Ok(())
}

fn summary_line(report: &SyncReport) -> String {
    let mut line = format!(
        "{} of {} repositories indexed for {}",
        report.indexed, report.fetched, report.login
    );
    if !report.profile_indexed {
        line.push_str(", profile not indexed");
    }
    if report.interrupted {
        line.push_str(" (interrupted)");
    }
    line
}

fn display_report(report: &SyncReport, elapsed: std::time::Duration, is_tty: bool) {
    if is_tty {
        println!();
        let marker = if report.has_failures() || report.interrupted {
            style("!").yellow().bold()
        } else {
            style("✓").green().bold()
        };
        println!(
            "{} {} in {:.1}s ({} pages)",
            marker,
            summary_line(report),
            elapsed.as_secs_f64(),
            report.pages_requested
        );
    } else {
        tracing::info!(
            login = %report.login,
            profile_indexed = report.profile_indexed,
            pages = report.pages_requested,
            fetched = report.fetched,
            indexed = report.indexed,
            failures = report.failures.len(),
            interrupted = report.interrupted,
            elapsed_secs = elapsed.as_secs_f64(),
            "Sync complete"
        );
    }
}
