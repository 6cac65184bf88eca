use std::sync::Arc;

use geronimo::{GitHubClient, PlatformClient, RateLimitedClient, SyncFailure};

use crate::config::Config;

/// Number of failures listed before the rest are summarized.
const MAX_DISPLAYED_FAILURES: usize = 10;

/// Build the GitHub client from configuration.
///
/// Wrapped in a client-side rate limiter unless rate limiting is disabled.
pub(crate) fn build_github_client(
    config: &Config,
) -> Result<(GitHubClient, Option<u32>), Box<dyn std::error::Error>> {
    let client = GitHubClient::new(&config.github.api_url, config.github_token())?;
    if !client.is_authenticated() {
        tracing::warn!("No GitHub token configured, using anonymous access (60 requests/hour)");
    }
    Ok((client, config.requests_per_second()))
}

/// Erase the client type, applying the rate limit if one is set.
pub(crate) fn into_platform_client(
    client: GitHubClient,
    requests_per_second: Option<u32>,
) -> Arc<dyn PlatformClient> {
    match requests_per_second {
        Some(rps) => {
            tracing::debug!(rps, "Rate limiting GitHub requests");
            Arc::new(RateLimitedClient::new(client, rps))
        }
        None => Arc::new(client),
    }
}

/// Lines describing skipped items, at most [`MAX_DISPLAYED_FAILURES`] of them
/// followed by a summary of the rest.
pub(crate) fn failure_lines(failures: &[SyncFailure]) -> Vec<String> {
    let mut lines: Vec<String> = failures
        .iter()
        .take(MAX_DISPLAYED_FAILURES)
        .map(|f| format!("  - {}", f))
        .collect();
    if failures.len() > MAX_DISPLAYED_FAILURES {
        lines.push(format!(
            "  ... and {} more errors",
            failures.len() - MAX_DISPLAYED_FAILURES
        ));
    }
    lines
}

/// Display non-fatal failures collected during a run.
pub(crate) fn display_failures(failures: &[SyncFailure], is_tty: bool) {
    if failures.is_empty() {
        return;
    }

    if is_tty {
        println!();
        eprintln!(
            "\x1b[1;33mSkipped items ({} total):\x1b[0m",
            failures.len()
        );
        for line in failure_lines(failures) {
            eprintln!("{}", line);
        }
    } else {
        for failure in failures.iter().take(MAX_DISPLAYED_FAILURES) {
            tracing::error!(
                kind = %failure.kind,
                subject = %failure.subject,
                error = %failure.message,
                "Item skipped"
            );
        }
        if failures.len() > MAX_DISPLAYED_FAILURES {
            tracing::error!(
                remaining = failures.len() - MAX_DISPLAYED_FAILURES,
                "Additional items skipped"
            );
        }
    }
}
