//! Geronimo CLI - mirrors a GitHub account into Elasticsearch.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::events::OutputFormat;
use crate::commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "geronimo")]
#[command(version)]
#[command(about = "Mirror a GitHub account into Elasticsearch")]
#[command(
    long_about = "Geronimo fetches a GitHub user's profile and owned repositories and \
upserts one document per item into Elasticsearch, so the metadata can be searched \
and aggregated there. Every run rewrites the same documents, so it can be repeated \
at any time."
)]
#[command(after_long_help = r#"EXAMPLES
    Mirror an account into a local Elasticsearch:
        $ geronimo sync --user nlamirault --host localhost:9200

    Resume from the 200th repository, 50 per page:
        $ geronimo sync --offset 200 --page-size 50

    Show recent public activity:
        $ geronimo events --user nlamirault --output json

    Generate shell completions:
        $ geronimo completions bash > ~/.local/share/bash-completion/completions/geronimo

CONFIGURATION
    Geronimo reads configuration from, lowest precedence first:
      1. ~/.config/geronimo/config.toml (or $XDG_CONFIG_HOME/geronimo/config.toml)
      2. ./geronimo.toml
      3. The file given with --config
      4. Environment variables (GERONIMO_* prefix, __ between section and key)
      5. .env file in current directory

ENVIRONMENT VARIABLES
    GERONIMO_GITHUB__API_TOKEN        GitHub personal access token
    GERONIMO_GITHUB__USER             Account to mirror
    GERONIMO_GITHUB__API_URL          GitHub API endpoint (default: https://api.github.com)
    GERONIMO_ELASTICSEARCH__HOST      Elasticsearch host, e.g. localhost:9200
    GERONIMO_ELASTICSEARCH__TYPELESS  Write typeless documents (Elasticsearch 7+)
    RUST_LOG                          Log filter (default: geronimo=info,geronimo_cli=info)
"#)]
struct Cli {
    /// Configuration file to load in addition to the default locations
    #[arg(short = 'C', long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a user's profile and repositories into Elasticsearch
    Sync(SyncArgs),
    /// List a user's recent public events
    Events {
        /// GitHub account (github.user)
        #[arg(short, long)]
        user: Option<String>,

        /// Maximum number of events, at most 100
        #[arg(short = 'n', long, default_value_t = 30)]
        limit: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "geronimo=debug,geronimo_cli=debug"
    } else {
        "geronimo=info,geronimo_cli=info"
    };
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_filter),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Progress bars own the terminal; structured logs otherwise
    if cli.debug || !Term::stdout().is_term() {
        init_tracing(cli.debug);
    }

    match cli.command {
        Commands::Completions { shell } => commands::meta::handle_completions(shell),
        Commands::Man { output } => commands::meta::handle_man(output),
        Commands::Sync(args) => {
            let config = config::Config::load(cli.config.as_deref())?;
            let shutdown = Arc::new(AtomicBool::new(false));
            shutdown::install_shutdown_handler(Arc::clone(&shutdown));
            commands::sync::handle_sync(args, config, shutdown).await
        }
        Commands::Events {
            user,
            limit,
            output,
        } => {
            let config = config::Config::load(cli.config.as_deref())?;
            commands::events::handle_events(user, limit, output, config).await
        }
    }
}
