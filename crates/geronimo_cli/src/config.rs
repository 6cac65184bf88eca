//! Configuration file support for geronimo.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GERONIMO_`, sections separated by
//!    a double underscore, e.g. `GERONIMO_GITHUB__API_TOKEN`)
//! 3. File given with `--config`
//! 4. Local config file (`./geronimo.toml`)
//! 5. XDG config file (`~/.config/geronimo/config.toml`)
//! 6. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! api_token = "ghp_..."  # optional, anonymous access when unset
//! user = "nlamirault"
//! api_url = "https://api.github.com"
//!
//! [elasticsearch]
//! host = "localhost:9200"
//! typeless = true  # Elasticsearch 7 and later
//!
//! [sync]
//! page_size = 100
//! page_delay_ms = 0
//! fetch_concurrency = 10
//! timeout_secs = 600
//! ```
//!
//! The `[remote]` and `[store]` section names are accepted as aliases of
//! `[github]` and `[elasticsearch]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use geronimo::github::GITHUB_API_URL;
use geronimo::rate_limits;
use geronimo::sync::{
    DEFAULT_FETCH_CONCURRENCY, DEFAULT_INDEX_CONCURRENCY, DEFAULT_PAGE_SIZE, SyncOptions,
};
use serde::Deserialize;
use thiserror::Error;

/// Name of the local config file.
const LOCAL_CONFIG_FILE: &str = "geronimo.toml";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("missing required setting `{key}` (or set {env})")]
    Missing {
        key: &'static str,
        env: &'static str,
    },
}

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub configuration.
    #[serde(alias = "remote")]
    pub github: GitHubConfig,
    /// Elasticsearch configuration.
    #[serde(alias = "store")]
    pub elasticsearch: ElasticsearchConfig,
    /// Default sync options.
    pub sync: SyncConfig,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token. Anonymous access when unset or empty.
    pub api_token: Option<String>,
    /// Account to mirror.
    pub user: Option<String>,
    /// API endpoint, for GitHub Enterprise.
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            user: None,
            api_url: GITHUB_API_URL.to_string(),
        }
    }
}

/// Elasticsearch configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    /// Host, with or without scheme (`localhost:9200`).
    pub host: Option<String>,
    /// Write documents without a mapping type (Elasticsearch 7+).
    pub typeless: bool,
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub page_size: u32,
    /// Repositories to skip before the first page.
    pub offset: u32,
    /// Pause between page requests, in milliseconds.
    pub page_delay_ms: u64,
    pub fetch_concurrency: usize,
    pub index_concurrency: usize,
    /// Client-side request rate. Defaults depend on authentication.
    pub requests_per_second: Option<u32>,
    /// Whether to disable proactive rate limiting.
    pub no_rate_limit: bool,
    /// Abort the run after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            page_delay_ms: 0,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            index_concurrency: DEFAULT_INDEX_CONCURRENCY,
            requests_per_second: None,
            no_rate_limit: false,
            timeout_secs: None,
        }
    }
}

impl SyncConfig {
    /// Engine options from the configured defaults.
    pub fn to_options(&self) -> SyncOptions {
        SyncOptions {
            fetch_concurrency: self.fetch_concurrency,
            index_concurrency: self.index_concurrency,
            offset: self.offset,
            page_size: self.page_size,
            page_delay: Duration::from_millis(self.page_delay_ms),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("GERONIMO")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Unlike the optional XDG and local files, an explicit `path` must exist.
    /// A file that fails to parse is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            tracing::debug!("Loading config from ./{}", LOCAL_CONFIG_FILE);
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(path) = path {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(environment());

        Ok(builder.build()?.try_deserialize()?)
    }

    /// The account to mirror.
    pub fn github_user(&self) -> Result<&str, ConfigurationError> {
        self.github
            .user
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(ConfigurationError::Missing {
                key: "github.user",
                env: "GERONIMO_GITHUB__USER",
            })
    }

    /// The GitHub token, if one is configured.
    pub fn github_token(&self) -> Option<&str> {
        self.github.api_token.as_deref().filter(|t| !t.is_empty())
    }

    /// The Elasticsearch host.
    pub fn elasticsearch_host(&self) -> Result<&str, ConfigurationError> {
        self.elasticsearch
            .host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(ConfigurationError::Missing {
                key: "elasticsearch.host",
                env: "GERONIMO_ELASTICSEARCH__HOST",
            })
    }

    /// Client-side request rate, or `None` when rate limiting is disabled.
    pub fn requests_per_second(&self) -> Option<u32> {
        if self.sync.no_rate_limit {
            return None;
        }
        Some(self.sync.requests_per_second.unwrap_or(
            if self.github_token().is_some() {
                rate_limits::GITHUB_DEFAULT_RPS
            } else {
                rate_limits::GITHUB_ANONYMOUS_RPS
            },
        ))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "geronimo").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_content: &str) -> Config {
        ConfigBuilder::builder()
            .add_source(config::File::from_str(toml_content, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.github.api_token.is_none());
        assert!(config.github.user.is_none());
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.elasticsearch.host.is_none());
        assert!(!config.elasticsearch.typeless);
        assert_eq!(config.sync.page_size, 100);
        assert_eq!(config.sync.fetch_concurrency, 10);
        assert_eq!(config.sync.index_concurrency, 4);
    }

    #[test]
    fn test_full_config_parsing() {
        let config = parse(
            r#"
            [github]
            api_token = "ghp_test123"
            user = "nlamirault"
            api_url = "https://github.example.com/api/v3"

            [elasticsearch]
            host = "es.example.com:9200"
            typeless = true

            [sync]
            page_size = 50
            offset = 100
            page_delay_ms = 250
            fetch_concurrency = 5
            index_concurrency = 2
            requests_per_second = 3
            timeout_secs = 60
            "#,
        );

        assert_eq!(config.github_token(), Some("ghp_test123"));
        assert_eq!(config.github_user().unwrap(), "nlamirault");
        assert_eq!(config.github.api_url, "https://github.example.com/api/v3");
        assert_eq!(config.elasticsearch_host().unwrap(), "es.example.com:9200");
        assert!(config.elasticsearch.typeless);
        assert_eq!(config.requests_per_second(), Some(3));

        let options = config.sync.to_options();
        assert_eq!(options.page_size, 50);
        assert_eq!(options.offset, 100);
        assert_eq!(options.page_delay, Duration::from_millis(250));
        assert_eq!(options.fetch_concurrency, 5);
        assert_eq!(options.index_concurrency, 2);
        assert_eq!(options.timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_section_aliases() {
        let config = parse(
            r#"
            [remote]
            user = "alice"

            [store]
            host = "localhost:9200"
            "#,
        );
        assert_eq!(config.github_user().unwrap(), "alice");
        assert_eq!(config.elasticsearch_host().unwrap(), "localhost:9200");
    }

    #[test]
    fn test_missing_user_is_an_error() {
        let config = parse(
            r#"
            [elasticsearch]
            host = "localhost:9200"
            "#,
        );
        let err = config.github_user().unwrap_err();
        assert!(err.to_string().contains("github.user"));
    }

    #[test]
    fn test_blank_host_is_an_error() {
        let config = parse(
            r#"
            [github]
            user = "alice"

            [elasticsearch]
            host = "  "
            "#,
        );
        assert!(matches!(
            config.elasticsearch_host(),
            Err(ConfigurationError::Missing {
                key: "elasticsearch.host",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_token_means_anonymous() {
        let config = parse(
            r#"
            [github]
            api_token = ""
            "#,
        );
        assert!(config.github_token().is_none());
        assert_eq!(
            config.requests_per_second(),
            Some(rate_limits::GITHUB_ANONYMOUS_RPS)
        );
    }

    #[test]
    fn test_rate_limit_defaults() {
        let config = parse(
            r#"
            [github]
            api_token = "ghp_x"
            "#,
        );
        assert_eq!(
            config.requests_per_second(),
            Some(rate_limits::GITHUB_DEFAULT_RPS)
        );

        let config = parse(
            r#"
            [sync]
            no_rate_limit = true
            "#,
        );
        assert_eq!(config.requests_per_second(), None);
    }

    #[test]
    fn test_sync_config_to_options_defaults() {
        let options = SyncConfig::default().to_options();
        assert_eq!(options, SyncOptions::default());
    }

    #[test]
    fn test_config_merging_order() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[sync]\npage_size = 20\nfetch_concurrency = 3",
                FileFormat::Toml,
            ))
            .add_source(config::File::from_str(
                "[sync]\npage_size = 40",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.sync.page_size, 40);
        assert_eq!(config.sync.fetch_concurrency, 3);
    }

    #[test]
    fn test_config_invalid_toml() {
        let result = ConfigBuilder::builder()
            .add_source(config::File::from_str("[sync\npage_size = 1", FileFormat::Toml))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let path = std::env::temp_dir().join("geronimo-does-not-exist.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigurationError::Load(_)));
    }

    #[test]
    fn test_load_explicit_file() {
        let path = std::env::temp_dir().join(format!(
            "geronimo-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[github]\nuser = \"explicit\"\n\n[elasticsearch]\nhost = \"es:9200\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path));
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.elasticsearch_host().unwrap(), "es:9200");
    }

    #[test]
    fn test_environment_source() {
        let settings = ConfigBuilder::builder()
            .add_source(config::File::from_str(
                "[github]\nuser = \"from-file\"",
                FileFormat::Toml,
            ))
            .add_source(environment().source(Some(
                [("GERONIMO_GITHUB__USER".to_string(), "from-env".to_string())]
                    .into_iter()
                    .collect(),
            )))
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();
        assert_eq!(config.github_user().unwrap(), "from-env");
    }
}
