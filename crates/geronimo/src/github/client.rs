//! GitHub REST client over [`HttpTransport`].

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;

use super::convert::{to_platform_repo, to_user_profile};
use super::error::GitHubError;
use super::types::{GitHubEvent, GitHubRepo, GitHubUser};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, header_get};
use crate::platform::{self, PlatformClient, RepoPage, UserProfile};

/// Default GitHub API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Pagination information extracted from GitHub's Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// The last page number (from rel="last" link).
    pub last_page: Option<u32>,
    /// The next page number (from rel="next" link).
    pub next_page: Option<u32>,
}

/// Parse the Link header to extract pagination info.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/user/1/repos?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if let Some(inner) = segment
                .strip_prefix('<')
                .and_then(|s| s.strip_suffix('>'))
            {
                url = Some(inner);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel_type)) = (url, rel)
            && let Some(page_num) = extract_page_from_url(url)
        {
            match rel_type {
                "last" => info.last_page = Some(page_num),
                "next" => info.next_page = Some(page_num),
                _ => {}
            }
        }
    }

    info
}

fn extract_page_from_url(url: &str) -> Option<u32> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|param| param.strip_prefix("page="))
        .and_then(|value| value.parse().ok())
}

/// GitHub API client.
///
/// Anonymous when constructed without a token; GitHub then applies the
/// unauthenticated quota.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client backed by reqwest.
    ///
    /// An empty token is treated as no token.
    pub fn new(api_url: &str, token: Option<&str>) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| GitHubError::Config(e.to_string()))?;
        Ok(Self::new_with_transport(api_url, token, Arc::new(transport)))
    }

    pub fn new_with_transport(
        api_url: &str,
        token: Option<&str>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, path: &str) -> HttpRequest {
        let request = HttpRequest::new(HttpMethod::Get, format!("{}{}", self.api_url, path))
            .header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    async fn get_response(&self, path: &str) -> Result<HttpResponse, GitHubError> {
        let response = self
            .transport
            .send(self.request(path))
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        if response.is_success() {
            return Ok(response);
        }

        Err(match response.status {
            403 | 429 if quota_exhausted(&response.headers) => GitHubError::RateLimited {
                reset_at: rate_limit_reset(&response.headers),
            },
            401 | 403 => GitHubError::AuthRequired,
            404 => GitHubError::NotFound(path.trim_start_matches('/').to_string()),
            status => GitHubError::Api {
                status,
                message: response.body_text(),
            },
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let response = self.get_response(path).await?;
        serde_json::from_slice(&response.body).map_err(GitHubError::Json)
    }

    /// Public events performed by a user, most recent first.
    pub async fn list_user_events(
        &self,
        login: &str,
        per_page: u32,
    ) -> Result<Vec<GitHubEvent>, GitHubError> {
        let per_page = per_page.clamp(1, platform::MAX_PAGE_SIZE);
        self.get(&format!("/users/{login}/events/public?per_page={per_page}"))
            .await
    }
}

fn quota_exhausted(headers: &HttpHeaders) -> bool {
    header_get(headers, "x-ratelimit-remaining").is_some_and(|v| v.trim() == "0")
}

fn rate_limit_reset(headers: &HttpHeaders) -> chrono::DateTime<Utc> {
    header_get(headers, "x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|epoch| chrono::DateTime::from_timestamp(epoch, 0))
        .unwrap_or_else(Utc::now)
}

#[async_trait]
impl PlatformClient for GitHubClient {
    async fn get_user(&self, login: &str) -> platform::Result<UserProfile> {
        let user: GitHubUser = self.get(&format!("/users/{login}")).await?;
        Ok(to_user_profile(user))
    }

    async fn list_user_repos_page(
        &self,
        login: &str,
        page: u32,
        per_page: u32,
    ) -> platform::Result<RepoPage> {
        let path = format!("/users/{login}/repos?type=owner&per_page={per_page}&page={page}");
        let response = self.get_response(&path).await?;

        let links = response
            .header("link")
            .map(parse_link_header)
            .unwrap_or_default();
        let repos: Vec<GitHubRepo> =
            serde_json::from_slice(&response.body).map_err(GitHubError::Json)?;

        tracing::debug!(
            login,
            page,
            count = repos.len(),
            next = ?links.next_page,
            last = ?links.last_page,
            "Fetched repository page"
        );

        Ok(RepoPage {
            repos: repos
                .into_iter()
                .map(|r| to_platform_repo(r, login))
                .collect(),
            next_page: links.next_page.unwrap_or(0),
            last_page: links.last_page,
        })
    }
}
