//! Elasticsearch REST client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::Deserialize;

use super::errors::{Result, StoreError};
use super::{DocumentStore, IndexAck, StoreInfo};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Error type Elasticsearch reports when creating an index that exists.
const ALREADY_EXISTS_TYPE: &str = "resource_already_exists_exception";

/// Prepend `http://` to a host given without a scheme and drop trailing slashes.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[derive(Debug, Deserialize)]
struct RootResponse {
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    version: VersionInfo,
}

#[derive(Debug, Default, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    number: String,
}

/// Elasticsearch document store.
///
/// In typeless mode (Elasticsearch 7 and later) documents are written to
/// `/{index}/_doc/{id}` and the document type is ignored.
#[derive(Clone)]
pub struct ElasticsearchClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    typeless: bool,
}

impl ElasticsearchClient {
    pub fn new(host: &str, typeless: bool) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(REQUEST_TIMEOUT)
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self::new_with_transport(host, typeless, Arc::new(transport)))
    }

    pub fn new_with_transport(
        host: &str,
        typeless: bool,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            host: normalize_host(host),
            typeless,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_typeless(&self) -> bool {
        self.typeless
    }

    fn document_path(&self, index: &str, doc_type: &str, id: &str) -> String {
        if self.typeless {
            format!("/{index}/_doc/{id}")
        } else {
            format!("/{index}/{doc_type}/{id}")
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.transport
            .send(request)
            .await
            .map_err(|e| StoreError::Http(e.to_string()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

fn api_error(response: &HttpResponse) -> StoreError {
    StoreError::Api {
        status: response.status,
        message: response.body_text(),
    }
}

fn is_already_exists(response: &HttpResponse) -> bool {
    if response.status != 400 {
        return false;
    }
    serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| {
            body.pointer("/error/type")
                .and_then(|t| t.as_str())
                .map(|t| t == ALREADY_EXISTS_TYPE)
        })
        .unwrap_or(false)
}

#[async_trait]
impl DocumentStore for ElasticsearchClient {
    async fn ping(&self) -> Result<StoreInfo> {
        let response = self
            .send(HttpRequest::new(HttpMethod::Get, self.url("/")))
            .await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }

        let root: RootResponse = serde_json::from_slice(&response.body)?;
        Ok(StoreInfo {
            version: root.version.number,
            cluster_name: root.cluster_name,
        })
    }

    async fn index_exists(&self, name: &str) -> Result<bool> {
        let response = self
            .send(HttpRequest::new(HttpMethod::Head, self.url(&format!("/{name}"))))
            .await?;
        match response.status {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(api_error(&response)),
        }
    }

    async fn create_index(&self, name: &str) -> Result<()> {
        let response = self
            .send(HttpRequest::new(HttpMethod::Put, self.url(&format!("/{name}"))))
            .await?;
        if response.is_success() {
            tracing::debug!(index = name, "Created index");
            return Ok(());
        }
        if is_already_exists(&response) {
            return Err(StoreError::IndexAlreadyExists(name.to_string()));
        }
        Err(api_error(&response))
    }

    async fn upsert(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        document: &serde_json::Value,
    ) -> Result<IndexAck> {
        let request = HttpRequest::new(
            HttpMethod::Put,
            self.url(&self.document_path(index, doc_type, id)),
        )
        .json(document)?;

        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }
        Ok(serde_json::from_slice(&response.body)?)
    }
}
