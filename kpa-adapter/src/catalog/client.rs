//! Remote catalog HTTP client
//!
//! Issues the one bulk catalog fetch and the per-song text fetches. Holds no
//! state beyond the HTTP connection pool; every call is independent and a
//! failure is local to that call. No automatic retry.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Remote catalog client errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogClientError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Access to the remote karaoke catalog
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// GET the catalog list at `catalog_url`, returning the raw response body
    async fn fetch_bulk(&self, catalog_url: &str) -> Result<String, CatalogClientError>;

    /// GET a per-song text resource at `base_url + relative_link`
    async fn fetch_resource(
        &self,
        base_url: &str,
        relative_link: &str,
    ) -> Result<String, CatalogClientError>;
}

/// Absolute URL of a catalog resource
///
/// Plain concatenation: the catalog publishes links relative to its base URL
/// and the base URL is used exactly as configured.
pub fn resource_url(base_url: &str, relative_link: &str) -> String {
    format!("{}{}", base_url, relative_link)
}

/// reqwest-backed [`CatalogClient`]
pub struct HttpCatalogClient {
    http_client: reqwest::Client,
}

impl HttpCatalogClient {
    /// Build a client. `timeout` of None applies no request timeout.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, CatalogClientError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| CatalogClientError::Network {
            url: String::new(),
            message: e.to_string(),
        })?;

        Ok(Self { http_client })
    }

    async fn get_text(&self, url: &str) -> Result<String, CatalogClientError> {
        tracing::debug!(url = %url, "Querying karaoke catalog");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogClientError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| CatalogClientError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_bulk(&self, catalog_url: &str) -> Result<String, CatalogClientError> {
        self.get_text(catalog_url).await
    }

    async fn fetch_resource(
        &self,
        base_url: &str,
        relative_link: &str,
    ) -> Result<String, CatalogClientError> {
        self.get_text(&resource_url(base_url, relative_link)).await
    }
}
