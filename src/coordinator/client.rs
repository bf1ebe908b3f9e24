//! HTTP client for the coordinator's REST surface.
//!
//! ## Example
//!
//! ```rust,no_run
//! use shardwatch::coordinator::CoordinatorClient;
//!
//! # tokio_test::block_on(async {
//! let client = CoordinatorClient::builder()
//!     .endpoint("http://127.0.0.1:8080")
//!     .build()
//!     .unwrap();
//!
//! for name in client.list_clusters().await.unwrap() {
//!     let stats = client.stats(&name).await.unwrap();
//!     println!("{}: {} groups", name, stats.group.models.len());
//! }
//! # });
//! ```

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use super::{request_tag, Command, CoordinatorError};
use crate::source::{ClusterStats, Overview};

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for one coordinator dashboard endpoint.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    client: Client,
    base: Url,
}

impl CoordinatorClient {
    pub fn builder() -> CoordinatorClientBuilder {
        CoordinatorClientBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        self.base.as_str()
    }

    /// `GET /list`: names of the clusters this coordinator forwards to.
    pub async fn list_clusters(&self) -> Result<Vec<String>, CoordinatorError> {
        let url = self.url(&["list".to_string()], None)?;
        let names: Option<Vec<String>> = self.get_json(url).await?;
        Ok(names.unwrap_or_default())
    }

    /// `GET /topom?forward=<cluster>`.
    pub async fn overview(&self, cluster: &str) -> Result<Overview, CoordinatorError> {
        let url = self.url(&["topom".to_string()], Some(cluster))?;
        self.get_json(url).await
    }

    /// `GET /api/topom/stats/<tag>?forward=<cluster>`.
    pub async fn stats(&self, cluster: &str) -> Result<ClusterStats, CoordinatorError> {
        let segments = ["api", "topom", "stats"]
            .into_iter()
            .map(str::to_string)
            .chain(std::iter::once(request_tag(cluster)))
            .collect::<Vec<_>>();
        let url = self.url(&segments, Some(cluster))?;
        self.get_json(url).await
    }

    /// Send one mutation. The response body of a success is ignored.
    pub async fn execute(&self, cluster: &str, command: &Command) -> Result<(), CoordinatorError> {
        let url = self.command_url(cluster, command)?;
        tracing::info!(%cluster, %command, "sending command");

        let response = self.client.put(url).send().await?;
        check(response).await?;
        Ok(())
    }

    fn command_url(&self, cluster: &str, command: &Command) -> Result<Url, CoordinatorError> {
        let mut segments = vec!["api".to_string(), "topom".to_string()];
        segments.extend(command.segments(&request_tag(cluster)));
        self.url(&segments, Some(cluster))
    }

    fn url(&self, segments: &[String], forward: Option<&str>) -> Result<Url, CoordinatorError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CoordinatorError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if let Some(name) = forward {
            url.query_pairs_mut().append_pair("forward", name);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CoordinatorError> {
        tracing::debug!(%url, "GET");
        let response = check(self.client.get(url).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CoordinatorError::Parse(e.to_string()))
    }
}

/// Turn any non-2xx response into [`CoordinatorError::Rejected`].
async fn check(response: Response) -> Result<Response, CoordinatorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), %body, "coordinator rejected request");
    Err(CoordinatorError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Builder for [`CoordinatorClient`].
#[derive(Debug, Default)]
pub struct CoordinatorClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
}

impl CoordinatorClientBuilder {
    /// Set the coordinator address (e.g. "http://127.0.0.1:8080" or "host:8080").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<CoordinatorClient, CoordinatorError> {
        let endpoint = self.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let base = parse_endpoint(&endpoint)?;

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;

        Ok(CoordinatorClient { client, base })
    }
}

/// Accept bare `host:port` as well as full URLs.
fn parse_endpoint(endpoint: &str) -> Result<Url, CoordinatorError> {
    let endpoint = endpoint.trim();
    let with_scheme = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| CoordinatorError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
    if url.cannot_be_a_base() {
        return Err(CoordinatorError::InvalidUrl(endpoint.to_string()));
    }
    Ok(url)
}
