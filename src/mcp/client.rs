//! Upstream HTTP client for the catalog REST API.
//!
//! Every call resolves to a typed outcome rather than an opaque
//! transport error: tool handlers (and the health endpoint) can tell a
//! missing record from an unreachable upstream. A request timeout makes
//! an unreachable upstream fail fast instead of hanging.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::warn;

/// Typed result of one upstream API call.
#[derive(Debug)]
pub enum UpstreamOutcome {
    /// 2xx with a JSON body.
    Success(Value),
    /// 404 from the API: the requested record does not exist.
    NotFound,
    /// Any other non-success status.
    Upstream { status: u16, body: String },
    /// Timeout or connection failure; the API never answered.
    Unreachable(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a path under `/api/v1` with query parameters.
    pub async fn get(&self, path: &str, params: &[(&str, String)]) -> UpstreamOutcome {
        let url = format!("{}/api/v1{}", self.base_url, path);

        let response = match self.http.get(&url).query(params).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "upstream request failed");
                return UpstreamOutcome::Unreachable(e.to_string());
            }
        };

        match response.status() {
            StatusCode::NOT_FOUND => UpstreamOutcome::NotFound,
            status if status.is_success() => match response.json::<Value>().await {
                Ok(value) => UpstreamOutcome::Success(value),
                Err(e) => UpstreamOutcome::Upstream {
                    status: status.as_u16(),
                    body: format!("invalid JSON from upstream: {e}"),
                },
            },
            status => UpstreamOutcome::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            },
        }
    }

    /// Cheap reachability probe used by the HTTP health endpoint.
    pub async fn probe(&self) -> Result<(), String> {
        match self
            .get("/lands/", &[("page", "1".into()), ("page_size", "1".into())])
            .await
        {
            UpstreamOutcome::Success(_) | UpstreamOutcome::NotFound => Ok(()),
            UpstreamOutcome::Upstream { status, .. } => Err(format!("upstream HTTP {status}")),
            UpstreamOutcome::Unreachable(reason) => Err(reason),
        }
    }
}
