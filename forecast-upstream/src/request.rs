//! Per-call upstream request description

use std::fmt;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::UpstreamError;

/// API token sent as a query parameter
#[derive(Clone)]
pub struct Credential {
    pub name: &'static str,
    pub value: String,
}

// Token values must never reach the logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({}=<redacted>)", self.name)
    }
}

/// Target, query parameters and credential for one upstream GET
///
/// Built fresh for every call and never cached.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub target: String,
    pub query: Vec<(&'static str, String)>,
    pub credential: Option<Credential>,
}

impl UpstreamRequest {
    pub fn get(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            query: Vec::new(),
            credential: None,
        }
    }

    pub fn query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    fn into_builder(self, client: &Client) -> RequestBuilder {
        let builder = client.get(&self.target).query(&self.query);

        match self.credential {
            Some(Credential { name, value }) => builder.query(&[(name, value)]),
            None => builder,
        }
    }
}

/// Send a GET and decode the body, treating a non-2xx answer as an absent payload
pub(crate) async fn fetch_optional_json<T: DeserializeOwned>(
    client: &Client,
    request: UpstreamRequest,
    service: &str,
) -> Result<Option<T>, UpstreamError> {
    debug!(service, ?request, "Calling upstream");

    let response = request.into_builder(client).send().await?;

    if !response.status().is_success() {
        warn!(service, status = %response.status(), "Upstream returned non-success status");
        return Ok(None);
    }

    let payload = response
        .json::<T>()
        .await
        .map_err(|e| UpstreamError::ParseError(e.to_string()))?;

    Ok(Some(payload))
}

/// Build an HTTP client with the given timeout
pub(crate) fn http_client(timeout: std::time::Duration) -> Result<Client, UpstreamError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| UpstreamError::InvalidConfig(e.to_string()))
}

/// Validate a base URL and strip any trailing slash
pub(crate) fn normalize_base_url(base_url: &str) -> Result<String, UpstreamError> {
    Url::parse(base_url)
        .map_err(|e| UpstreamError::InvalidConfig(format!("invalid base URL '{}': {}", base_url, e)))?;
    Ok(base_url.trim_end_matches('/').to_string())
}
