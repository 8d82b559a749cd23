//! HTTP client wrapper for kDrive API requests.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use tokio::time::timeout;
use url::Url;

use crate::error::{KdriveError, Result};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("kdrivefs/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated HTTP client for the kDrive API.
///
/// The bearer token is installed as a default header, so every request built
/// from this client is authenticated.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

fn auth_headers(token: &str) -> Result<HeaderMap> {
    if token.trim().is_empty() {
        return Err(KdriveError::InvalidConfig("API token is empty".to_string()));
    }
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
        .map_err(|_| KdriveError::InvalidConfig("API token is not a valid header".to_string()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

impl HttpClient {
    /// Create a client authenticated with `token`.
    pub fn new(token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(auth_headers(token)?)
            .build()?;

        Ok(Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Create a client that goes through a proxy.
    pub fn with_proxy(token: &str, proxy: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| KdriveError::InvalidConfig(format!("Invalid proxy: {}", e)))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(auth_headers(token)?)
            .proxy(proxy)
            .build()?;

        Ok(Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start a request.
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request, giving up after the configured timeout.
    ///
    /// Non-success statuses are returned as responses; the caller decides
    /// whether to retry or read the error body.
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        timeout(self.timeout, request.send())
            .await
            .map_err(|_| KdriveError::Timeout)?
            .map_err(KdriveError::from)
    }
}
