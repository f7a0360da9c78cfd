//! HTTP client abstraction for the remote services the bot talks to
//! (playback service, media-server inventory, playlist downloads).
//!
//! The trait lets the dispatcher and the importer run against a mock in
//! tests. `DefaultHttpClient` wraps reqwest and folds non-2xx answers into
//! `Error::UpstreamUnavailable`, so callers only ever see one failure shape.
//!
//! # Example Usage:
//! ``
//! use crate::http::{HttpClient, DefaultHttpClient};
//!
//! let client: Arc<dyn HttpClient> = Arc::new(DefaultHttpClient::new());
//! let body = client.get(url, HashMap::new()).await?;
//! ``

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest;
use tracing::debug;

use crate::Error;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// A generic trait for making HTTP requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<String, Error>;
    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<String, Error>;
}

#[derive(Clone)]
pub struct DefaultHttpClient {
    client: reqwest::Client,
}

impl DefaultHttpClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn read_body(url: &str, response: reqwest::Response) -> Result<String, Error> {
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("{url} responded {status}")));
        }
        Ok(response.text().await?)
    }
}

impl Default for DefaultHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for DefaultHttpClient {
    async fn get(&self, url: String, headers: HashMap<String, String>) -> Result<String, Error> {
        debug!("GET {url}");
        let mut request = self.client.get(&url);
        for (key, value) in headers {
            request = request.header(&key, value);
        }
        let response = request
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("GET {url} failed: {e}")))?;
        Self::read_body(&url, response).await
    }

    async fn post_json(&self, url: String, body: serde_json::Value) -> Result<String, Error> {
        debug!("POST {url}");
        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("POST {url} failed: {e}")))?;
        Self::read_body(&url, response).await
    }
}
