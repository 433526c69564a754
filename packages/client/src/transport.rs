//! How requests reach the statistics API.
//!
//! [`HttpTransport`] is the real network transport. [`StaticTransport`]
//! serves canned bodies from memory and counts how often each path was
//! requested, for offline runs and tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{ClientError, Endpoint};

/// Issues a `GET` for a path on the statistics API and returns the raw
/// response body.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Base URL requests are resolved against (for logging).
    fn base_url(&self) -> &str;

    /// Fetches `path` (e.g. `"/api/mapData"`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the server answers
    /// with a non-success status.
    async fn get(&self, path: &str) -> Result<String, ClientError>;
}

/// Network transport backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the API served at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a transport reusing an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str) -> Result<String, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// A canned response: a body, or an error status.
#[derive(Debug, Clone)]
enum Canned {
    Body(String),
    Status(u16),
}

/// In-memory transport serving fixed responses per endpoint.
///
/// Paths with no canned response answer `404`.
#[derive(Debug, Default)]
pub struct StaticTransport {
    responses: BTreeMap<String, Canned>,
    calls: Mutex<BTreeMap<String, usize>>,
}

impl StaticTransport {
    /// Creates a transport with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `endpoint`.
    #[must_use]
    pub fn with_body(mut self, endpoint: Endpoint, body: impl Into<String>) -> Self {
        self.responses
            .insert(endpoint.to_string(), Canned::Body(body.into()));
        self
    }

    /// Answers `endpoint` with the HTTP `status` error.
    #[must_use]
    pub fn with_status(mut self, endpoint: Endpoint, status: u16) -> Self {
        self.responses
            .insert(endpoint.to_string(), Canned::Status(status));
        self
    }

    /// How many times `endpoint` has been requested.
    ///
    /// # Panics
    ///
    /// Panics if the call counter `Mutex` is poisoned.
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .expect("call counter mutex poisoned")
            .get(endpoint.as_ref())
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ApiTransport for StaticTransport {
    fn base_url(&self) -> &str {
        "static:"
    }

    async fn get(&self, path: &str) -> Result<String, ClientError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(path.to_string()).or_insert(0) += 1;
        }

        match self.responses.get(path) {
            Some(Canned::Body(body)) => Ok(body.clone()),
            Some(Canned::Status(status)) => Err(ClientError::Status {
                url: path.to_string(),
                status: *status,
            }),
            None => Err(ClientError::Status {
                url: path.to_string(),
                status: 404,
            }),
        }
    }
}
