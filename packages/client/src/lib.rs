#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the precomputed traffic accident statistics API.
//!
//! Every endpoint is a plain `GET` returning JSON. [`ApiClient::get_json`]
//! issues the request through an [`ApiTransport`] and decodes the body,
//! returning [`Payload::Empty`] for a successful response with no content
//! and a [`ClientError`] for anything that went wrong, so callers never
//! have to guess whether "nothing" meant "no data" or "request failed".
//!
//! There are no retries and no timeouts: the backend serves static files
//! and a failed request is reported to the user as-is.

pub mod map;
pub mod transport;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use strum_macros::{AsRefStr, Display};

pub use transport::{ApiTransport, HttpTransport, StaticTransport};

/// Maximum length of the response body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Errors that can occur while talking to the statistics API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, DNS, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL or path.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The body was not the JSON shape we expected.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The statistics API's endpoints.
///
/// `Display`/`AsRef<str>` give the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Endpoint {
    /// Headline statistics.
    #[strum(serialize = "/api/stats")]
    Stats,
    /// Accidents and deaths per month.
    #[strum(serialize = "/api/accidents_by_month")]
    AccidentsByMonth,
    /// Accidents and deaths per car make.
    #[strum(serialize = "/api/carType")]
    CarType,
    /// Sober vs. intoxicated drivers per month.
    #[strum(serialize = "/api/intoxicatedDrivers")]
    IntoxicatedDrivers,
    /// Every accident with its location.
    #[strum(serialize = "/api/mapData")]
    MapData,
}

/// A successfully fetched response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<T> {
    /// The decoded body.
    Data(T),
    /// The server answered successfully but sent nothing (empty body or
    /// JSON `null`).
    Empty,
}

impl<T> Payload<T> {
    /// Whether the response had no content.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Converts into an `Option`, mapping [`Payload::Empty`] to `None`.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Data(data) => Some(data),
            Self::Empty => None,
        }
    }
}

impl<T: Default> Payload<T> {
    /// The decoded body, or `T::default()` (an empty collection) for an
    /// empty response.
    #[must_use]
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

/// Client for the statistics API.
///
/// Cheap to clone; clones share the same transport and connection pool.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.transport.base_url())
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for the API served at `base_url`
    /// (e.g. `"http://127.0.0.1:8000"`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(Arc::new(HttpTransport::new(base_url)))
    }

    /// Creates a client on top of an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn ApiTransport>) -> Self {
        Self { transport }
    }

    /// Fetches `endpoint` and decodes its JSON body as `T`.
    ///
    /// Failures are logged here, where the request context is known, and
    /// then returned.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails, the server returns a
    /// non-success status, or the body is not valid JSON for `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
    ) -> Result<Payload<T>, ClientError> {
        let path = endpoint.as_ref();
        log::debug!("GET {}{path}", self.transport.base_url());

        let body = match self.transport.get(path).await {
            Ok(body) => body,
            Err(e) => {
                log::error!("GET {path} failed: {e}");
                return Err(e);
            }
        };

        decode_body(&body).inspect_err(|e| {
            log::error!(
                "Failed to decode {path}: {e}\n  \
                 received: {} bytes\n  \
                 body preview: {}",
                body.len(),
                preview(&body)
            );
        })
    }
}

/// Decodes a response body, treating an empty body or JSON `null` as
/// [`Payload::Empty`].
///
/// # Errors
///
/// Returns [`ClientError::Json`] if the body is not valid JSON for `T`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<Payload<T>, ClientError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Payload::Empty);
    }
    Ok(Payload::Data(serde_json::from_str(trimmed)?))
}

fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
