//! tumbller-link: HTTP client for the robot's local control surface.
//!
//! Every call is a single bounded-timeout `GET {base_url}{path}`. Transport
//! failures, non-2xx statuses and undecodable bodies all collapse into one
//! [`LinkError`] so callers never branch on transport details. Nothing here
//! retries.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest slice of an error response body quoted in a [`LinkError`].
const MAX_ERROR_BODY_CHARS: usize = 200;

/// A failed robot request. `cause` is human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("robot request {path} failed: {cause}")]
pub struct LinkError {
    pub path: String,
    pub cause: String,
}

impl LinkError {
    pub fn new(path: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

/// Errors building an [`HttpRobotLink`].
#[derive(Debug, Error)]
pub enum LinkBuildError {
    #[error("invalid robot base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Request/response access to the robot.
#[async_trait]
pub trait RobotLink: Send + Sync {
    /// `GET` the endpoint at `path` (e.g. `"/motor/stop"`) and return the
    /// decoded JSON body.
    async fn send(&self, path: &str) -> Result<Value, LinkError>;
}

/// [`RobotLink`] over HTTP with one shared, pooled client.
///
/// Cloning is cheap: the underlying `reqwest::Client` is reference-counted,
/// so every clone reuses the same connection pool and timeout policy.
#[derive(Debug, Clone)]
pub struct HttpRobotLink {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpRobotLink {
    /// Build a link to `base_url` (e.g. `"http://192.168.4.1"`) where every
    /// request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LinkBuildError> {
        let parsed = Url::parse(base_url).map_err(|e| LinkBuildError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LinkBuildError::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs_f32())
        } else if err.is_connect() {
            format!("robot unreachable: {err}")
        } else {
            err.to_string()
        }
    }
}

#[async_trait]
impl RobotLink for HttpRobotLink {
    async fn send(&self, path: &str) -> Result<Value, LinkError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Robot request");

        let response = self.client.get(&url).send().await.map_err(|e| {
            let cause = self.describe(&e);
            warn!(path, %cause, "Robot request failed");
            LinkError::new(path, cause)
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            let cause = self.describe(&e);
            warn!(path, %cause, "Reading robot response failed");
            LinkError::new(path, cause)
        })?;

        if !status.is_success() {
            let text: String = String::from_utf8_lossy(&body)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            warn!(path, %status, "Robot returned an error status");
            return Err(LinkError::new(path, format!("HTTP {status}: {}", text.trim())));
        }

        // Some firmware endpoints answer with an empty body.
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&body).map_err(|e| {
            warn!(path, error = %e, "Robot returned a malformed body");
            LinkError::new(path, format!("malformed response body: {e}"))
        })
    }
}
