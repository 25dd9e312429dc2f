//! Bearer token authentication for the MCP endpoint.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use crate::GatewayState;

/// How inbound calls are authenticated, chosen once at startup.
#[derive(Clone)]
pub enum AuthPolicy {
    /// Every call is accepted.
    Disabled,
    /// Every call must present `Authorization: Bearer <token>`.
    /// Only the SHA-256 digest of the token is kept.
    Bearer([u8; 32]),
}

/// A call was rejected before dispatch. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unauthorized")]
pub struct Unauthorized;

impl AuthPolicy {
    /// `Bearer` when a token is configured, `Disabled` otherwise.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if !t.is_empty() => AuthPolicy::Bearer(digest(t)),
            _ => AuthPolicy::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AuthPolicy::Bearer(_))
    }

    /// Check the credentials carried by `headers`.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), Unauthorized> {
        let AuthPolicy::Bearer(expected) = self else {
            return Ok(());
        };

        match extract_bearer_token(headers) {
            Some(token) if constant_time_eq(&digest(token), expected) => Ok(()),
            _ => Err(Unauthorized),
        }
    }
}

impl std::fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthPolicy::Disabled => f.write_str("Disabled"),
            AuthPolicy::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({
                "error": "invalid_token",
                "error_description": "Authentication required",
            })),
        )
            .into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer error=\"invalid_token\""),
        );
        response
    }
}

/// Middleware rejecting unauthenticated requests before any handler runs.
pub async fn require_auth(
    State(state): State<Arc<GatewayState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Err(e) = state.auth.check(request.headers()) {
        warn!(method = %request.method(), path = %request.uri().path(), "MCP authentication failed");
        return e.into_response();
    }
    next.run(request).await
}

/// Extract bearer token from Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
