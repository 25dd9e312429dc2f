//! tumbller-gateway: MCP tool gateway for the Tumbller robot.
//!
//! Provides:
//! - MCP streamable HTTP endpoint at `/mcp` (JSON-RPC 2.0)
//! - Methods: initialize, ping, tools/list, tools/call
//! - Optional bearer token authentication
//! - HTTP health check endpoint

pub mod auth;
pub mod handlers;
pub mod jsonrpc;
pub mod mcp;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use tumbller_tools::ToolCatalog;

pub use auth::{AuthPolicy, Unauthorized};

/// Path the MCP endpoint is mounted at.
pub const MCP_PATH: &str = "/mcp";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid listen address '{0}'")]
    InvalidAddress(String),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Identity reported to MCP clients at `initialize`.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub instructions: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "Tumbller Self-Balancing Robot".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: "Control and monitor a Tumbller ESP32-S3 self-balancing robot"
                .to_string(),
        }
    }
}

/// Shared gateway state. Read-only after startup.
pub struct GatewayState {
    pub catalog: ToolCatalog,
    pub auth: AuthPolicy,
    pub server_info: ServerInfo,
}

impl GatewayState {
    pub fn new(catalog: ToolCatalog, auth: AuthPolicy) -> Self {
        Self {
            catalog,
            auth,
            server_info: ServerInfo::default(),
        }
    }
}

/// Build the axum router: `/mcp` behind authentication, `/health` open.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let mcp_routes = Router::new()
        .route(
            MCP_PATH,
            post(mcp::post_mcp).get(mcp::get_mcp).delete(mcp::delete_mcp),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .route("/health", get(health_handler))
        .merge(mcp_routes)
        .with_state(state)
}

/// Bind the listening socket without serving yet.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, GatewayError> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|_| GatewayError::InvalidAddress(format!("{host}:{port}")))?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind { addr, source })
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<GatewayState>,
    shutdown: F,
) -> Result<(), GatewayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;

    match insecure_mode_warning(&state.auth) {
        Some(msg) => warn!("{msg}"),
        None => info!("Bearer token authentication enabled"),
    }

    info!("Gateway listening on {addr}");
    info!("  MCP:    http://{addr}{MCP_PATH}");
    info!("  Health: http://{addr}/health");
    info!("  Tools:  {}", state.catalog.names().join(", "));

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Gateway stopped");
    Ok(())
}

/// Startup warning for a gateway that accepts unauthenticated callers.
pub fn insecure_mode_warning(auth: &AuthPolicy) -> Option<&'static str> {
    (!auth.is_enabled())
        .then_some("MCP_BEARER_TOKEN not set: authentication DISABLED, every caller is accepted")
}

/// GET /health — simple HTTP health check.
async fn health_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
