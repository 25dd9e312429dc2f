use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use tumbller_config::TumbllerConfig;
use tumbller_gateway::{AuthPolicy, GatewayState};
use tumbller_link::HttpRobotLink;
use tumbller_tools::{RobotToolContext, create_robot_tools};
use tumbller_types::AutoStopRule;

#[derive(Parser, Debug)]
#[command(name = "tumbller-mcp", about = "MCP gateway for the Tumbller self-balancing robot")]
struct Cli {
    /// Expose the gateway on the reserved ngrok domain
    #[arg(long)]
    ngrok: bool,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path (default: ~/.tumbller/config.json5)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // .env may carry RUST_LOG / TUMBLLER_LOG_FORMAT; never overrides the process env.
    load_dotenv(None);
    init_tracing();

    let cli = Cli::parse();
    let mut config = tumbller_config::load_config(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, cli.ngrok))
}

/// Load `.env` from the working directory, or from `path` when given.
fn load_dotenv(path: Option<&Path>) {
    let _ = match path {
        Some(p) => dotenvy::from_path(p),
        None => dotenvy::dotenv().map(|_| ()),
    };
}

fn json_logging() -> bool {
    std::env::var("TUMBLLER_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// `TUMBLLER_LOG_FORMAT=json` switches to JSON lines; `RUST_LOG` sets the filter.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: TumbllerConfig, expose: bool) -> anyhow::Result<()> {
    let link = HttpRobotLink::new(
        &config.robot.base_url,
        Duration::from_secs(config.robot.timeout_secs),
    )
    .context("Invalid robot configuration")?;
    info!(
        base_url = %link.base_url(),
        timeout_secs = config.robot.timeout_secs,
        "Robot link ready"
    );

    let ctx = Arc::new(RobotToolContext::new(Arc::new(link), AutoStopRule::default()));
    let auth = AuthPolicy::from_token(config.gateway.auth_token.as_deref());
    let state = Arc::new(GatewayState::new(create_robot_tools(ctx), auth));

    let listener = tumbller_gateway::bind(&config.gateway.host, config.gateway.port).await?;

    let tunnel = if expose {
        let port = bound_port(&listener)?;
        let binding = tumbller_tunnel::expose_publicly(port, &config.tunnel)
            .await
            .context("Failed to expose gateway publicly")?;
        Some(binding)
    } else {
        None
    };

    let served = tumbller_gateway::serve(listener, state, shutdown_signal()).await;

    if let Some(binding) = tunnel {
        binding.shutdown().await;
    }
    served?;
    Ok(())
}

/// Port the listener actually holds; differs from the configured one for `--port 0`.
fn bound_port(listener: &TcpListener) -> std::io::Result<u16> {
    Ok(listener.local_addr()?.port())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
