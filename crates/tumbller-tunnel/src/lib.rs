//! tumbller-tunnel: expose the local gateway on a stable public hostname.
//!
//! The tunnel is run by the `ngrok` agent as a child process. The agent is
//! asked for JSON logs on stdout; startup completes once it reports
//! `started tunnel`, and the process is killed when the [`TunnelBinding`]
//! is shut down or dropped.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tumbller_config::TunnelConfig;

/// How long the agent gets to bring the tunnel up.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);

const DEFAULT_AGENT: &str = "ngrok";

#[derive(Debug, Error)]
pub enum TunnelError {
    /// Required credentials are missing. Raised before anything is spawned.
    #[error("tunnel configuration error: {0}")]
    Configuration(String),
    #[error("failed to start tunnel agent '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("tunnel did not start: {0}")]
    Startup(String),
}

/// Validated tunnel parameters.
#[derive(Clone)]
pub struct TunnelSettings {
    auth_token: String,
    domain: String,
    program: String,
    startup_timeout: Duration,
}

impl std::fmt::Debug for TunnelSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelSettings")
            .field("auth_token", &"<redacted>")
            .field("domain", &self.domain)
            .field("program", &self.program)
            .field("startup_timeout", &self.startup_timeout)
            .finish()
    }
}

impl TunnelSettings {
    /// Validate `config`. The auth token is checked before the domain.
    pub fn from_config(config: &TunnelConfig) -> Result<Self, TunnelError> {
        let auth_token = non_empty(&config.auth_token).ok_or_else(|| {
            TunnelError::Configuration(
                "NGROK_AUTHTOKEN is required to expose the gateway publicly".into(),
            )
        })?;
        let domain = non_empty(&config.domain)
            .map(normalize_domain)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| {
                TunnelError::Configuration(
                    "NGROK_DOMAIN is required to expose the gateway publicly".into(),
                )
            })?;

        Ok(Self {
            auth_token: auth_token.to_string(),
            domain,
            program: DEFAULT_AGENT.to_string(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        })
    }

    /// Use a different agent executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Command-line arguments for the agent. The auth token is passed through
    /// the environment so it never shows up in the process list.
    pub fn agent_args(&self, local_port: u16) -> Vec<String> {
        vec![
            "http".to_string(),
            local_port.to_string(),
            "--url".to_string(),
            format!("https://{}", self.domain),
            "--log".to_string(),
            "stdout".to_string(),
            "--log-format".to_string(),
            "json".to_string(),
        ]
    }

    /// Start the agent and wait until it reports the tunnel as up.
    pub async fn expose(&self, local_port: u16) -> Result<TunnelBinding, TunnelError> {
        info!(domain = %self.domain, local_port, "Starting ngrok tunnel");

        let mut child = Command::new(&self.program)
            .args(self.agent_args(local_port))
            .env("NGROK_AUTHTOKEN", &self.auth_token)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TunnelError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TunnelError::Startup("agent stdout was not captured".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        // On any early return the child is dropped and killed.
        let reported =
            match tokio::time::timeout(self.startup_timeout, wait_for_start(&mut lines)).await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(TunnelError::Startup(format!(
                        "no tunnel reported within {}s",
                        self.startup_timeout.as_secs()
                    )));
                }
            };

        let binding = TunnelBinding {
            public_hostname: self.domain.clone(),
            local_port,
            child,
            log_task: tokio::spawn(drain_agent_log(lines)),
        };

        if let Some(url) = reported.filter(|u| u.trim_end_matches('/') != binding.public_url()) {
            warn!(reported = %url, expected = %binding.public_url(), "Agent reported an unexpected URL");
        }
        info!("Public URL:   {}", binding.public_url());
        info!("MCP endpoint: {}", binding.mcp_endpoint());
        Ok(binding)
    }
}

/// Expose `local_port` on the configured reserved domain.
///
/// Fails with [`TunnelError::Configuration`] before spawning anything when
/// the token or domain is missing.
pub async fn expose_publicly(
    local_port: u16,
    config: &TunnelConfig,
) -> Result<TunnelBinding, TunnelError> {
    TunnelSettings::from_config(config)?.expose(local_port).await
}

/// A live public tunnel. Dropping it kills the agent.
#[derive(Debug)]
pub struct TunnelBinding {
    public_hostname: String,
    local_port: u16,
    child: Child,
    log_task: JoinHandle<()>,
}

impl TunnelBinding {
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub fn public_url(&self) -> String {
        format!("https://{}", self.public_hostname)
    }

    pub fn mcp_endpoint(&self) -> String {
        format!("{}/mcp", self.public_url())
    }

    /// Stop the agent and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "Failed to stop ngrok agent");
        }
        self.log_task.abort();
        info!(hostname = %self.public_hostname, "Tunnel closed");
    }
}

/// What a single agent log line means for startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    Started { url: Option<String> },
    Failed(String),
    Other,
}

#[derive(Deserialize)]
struct AgentLogLine {
    #[serde(default)]
    lvl: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    err: Option<String>,
}

/// Classify one line of the agent's JSON log. Non-JSON lines are `Other`.
pub fn parse_agent_line(line: &str) -> AgentEvent {
    let Ok(entry) = serde_json::from_str::<AgentLogLine>(line) else {
        return AgentEvent::Other;
    };

    if entry.msg == "started tunnel" {
        return AgentEvent::Started { url: entry.url };
    }
    if matches!(entry.lvl.as_str(), "eror" | "error" | "crit") {
        let detail = match entry.err {
            Some(err) if !err.is_empty() => format!("{}: {err}", entry.msg),
            _ => entry.msg,
        };
        return AgentEvent::Failed(detail);
    }
    AgentEvent::Other
}

async fn wait_for_start(
    lines: &mut Lines<BufReader<ChildStdout>>,
) -> Result<Option<String>, TunnelError> {
    let mut last_error = None;
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_agent_line(&line) {
                AgentEvent::Started { url } => return Ok(url),
                AgentEvent::Failed(msg) => {
                    warn!(error = %msg, "ngrok agent error");
                    last_error = Some(msg);
                }
                AgentEvent::Other => debug!(line = %line, "ngrok"),
            },
            Ok(None) => {
                return Err(TunnelError::Startup(last_error.unwrap_or_else(|| {
                    "agent exited before the tunnel started".to_string()
                })));
            }
            Err(e) => {
                return Err(TunnelError::Startup(format!("reading agent output: {e}")));
            }
        }
    }
}

/// Keep reading agent output so the pipe never fills.
async fn drain_agent_log(mut lines: Lines<BufReader<ChildStdout>>) {
    while let Ok(Some(line)) = lines.next_line().await {
        match parse_agent_line(&line) {
            AgentEvent::Failed(msg) => warn!(error = %msg, "ngrok agent error"),
            _ => debug!(line = %line, "ngrok"),
        }
    }
    debug!("ngrok agent output closed");
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Accept `my-robot.ngrok.app` as well as `https://my-robot.ngrok.app/`.
fn normalize_domain(domain: &str) -> String {
    domain
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}
