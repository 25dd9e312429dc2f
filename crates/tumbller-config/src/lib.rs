use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("Config directory not found")]
    NoDirFound,
    #[error("Config file not found: {}", .0.display())]
    Missing(PathBuf),
}

/// Tool gateway (MCP server) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bearer token required on every `/mcp` request. Unset disables auth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            auth_token: None,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("port", &self.port)
            .field("host", &self.host)
            .field("auth_token", &redacted(&self.auth_token))
            .finish()
    }
}

/// Robot HTTP control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Base URL of the robot firmware's HTTP server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Public tunnel credentials. Only required when exposure is requested.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// ngrok agent auth token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Reserved ngrok domain (e.g. "my-robot.ngrok-free.app").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl fmt::Debug for TunnelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelConfig")
            .field("auth_token", &redacted(&self.auth_token))
            .field("domain", &self.domain)
            .finish()
    }
}

fn redacted(secret: &Option<String>) -> &'static str {
    if secret.is_some() { "<redacted>" } else { "<not set>" }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TumbllerConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub tunnel: TunnelConfig,
}

/// Resolve the config directory (~/.tumbller/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".tumbller"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the config file path (~/.tumbller/config.json5).
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json5"))
}

/// Load configuration: `.env`, then the config file (explicit `path` or the
/// default location), then environment overrides.
///
/// A missing default config file falls back to defaults; a missing explicit
/// `path` is an error.
pub fn load_config(path: Option<&Path>) -> Result<TumbllerConfig, ConfigError> {
    // Load .env if present; never overrides variables already set.
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(p) if !p.exists() => return Err(ConfigError::Missing(p.to_path_buf())),
        Some(p) => load_config_from(p)?,
        None => load_config_from(&config_file_path()?)?,
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load configuration from a specific path, falling back to defaults if not found.
pub fn load_config_from(path: &Path) -> Result<TumbllerConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("Config file not found at {}, using defaults", path.display());
        return Ok(TumbllerConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let mut config: TumbllerConfig = json5::from_str(&content)?;
    if config.robot.timeout_secs == 0 {
        tracing::warn!(
            "Ignoring robot.timeout_secs = 0 in {}, using {}s",
            path.display(),
            default_timeout_secs()
        );
        config.robot.timeout_secs = default_timeout_secs();
    }
    Ok(config)
}

/// Apply environment variable overrides to `config`.
///
/// | Variable | Field |
/// |---|---|
/// | `MCP_BEARER_TOKEN` | `gateway.auth_token` |
/// | `MCP_PORT` | `gateway.port` |
/// | `MCP_HOST` | `gateway.host` |
/// | `TUMBLLER_BASE_URL` | `robot.base_url` |
/// | `TUMBLLER_TIMEOUT_SECS` | `robot.timeout_secs` |
/// | `NGROK_AUTHTOKEN` | `tunnel.auth_token` |
/// | `NGROK_DOMAIN` | `tunnel.domain` |
pub fn apply_env_overrides(config: &mut TumbllerConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary key lookup. Empty values count as unset.
pub fn apply_overrides_from<F>(config: &mut TumbllerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(v) = get("MCP_BEARER_TOKEN") {
        config.gateway.auth_token = Some(v);
    }
    if let Some(v) = get("MCP_PORT") {
        match v.parse::<u16>() {
            Ok(port) => config.gateway.port = port,
            Err(_) => tracing::warn!(value = %v, "Ignoring invalid MCP_PORT"),
        }
    }
    if let Some(v) = get("MCP_HOST") {
        config.gateway.host = v;
    }
    if let Some(v) = get("TUMBLLER_BASE_URL") {
        config.robot.base_url = v;
    }
    if let Some(v) = get("TUMBLLER_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) if secs > 0 => config.robot.timeout_secs = secs,
            _ => tracing::warn!(value = %v, "Ignoring invalid TUMBLLER_TIMEOUT_SECS"),
        }
    }
    if let Some(v) = get("NGROK_AUTHTOKEN") {
        config.tunnel.auth_token = Some(v);
    }
    if let Some(v) = get("NGROK_DOMAIN") {
        config.tunnel.domain = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TumbllerConfig::default();
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert!(config.gateway.auth_token.is_none());
        assert_eq!(config.robot.timeout_secs, 5);
        assert!(config.tunnel.domain.is_none());
    }

    #[test]
    fn test_json5_parse() {
        let json5_str = r#"{
            gateway: { port: 9000 },
            robot: { base_url: "http://tumbller.local", },
            tunnel: { domain: "robot.ngrok-free.app" },
        }"#;
        let config: TumbllerConfig = json5::from_str(json5_str).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.robot.base_url, "http://tumbller.local");
        assert_eq!(config.robot.timeout_secs, 5);
        assert_eq!(config.tunnel.domain.as_deref(), Some("robot.ngrok-free.app"));
        assert!(config.tunnel.auth_token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TumbllerConfig::default();
        apply_overrides_from(
            &mut config,
            lookup(&[
                ("MCP_BEARER_TOKEN", "s3cret"),
                ("MCP_PORT", "8123"),
                ("TUMBLLER_BASE_URL", "http://10.0.0.7"),
                ("TUMBLLER_TIMEOUT_SECS", "3"),
                ("NGROK_AUTHTOKEN", "ngrok-token"),
                ("NGROK_DOMAIN", "robot.ngrok-free.app"),
            ]),
        );
        assert_eq!(config.gateway.auth_token.as_deref(), Some("s3cret"));
        assert_eq!(config.gateway.port, 8123);
        assert_eq!(config.robot.base_url, "http://10.0.0.7");
        assert_eq!(config.robot.timeout_secs, 3);
        assert_eq!(config.tunnel.auth_token.as_deref(), Some("ngrok-token"));
        assert_eq!(config.tunnel.domain.as_deref(), Some("robot.ngrok-free.app"));
    }

    #[test]
    fn test_empty_env_values_are_unset() {
        let mut config = TumbllerConfig::default();
        apply_overrides_from(&mut config, lookup(&[("MCP_BEARER_TOKEN", ""), ("NGROK_DOMAIN", "  ")]));
        assert!(config.gateway.auth_token.is_none());
        assert!(config.tunnel.domain.is_none());
    }

    #[test]
    fn test_invalid_numbers_are_ignored() {
        let mut config = TumbllerConfig::default();
        apply_overrides_from(
            &mut config,
            lookup(&[("MCP_PORT", "not-a-port"), ("TUMBLLER_TIMEOUT_SECS", "0")]),
        );
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.robot.timeout_secs, 5);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = TumbllerConfig::default();
        config.gateway.auth_token = Some("bearer-secret".into());
        config.tunnel.auth_token = Some("ngrok-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("bearer-secret"));
        assert!(!debug.contains("ngrok-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_load_config_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json5")).unwrap();
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(&path, "{ robot: { timeout_secs: 2 } }").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.robot.timeout_secs, 2);
    }

    #[test]
    fn test_load_config_from_file_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json5");
        std::fs::write(&path, "{ robot: { timeout_secs: 0 } }").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.robot.timeout_secs, 5);
    }

    #[test]
    fn test_load_config_explicit_missing_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json5");
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }
}
