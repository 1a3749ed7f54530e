//! Server configuration loading.
//!
//! Configuration is a JSON document with an `mcpServers` object mapping a
//! server name to either a stdio launch spec (`command`, `args`, `env`) or
//! an HTTP endpoint spec (`url`, `headers`, `authToken`, `timeout`). The
//! shape of each entry decides which connector gets built.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::connector::{Connector, HttpConnector, StdioConnector, DEFAULT_REQUEST_TIMEOUT};

/// Errors raised while loading configuration or building connectors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// No server with the given name exists in the configuration.
    #[error("no server named '{0}' in configuration")]
    UnknownServer(String),

    /// A server entry has neither a command nor a URL.
    #[error("server '{0}' defines neither 'command' nor 'url'")]
    InvalidEntry(String),

    /// The connector could not be constructed from the entry.
    #[error("failed to build connector for '{name}': {message}")]
    Connector { name: String, message: String },
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct McpConfig {
    /// Server entries keyed by name.
    #[serde(default)]
    pub mcp_servers: HashMap<String, ServerConfig>,
}

/// A single server entry.
///
/// Both connector shapes share one struct so that an entry mixing fields is
/// still readable; [`ServerConfig::kind`] decides which set wins.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Executable to launch for a stdio server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Arguments passed to the executable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment variables for the child process.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Endpoint URL for an HTTP server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Extra headers sent on every HTTP request.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// Bearer token for HTTP authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Which connector a server entry resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerKind {
    /// Child process speaking JSON-RPC over stdin/stdout.
    Stdio,
    /// Remote endpoint speaking JSON-RPC over HTTP.
    Http,
}

impl ServerConfig {
    /// Classify the entry. `command` takes precedence over `url`.
    pub fn kind(&self) -> Option<ServerKind> {
        if self.command.is_some() {
            Some(ServerKind::Stdio)
        } else if self.url.is_some() {
            Some(ServerKind::Http)
        } else {
            None
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a connector from this entry. `name` is used in error messages.
    pub fn connector(&self, name: &str) -> Result<Arc<dyn Connector>, ConfigError> {
        match self.kind() {
            Some(ServerKind::Stdio) => {
                let command = self.command.as_deref().unwrap_or_default();
                let connector = StdioConnector::with_timeout(
                    command,
                    self.args.clone(),
                    self.env.clone(),
                    self.timeout(),
                )
                .map_err(|e| ConfigError::Connector {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Arc::new(connector))
            }
            Some(ServerKind::Http) => {
                let url = self.url.as_deref().unwrap_or_default();
                let connector = HttpConnector::with_options(
                    url,
                    self.auth_token.clone(),
                    self.headers.clone(),
                    self.timeout(),
                )
                .map_err(|e| ConfigError::Connector {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Arc::new(connector))
            }
            None => Err(ConfigError::InvalidEntry(name.to_string())),
        }
    }
}

impl McpConfig {
    /// Parse a configuration document from a JSON string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load a configuration document from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading MCP configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Names of all configured servers.
    pub fn server_names(&self) -> Vec<&str> {
        self.mcp_servers.keys().map(String::as_str).collect()
    }

    /// Build a connector for the named server.
    pub fn connector(&self, name: &str) -> Result<Arc<dyn Connector>, ConfigError> {
        let entry = self
            .mcp_servers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownServer(name.to_string()))?;
        entry.connector(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_stdio_entry() {
        let config = McpConfig::from_str(
            r#"{
                "mcpServers": {
                    "files": {
                        "command": "mcp-files",
                        "args": ["--root", "/tmp"],
                        "env": {"LOG": "debug"}
                    }
                }
            }"#,
        )
        .unwrap();

        let entry = &config.mcp_servers["files"];
        assert_eq!(entry.kind(), Some(ServerKind::Stdio));
        assert_eq!(entry.command.as_deref(), Some("mcp-files"));
        assert_eq!(entry.args, vec!["--root", "/tmp"]);
        assert_eq!(entry.env["LOG"], "debug");
    }

    #[test]
    fn parses_http_entry() {
        let config = McpConfig::from_str(
            r#"{
                "mcpServers": {
                    "remote": {
                        "url": "https://example.com/mcp",
                        "authToken": "secret",
                        "headers": {"X-Env": "staging"},
                        "timeout": 10
                    }
                }
            }"#,
        )
        .unwrap();

        let entry = &config.mcp_servers["remote"];
        assert_eq!(entry.kind(), Some(ServerKind::Http));
        assert_eq!(entry.url.as_deref(), Some("https://example.com/mcp"));
        assert_eq!(entry.auth_token.as_deref(), Some("secret"));
        assert_eq!(entry.timeout, Some(10));
    }

    #[test]
    fn command_takes_precedence_over_url() {
        let config = McpConfig::from_str(
            r#"{"mcpServers": {"both": {"command": "x", "url": "http://y"}}}"#,
        )
        .unwrap();
        assert_eq!(config.mcp_servers["both"].kind(), Some(ServerKind::Stdio));
    }

    #[test]
    fn empty_entry_is_invalid() {
        let config = McpConfig::from_str(r#"{"mcpServers": {"bare": {}}}"#).unwrap();
        let err = config.connector("bare").err().unwrap();
        assert!(matches!(err, ConfigError::InvalidEntry(name) if name == "bare"));
    }

    #[test]
    fn unknown_server_is_an_error() {
        let config = McpConfig::default();
        let err = config.connector("nope").err().unwrap();
        assert!(matches!(err, ConfigError::UnknownServer(name) if name == "nope"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, r#"{"mcpServers": {"s": {"command": "srv"}}}"#).unwrap();

        let config = McpConfig::load(&path).unwrap();
        assert_eq!(config.server_names(), vec!["s"]);
    }
}
