//! Connectors: the session objects through which MCP tools are listed and
//! invoked.
//!
//! A connector owns the transport/session lifecycle for one MCP server. Two
//! implementations are provided, stdio (local child process) and HTTP
//! (remote endpoint); the agent layer only ever sees the [`Connector`]
//! trait.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::mcp::types::{CallToolResult, ServerCapabilities, Tool};

pub mod http;
pub mod stdio;

pub use http::HttpConnector;
pub use stdio::StdioConnector;

/// Default request timeout for connector operations.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during connector operations.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Connector has not completed the initialization handshake.
    #[error("connector not initialized")]
    NotInitialized,

    /// Failed to spawn or talk to the server process (stdio transport).
    #[error("process error: {0}")]
    Process(String),

    /// I/O error on the underlying transport.
    #[error("I/O error: {0}")]
    Io(String),

    /// HTTP-level failure (remote transport).
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Request timed out.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The server returned a JSON-RPC error object.
    #[error("server error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Failed to encode a request or decode a response.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The response was well-formed JSON but not the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ConnectorError {
    /// Create an I/O error from any displayable error.
    pub fn io<E: fmt::Display>(err: E) -> Self {
        ConnectorError::Io(err.to_string())
    }

    /// Create a serialization error from any displayable error.
    pub fn serialization<E: fmt::Display>(err: E) -> Self {
        ConnectorError::Serialization(err.to_string())
    }
}

/// A session with one MCP server.
///
/// Implementations must complete the MCP initialization handshake before
/// `list_tools`/`call_tool` succeed; both return [`ConnectorError::NotInitialized`]
/// otherwise. Timeouts are the connector's responsibility, not the caller's.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the initialization handshake with the server.
    async fn initialize(&self) -> Result<ServerCapabilities, ConnectorError>;

    /// List the tools the server declares.
    async fn list_tools(&self) -> Result<Vec<Tool>, ConnectorError>;

    /// Invoke a tool by name with a JSON object of arguments.
    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ConnectorError>;

    /// Shut down the session and release transport resources.
    async fn close(&self) -> Result<(), ConnectorError>;
}
