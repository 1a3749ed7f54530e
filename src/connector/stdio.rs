//! Stdio connector for local MCP servers.
//!
//! Spawns the server as a child process and speaks newline-framed JSON-RPC
//! over its stdin/stdout pipes. Stderr is drained to debug logs so a chatty
//! server cannot block on a full pipe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::mcp::types::{
    CallToolRequest, CallToolResult, Implementation, InitializeRequest, InitializeResponse,
    JsonRpcRequest, ListToolsRequest, ListToolsResult, ServerCapabilities, Tool,
    PROTOCOL_VERSION,
};

use super::{Connector, ConnectorError, DEFAULT_REQUEST_TIMEOUT};

/// Connector for MCP servers launched as local child processes.
pub struct StdioConnector {
    process: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    stderr_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    next_id: AtomicI64,
    capabilities: Mutex<Option<ServerCapabilities>>,
    timeout: Duration,
    command: String,
}

impl StdioConnector {
    /// Spawn the server command and wire up its pipes.
    ///
    /// The connector is not usable until [`Connector::initialize`] has
    /// completed the MCP handshake.
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
    ) -> Result<Self, ConnectorError> {
        Self::with_timeout(command, args, env, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Spawn the server command with a custom request timeout.
    pub fn with_timeout(
        command: impl Into<String>,
        args: Vec<String>,
        env: HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let command = command.into();
        info!("spawning MCP server: {}", command);

        let mut cmd = Command::new(&command);
        cmd.args(&args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ConnectorError::Process(format!("failed to spawn '{}': {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConnectorError::Process("failed to capture stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ConnectorError::Process("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConnectorError::Process("failed to capture stderr".to_string()))?;

        // Drain stderr so the server cannot block on a full pipe.
        let stderr_command = command.clone();
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(server = %stderr_command, "server stderr: {}", line);
            }
        });

        Ok(Self {
            process: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            stderr_task: Mutex::new(Some(stderr_task)),
            next_id: AtomicI64::new(1),
            capabilities: Mutex::new(None),
            timeout,
            command,
        })
    }

    /// Whether the initialization handshake has completed.
    pub async fn is_initialized(&self) -> bool {
        self.capabilities.lock().await.is_some()
    }

    async fn ensure_initialized(&self) -> Result<(), ConnectorError> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(ConnectorError::NotInitialized)
        }
    }

    async fn write_message(&self, message: &JsonRpcRequest) -> Result<(), ConnectorError> {
        let body = serde_json::to_string(message).map_err(ConnectorError::serialization)?;
        let framed = format!("{}\n", body);

        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(framed.as_bytes())
            .await
            .map_err(ConnectorError::io)?;
        stdin.flush().await.map_err(ConnectorError::io)?;

        trace!("wrote {} bytes to server stdin", framed.len());
        Ok(())
    }

    async fn read_message(&self) -> Result<serde_json::Value, ConnectorError> {
        let mut stdout = self.stdout.lock().await;
        let mut line = String::new();
        match stdout.read_line(&mut line).await {
            Ok(0) => Err(ConnectorError::Process(
                "unexpected EOF while reading response".to_string(),
            )),
            Ok(_) => serde_json::from_str(line.trim_end_matches(['\r', '\n']))
                .map_err(|e| ConnectorError::InvalidResponse(format!("invalid JSON: {}", e))),
            Err(e) => Err(ConnectorError::io(e)),
        }
    }

    /// Send a request and wait for the response with a matching id.
    ///
    /// Messages with other ids (server notifications, out-of-order replies)
    /// are skipped.
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ConnectorError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        trace!(method, id, "sending request");

        let request = JsonRpcRequest::new(id, method, Some(params));
        self.write_message(&request).await?;

        loop {
            let message = tokio::time::timeout(self.timeout, self.read_message())
                .await
                .map_err(|_| ConnectorError::Timeout(self.timeout))??;

            if message.get("id").and_then(|v| v.as_i64()) != Some(id) {
                trace!("skipping notification or unmatched message");
                continue;
            }

            if let Some(error) = message.get("error") {
                let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0) as i32;
                let text = error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error")
                    .to_string();
                return Err(ConnectorError::Rpc {
                    code,
                    message: text,
                });
            }

            return Ok(message
                .get("result")
                .cloned()
                .unwrap_or_else(|| serde_json::json!({})));
        }
    }

    async fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), ConnectorError> {
        let notification = JsonRpcRequest::notification(method, Some(params));
        self.write_message(&notification).await
    }
}

#[async_trait]
impl Connector for StdioConnector {
    async fn initialize(&self) -> Result<ServerCapabilities, ConnectorError> {
        if let Some(capabilities) = self.capabilities.lock().await.clone() {
            return Ok(capabilities);
        }

        let client_info = Implementation::new("mcp-bridge", env!("CARGO_PKG_VERSION"));
        let init_request = InitializeRequest::new(PROTOCOL_VERSION, client_info);
        let params =
            serde_json::to_value(&init_request).map_err(ConnectorError::serialization)?;

        let response = self.request("initialize", params).await?;
        let init_response: InitializeResponse = serde_json::from_value(response)
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;

        if let Err(e) = self
            .notify("notifications/initialized", serde_json::json!({}))
            .await
        {
            warn!("failed to send initialized notification: {}", e);
        }

        info!(
            server = %self.command,
            protocol = %init_response.protocol_version,
            "stdio connector initialized"
        );

        *self.capabilities.lock().await = Some(init_response.capabilities.clone());
        Ok(init_response.capabilities)
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, ConnectorError> {
        self.ensure_initialized().await?;

        let params = serde_json::to_value(ListToolsRequest::default())
            .map_err(ConnectorError::serialization)?;
        let response = self.request("tools/list", params).await?;
        let result: ListToolsResult = serde_json::from_value(response)
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))?;
        Ok(result.tools)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ConnectorError> {
        self.ensure_initialized().await?;

        let arguments = match arguments {
            serde_json::Value::Object(map) => Some(map),
            serde_json::Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            }
        };

        let request = CallToolRequest {
            name: name.to_string(),
            arguments,
        };
        let params = serde_json::to_value(&request).map_err(ConnectorError::serialization)?;

        let response = self.request("tools/call", params).await?;
        serde_json::from_value(response)
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))
    }

    async fn close(&self) -> Result<(), ConnectorError> {
        info!(server = %self.command, "closing stdio connector");

        if let Some(task) = self.stderr_task.lock().await.take() {
            task.abort();
        }

        let mut process = self.process.lock().await;
        let _ = process.start_kill();
        let _ = process.wait().await;

        *self.capabilities.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn operations_require_initialization() {
        // `cat` never answers the handshake, so the connector stays
        // uninitialized and operations must refuse to run.
        let connector =
            StdioConnector::new("cat", Vec::new(), HashMap::new()).expect("spawn cat");

        assert!(!connector.is_initialized().await);
        let err = connector.list_tools().await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotInitialized));

        let err = connector
            .call_tool("anything", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::NotInitialized));

        connector.close().await.unwrap();
    }

    #[tokio::test]
    async fn spawn_failure_is_a_process_error() {
        let result = StdioConnector::new(
            "definitely-not-a-real-command-mcp",
            Vec::new(),
            HashMap::new(),
        );
        assert!(matches!(result, Err(ConnectorError::Process(_))));
    }
}
