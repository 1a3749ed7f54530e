//! HTTP connector for remote MCP servers.
//!
//! Speaks JSON-RPC over POST requests to a single endpoint. Authentication
//! is a bearer token and/or custom headers supplied at construction time;
//! the request timeout lives on the underlying client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tokio::sync::Mutex;
use tracing::{info, trace};

use crate::mcp::types::{
    CallToolRequest, CallToolResult, Implementation, InitializeRequest, InitializeResponse,
    JsonRpcRequest, ListToolsRequest, ListToolsResult, ServerCapabilities, Tool,
    PROTOCOL_VERSION,
};

use super::{Connector, ConnectorError, DEFAULT_REQUEST_TIMEOUT};

/// Connector for MCP servers reachable over HTTP.
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: String,
    next_id: AtomicI64,
    capabilities: Mutex<Option<ServerCapabilities>>,
}

impl HttpConnector {
    /// Create a connector for the given endpoint with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConnectorError> {
        Self::with_options(base_url, None, HashMap::new(), DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a connector with authentication and timeout options.
    ///
    /// `auth_token` becomes a `Bearer` authorization header; `headers` are
    /// sent verbatim on every request.
    pub fn with_options(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        headers: HashMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let base_url = base_url.into();
        info!("creating HTTP connector for {}", base_url);

        let mut header_map = HeaderMap::new();
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ConnectorError::InvalidResponse(format!("invalid auth token: {}", e)))?;
            header_map.insert(AUTHORIZATION, value);
        }

        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                ConnectorError::InvalidResponse(format!("invalid header name '{}': {}", key, e))
            })?;
            let value = HeaderValue::from_str(&value).map_err(|e| {
                ConnectorError::InvalidResponse(format!("invalid header value: {}", e))
            })?;
            header_map.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(header_map)
            .build()
            .map_err(|e| ConnectorError::Io(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            next_id: AtomicI64::new(1),
            capabilities: Mutex::new(None),
        })
    }

    async fn ensure_initialized(&self) -> Result<(), ConnectorError> {
        if self.capabilities.lock().await.is_some() {
            Ok(())
        } else {
            Err(ConnectorError::NotInitialized)
        }
    }

    async fn post(&self, request: &JsonRpcRequest) -> Result<serde_json::Value, ConnectorError> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectorError::Timeout(DEFAULT_REQUEST_TIMEOUT)
                } else {
                    ConnectorError::Io(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Http {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ConnectorError::InvalidResponse(e.to_string()))
    }

    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ConnectorError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        trace!(method, id, "sending HTTP request");

        let request = JsonRpcRequest::new(id, method, Some(params));
        let message = self.post(&request).await?;

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

        Ok(message
            .get("result")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({})))
    }

    async fn notify(&self, method: &str, params: serde_json::Value) -> Result<(), ConnectorError> {
        let notification = JsonRpcRequest::notification(method, Some(params));
        // Notification responses carry no payload worth inspecting.
        let _ = self.post(&notification).await?;
        Ok(())
    }
}

#[async_trait]
impl Connector for HttpConnector {
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

        let _ = self
            .notify("notifications/initialized", serde_json::json!({}))
            .await;

        info!(
            endpoint = %self.base_url,
            protocol = %init_response.protocol_version,
            "HTTP connector initialized"
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
        *self.capabilities.lock().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn operations_require_initialization() {
        let connector = HttpConnector::new("http://localhost:9").unwrap();
        let err = connector.list_tools().await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotInitialized));
    }

    #[test]
    fn rejects_invalid_header_names() {
        let mut headers = HashMap::new();
        headers.insert("bad header\n".to_string(), "x".to_string());
        let result = HttpConnector::with_options(
            "http://localhost:9",
            None,
            headers,
            DEFAULT_REQUEST_TIMEOUT,
        );
        assert!(result.is_err());
    }
}
