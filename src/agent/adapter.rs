//! Tool adapters.
//!
//! A [`ToolAdapter`] wraps one server-declared tool behind a uniform call
//! surface: normalized argument schema, async-only invocation, and text
//! output. One concrete type covers every tool; the differences live in
//! data, not in per-tool types.

use std::sync::Arc;

use tracing::debug;

use crate::connector::{Connector, ConnectorError};
use crate::mcp::types::Tool;
use crate::model::ToolDescriptor;
use crate::schema::{ParameterSchema, SchemaError};

use super::decoder::decode_tool_result;

/// Placeholder for tools the server listed without a name.
const NO_NAME: &str = "NO NAME";

/// Errors raised by a tool adapter.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The tool was invoked synchronously.
    #[error("tool '{0}' only supports async invocation")]
    SyncUnsupported(String),

    /// The arguments did not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] SchemaError),

    /// The connector failed to execute the call.
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

/// One MCP tool exposed to the agent loop.
pub struct ToolAdapter {
    name: String,
    description: String,
    schema: ParameterSchema,
    connector: Arc<dyn Connector>,
    handle_tool_error: bool,
}

impl ToolAdapter {
    /// Wrap a tool declaration with a connector to call it through.
    pub fn new(tool: Tool, connector: Arc<dyn Connector>) -> Self {
        let name = if tool.name.is_empty() {
            NO_NAME.to_string()
        } else {
            tool.name
        };
        Self {
            name,
            description: tool.description.unwrap_or_default(),
            schema: ParameterSchema::compile(tool.input_schema),
            connector,
            handle_tool_error: true,
        }
    }

    /// Build adapters for every tool a connector lists.
    ///
    /// The connector must already be initialized.
    pub async fn from_connector(
        connector: Arc<dyn Connector>,
    ) -> Result<Vec<Self>, ConnectorError> {
        let tools = connector.list_tools().await?;
        debug!(count = tools.len(), "building tool adapters");
        Ok(tools
            .into_iter()
            .map(|tool| Self::new(tool, Arc::clone(&connector)))
            .collect())
    }

    /// Whether connector and decode failures are folded into the returned
    /// string instead of propagating. Defaults to true.
    pub fn with_error_handling(mut self, handle_tool_error: bool) -> Self {
        self.handle_tool_error = handle_tool_error;
        self
    }

    /// Tool name as presented to the model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tool description as presented to the model.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The surface handed to the language model.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.as_value().clone(),
        }
    }

    /// Synchronous invocation is never supported.
    pub fn invoke_sync(&self) -> Result<String, AdapterError> {
        Err(AdapterError::SyncUnsupported(self.name.clone()))
    }

    /// Validate arguments, execute the tool, and decode the result to text.
    ///
    /// Decode failures always fold into the returned string. Connector
    /// failures fold only when error handling is on; otherwise they
    /// propagate.
    pub async fn call(&self, arguments: serde_json::Value) -> Result<String, AdapterError> {
        self.schema.validate(&arguments)?;
        debug!(tool = %self.name, args = %arguments, "executing MCP tool");

        let result = match self.connector.call_tool(&self.name, arguments).await {
            Ok(result) => result,
            Err(e) if self.handle_tool_error => {
                return Ok(format!("Error executing tool: {}", e));
            }
            Err(e) => return Err(e.into()),
        };

        match decode_tool_result(&result) {
            Ok(text) => Ok(text),
            Err(e) => Ok(format!(
                "Error parsing result: {}; raw content: {:?}",
                e, result.content
            )),
        }
    }
}

impl std::fmt::Debug for ToolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAdapter")
            .field("name", &self.name)
            .field("handle_tool_error", &self.handle_tool_error)
            .finish()
    }
}
