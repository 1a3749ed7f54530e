//! Shared test doubles for integration tests.
//!
//! Provides an in-memory connector with canned tools and results, and a
//! scripted language model, so the agent loop can be exercised without
//! spawning processes or talking to a real backend.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use mcp_bridge::connector::{Connector, ConnectorError};
use mcp_bridge::mcp::types::{
    CallToolResult, Content, ServerCapabilities, TextContent, Tool, ToolsCapability,
};
use mcp_bridge::model::{LanguageModel, ModelError, ModelStep, StepRequest, ToolCall};

/// Initialize tracing once for the test binary. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Build a text-only tool result.
pub fn text_result(text: &str) -> CallToolResult {
    CallToolResult {
        content: vec![Content::Text(TextContent {
            text: text.to_string(),
        })],
        is_error: None,
        structured_content: None,
    }
}

/// An in-memory connector with canned tools and per-tool results.
pub struct MockConnector {
    tools: Vec<Tool>,
    results: Mutex<HashMap<String, CallToolResult>>,
    should_fail_calls: Mutex<Option<String>>,
    call_log: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockConnector {
    /// Create an empty mock connector.
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            results: Mutex::new(HashMap::new()),
            should_fail_calls: Mutex::new(None),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock connector with sample tools.
    pub fn with_sample_tools() -> Self {
        let mut connector = Self::new();
        connector.tools = vec![
            Tool {
                name: "echo".to_string(),
                description: Some("Echo the input text".to_string()),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "text": { "type": "string" }
                    },
                    "required": ["text"]
                }),
                output_schema: None,
                annotations: None,
            },
            Tool {
                name: "add".to_string(),
                description: Some("Add two numbers".to_string()),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "a": { "type": "number" },
                        "b": { "type": "number" }
                    },
                    "required": ["a", "b"]
                }),
                output_schema: None,
                annotations: None,
            },
        ];
        connector
    }

    /// Canned result returned for calls to `tool`.
    pub fn set_result(&self, tool: &str, result: CallToolResult) {
        self.results
            .lock()
            .unwrap()
            .insert(tool.to_string(), result);
    }

    /// Make every tool call fail with the given message.
    pub fn fail_calls_with(&self, message: &str) {
        *self.should_fail_calls.lock().unwrap() = Some(message.to_string());
    }

    /// Every `(tool, arguments)` pair seen so far, in call order.
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.call_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn initialize(&self) -> Result<ServerCapabilities, ConnectorError> {
        Ok(ServerCapabilities {
            tools: Some(ToolsCapability::default()),
            ..Default::default()
        })
    }

    async fn list_tools(&self) -> Result<Vec<Tool>, ConnectorError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ConnectorError> {
        self.call_log
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));

        if let Some(message) = self.should_fail_calls.lock().unwrap().clone() {
            return Err(ConnectorError::Rpc {
                code: -32000,
                message,
            });
        }

        if let Some(result) = self.results.lock().unwrap().get(name) {
            return Ok(result.clone());
        }
        Ok(text_result(&format!("{}: {}", name, arguments)))
    }

    async fn close(&self) -> Result<(), ConnectorError> {
        Ok(())
    }
}

/// A language model that replays a fixed script of steps.
pub struct ScriptedModel {
    script: Mutex<VecDeque<ModelStep>>,
    /// Step returned once the script runs out.
    fallback: Option<ModelStep>,
    requests: Mutex<Vec<StepRequest>>,
}

impl ScriptedModel {
    /// Replay `steps` in order, then fail.
    pub fn new(steps: Vec<ModelStep>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that requests the same tool call on every step.
    pub fn always_calling(call: ToolCall) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(ModelStep::ToolCalls(vec![call])),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request the agent sent, in order.
    pub fn requests(&self) -> Vec<StepRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn step(&self, request: StepRequest) -> Result<ModelStep, ModelError> {
        self.requests.lock().unwrap().push(request);
        if let Some(step) = self.script.lock().unwrap().pop_front() {
            return Ok(step);
        }
        match &self.fallback {
            Some(step) => Ok(step.clone()),
            None => Err(ModelError::InvalidResponse(
                "scripted model ran out of steps".to_string(),
            )),
        }
    }
}
