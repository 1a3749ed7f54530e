//! MCP tool bridge for LLM agents.
//!
//! This crate connects Model Context Protocol (MCP) servers to a
//! tool-calling language model. It handles:
//! - Connector setup (stdio child processes and HTTP endpoints)
//! - The initialize handshake and tool discovery
//! - Schema normalization and argument validation
//! - Tool result decoding into model-readable text
//! - A bounded agent loop that executes the model's tool calls
//!
//! # Architecture
//!
//! The crate follows a layered architecture:
//! - `mcp`: Wire types for JSON-RPC and the MCP protocol
//! - `connector`: Transport implementations behind the `Connector` trait
//! - `config`: Server configuration loading and connector construction
//! - `schema`: JSON Schema normalization and validation
//! - `model`: Language model abstraction (`LanguageModel` trait)
//! - `agent`: Tool adapters, result decoding, and the agent loop

pub mod agent;
pub mod config;
pub mod connector;
pub mod mcp;
pub mod model;
pub mod schema;

pub use agent::{
    AdapterError, AgentError, McpAgent, PromptTemplate, ToolAdapter, ToolExecutionError,
    DEFAULT_MAX_STEPS, DEFAULT_SYSTEM_PROMPT,
};
pub use config::{ConfigError, McpConfig, ServerConfig, ServerKind};
pub use connector::{Connector, ConnectorError, HttpConnector, StdioConnector};
pub use mcp::{CallToolResult, Content, Tool};
pub use model::{
    ChatMessage, LanguageModel, ModelError, ModelStep, Role, StepRequest, ToolCall,
    ToolDescriptor,
};
pub use schema::{normalize_schema, ParameterSchema, SchemaError};
