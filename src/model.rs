//! Language model abstraction.
//!
//! The agent drives any backend through [`LanguageModel`]: it hands the
//! model the conversation so far plus the tool descriptors, and the model
//! answers with either tool calls to execute or a final reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors raised by a language model backend.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The request could not be sent.
    #[error("model request failed: {0}")]
    Request(String),

    /// The backend answered with an API-level error.
    #[error("model API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response could not be parsed into a step.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// A tool result fed back to the model.
    Tool,
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// For tool results, the id of the call this answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// An assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_call_id: None,
        }
    }

    /// A tool result message answering the given call.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A tool surface presented to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name the model must use to call it.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON Schema of the tool's arguments.
    pub parameters: serde_json::Value,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier the backend assigned to this call.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments for the tool.
    pub arguments: serde_json::Value,
}

/// One request to the model: conversation plus available tools.
#[derive(Debug, Clone)]
pub struct StepRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Tools the model may call this step.
    pub tools: Vec<ToolDescriptor>,
}

/// What the model decided to do this step.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelStep {
    /// Execute these tool calls and report back.
    ToolCalls(Vec<ToolCall>),
    /// The final answer; the loop ends here.
    Final(String),
}

/// A chat model capable of tool calling.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Run one inference step over the conversation.
    async fn step(&self, request: StepRequest) -> Result<ModelStep, ModelError>;
}
