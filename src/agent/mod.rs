//! Tool-calling agent loop.
//!
//! [`McpAgent`] ties the pieces together: it initializes a connector,
//! wraps every listed tool in a [`ToolAdapter`], and drives a bounded
//! model/tool loop until the model produces a final answer or the step
//! limit runs out.

pub mod adapter;
pub mod decoder;
pub mod prompt;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::connector::{Connector, ConnectorError};
use crate::model::{ChatMessage, LanguageModel, ModelError, ModelStep, ToolCall};

pub use adapter::{AdapterError, ToolAdapter};
pub use decoder::{decode_tool_result, ToolExecutionError};
pub use prompt::{PromptTemplate, DEFAULT_SYSTEM_PROMPT};

/// Step limit used when the caller never supplies one.
pub const DEFAULT_MAX_STEPS: usize = 5;

/// Errors raised by the agent.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// `run` was called before `initialize`.
    #[error("MCP client is not initialized")]
    NotInitialized,

    /// The connector failed during setup or teardown.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The language model failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// An agent that answers queries using tools from one MCP server.
pub struct McpAgent {
    connector: Arc<dyn Connector>,
    model: Arc<dyn LanguageModel>,
    template: PromptTemplate,
    adapters: Vec<ToolAdapter>,
    initialized: bool,
    max_steps: usize,
}

impl McpAgent {
    /// Create an agent over a connector and a model. Call
    /// [`initialize`](Self::initialize) before [`run`](Self::run).
    pub fn new(connector: Arc<dyn Connector>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            connector,
            model,
            template: PromptTemplate::default(),
            adapters: Vec::new(),
            initialized: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Replace the default prompt template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Set the initial step limit.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Step limit currently in effect.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Names of the tools available to the model.
    pub fn tool_names(&self) -> Vec<&str> {
        self.adapters.iter().map(ToolAdapter::name).collect()
    }

    /// Perform the server handshake and build adapters for every tool the
    /// server lists. Tools are fetched once; later server-side changes are
    /// not observed.
    pub async fn initialize(&mut self) -> Result<(), AgentError> {
        self.connector.initialize().await?;
        self.adapters = ToolAdapter::from_connector(Arc::clone(&self.connector)).await?;
        self.initialized = true;
        info!(tools = self.adapters.len(), "agent initialized");
        Ok(())
    }

    /// Answer a query, invoking tools as the model requests them.
    ///
    /// A `max_steps` override replaces the agent's step limit for this run
    /// and every run after it. `chat_history` is prepended to the prompt as
    /// prior turns.
    pub async fn run(
        &mut self,
        query: &str,
        max_steps: Option<usize>,
        chat_history: Option<Vec<ChatMessage>>,
    ) -> Result<String, AgentError> {
        if !self.initialized {
            return Err(AgentError::NotInitialized);
        }
        if let Some(limit) = max_steps {
            self.max_steps = limit;
        }

        let history = chat_history.unwrap_or_default();
        let mut scratch: Vec<ChatMessage> = Vec::new();

        for step in 0..self.max_steps {
            debug!(step, limit = self.max_steps, "agent step");
            let descriptors = self.adapters.iter().map(ToolAdapter::descriptor).collect();
            let request = self.template.build(&history, query, &scratch, descriptors);

            match self.model.step(request).await? {
                ModelStep::Final(answer) => {
                    debug!(step, "agent finished");
                    return Ok(answer);
                }
                ModelStep::ToolCalls(calls) => {
                    for call in calls {
                        let output = self.execute_call(&call).await;
                        scratch.push(ChatMessage::assistant(format!(
                            "Calling tool '{}' with arguments {}",
                            call.name, call.arguments
                        )));
                        scratch.push(ChatMessage::tool(call.id, output));
                    }
                }
            }
        }

        warn!(limit = self.max_steps, "agent hit the step limit");
        Ok(format!(
            "Agent stopped after reaching the maximum number of steps ({}).",
            self.max_steps
        ))
    }

    /// Run one tool call, folding every failure into the string the model
    /// sees so the loop can continue.
    async fn execute_call(&self, call: &ToolCall) -> String {
        let Some(adapter) = self.adapters.iter().find(|a| a.name() == call.name) else {
            warn!(tool = %call.name, "model requested an unknown tool");
            return format!("Error: no tool named '{}'", call.name);
        };
        match adapter.call(call.arguments.clone()).await {
            Ok(output) => output,
            Err(e) => format!("Error: {}", e),
        }
    }

    /// Shut the connector down and drop the adapters.
    pub async fn close(&mut self) -> Result<(), AgentError> {
        self.adapters.clear();
        self.initialized = false;
        self.connector.close().await?;
        Ok(())
    }
}
