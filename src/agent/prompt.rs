//! Prompt assembly.
//!
//! The loop rebuilds the model request on every step from three parts:
//! the system prompt, the prior conversation, and the scratch trace of
//! tool calls made so far in the current turn.

use crate::model::{ChatMessage, StepRequest, ToolDescriptor};

/// Default instructions for the agent.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that can use tools to help users.";

/// Builds [`StepRequest`]s from conversation state.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Use custom system instructions instead of the default.
    pub fn with_system(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    /// The system prompt in use.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Assemble the request for one model step.
    ///
    /// Order: system, prior history, the current query, then the scratch
    /// trace of this turn's tool activity.
    pub fn build(
        &self,
        history: &[ChatMessage],
        query: &str,
        scratch: &[ChatMessage],
        tools: Vec<ToolDescriptor>,
    ) -> StepRequest {
        let mut messages = Vec::with_capacity(history.len() + scratch.len() + 2);
        messages.push(ChatMessage::system(&self.system));
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(query));
        messages.extend_from_slice(scratch);
        StepRequest { messages, tools }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_messages_in_order() {
        let template = PromptTemplate::default();
        let history = vec![
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
        ];
        let scratch = vec![ChatMessage::tool("call-1", "tool output")];

        let request = template.build(&history, "current question", &scratch, vec![]);

        let roles: Vec<Role> = request.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Tool]
        );
        assert_eq!(request.messages[0].content, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(request.messages[3].content, "current question");
    }

    #[test]
    fn custom_system_prompt_replaces_default() {
        let template = PromptTemplate::with_system("Answer in French.");
        let request = template.build(&[], "bonjour", &[], vec![]);
        assert_eq!(request.messages[0].content, "Answer in French.");
    }
}
