use serde::{Deserialize, Serialize};
use helpdesk_common::model::model::{ChatMessage, Role};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        Self { role: message.role, content: message.content.clone() }
    }
}

/// A chat completion request, independent of the gateway it is sent to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub messages: Vec<PromptMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

impl Prompt {
    pub fn new_simple(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self { system: system.into(), messages: vec![PromptMessage::user(user)], stop: Vec::new() }
    }

    pub fn new_messages(system: impl Into<String>, messages: Vec<PromptMessage>) -> Self {
        Self { system: system.into(), messages, stop: Vec::new() }
    }

    pub fn with_stop(mut self, stop: &str) -> Self {
        self.stop.push(stop.to_string());
        self
    }

    /// Content of the last user message, if any.
    pub fn last_user(&self) -> Option<&str> {
        self.messages.iter().rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}
