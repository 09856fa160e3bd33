use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use helpdesk_agent::agent::classifier::contains_any_word;
use helpdesk_orchestrator::orchestrator::orchestrator::IncomingMessage;
use helpdesk_orchestrator::session::session::Channel;

const END_CALL_WORDS: &[&str] = &["end", "bye", "goodbye", "quit"];

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Payload posted by the voice platform, OpenAI chat-completions shaped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TelephonyRequest {
    #[serde(default)]
    pub call: Option<Map<String, Value>>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<RequestMessage>>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Payload posted by the Teams connector. Field names vary between connector versions.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TeamsRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<Value>>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub from: Option<Value>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

impl TelephonyRequest {

    pub fn session_id(&self) -> String {
        self.call.as_ref()
            .and_then(|call| call.get("id"))
            .and_then(value_as_string)
            .or_else(|| non_empty(&self.session_id))
            .unwrap_or_else(new_session_id)
    }

    pub fn phone(&self) -> Option<String> {
        self.call.as_ref()
            .and_then(|call| call.get("customer"))
            .and_then(|customer| customer.get("number"))
            .and_then(value_as_string)
            .or_else(|| non_empty(&self.phone))
    }

    /// `message`, else the first user entry of `messages` with content.
    pub fn user_message(&self) -> String {
        non_empty(&self.message)
            .or_else(|| {
                self.messages.iter().flatten()
                    .filter(|m| m.role == "user")
                    .find_map(|m| non_empty(&m.content))
            })
            .unwrap_or_default()
    }

    pub fn incoming(&self, session_id: &str) -> IncomingMessage {
        IncomingMessage {
            phone: self.phone(),
            language: non_empty(&self.language),
            ..IncomingMessage::new(session_id, &self.user_message(), Channel::Telephony)
        }
    }
}

impl TeamsRequest {

    pub fn session_id(&self) -> String {
        non_empty(&self.session_id).unwrap_or_else(new_session_id)
    }

    pub fn user_message(&self) -> String {
        non_empty(&self.message)
            .or_else(|| non_empty(&self.text))
            .or_else(|| non_empty(&self.content))
            .or_else(|| {
                self.messages.iter().flatten()
                    .filter_map(|m| m.get("content"))
                    .find_map(value_as_string)
            })
            .unwrap_or_default()
    }

    pub fn email(&self) -> Option<String> {
        non_empty(&self.email).or_else(|| {
            self.from.as_ref()
                .and_then(|from| from.get("email"))
                .and_then(value_as_string)
        })
    }

    /// The connector expects a message object rather than an event stream.
    pub fn is_teams_channel(&self) -> bool {
        self.channel.as_deref() == Some("teams")
    }

    pub fn incoming(&self, session_id: &str) -> IncomingMessage {
        IncomingMessage {
            email: self.email(),
            phone: non_empty(&self.phone),
            language: non_empty(&self.language),
            ..IncomingMessage::new(session_id, &self.user_message(), Channel::Teams)
        }
    }
}

/// The caller asked to hang up.
pub fn ends_call(message: &str) -> bool {
    contains_any_word(message, END_CALL_WORDS)
}
