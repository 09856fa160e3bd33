use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category an incoming support request is routed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
    strum_macros::AsRefStr, strum_macros::Display, strum_macros::EnumString)]
pub enum IssueType {
    Hardware,
    Software,
    Password,
    General,
}

impl IssueType {
    pub fn is_specialized(&self) -> bool {
        !matches!(self, IssueType::General)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Spanish,
    French,
    German,
}

impl Language {

    /// Accepts names (`"Spanish"`) and ISO codes (`"es"`, `"es-MX"`).
    pub fn parse(value: &str) -> Option<Language> {
        let value = value.trim().to_ascii_lowercase();
        let primary = value.split(['-', '_']).next().unwrap_or("");
        match (value.as_str(), primary) {
            ("english", _) | (_, "en") => Some(Language::English),
            ("spanish", _) | ("español", _) | (_, "es") => Some(Language::Spanish),
            ("french", _) | ("français", _) | (_, "fr") => Some(Language::French),
            ("german", _) | ("deutsch", _) | (_, "de") => Some(Language::German),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::AsRefStr)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), timestamp: Local::now() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Employee record as served by the directory service. Unknown fields are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(deserialize_with = "id_as_string")]
    pub employee_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Employee {
    pub fn first_name(&self) -> Option<&str> {
        self.name.split_whitespace().next()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(deserialize_with = "id_as_string")]
    pub device_id: String,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub os_type: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default, deserialize_with = "optional_id_as_string")]
    pub employee_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Device {
    pub fn summary(&self) -> String {
        format!(
            "{} - {} {}",
            self.device_name.as_deref().unwrap_or("Unknown Device"),
            self.os_type.as_deref().unwrap_or("Unknown OS"),
            self.os_version.as_deref().unwrap_or("")
        ).trim_end().to_string()
    }
}

/// Human support agent known to the directory service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportAgentRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub agent_id: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(default)]
    pub status: String,
}

impl SupportAgentRecord {
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationLogEntry {
    #[serde(skip_serializing)]
    pub conversation_id: String,
    pub user_id: String,
    pub agent_id: String,
    pub message_text: String,
    pub message_type: String,
    pub issue_status: String,
}

impl ConversationLogEntry {
    pub const USER_INPUT: &'static str = "User input";
    pub const AI_RESPONSE: &'static str = "AI response";
    pub const IN_PROGRESS: &'static str = "In Progress";

    pub fn new(conversation_id: &str, user_id: &str, agent_id: &str, message: &ChatMessage) -> Self {
        let message_type = match message.role {
            Role::User => Self::USER_INPUT,
            _ => Self::AI_RESPONSE,
        };
        Self {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            agent_id: agent_id.to_string(),
            message_text: message.content.clone(),
            message_type: message_type.to_string(),
            issue_status: Self::IN_PROGRESS.to_string(),
        }
    }
}

// The directory service is not consistent about numeric vs string ids.
fn id_as_string<'de, D>(deserializer: D) -> core::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

fn optional_id_as_string<'de, D>(deserializer: D) -> core::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}
