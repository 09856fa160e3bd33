use chrono::{DateTime, Local};
use redis::aio::ConnectionManager;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use helpdesk_common::config::config::ServerConfig;
use helpdesk_common::model::model::{ChatMessage, Role};
use crate::memory::message_history::{connect, MessageHistory, RedisHistory};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryType {
    Buffer,
    /// Last `k` exchanges, i.e. `2k` messages.
    Window(usize),
}

impl MemoryType {
    pub fn parse(memory_type: &str, window_size: usize) -> Self {
        match memory_type.to_lowercase().as_str() {
            "window" => MemoryType::Window(window_size),
            _ => MemoryType::Buffer,
        }
    }

    fn apply(&self, messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
        match self {
            MemoryType::Buffer => messages,
            MemoryType::Window(k) => {
                let start = messages.len().saturating_sub(k * 2);
                messages[start..].to_vec()
            }
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionData {
    pub created_at: DateTime<Local>,
    pub last_updated: DateTime<Local>,
    pub user_info: Map<String, Value>,
    pub device_info: Vec<Value>,
    pub issue_data: Map<String, Value>,
    pub metadata: Map<String, Value>,
}

impl SessionData {
    fn new() -> Self {
        let now = Local::now();
        Self {
            created_at: now,
            last_updated: now,
            user_info: Map::new(),
            device_info: Vec::new(),
            issue_data: Map::new(),
            metadata: Map::new(),
        }
    }
}

/// Context merged into the session data. Absent parts are left untouched.
#[derive(Clone, Debug, Default)]
pub struct SystemContext {
    pub user_info: Option<Map<String, Value>>,
    /// An array replaces the device list, anything else is appended to it.
    pub device_info: Option<Value>,
    pub issue_data: Option<Map<String, Value>>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExportedMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionExport {
    pub session_id: String,
    pub created_at: DateTime<Local>,
    pub last_updated: DateTime<Local>,
    pub user_info: Map<String, Value>,
    pub device_info: Vec<Value>,
    pub issue_data: Map<String, Value>,
    pub metadata: Map<String, Value>,
    pub messages: Vec<ExportedMessage>,
}

/// Chat history plus the structured context gathered during a session.
#[derive(Clone, Debug)]
pub struct SessionMemory {
    session_id: String,
    memory_type: MemoryType,
    history: MessageHistory,
    data: SessionData,
}

impl SessionMemory {

    pub fn new(session_id: &str, memory_type: MemoryType, history: MessageHistory) -> Self {
        Self { session_id: session_id.to_string(), memory_type, history, data: SessionData::new() }
    }

    pub fn in_process(session_id: &str, memory_type: MemoryType) -> Self {
        Self::new(session_id, memory_type, MessageHistory::in_process())
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub async fn add_user_message(&mut self, message: &str) {
        self.history.push(ChatMessage::user(message)).await;
        self.data.last_updated = Local::now();
    }

    pub async fn add_ai_message(&mut self, message: &str) {
        self.history.push(ChatMessage::assistant(message)).await;
        self.data.last_updated = Local::now();
    }

    /// History as seen by the model: all of it, or the configured window.
    pub async fn messages(&mut self) -> Vec<ChatMessage> {
        let messages = self.history.messages().await;
        self.memory_type.apply(messages)
    }

    pub async fn clear(&mut self) {
        self.history.clear().await;
        info!("Cleared memory for session {}", self.session_id);
    }

    pub fn add_system_context(&mut self, context: SystemContext) {
        if let Some(user_info) = context.user_info {
            self.data.user_info.extend(user_info);
        }
        match context.device_info {
            Some(Value::Array(devices)) => self.data.device_info = devices,
            Some(device) => self.data.device_info.push(device),
            None => {}
        }
        if let Some(issue_data) = context.issue_data {
            self.data.issue_data.extend(issue_data);
        }
        if let Some(metadata) = context.metadata {
            self.data.metadata.extend(metadata);
        }
        self.data.last_updated = Local::now();
    }

    pub fn set_issue_field(&mut self, key: &str, value: Value) {
        self.data.issue_data.insert(key.to_string(), value);
        self.data.last_updated = Local::now();
    }

    /// `User:` / `Assistant:` lines for the remembered history.
    pub async fn conversation_summary(&mut self) -> String {
        self.messages().await.iter()
            .map(|m| format!("{}: {}\n", m.role.label(), m.content))
            .collect()
    }

    pub async fn export_session_data(&mut self) -> SessionExport {
        let messages = self.history.messages().await.into_iter()
            .map(|m| ExportedMessage { role: m.role, content: m.content, timestamp: m.timestamp })
            .collect();
        SessionExport {
            session_id: self.session_id.clone(),
            created_at: self.data.created_at,
            last_updated: Local::now(),
            user_info: self.data.user_info.clone(),
            device_info: self.data.device_info.clone(),
            issue_data: self.data.issue_data.clone(),
            metadata: self.data.metadata.clone(),
            messages,
        }
    }
}

/// Creates the memory for each new session from configuration.
#[derive(Clone)]
pub struct MemoryFactory {
    memory_type: MemoryType,
    redis: Option<(ConnectionManager, Option<u64>)>,
}

impl MemoryFactory {

    pub fn in_process(memory_type: MemoryType) -> Self {
        Self { memory_type, redis: None }
    }

    /// Connects to Redis when persistence is `redis`; an unreachable server
    /// leaves every session on in-process history.
    pub async fn from_config(config: &ServerConfig) -> Self {
        let memory_type = MemoryType::parse(&config.memory.memory_type, config.memory.window_size);
        if config.memory.persistence.to_lowercase() != "redis" {
            return Self::in_process(memory_type);
        }

        let Some(redis_config) = config.redis.as_ref() else {
            warn!("Memory persistence is redis but no redis section is configured");
            return Self::in_process(memory_type);
        };
        match connect(redis_config).await {
            Ok(connection) => Self { memory_type, redis: Some((connection, redis_config.ttl_secs)) },
            Err(e) => {
                warn!("Failed to initialize Redis chat history, falling back to in-process: {}", e);
                Self::in_process(memory_type)
            }
        }
    }

    pub fn create(&self, session_id: &str) -> SessionMemory {
        let history = match &self.redis {
            Some((connection, ttl)) => MessageHistory::Redis(RedisHistory::new(connection.clone(), session_id, *ttl)),
            None => MessageHistory::in_process(),
        };
        SessionMemory::new(session_id, self.memory_type, history)
    }
}
