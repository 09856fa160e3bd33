use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};
use helpdesk_common::config::config::RedisConfig;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::ChatMessage;

/// `redis://host:port/db` as given, or a bare host expanded to one.
pub fn redis_url(config: &RedisConfig) -> String {
    if config.host.contains("://") {
        config.host.clone()
    } else {
        format!("redis://{}/0", config.host)
    }
}

/// Opens the shared Redis connection used for every session's history.
pub async fn connect(config: &RedisConfig) -> Result<ConnectionManager> {
    let url = redis_url(config);
    let client = redis::Client::open(url.as_str()).map_err(|e| Error::MemoryStore { cause: e.to_string() })?;
    let manager = ConnectionManager::new(client).await.map_err(|e| Error::MemoryStore { cause: e.to_string() })?;
    info!("Connected to Redis at {}", url);
    Ok(manager)
}

/// Messages stored as JSON in the list `message_store:{session_id}`, newest first.
///
/// Every message is mirrored in process; reads fall back to the mirror when
/// Redis cannot be reached.
#[derive(Clone)]
pub struct RedisHistory {
    connection: ConnectionManager,
    key: String,
    ttl_secs: Option<u64>,
    mirror: Vec<ChatMessage>,
}

impl std::fmt::Debug for RedisHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHistory")
            .field("key", &self.key)
            .field("ttl_secs", &self.ttl_secs)
            .field("mirror", &self.mirror.len())
            .finish()
    }
}

impl RedisHistory {

    pub fn new(connection: ConnectionManager, session_id: &str, ttl_secs: Option<u64>) -> Self {
        Self { connection, key: format!("message_store:{}", session_id), ttl_secs, mirror: Vec::new() }
    }

    async fn push_remote(&mut self, message: &ChatMessage) -> Result<()> {
        let json = serde_json::to_string(message).map_err(|e| Error::MemoryStore { cause: e.to_string() })?;
        self.connection.lpush::<_, _, ()>(&self.key, json).await
            .map_err(|e| Error::MemoryStore { cause: e.to_string() })?;
        if let Some(ttl) = self.ttl_secs {
            self.connection.expire::<_, ()>(&self.key, ttl as i64).await
                .map_err(|e| Error::MemoryStore { cause: e.to_string() })?;
        }
        Ok(())
    }

    async fn read_remote(&mut self) -> Result<Vec<ChatMessage>> {
        let items: Vec<String> = self.connection.lrange(&self.key, 0, -1).await
            .map_err(|e| Error::MemoryStore { cause: e.to_string() })?;
        items.iter().rev()
            .map(|item| serde_json::from_str(item).map_err(|e| Error::MemoryStore { cause: e.to_string() }))
            .collect()
    }

    async fn clear_remote(&mut self) -> Result<()> {
        self.connection.del::<_, ()>(&self.key).await
            .map_err(|e| Error::MemoryStore { cause: e.to_string() })
    }
}

#[derive(Clone, Debug)]
pub enum MessageHistory {
    InProcess(Vec<ChatMessage>),
    Redis(RedisHistory),
}

impl MessageHistory {

    pub fn in_process() -> Self {
        MessageHistory::InProcess(Vec::new())
    }

    pub async fn push(&mut self, message: ChatMessage) {
        match self {
            MessageHistory::InProcess(messages) => messages.push(message),
            MessageHistory::Redis(history) => {
                if let Err(e) = history.push_remote(&message).await {
                    warn!("Could not store message in {}: {}", history.key, e);
                }
                history.mirror.push(message);
            }
        }
    }

    /// All messages, oldest first.
    pub async fn messages(&mut self) -> Vec<ChatMessage> {
        match self {
            MessageHistory::InProcess(messages) => messages.clone(),
            MessageHistory::Redis(history) => match history.read_remote().await {
                Ok(messages) if messages.len() >= history.mirror.len() => messages,
                Ok(_) => history.mirror.clone(),
                Err(e) => {
                    warn!("Could not read {}, using in-process history: {}", history.key, e);
                    history.mirror.clone()
                }
            },
        }
    }

    pub async fn clear(&mut self) {
        match self {
            MessageHistory::InProcess(messages) => messages.clear(),
            MessageHistory::Redis(history) => {
                if let Err(e) = history.clear_remote().await {
                    warn!("Could not clear {}: {}", history.key, e);
                }
                history.mirror.clear();
            }
        }
    }
}
