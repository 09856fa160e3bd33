use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Local};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use helpdesk_common::model::model::Language;
use crate::memory::session_memory::MemoryFactory;
use crate::session::session::Session;

pub type SharedSession = Arc<Mutex<Session>>;

/// Live sessions. A turn holds its session's mutex, so turns of one session
/// run one after another while different sessions proceed in parallel.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SharedSession>>,
    memory: MemoryFactory,
    default_language: Language,
    idle_timeout: Duration,
}

impl SessionManager {

    pub fn new(memory: MemoryFactory, default_language: Language, idle_timeout: Duration) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), memory, default_language, idle_timeout }
    }

    pub async fn get_or_create(&self, session_id: &str) -> SharedSession {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.to_string())
            .or_insert_with(|| {
                info!("Created session {}", session_id);
                let memory = self.memory.create(session_id);
                Arc::new(Mutex::new(Session::new(session_id, self.default_language, memory)))
            })
            .clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!("Session {} ended", session_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drops sessions untouched since `cutoff`. Sessions busy with a turn are kept.
    pub async fn evict_idle_before(&self, cutoff: DateTime<Local>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(session) if session.last_updated < cutoff => {
                debug!("Evicting idle session {}", id);
                false
            }
            _ => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    pub async fn evict_idle(&self) -> usize {
        let idle = chrono::Duration::from_std(self.idle_timeout).unwrap_or(chrono::Duration::hours(1));
        self.evict_idle_before(Local::now() - idle).await
    }

    /// Periodically evicts idle sessions until the manager is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                match manager.upgrade() {
                    Some(manager) => {
                        manager.evict_idle().await;
                    }
                    None => break,
                }
            }
        })
    }
}
