use std::fs;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::{ConversationLogEntry, Device, Employee, SupportAgentRecord};
use crate::directory::directory::{match_email, match_phone, pick_agent, ContactKind, Directory};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub agents: Vec<SupportAgentRecord>,
}

/// Directory held in process memory, for offline runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    seed: DirectorySeed,
    log: Mutex<Vec<ConversationLogEntry>>,
}

impl InMemoryDirectory {

    pub fn new(seed: DirectorySeed) -> Self {
        Self { seed, log: Mutex::new(Vec::new()) }
    }

    pub fn from_json(source: &str) -> Result<Self> {
        let seed: DirectorySeed = serde_json::from_str(source)
            .map_err(|e| Error::DirectorySeed { cause: e.to_string() })?;
        Ok(Self::new(seed))
    }

    pub fn from_seed_file(path: &str) -> Result<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::DirectorySeed { cause: format!("{}: {}", path, e) })?;
        let directory = Self::from_json(&source)?;
        info!(
            "Loaded directory seed from {} ({} employees, {} devices, {} agents)",
            path, directory.seed.employees.len(), directory.seed.devices.len(), directory.seed.agents.len()
        );
        Ok(directory)
    }

    /// Entries written through `log_conversation`, oldest first.
    pub async fn logged(&self) -> Vec<ConversationLogEntry> {
        self.log.lock().await.clone()
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {

    async fn find_employee_by_contact(&self, kind: ContactKind, value: &str) -> Result<Option<Employee>> {
        let employees = &self.seed.employees;
        let found = match kind {
            ContactKind::Email => match_email(employees, value),
            ContactKind::Phone => match_phone(employees, value),
            ContactKind::Id => employees.iter().find(|e| e.employee_id == value.trim()),
        };
        Ok(found.cloned())
    }

    async fn get_employee_devices(&self, employee_id: &str) -> Result<Vec<Device>> {
        Ok(self.seed.devices.iter()
            .filter(|d| d.employee_id.as_deref() == Some(employee_id))
            .cloned()
            .collect())
    }

    async fn find_agent_by_specialization(&self, specialization: &str) -> Result<Option<SupportAgentRecord>> {
        Ok(pick_agent(&self.seed.agents, specialization).cloned())
    }

    async fn log_conversation(&self, entry: &ConversationLogEntry) -> Result<bool> {
        self.log.lock().await.push(entry.clone());
        Ok(true)
    }
}
