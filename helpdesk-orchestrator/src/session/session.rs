use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;
use helpdesk_common::model::model::{ChatMessage, ConversationLogEntry, Device, Employee, IssueType, Language};
use crate::memory::session_memory::SessionMemory;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Telephony,
    Chat,
    Teams,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub telephony: bool,
    pub chat: bool,
    pub teams: bool,
}

/// Per-conversation state, keyed by the channel's session id.
#[derive(Clone, Debug)]
pub struct Session {
    pub session_id: String,
    pub conversation_id: String,
    pub customer_number: Option<String>,
    pub customer_email: Option<String>,
    pub employee_id: Option<String>,
    /// Directory id of the human support agent the conversation is logged against.
    pub agent_id: Option<String>,
    pub employee_info: Option<Employee>,
    pub devices: Vec<Device>,
    pub messages: Vec<ChatMessage>,
    pub channel_status: ChannelStatus,
    pub issue_type: Option<IssueType>,
    pub language: Language,
    pub greeted: bool,
    pub created_at: DateTime<Local>,
    pub last_updated: DateTime<Local>,
    pub call_data: Map<String, Value>,
    pub memory: SessionMemory,
}

impl Session {

    pub fn new(session_id: &str, language: Language, memory: SessionMemory) -> Self {
        let now = Local::now();
        Self {
            session_id: session_id.to_string(),
            conversation_id: Uuid::new_v4().to_string(),
            customer_number: None,
            customer_email: None,
            employee_id: None,
            agent_id: None,
            employee_info: None,
            devices: Vec::new(),
            messages: Vec::new(),
            channel_status: ChannelStatus::default(),
            issue_type: None,
            language,
            greeted: false,
            created_at: now,
            last_updated: now,
            call_data: Map::new(),
            memory,
        }
    }

    pub fn touch(&mut self) {
        self.last_updated = Local::now();
    }

    /// Records a message. Returns the directory log entry when both the
    /// employee and the support agent are known.
    pub fn add_message(&mut self, message: ChatMessage) -> Option<ConversationLogEntry> {
        let entry = match (&self.employee_id, &self.agent_id) {
            (Some(employee_id), Some(agent_id)) => {
                Some(ConversationLogEntry::new(&self.conversation_id, employee_id, agent_id, &message))
            }
            _ => None,
        };
        self.messages.push(message);
        self.touch();
        entry
    }

    pub fn update_channel_status(&mut self, channel: Channel, active: bool) {
        match channel {
            Channel::Telephony => self.channel_status.telephony = active,
            Channel::Chat => self.channel_status.chat = active,
            Channel::Teams => self.channel_status.teams = active,
        }
        self.touch();
    }

    pub fn update_call_data(&mut self, call_data: Map<String, Value>) {
        self.call_data.extend(call_data);
        self.touch();
    }

    pub fn set_employee(&mut self, employee: Employee, devices: Vec<Device>) {
        self.employee_id = Some(employee.employee_id.clone());
        self.employee_info = Some(employee);
        self.devices = devices;
        self.touch();
    }
}
