use std::sync::Arc;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;
use helpdesk_common::model::model::{ConversationLogEntry, Employee};
use crate::directory::directory::{ContactKind, Directory};
use crate::tool::tool::Tool;

pub fn directory_tools(directory: Arc<dyn Directory>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(FindEmployeeTool::new(directory.clone(), ContactKind::Email)),
        Arc::new(FindEmployeeTool::new(directory.clone(), ContactKind::Phone)),
        Arc::new(EmployeeDevicesTool::new(directory.clone())),
        Arc::new(FindAgentTool { directory: directory.clone() }),
        Arc::new(LogConversationTool { directory }),
    ]
}

fn describe_employee(employee: &Employee) -> String {
    format!(
        "Employee {} (ID: {})\nEmail: {}\nPhone: {}\nDepartment: {}\nRole: {}",
        employee.name,
        employee.employee_id,
        employee.email.as_deref().unwrap_or("unknown"),
        employee.phone.as_deref().unwrap_or("unknown"),
        employee.department.as_deref().unwrap_or("unknown"),
        employee.role.as_deref().unwrap_or("unknown"),
    )
}

#[derive(Debug)]
pub struct FindEmployeeTool {
    directory: Arc<dyn Directory>,
    kind: ContactKind,
}

impl FindEmployeeTool {
    pub fn new(directory: Arc<dyn Directory>, kind: ContactKind) -> Self {
        Self { directory, kind }
    }
}

#[async_trait]
impl Tool for FindEmployeeTool {
    fn name(&self) -> &str {
        match self.kind {
            ContactKind::Phone => "find_employee_by_phone",
            ContactKind::Id => "find_employee_by_id",
            ContactKind::Email => "find_employee_by_email",
        }
    }

    fn description(&self) -> &str {
        match self.kind {
            ContactKind::Phone => "Find an employee by their phone number. Input should be the phone number.",
            ContactKind::Id => "Find an employee by their employee ID. Input should be the employee ID.",
            ContactKind::Email => "Find an employee by their email address. Input should be the email address.",
        }
    }

    async fn call(&self, input: &str) -> String {
        match self.directory.find_employee_by_contact(self.kind, input.trim()).await {
            Ok(Some(employee)) => describe_employee(&employee),
            Ok(None) => format!("No employee found with {} {}.", self.kind.as_ref(), input.trim()),
            Err(e) => {
                error!("Error finding employee: {}", e);
                format!("Error looking up employee: {}", e.as_ref())
            }
        }
    }
}

#[derive(Debug)]
pub struct EmployeeDevicesTool {
    directory: Arc<dyn Directory>,
}

impl EmployeeDevicesTool {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for EmployeeDevicesTool {
    fn name(&self) -> &str {
        "get_employee_devices"
    }

    fn description(&self) -> &str {
        "Get all devices registered to an employee. Input should be the employee ID."
    }

    async fn call(&self, input: &str) -> String {
        match self.directory.get_employee_devices(input.trim()).await {
            Ok(devices) if devices.is_empty() => String::from("No devices found for this employee."),
            Ok(devices) => {
                let lines: Vec<String> = devices.iter()
                    .enumerate()
                    .map(|(i, d)| format!("{}. {}", i + 1, d.summary()))
                    .collect();
                format!("Employee devices:\n{}", lines.join("\n"))
            }
            Err(e) => {
                error!("Error getting employee devices: {}", e);
                format!("Error retrieving device information: {}", e.as_ref())
            }
        }
    }
}

#[derive(Debug)]
pub struct FindAgentTool {
    directory: Arc<dyn Directory>,
}

#[async_trait]
impl Tool for FindAgentTool {
    fn name(&self) -> &str {
        "find_agent_by_specialization"
    }

    fn description(&self) -> &str {
        "Find a support agent with a specific specialization. Input should be the specialization (e.g., 'Hardware', 'Software', 'Password')."
    }

    async fn call(&self, input: &str) -> String {
        match self.directory.find_agent_by_specialization(input.trim()).await {
            Ok(Some(agent)) => format!(
                "Support agent {} (ID: {}), specialization: {}, status: {}",
                agent.agent_name, agent.agent_id, agent.specialization, agent.status
            ),
            Ok(None) => String::from("No active support agent found."),
            Err(e) => {
                error!("Error finding agent: {}", e);
                format!("Error finding support agent: {}", e.as_ref())
            }
        }
    }
}

#[derive(Deserialize)]
struct LogParams {
    #[serde(default)]
    conversation_id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    agent_id: String,
    #[serde(default)]
    message_text: String,
    #[serde(default)]
    message_type: Option<String>,
    #[serde(default)]
    issue_status: Option<String>,
}

#[derive(Debug)]
pub struct LogConversationTool {
    directory: Arc<dyn Directory>,
}

#[async_trait]
impl Tool for LogConversationTool {
    fn name(&self) -> &str {
        "log_conversation"
    }

    fn description(&self) -> &str {
        "Log a conversation message to the database. Input should be a JSON string with conversation_id, user_id, agent_id, message_text, message_type, and issue_status."
    }

    async fn call(&self, input: &str) -> String {
        let params: LogParams = match serde_json::from_str(input) {
            Ok(params) => params,
            Err(e) => return format!("Error logging conversation: {}", e),
        };
        let required = [&params.conversation_id, &params.user_id, &params.agent_id, &params.message_text];
        if required.iter().any(|v| v.trim().is_empty()) {
            return String::from("Error: Missing required parameters. Need conversation_id, user_id, agent_id, and message_text.");
        }

        let entry = ConversationLogEntry {
            conversation_id: params.conversation_id,
            user_id: params.user_id,
            agent_id: params.agent_id,
            message_text: params.message_text,
            message_type: params.message_type.unwrap_or_else(|| ConversationLogEntry::AI_RESPONSE.to_string()),
            issue_status: params.issue_status.unwrap_or_else(|| ConversationLogEntry::IN_PROGRESS.to_string()),
        };
        match self.directory.log_conversation(&entry).await {
            Ok(true) => String::from("Successfully logged conversation message."),
            Ok(false) => String::from("Failed to log conversation message."),
            Err(e) => {
                error!("Error logging conversation: {}", e);
                format!("Error logging conversation: {}", e.as_ref())
            }
        }
    }
}
