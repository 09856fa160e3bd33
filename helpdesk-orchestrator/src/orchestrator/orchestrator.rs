use std::collections::HashMap;
use std::sync::Arc;
use chrono::{Local, Timelike};
use metrics::counter;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use helpdesk_agent::agent::agent::{AgentContext, SupportAgent};
use helpdesk_agent::agent::agent_factory::AgentFactory;
use helpdesk_agent::agent::classifier::{classify_issue, is_greeting};
use helpdesk_agent::agent::fallback::Fallback;
use helpdesk_agent::llm::llm_factory::LLM;
use helpdesk_common::config::config::Config;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::{ChatMessage, ConversationLogEntry, IssueType, Language};
use helpdesk_prompt::prompt::prompt::PromptCatalog;
use helpdesk_toolbox::directory::directory::{ContactKind, Directory};
use helpdesk_toolbox::knowledge::knowledge::KnowledgeBase;
use crate::chains::conversation::ConversationChain;
use crate::chains::workflow::{DetailedClassification, Plan, ProgressStage, WorkflowChain};
use crate::memory::session_memory::{SessionExport, SystemContext};
use crate::session::session::{Channel, Session};
use crate::session::session_manager::SessionManager;

pub const TECHNICAL_DIFFICULTIES: &str = "I apologize, but I'm experiencing technical difficulties. Please try again later or contact our IT support team directly if your issue is urgent.";

/// One user turn as received from a channel.
#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub session_id: String,
    pub message: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub language: Option<String>,
    pub channel: Channel,
}

impl IncomingMessage {
    pub fn new(session_id: &str, message: &str, channel: Channel) -> Self {
        Self {
            session_id: session_id.to_string(),
            message: message.to_string(),
            email: None,
            phone: None,
            language: None,
            channel,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Recommendation {
    pub issue_type: String,
    pub subcategory: String,
    pub stage: ProgressStage,
    pub actions: String,
}

/// Maps a detailed classification category onto the agent that handles it.
pub fn category_to_issue_type(category: &str) -> IssueType {
    let category = category.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| category.contains(n));
    if has(&["hardware", "device"]) {
        IssueType::Hardware
    } else if has(&["software", "application"]) {
        IssueType::Software
    } else if has(&["password", "access", "account"]) {
        IssueType::Password
    } else {
        IssueType::General
    }
}

fn as_object<T: Serialize>(value: &T) -> Option<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Routes each turn to a specialist agent and keeps the session, memory and
/// directory log in step.
pub struct Orchestrator {
    agents: HashMap<IssueType, Arc<SupportAgent>>,
    default_agent: IssueType,
    sessions: Arc<SessionManager>,
    directory: Arc<dyn Directory>,
    conversation: ConversationChain,
    workflow: WorkflowChain,
    fallback: Fallback,
}

impl Orchestrator {

    pub fn new(
        config: &Config,
        llm: LLM,
        knowledge: Arc<KnowledgeBase>,
        directory: Arc<dyn Directory>,
        catalog: PromptCatalog,
        sessions: Arc<SessionManager>,
    ) -> Self {
        let factory = AgentFactory::new(config.clone(), llm.clone(), knowledge, directory.clone(), catalog.clone());
        let assistant_name = &config.config.assistant.name;
        info!("Helpdesk orchestrator initialized");
        Self {
            agents: factory.create_all(),
            default_agent: factory.default_agent(),
            sessions,
            directory,
            conversation: ConversationChain::new(llm.clone(), catalog.clone(), assistant_name),
            workflow: WorkflowChain::new(llm, catalog),
            fallback: factory.fallback(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Handles one turn from any channel. Always produces a reply.
    pub async fn process_message(&self, incoming: IncomingMessage) -> String {
        let session = self.sessions.get_or_create(&incoming.session_id).await;
        let mut session = session.lock().await;
        match self.handle_message(&mut session, &incoming).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error processing message for session {}: {}", incoming.session_id, e);
                String::from(TECHNICAL_DIFFICULTIES)
            }
        }
    }

    async fn handle_message(&self, session: &mut Session, incoming: &IncomingMessage) -> Result<String> {
        if let Some(email) = incoming.email.as_deref().filter(|e| !e.is_empty()) {
            session.customer_email = Some(email.to_string());
        }
        if let Some(phone) = incoming.phone.as_deref().filter(|p| !p.is_empty()) {
            session.customer_number = Some(phone.to_string());
        }
        if let Some(language) = incoming.language.as_deref() {
            match Language::parse(language) {
                Some(language) => session.language = language,
                None => warn!("Ignoring unsupported language {}", language),
            }
        }
        session.update_channel_status(incoming.channel, true);

        if session.employee_id.is_none() {
            self.identify_employee(session).await;
        }

        let message = incoming.message.trim();
        if message.is_empty() {
            let greeting = self.get_initial_greeting(session).await;
            session.greeted = true;
            self.record(session, ChatMessage::assistant(greeting.clone())).await;
            return Ok(greeting);
        }

        if !session.greeted && is_greeting(message) {
            let greeting = self.get_initial_greeting(session).await;
            session.greeted = true;
            self.record(session, ChatMessage::user(message)).await;
            self.record(session, ChatMessage::assistant(greeting.clone())).await;
            return Ok(greeting);
        }

        self.record(session, ChatMessage::user(message)).await;
        let response = self.process_query(session, message).await?;
        self.record(session, ChatMessage::assistant(response.clone())).await;
        Ok(response)
    }

    /// Looks the caller up by email, then phone, and loads their devices.
    async fn identify_employee(&self, session: &mut Session) {
        let mut lookups = Vec::new();
        if let Some(email) = session.customer_email.clone() {
            lookups.push((ContactKind::Email, email));
        }
        if let Some(phone) = session.customer_number.clone() {
            lookups.push((ContactKind::Phone, phone));
        }

        for (kind, value) in lookups {
            let employee = match self.directory.find_employee_by_contact(kind, &value).await {
                Ok(Some(employee)) => employee,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Employee lookup by {} failed: {}", kind.as_ref(), e);
                    continue;
                }
            };

            let devices = self.directory.get_employee_devices(&employee.employee_id).await.unwrap_or_else(|e| {
                warn!("Could not load devices for {}: {}", employee.employee_id, e);
                Vec::new()
            });
            info!("Identified employee {} by {} with {} device(s)", employee.employee_id, kind.as_ref(), devices.len());

            session.memory.add_system_context(SystemContext {
                user_info: as_object(&employee),
                device_info: serde_json::to_value(&devices).ok(),
                ..Default::default()
            });
            session.set_employee(employee, devices);
            return;
        }
    }

    async fn record(&self, session: &mut Session, message: ChatMessage) {
        if let Some(entry) = session.add_message(message) {
            self.log_to_directory(&entry).await;
        }
    }

    async fn log_to_directory(&self, entry: &ConversationLogEntry) {
        match self.directory.log_conversation(entry).await {
            Ok(true) => debug!("Logged {} to conversation {}", entry.message_type, entry.conversation_id),
            Ok(false) => warn!("Directory rejected log entry for conversation {}", entry.conversation_id),
            Err(e) => warn!("Error logging to directory: {}", e),
        }
    }

    async fn classify(&self, query: &str) -> (IssueType, Option<DetailedClassification>) {
        let issue_type = classify_issue(query);
        if issue_type != IssueType::General {
            return (issue_type, None);
        }
        let detailed = self.workflow.classify_issue_detailed(&format!("User: {}", query)).await;
        (category_to_issue_type(&detailed.category), Some(detailed))
    }

    /// Keyword classification, refined by the model when the keywords are inconclusive.
    pub async fn classify_issue_type(&self, query: &str) -> IssueType {
        self.classify(query).await.0
    }

    fn select_agent(&self, issue_type: IssueType) -> Result<Arc<SupportAgent>> {
        if let Some(agent) = self.agents.get(&issue_type) {
            info!("Using {} agent for processing", issue_type);
            return Ok(agent.clone());
        }
        info!("Using default agent ({}) for processing", self.default_agent);
        self.agents.get(&self.default_agent).cloned().ok_or_else(|| Error::AgentNotRegistered {
            issue_type: self.default_agent.as_ref().to_string(),
        })
    }

    async fn assign_support_agent(&self, session: &mut Session, issue_type: IssueType) {
        match self.directory.find_agent_by_specialization(issue_type.as_ref()).await {
            Ok(Some(agent)) => {
                info!("Assigned agent ID: {}", agent.agent_id);
                session.agent_id = Some(agent.agent_id);
            }
            Ok(None) => debug!("No support agent available for {}", issue_type),
            Err(e) => warn!("Support agent lookup failed: {}", e),
        }
    }

    pub async fn process_query(&self, session: &mut Session, query: &str) -> Result<String> {
        let history = session.memory.messages().await;
        session.memory.add_user_message(query).await;

        let issue_type = match session.issue_type {
            Some(issue_type) if issue_type.is_specialized() => issue_type,
            _ => {
                let (issue_type, detailed) = self.classify(query).await;
                info!("Classified issue as: {}", issue_type);
                session.issue_type = Some(issue_type);

                let mut issue_data = Map::new();
                issue_data.insert(String::from("type"), json!(issue_type));
                issue_data.insert(String::from("classified_at"), json!(Local::now().to_rfc3339()));
                session.memory.add_system_context(SystemContext { issue_data: Some(issue_data), ..Default::default() });
                if let Some(detailed) = detailed {
                    session.memory.set_issue_field("subcategory", json!(detailed.subcategory));
                    session.memory.set_issue_field("priority", json!(detailed.priority));
                }
                issue_type
            }
        };

        let agent = self.select_agent(issue_type)?;
        if session.agent_id.is_none() {
            self.assign_support_agent(session, issue_type).await;
        }

        let context = AgentContext {
            employee: session.employee_info.clone(),
            devices: session.devices.clone(),
            language: session.language,
            history,
        };
        let response = agent.process(query, &context).await;
        counter!("helpdesk_queries_total", "agent" => agent.issue_type().as_ref().to_string()).increment(1);

        session.memory.add_ai_message(&response).await;
        Ok(response)
    }

    /// Personalised model greeting when the caller is known, otherwise a static one.
    pub async fn get_initial_greeting(&self, session: &Session) -> String {
        let hour = Local::now().hour();
        let Some(employee) = session.employee_info.as_ref() else {
            return self.fallback.initial_greeting(None, hour);
        };
        match self.conversation.greeting(employee, session.language).await {
            Ok(greeting) if !greeting.is_empty() => {
                info!("Generated personalized greeting for {}", employee.employee_id);
                greeting
            }
            Ok(_) => self.fallback.initial_greeting(Some(employee), hour),
            Err(e) => {
                warn!("Error generating greeting: {}", e);
                self.fallback.initial_greeting(Some(employee), hour)
            }
        }
    }

    pub async fn export_conversation(&self, session_id: &str) -> Result<SessionExport> {
        let session = self.sessions.get(session_id).await
            .ok_or_else(|| Error::SessionNotFound { session_id: session_id.to_string() })?;
        let mut session = session.lock().await;
        let issue_type = session.issue_type;
        let mut export = session.memory.export_session_data().await;
        if let Some(issue_type) = issue_type {
            export.issue_data.insert(String::from("type"), json!(issue_type));
        }
        Ok(export)
    }

    pub async fn plan_next_step(&self, session_id: &str) -> Result<Plan> {
        let session = self.sessions.get(session_id).await
            .ok_or_else(|| Error::SessionNotFound { session_id: session_id.to_string() })?;
        let session = session.lock().await;
        let issue_type = session.issue_type.map(|t| t.as_ref().to_string()).unwrap_or_else(|| String::from("Unknown"));
        Ok(self.workflow.plan_next_step(session.employee_info.as_ref(), &issue_type, &session.messages).await)
    }

    pub async fn recommend_actions(&self, session_id: &str) -> Result<Recommendation> {
        let session = self.sessions.get(session_id).await
            .ok_or_else(|| Error::SessionNotFound { session_id: session_id.to_string() })?;
        let mut session = session.lock().await;

        let issue_type = session.issue_type.map(|t| t.as_ref().to_string()).unwrap_or_else(|| String::from("Unknown"));
        let subcategory = session.memory.data().issue_data.get("subcategory")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let stage = ProgressStage::from_message_count(session.messages.len());
        let conversation = session.memory.conversation_summary().await;

        let actions = self.workflow.recommend_actions(&issue_type, &subcategory, &conversation, stage).await;
        Ok(Recommendation { issue_type, subcategory, stage, actions })
    }

    pub async fn end_session(&self, session_id: &str) -> bool {
        self.sessions.end_session(session_id).await
    }
}
