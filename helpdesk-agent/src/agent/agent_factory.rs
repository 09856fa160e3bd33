use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use helpdesk_common::config::config::Config;
use helpdesk_common::model::model::IssueType;
use helpdesk_prompt::prompt::prompt::PromptCatalog;
use helpdesk_toolbox::directory::directory::Directory;
use helpdesk_toolbox::directory::directory_tools::directory_tools;
use helpdesk_toolbox::hardware::hardware_tools::hardware_tools;
use helpdesk_toolbox::knowledge::knowledge::KnowledgeBase;
use helpdesk_toolbox::password::password_tools::password_tools;
use helpdesk_toolbox::software::software_tools::software_tools;
use helpdesk_toolbox::tool::tool::ToolBox;
use crate::agent::agent::SupportAgent;
use crate::agent::fallback::Fallback;
use crate::llm::llm_factory::LLM;

pub const AGENT_TYPES: [IssueType; 4] = [IssueType::Hardware, IssueType::Software, IssueType::Password, IssueType::General];

/// Wires each agent to its tools, the shared model and the prompt catalog.
pub struct AgentFactory {
    config: Config,
    llm: LLM,
    knowledge: Arc<KnowledgeBase>,
    directory: Arc<dyn Directory>,
    catalog: PromptCatalog,
}

impl AgentFactory {

    pub fn new(config: Config, llm: LLM, knowledge: Arc<KnowledgeBase>, directory: Arc<dyn Directory>, catalog: PromptCatalog) -> Self {
        Self { config, llm, knowledge, directory, catalog }
    }

    pub fn fallback(&self) -> Fallback {
        Fallback::new(&self.config.config.assistant.name)
    }

    /// Issue type whose agent answers when no specialist is registered.
    pub fn default_agent(&self) -> IssueType {
        let name = &self.config.config.agents.default_agent;
        IssueType::from_str(name).unwrap_or_else(|_| {
            warn!("Unknown default agent {}, using Hardware", name);
            IssueType::Hardware
        })
    }

    fn toolbox(&self, issue_type: IssueType) -> ToolBox {
        let tools = match issue_type {
            IssueType::Hardware => hardware_tools(self.knowledge.clone(), self.directory.clone()),
            IssueType::Software => software_tools(self.knowledge.clone()),
            IssueType::Password => password_tools(self.knowledge.clone(), self.config.config.agents.enable_mfa),
            IssueType::General => directory_tools(self.directory.clone()),
        };
        ToolBox::new(tools)
    }

    pub fn create(&self, issue_type: IssueType) -> SupportAgent {
        let toolbox = self.toolbox(issue_type);
        info!("Created {} agent with {} tools", issue_type, toolbox.len());
        SupportAgent::new(
            issue_type,
            self.llm.clone(),
            toolbox,
            self.catalog.clone(),
            self.fallback(),
            self.config.config.agents.max_iterations,
        )
    }

    /// One agent per issue type, including the general agent for unclassified issues.
    pub fn create_all(&self) -> HashMap<IssueType, Arc<SupportAgent>> {
        AGENT_TYPES.iter().map(|t| (*t, Arc::new(self.create(*t)))).collect()
    }
}
