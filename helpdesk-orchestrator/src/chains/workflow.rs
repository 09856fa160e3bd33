use serde::Serialize;
use tracing::{error, info};
use helpdesk_agent::llm::llm_factory::LLM;
use helpdesk_agent::llm::prompt::Prompt;
use helpdesk_common::error::error::Result;
use helpdesk_common::model::model::{ChatMessage, Employee};
use helpdesk_prompt::prompt::prompt::{PromptCatalog, PromptKind, PromptVars};

const PLANNING_WINDOW: usize = 6;
const DEFAULT_ACTIONS: &str = "Please gather more information about the specific issue the user is experiencing.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgressStage {
    Initial,
    InformationGathering,
    Troubleshooting,
    Resolution,
}

impl ProgressStage {
    pub fn from_message_count(count: usize) -> Self {
        match count {
            0..=2 => ProgressStage::Initial,
            3..=6 => ProgressStage::InformationGathering,
            7..=10 => ProgressStage::Troubleshooting,
            _ => ProgressStage::Resolution,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, strum_macros::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NextStep {
    #[default]
    GatherInfo,
    Troubleshoot,
    VerifySolution,
    Escalate,
    Close,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Plan {
    pub stage: ProgressStage,
    pub next_step: NextStep,
    pub analysis: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailedClassification {
    pub category: String,
    pub subcategory: String,
    pub priority: String,
    pub full_response: String,
}

impl Default for DetailedClassification {
    fn default() -> Self {
        Self {
            category: String::from("Unknown"),
            subcategory: String::from("Unknown"),
            priority: String::from("Medium"),
            full_response: String::from("Error in classification"),
        }
    }
}

/// Value after `label` on the first line that starts with it.
fn field(text: &str, label: &str) -> Option<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches('*').trim_start())
        .find_map(|line| line.strip_prefix(label))
        .map(|value| value.trim().trim_matches('*').trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn parse_next_step(text: &str) -> NextStep {
    let Some(value) = field(text, "NEXT STEP:") else {
        return NextStep::default();
    };
    let value = value.to_lowercase();
    [NextStep::VerifySolution, NextStep::GatherInfo, NextStep::Troubleshoot, NextStep::Escalate, NextStep::Close]
        .into_iter()
        .find(|step| value.contains(step.as_ref()))
        .unwrap_or_default()
}

pub fn parse_classification(text: &str) -> DetailedClassification {
    let defaults = DetailedClassification::default();
    DetailedClassification {
        category: field(text, "CATEGORY:").unwrap_or(defaults.category),
        subcategory: field(text, "SUBCATEGORY:").unwrap_or(defaults.subcategory),
        priority: field(text, "PRIORITY:").unwrap_or(defaults.priority),
        full_response: text.to_string(),
    }
}

/// `Role: content` blocks for the last few messages.
pub fn format_conversation(messages: &[ChatMessage], window: usize) -> String {
    let start = messages.len().saturating_sub(window);
    messages[start..].iter()
        .map(|m| format!("{}: {}\n\n", m.role.label(), m.content))
        .collect()
}

/// Planning, detailed classification and action recommendation over a conversation.
#[derive(Clone, Debug)]
pub struct WorkflowChain {
    llm: LLM,
    catalog: PromptCatalog,
}

impl WorkflowChain {

    pub fn new(llm: LLM, catalog: PromptCatalog) -> Self {
        Self { llm, catalog }
    }

    async fn run(&self, kind: PromptKind, vars: &PromptVars) -> Result<String> {
        let system = self.catalog.render(kind, None, vars)?;
        let result = self.llm.execute(&Prompt::new_simple(system, "Respond in the requested format.")).await?;
        Ok(result.message)
    }

    pub async fn plan_next_step(&self, employee: Option<&Employee>, issue_type: &str, messages: &[ChatMessage]) -> Plan {
        let stage = ProgressStage::from_message_count(messages.len());
        let vars = PromptVars {
            employee_name: employee.map(|e| e.name.clone()).unwrap_or_else(|| String::from("Unknown")),
            department: employee.and_then(|e| e.department.clone()).unwrap_or_else(|| String::from("Unknown")),
            role: employee.and_then(|e| e.role.clone()).unwrap_or_else(|| String::from("Unknown")),
            issue_type: issue_type.to_string(),
            stage: stage.as_ref().to_string(),
            conversation: format_conversation(messages, PLANNING_WINDOW),
            ..Default::default()
        };

        match self.run(PromptKind::WorkflowPlanner, &vars).await {
            Ok(analysis) => {
                info!("Workflow planning result: {}", analysis.chars().take(100).collect::<String>());
                Plan { stage, next_step: parse_next_step(&analysis), analysis }
            }
            Err(e) => {
                error!("Error in workflow planning: {}", e);
                Plan { stage, next_step: NextStep::GatherInfo, analysis: String::from("NEXT STEP: gather_info") }
            }
        }
    }

    pub async fn classify_issue_detailed(&self, conversation: &str) -> DetailedClassification {
        let vars = PromptVars { conversation: conversation.to_string(), ..Default::default() };
        match self.run(PromptKind::DetailedClassifier, &vars).await {
            Ok(result) => {
                info!("Issue classification result: {}", result);
                parse_classification(&result)
            }
            Err(e) => {
                error!("Error in issue classification: {}", e);
                DetailedClassification::default()
            }
        }
    }

    pub async fn recommend_actions(&self, issue_type: &str, subcategory: &str, conversation: &str, stage: ProgressStage) -> String {
        let vars = PromptVars {
            issue_type: issue_type.to_string(),
            subcategory: subcategory.to_string(),
            conversation: conversation.to_string(),
            stage: stage.as_ref().to_string(),
            ..Default::default()
        };
        match self.run(PromptKind::ActionRecommender, &vars).await {
            Ok(result) => result.trim().to_string(),
            Err(e) => {
                error!("Error in action recommendation: {}", e);
                String::from(DEFAULT_ACTIONS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use helpdesk_agent::llm::scripted_llm::ScriptedLLM;
    use super::*;

    #[test]
    fn test_progress_stages() {
        assert_eq!(ProgressStage::from_message_count(0), ProgressStage::Initial);
        assert_eq!(ProgressStage::from_message_count(2), ProgressStage::Initial);
        assert_eq!(ProgressStage::from_message_count(3), ProgressStage::InformationGathering);
        assert_eq!(ProgressStage::from_message_count(6), ProgressStage::InformationGathering);
        assert_eq!(ProgressStage::from_message_count(10), ProgressStage::Troubleshooting);
        assert_eq!(ProgressStage::from_message_count(11), ProgressStage::Resolution);
        assert_eq!(ProgressStage::InformationGathering.as_ref(), "information_gathering");
    }

    #[test]
    fn test_parse_next_step() {
        assert_eq!(parse_next_step("ANALYSIS: fine\nNEXT STEP: \"troubleshoot\"\nREASONING: x"), NextStep::Troubleshoot);
        assert_eq!(parse_next_step("**NEXT STEP:** verify_solution"), NextStep::VerifySolution);
        assert_eq!(parse_next_step("NEXT STEP: dance"), NextStep::GatherInfo);
        assert_eq!(parse_next_step("no structure at all"), NextStep::GatherInfo);
    }

    #[test]
    fn test_parse_classification() {
        let parsed = parse_classification("CATEGORY: Password/Access\nSUBCATEGORY: Account lockout\nPRIORITY: High\nREASONING: locked");
        assert_eq!(parsed.category, "Password/Access");
        assert_eq!(parsed.subcategory, "Account lockout");
        assert_eq!(parsed.priority, "High");

        let partial = parse_classification("SUBCATEGORY: VPN");
        assert_eq!(partial.category, "Unknown");
        assert_eq!(partial.subcategory, "VPN");
        assert_eq!(partial.priority, "Medium");
    }

    #[test]
    fn test_format_conversation_window() {
        let messages: Vec<ChatMessage> = (0..8).map(|i| ChatMessage::user(format!("m{}", i))).collect();
        let text = format_conversation(&messages, 6);
        assert!(text.starts_with("User: m2\n\n"));
        assert!(!text.contains("m1"));
    }

    #[tokio::test]
    async fn test_chain_failures_use_defaults() {
        let chain = WorkflowChain::new(LLM::from(ScriptedLLM::new("test")), PromptCatalog::default());
        let plan = chain.plan_next_step(None, "Hardware", &[]).await;
        assert_eq!(plan.next_step, NextStep::GatherInfo);
        assert_eq!(plan.stage, ProgressStage::Initial);
        assert_eq!(chain.classify_issue_detailed("User: ?").await, DetailedClassification::default());
        assert_eq!(chain.recommend_actions("Hardware", "Unknown", "", ProgressStage::Initial).await, DEFAULT_ACTIONS);
    }

    #[tokio::test]
    async fn test_plan_renders_stage_and_parses_step() {
        let llm = ScriptedLLM::with_replies("test", ["ANALYSIS: done\nNEXT STEP: close"]);
        let chain = WorkflowChain::new(LLM::from(llm.clone()), PromptCatalog::default());
        let messages: Vec<ChatMessage> = (0..4).map(|i| ChatMessage::user(format!("m{}", i))).collect();

        let plan = chain.plan_next_step(None, "Software", &messages).await;
        assert_eq!(plan.next_step, NextStep::Close);
        assert!(llm.prompts()[0].system.contains("Progress: information_gathering"));
    }
}
