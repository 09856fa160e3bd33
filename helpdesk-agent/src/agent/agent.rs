use chrono::{Local, Timelike};
use tracing::{debug, info, warn};
use helpdesk_common::error::error::Result;
use helpdesk_common::model::model::{ChatMessage, Device, Employee, IssueType, Language, Role};
use helpdesk_prompt::prompt::prompt::{time_greeting, PromptCatalog, PromptKind, PromptVars};
use helpdesk_toolbox::tool::tool::ToolBox;
use crate::agent::fallback::Fallback;
use crate::agent::react::{parse_step, unknown_tool, Scratchpad, Step, STOP_SEQUENCE};
use crate::llm::llm_factory::LLM;
use crate::llm::prompt::{Prompt, PromptMessage};

const HISTORY_WINDOW: usize = 6;

/// What an agent knows about the caller for one turn.
#[derive(Clone, Debug, Default)]
pub struct AgentContext {
    pub employee: Option<Employee>,
    pub devices: Vec<Device>,
    pub language: Language,
    /// Earlier turns, not including the input being processed.
    pub history: Vec<ChatMessage>,
}

impl AgentContext {
    fn recent_history(&self) -> Vec<PromptMessage> {
        let turns: Vec<&ChatMessage> = self.history.iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .collect();
        let start = turns.len().saturating_sub(HISTORY_WINDOW);
        turns[start..].iter().map(|m| PromptMessage::from(*m)).collect()
    }
}

/// A specialist: one issue type, one model, and the tools it may call.
#[derive(Clone, Debug)]
pub struct SupportAgent {
    issue_type: IssueType,
    llm: LLM,
    toolbox: ToolBox,
    catalog: PromptCatalog,
    fallback: Fallback,
    max_iterations: usize,
}

impl SupportAgent {

    pub fn new(issue_type: IssueType, llm: LLM, toolbox: ToolBox, catalog: PromptCatalog, fallback: Fallback, max_iterations: usize) -> Self {
        Self { issue_type, llm, toolbox, catalog, fallback, max_iterations: max_iterations.max(1) }
    }

    pub fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    pub fn toolbox(&self) -> &ToolBox {
        &self.toolbox
    }

    fn system_prompt(&self, input: &str, context: &AgentContext) -> Result<String> {
        let employee = context.employee.as_ref();
        let vars = PromptVars {
            time_greeting: time_greeting(Local::now().hour(), context.language).to_string(),
            employee_name: employee.map(|e| e.name.clone()).unwrap_or_else(|| String::from("Unknown")),
            department: employee.and_then(|e| e.department.clone()).unwrap_or_else(|| String::from("Unknown")),
            role: employee.and_then(|e| e.role.clone()).unwrap_or_else(|| String::from("Unknown")),
            devices: context.devices.iter().map(Device::summary).collect::<Vec<_>>().join("; "),
            issue_description: input.to_string(),
            language_name: context.language.as_ref().to_string(),
            tools: self.toolbox.descriptions(),
            tool_names: self.toolbox.names().join(", "),
            ..PromptVars::new(self.fallback.assistant_name())
        };

        let agent = self.catalog.render(PromptKind::for_agent(self.issue_type), Some(context.language), &vars)?;
        let format = self.catalog.render(PromptKind::ReactFormat, Some(context.language), &vars)?;
        Ok(format!("{}\n\n{}", agent, format))
    }

    /// Runs the ReAct loop for `input`. Never fails: model trouble yields a canned reply.
    pub async fn process(&self, input: &str, context: &AgentContext) -> String {
        let system = match self.system_prompt(input, context) {
            Ok(system) => system,
            Err(e) => {
                warn!("Could not render {} agent prompt: {}", self.issue_type, e);
                return self.fallback.response(input, context.employee.as_ref(), Some(self.issue_type), false);
            }
        };
        let history = context.recent_history();
        let mut scratchpad = Scratchpad::new();

        for iteration in 0..self.max_iterations {
            let mut messages = history.clone();
            messages.push(PromptMessage::user(scratchpad.question(input)));
            let prompt = Prompt::new_messages(system.clone(), messages).with_stop(STOP_SEQUENCE);

            let output = match self.llm.execute(&prompt).await {
                Ok(result) => result.message,
                Err(e) => {
                    return self.fallback.response(input, context.employee.as_ref(), Some(self.issue_type), e.is_timeout());
                }
            };
            debug!("{} agent iteration {}: {}", self.issue_type, iteration + 1, output);

            match parse_step(&output) {
                Step::Final(answer) if !answer.is_empty() => {
                    info!("{} agent answered after {} iteration(s)", self.issue_type, iteration + 1);
                    return answer;
                }
                Step::Final(_) => break,
                Step::Action { tool, input: tool_input } => {
                    let observation = match self.toolbox.get(&tool) {
                        Some(t) => {
                            info!("{} agent calling {} with {:?}", self.issue_type, tool, tool_input);
                            t.call(&tool_input).await
                        }
                        None => unknown_tool(&tool, &self.toolbox.names()),
                    };
                    scratchpad.record(&output, &observation);
                }
            }
        }

        warn!("{} agent gave no answer within {} iterations", self.issue_type, self.max_iterations);
        self.fallback.response(input, context.employee.as_ref(), Some(self.issue_type), false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use helpdesk_common::error::error::Error;
    use helpdesk_toolbox::knowledge::knowledge::KnowledgeBase;
    use helpdesk_toolbox::software::software_tools::software_tools;
    use crate::llm::scripted_llm::ScriptedLLM;
    use super::*;

    fn agent(llm: &ScriptedLLM, max_iterations: usize) -> SupportAgent {
        let knowledge = Arc::new(KnowledgeBase::embedded().unwrap());
        SupportAgent::new(
            IssueType::Software,
            LLM::from(llm.clone()),
            ToolBox::new(software_tools(knowledge)),
            PromptCatalog::default(),
            Fallback::new("Helpdesk Assistant"),
            max_iterations,
        )
    }

    fn context() -> AgentContext {
        AgentContext {
            employee: Some(Employee { employee_id: String::from("E001"), name: String::from("Ana Lopez"), ..Default::default() }),
            history: vec![ChatMessage::user("hi"), ChatMessage::assistant("Hello Ana")],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let llm = ScriptedLLM::with_replies("test", [
            "Thought: look it up\nAction: get_software_info\nAction Input: zoom",
            "Thought: I now know the final answer\nFinal Answer: Zoom is on the current version.",
        ]);
        let reply = agent(&llm, 5).process("Which Zoom version do we use?", &context()).await;
        assert_eq!(reply, "Zoom is on the current version.");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].system.contains("get_software_info"));
        assert_eq!(prompts[0].stop, vec![STOP_SEQUENCE.to_string()]);
        assert_eq!(prompts[0].messages.len(), 3);
        let second = prompts[1].last_user().unwrap();
        assert!(second.starts_with("Question: Which Zoom version do we use?\nThought: look it up"));
        assert!(second.contains("Observation: "));
        assert!(second.ends_with("Thought:"));
    }

    #[tokio::test]
    async fn test_unknown_tool_observation() {
        let llm = ScriptedLLM::with_replies("test", [
            "Action: reboot_everything\nAction Input: now",
            "Final Answer: ok",
        ]);
        assert_eq!(agent(&llm, 5).process("Excel is broken", &context()).await, "ok");
        let second = llm.prompts()[1].last_user().unwrap().to_string();
        assert!(second.contains("reboot_everything is not a valid tool, try one of [get_software_info"));
    }

    #[tokio::test]
    async fn test_max_iterations_falls_back() {
        let llm = ScriptedLLM::with_replies("test", [
            "Action: get_software_info\nAction Input: zoom",
            "Action: get_software_info\nAction Input: slack",
        ]);
        let reply = agent(&llm, 2).process("please install zoom", &context()).await;
        assert!(reply.starts_with("Hi Ana, I understand you need help installing software."));
    }

    #[tokio::test]
    async fn test_llm_errors_fall_back() {
        let llm = ScriptedLLM::new("test");
        llm.push_error(Error::LlmTimeout { gateway: String::from("test") });
        let reply = agent(&llm, 5).process("Outlook crashes", &context()).await;
        assert!(reply.contains("momentary slowness"));

        let reply = agent(&llm, 5).process("Outlook crashes", &AgentContext::default()).await;
        assert!(reply.starts_with("Hello, I understand you're experiencing an issue with Microsoft Office."));
    }

    #[test]
    fn test_recent_history_window() {
        let history = (0..10).map(|i| ChatMessage::user(format!("m{}", i))).collect();
        let context = AgentContext { history, ..Default::default() };
        let recent = context.recent_history();
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].content, "m4");
    }
}
