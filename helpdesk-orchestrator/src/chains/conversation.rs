use chrono::{Local, Timelike};
use tracing::{error, info};
use helpdesk_agent::llm::llm_factory::LLM;
use helpdesk_agent::llm::prompt::{Prompt, PromptMessage};
use helpdesk_common::error::error::Result;
use helpdesk_common::model::model::{ChatMessage, Employee, Language, Role};
use helpdesk_prompt::prompt::prompt::{time_greeting, PromptCatalog, PromptKind, PromptVars};

pub const APOLOGY: &str = "I apologize, but I'm experiencing technical difficulties. Please try again or contact our IT team directly if your issue is urgent.";

/// Free-form conversation in the assistant persona, used for greetings and small talk.
#[derive(Clone, Debug)]
pub struct ConversationChain {
    llm: LLM,
    catalog: PromptCatalog,
    assistant_name: String,
}

fn employee_vars(vars: &mut PromptVars, employee: Option<&Employee>) {
    if let Some(employee) = employee {
        vars.employee_name = employee.name.clone();
        vars.department = employee.department.clone().unwrap_or_else(|| String::from("unknown"));
        vars.role = employee.role.clone().unwrap_or_else(|| String::from("unknown"));
    }
}

impl ConversationChain {

    pub fn new(llm: LLM, catalog: PromptCatalog, assistant_name: &str) -> Self {
        Self { llm, catalog, assistant_name: assistant_name.to_string() }
    }

    async fn respond(&self, input: &str, employee: Option<&Employee>, history: &[ChatMessage], language: Language) -> Result<String> {
        let mut vars = PromptVars { language_name: language.as_ref().to_string(), ..PromptVars::new(&self.assistant_name) };
        employee_vars(&mut vars, employee);
        let system = self.catalog.render(PromptKind::ConversationPersona, Some(language), &vars)?;

        let mut messages: Vec<PromptMessage> = history.iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .map(PromptMessage::from)
            .collect();
        messages.push(PromptMessage::user(input));

        let result = self.llm.execute(&Prompt::new_messages(system, messages)).await?;
        Ok(result.message.trim().to_string())
    }

    /// Replies in persona. Failures become the apology text.
    pub async fn process(&self, input: &str, employee: Option<&Employee>, history: &[ChatMessage], language: Language) -> String {
        match self.respond(input, employee, history, language).await {
            Ok(response) => {
                info!("Generated conversation response of length {}", response.len());
                response
            }
            Err(e) => {
                error!("Error in conversation chain: {}", e);
                String::from(APOLOGY)
            }
        }
    }

    /// Personalised greeting from the model.
    pub async fn greeting(&self, employee: &Employee, language: Language) -> Result<String> {
        let mut vars = PromptVars {
            time_greeting: time_greeting(Local::now().hour(), language).to_string(),
            language_name: language.as_ref().to_string(),
            ..PromptVars::new(&self.assistant_name)
        };
        employee_vars(&mut vars, Some(employee));
        if let Some(first) = employee.first_name() {
            vars.employee_name = first.to_string();
        }

        let system = self.catalog.render(PromptKind::Greeting, Some(language), &vars)?;
        let result = self.llm.execute(&Prompt::new_simple(system, "Hello")).await?;
        Ok(result.message.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use helpdesk_agent::llm::scripted_llm::ScriptedLLM;
    use super::*;

    fn employee() -> Employee {
        Employee {
            employee_id: String::from("E001"),
            name: String::from("Ana Lopez"),
            department: Some(String::from("Finance")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_process_sends_persona_and_history() {
        let llm = ScriptedLLM::with_replies("test", ["  Happy to help!  "]);
        let chain = ConversationChain::new(LLM::from(llm.clone()), PromptCatalog::default(), "Helpdesk Assistant");
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];

        let reply = chain.process("thanks", Some(&employee()), &history, Language::English).await;
        assert_eq!(reply, "Happy to help!");

        let prompt = &llm.prompts()[0];
        assert!(prompt.system.contains("Helpdesk Assistant"));
        assert!(prompt.system.contains("[System: User is Ana Lopez, department: Finance"));
        assert_eq!(prompt.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_failure_is_an_apology() {
        let chain = ConversationChain::new(LLM::from(ScriptedLLM::new("test")), PromptCatalog::default(), "Helpdesk Assistant");
        assert_eq!(chain.process("thanks", None, &[], Language::Spanish).await, APOLOGY);
    }

    #[tokio::test]
    async fn test_greeting_uses_first_name() {
        let llm = ScriptedLLM::with_replies("test", ["Good morning, Ana!"]);
        let chain = ConversationChain::new(LLM::from(llm.clone()), PromptCatalog::default(), "Helpdesk Assistant");
        assert_eq!(chain.greeting(&employee(), Language::English).await.unwrap(), "Good morning, Ana!");
        assert!(llm.prompts()[0].system.contains("for Ana from the Finance department"));
        assert!(chain.greeting(&employee(), Language::English).await.is_err());
    }
}
