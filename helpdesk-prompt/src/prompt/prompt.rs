use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use serde::Serialize;
use tracing::{info, warn};
use helpdesk_common::config::config::CustomPromptConfig;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::{IssueType, Language};
use crate::template::compiled::render_compiled;
use crate::template::runtime_template::RuntimeTemplate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PromptKind {
    BaseSystem,
    HardwareAgent,
    SoftwareAgent,
    PasswordAgent,
    GeneralAgent,
    ReactFormat,
    DetailedClassifier,
    WorkflowPlanner,
    ActionRecommender,
    Greeting,
    ConversationPersona,
}

impl PromptKind {

    pub const ALL: [PromptKind; 11] = [
        PromptKind::BaseSystem, PromptKind::HardwareAgent, PromptKind::SoftwareAgent,
        PromptKind::PasswordAgent, PromptKind::GeneralAgent, PromptKind::ReactFormat,
        PromptKind::DetailedClassifier, PromptKind::WorkflowPlanner, PromptKind::ActionRecommender,
        PromptKind::Greeting, PromptKind::ConversationPersona,
    ];

    /// Snake-case name as used in configuration, e.g. `hardware_agent`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|kind| kind.as_ref().eq_ignore_ascii_case(name))
    }

    pub fn for_agent(issue_type: IssueType) -> Self {
        match issue_type {
            IssueType::Hardware => PromptKind::HardwareAgent,
            IssueType::Software => PromptKind::SoftwareAgent,
            IssueType::Password => PromptKind::PasswordAgent,
            IssueType::General => PromptKind::GeneralAgent,
        }
    }
}

/// Values available to every prompt. Templates pick the ones they need.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PromptVars {
    pub assistant_name: String,
    pub time_greeting: String,
    pub employee_name: String,
    pub department: String,
    pub role: String,
    pub devices: String,
    pub issue_description: String,
    pub language_name: String,
    pub conversation: String,
    pub issue_type: String,
    pub subcategory: String,
    pub stage: String,
    pub tools: String,
    pub tool_names: String,
}

impl PromptVars {

    pub const NAMES: [&'static str; 14] = [
        "assistant_name", "time_greeting", "employee_name", "department", "role", "devices",
        "issue_description", "language_name", "conversation", "issue_type",
        "subcategory", "stage", "tools", "tool_names",
    ];

    pub fn new(assistant_name: &str) -> Self {
        Self {
            assistant_name: assistant_name.to_string(),
            language_name: Language::English.as_ref().to_string(),
            ..Default::default()
        }
    }

    fn as_map(&self) -> HashMap<&'static str, String> {
        let values = [
            &self.assistant_name, &self.time_greeting, &self.employee_name, &self.department,
            &self.role, &self.devices, &self.issue_description, &self.language_name,
            &self.conversation, &self.issue_type, &self.subcategory, &self.stage, &self.tools,
            &self.tool_names,
        ];
        Self::NAMES.iter().copied().zip(values.into_iter().cloned()).collect()
    }
}

/// Time-of-day salutation, localised.
pub fn time_greeting(hour: u32, language: Language) -> &'static str {
    let slot = match hour {
        5..=11 => 0,
        12..=17 => 1,
        _ => 2,
    };
    let table: [&'static str; 3] = match language {
        Language::English => ["Good morning", "Good afternoon", "Good evening"],
        Language::Spanish => ["Buenos días", "Buenas tardes", "Buenas noches"],
        Language::French => ["Bonjour", "Bonjour", "Bonsoir"],
        Language::German => ["Guten Morgen", "Guten Tag", "Guten Abend"],
    };
    table[slot]
}

/// Compiled prompt templates plus custom overrides registered at runtime.
#[derive(Clone, Debug)]
pub struct PromptCatalog {
    default_language: Language,
    custom: Arc<RwLock<HashMap<(PromptKind, Language), RuntimeTemplate>>>,
}

impl PromptCatalog {

    pub fn new(default_language: Language) -> Self {
        Self { default_language, custom: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    /// Registers a `{variable}` template that takes precedence over the compiled one.
    pub fn add_custom(&self, kind: PromptKind, language: Language, source: &str) -> Result<()> {
        let template = RuntimeTemplate::parse(kind.as_ref(), source)?;
        if let Some(unknown) = template.variables().into_iter().find(|name| !PromptVars::NAMES.contains(name)) {
            return Err(Error::PromptVariableMissing { kind: kind.as_ref().to_string(), variable: unknown.to_string() });
        }

        let mut custom = self.custom.write().map_err(|e| Error::PromptRender {
            kind: kind.as_ref().to_string(),
            cause: e.to_string(),
        })?;
        custom.insert((kind, language), template);
        info!("Added custom prompt template for {} in {}", kind.as_ref(), language.as_ref());
        Ok(())
    }

    /// Registers the templates from the `prompts` configuration section.
    pub fn load_custom(&self, prompts: &[CustomPromptConfig]) -> Result<()> {
        for prompt in prompts {
            let kind = PromptKind::parse(&prompt.kind).ok_or_else(|| Error::PromptRender {
                kind: prompt.kind.clone(),
                cause: String::from("unknown prompt kind"),
            })?;
            let language = Language::parse(&prompt.language).ok_or_else(|| Error::PromptRender {
                kind: prompt.kind.clone(),
                cause: format!("unsupported language {}", prompt.language),
            })?;
            self.add_custom(kind, language, &prompt.template)?;
        }
        Ok(())
    }

    pub fn render(&self, kind: PromptKind, language: Option<Language>, vars: &PromptVars) -> Result<String> {
        let language = language.unwrap_or(self.default_language);

        if let Some(rendered) = self.render_custom(kind, language, vars)? {
            return Ok(rendered);
        }

        let rendered = match render_compiled(kind, language, vars) {
            Some(rendered) => rendered,
            None => {
                warn!("Language {} not available for {}, falling back to English", language.as_ref(), kind.as_ref());
                if let Some(rendered) = self.render_custom(kind, Language::English, vars)? {
                    return Ok(rendered);
                }
                render_compiled(kind, Language::English, vars).ok_or_else(|| Error::PromptRender {
                    kind: kind.as_ref().to_string(),
                    cause: String::from("no English template"),
                })?
            }
        };

        rendered
            .map(|text| text.trim().to_string())
            .map_err(|e| Error::PromptRender { kind: kind.as_ref().to_string(), cause: e.to_string() })
    }

    fn render_custom(&self, kind: PromptKind, language: Language, vars: &PromptVars) -> Result<Option<String>> {
        let custom = self.custom.read().map_err(|e| Error::PromptRender {
            kind: kind.as_ref().to_string(),
            cause: e.to_string(),
        })?;
        match custom.get(&(kind, language)) {
            Some(template) => template.render(&vars.as_map()).map(|text| Some(text.trim().to_string())),
            None => Ok(None),
        }
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::new(Language::English)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> PromptVars {
        PromptVars {
            time_greeting: String::from("Good morning"),
            employee_name: String::from("Ana Lopez"),
            department: String::from("Finance"),
            role: String::from("Analyst"),
            devices: String::from("ThinkPad X1 - Windows 11"),
            issue_description: String::from("laptop will not boot"),
            ..PromptVars::new("Helpdesk Assistant")
        }
    }

    #[test]
    fn test_time_greeting_slots() {
        assert_eq!(time_greeting(4, Language::English), "Good evening");
        assert_eq!(time_greeting(5, Language::English), "Good morning");
        assert_eq!(time_greeting(12, Language::Spanish), "Buenas tardes");
        assert_eq!(time_greeting(18, Language::German), "Guten Abend");
    }

    #[test]
    fn test_hardware_agent_prompt_includes_user_info() {
        let catalog = PromptCatalog::default();
        let prompt = catalog.render(PromptKind::HardwareAgent, None, &vars()).unwrap();

        assert!(prompt.starts_with("You are Helpdesk Assistant"));
        assert!(prompt.contains("Name: Ana Lopez"));
        assert!(prompt.contains("Department: Finance"));
        assert!(prompt.contains("\"laptop will not boot\""));
        assert!(prompt.contains("TechBot"));
    }

    #[test]
    fn test_missing_translation_falls_back_to_english() {
        let catalog = PromptCatalog::default();
        let prompt = catalog.render(PromptKind::PasswordAgent, Some(Language::German), &vars()).unwrap();
        assert!(prompt.contains("SecurityBot"));
        assert!(prompt.contains("NEVER ask for current passwords"));
    }

    #[test]
    fn test_localised_base_prompt() {
        let catalog = PromptCatalog::default();
        let prompt = catalog.render(PromptKind::BaseSystem, Some(Language::French), &vars()).unwrap();
        assert!(prompt.starts_with("Vous êtes Helpdesk Assistant"));
        assert!(prompt.contains("Département: Finance"));
    }

    #[test]
    fn test_persona_adds_language_line_only_for_other_languages() {
        let catalog = PromptCatalog::default();
        let english = catalog.render(PromptKind::ConversationPersona, None, &vars()).unwrap();
        assert!(!english.contains("Respond in"));
        assert!(english.contains("[System: User is Ana Lopez, department: Finance, role: Analyst]"));

        let spanish_vars = PromptVars { language_name: String::from("spanish"), ..vars() };
        let spanish = catalog.render(PromptKind::ConversationPersona, Some(Language::Spanish), &spanish_vars).unwrap();
        assert!(spanish.contains("Respond in spanish."));
    }

    #[test]
    fn test_custom_template_overrides_compiled() {
        let catalog = PromptCatalog::default();
        catalog.add_custom(PromptKind::Greeting, Language::English, "Hey {employee_name} from {department}!").unwrap();

        let greeting = catalog.render(PromptKind::Greeting, None, &vars()).unwrap();
        assert_eq!(greeting, "Hey Ana Lopez from Finance!");

        // Other languages keep their compiled translation.
        let spanish = catalog.render(PromptKind::Greeting, Some(Language::Spanish), &vars()).unwrap();
        assert!(spanish.starts_with("Eres Helpdesk Assistant"));
    }

    #[test]
    fn test_custom_template_with_unknown_variable_is_rejected() {
        let catalog = PromptCatalog::default();
        let result = catalog.add_custom(PromptKind::Greeting, Language::English, "Hello {nickname}");
        assert!(matches!(result, Err(Error::PromptVariableMissing { .. })));
    }

    #[test]
    fn test_configured_prompts_are_loaded() {
        let prompts = vec![
            CustomPromptConfig { kind: String::from("greeting"), language: String::from("english"), template: String::from("Hi {employee_name}!") },
            CustomPromptConfig { kind: String::from("General_Agent"), language: String::from("es"), template: String::from("Soy {assistant_name}.") },
        ];
        let catalog = PromptCatalog::default();
        catalog.load_custom(&prompts).unwrap();

        assert_eq!(catalog.render(PromptKind::Greeting, None, &vars()).unwrap(), "Hi Ana Lopez!");
        assert_eq!(catalog.render(PromptKind::GeneralAgent, Some(Language::Spanish), &vars()).unwrap(), "Soy Helpdesk Assistant.");
    }

    #[test]
    fn test_configured_prompt_with_unknown_kind_is_rejected() {
        let catalog = PromptCatalog::default();
        let unknown_kind = vec![CustomPromptConfig { kind: String::from("farewell"), language: String::from("english"), template: String::from("Bye") }];
        assert!(matches!(catalog.load_custom(&unknown_kind), Err(Error::PromptRender { .. })));

        let unknown_language = vec![CustomPromptConfig { kind: String::from("greeting"), language: String::from("klingon"), template: String::from("Bye") }];
        assert!(matches!(catalog.load_custom(&unknown_language), Err(Error::PromptRender { .. })));
    }

    #[test]
    fn test_prompt_kind_names() {
        assert_eq!(PromptKind::parse("hardware_agent"), Some(PromptKind::HardwareAgent));
        assert_eq!(PromptKind::parse("conversation_persona"), Some(PromptKind::ConversationPersona));
        assert_eq!(PromptKind::parse("issue_classifier"), None);
    }

    #[test]
    fn test_react_format_lists_tools() {
        let catalog = PromptCatalog::default();
        let format_vars = PromptVars {
            tools: String::from("check_device_status: Check the status of a device."),
            tool_names: String::from("check_device_status"),
            ..vars()
        };
        let text = catalog.render(PromptKind::ReactFormat, None, &format_vars).unwrap();
        assert!(text.contains("should be one of [check_device_status]"));
        assert!(text.contains("Final Answer:"));
    }
}
