use askama::Template;
use helpdesk_common::model::model::Language;
use crate::prompt::prompt::{PromptKind, PromptVars};

macro_rules! compiled_template {
    ($name:ident, $path:tt) => {
        #[derive(Template)]
        #[template(path = $path)]
        pub(crate) struct $name<'a> {
            pub(crate) v: &'a PromptVars,
        }
    };
}

compiled_template!(BaseSystemEn, "base_system/en.txt");
compiled_template!(BaseSystemEs, "base_system/es.txt");
compiled_template!(BaseSystemFr, "base_system/fr.txt");
compiled_template!(BaseSystemDe, "base_system/de.txt");
compiled_template!(HardwareAgentEn, "agent/hardware.en.txt");
compiled_template!(HardwareAgentEs, "agent/hardware.es.txt");
compiled_template!(SoftwareAgentEn, "agent/software.en.txt");
compiled_template!(SoftwareAgentEs, "agent/software.es.txt");
compiled_template!(PasswordAgentEn, "agent/password.en.txt");
compiled_template!(PasswordAgentEs, "agent/password.es.txt");
compiled_template!(GeneralAgentEn, "agent/general.en.txt");
compiled_template!(ReactFormatEn, "agent/react_format.en.txt");
compiled_template!(DetailedClassifierEn, "workflow/detailed_classifier.en.txt");
compiled_template!(WorkflowPlannerEn, "workflow/planner.en.txt");
compiled_template!(ActionRecommenderEn, "workflow/action_recommender.en.txt");
compiled_template!(GreetingEn, "greeting/en.txt");
compiled_template!(GreetingEs, "greeting/es.txt");
compiled_template!(GreetingFr, "greeting/fr.txt");
compiled_template!(GreetingDe, "greeting/de.txt");
compiled_template!(ConversationPersonaEn, "conversation/persona.en.txt");

/// Renders the compiled template for `(kind, language)`, or `None` when that translation does not exist.
pub(crate) fn render_compiled(
    kind: PromptKind,
    language: Language,
    v: &PromptVars,
) -> Option<askama::Result<String>> {
    use Language::*;
    use PromptKind::*;

    let rendered = match (kind, language) {
        (BaseSystem, English) => BaseSystemEn { v }.render(),
        (BaseSystem, Spanish) => BaseSystemEs { v }.render(),
        (BaseSystem, French) => BaseSystemFr { v }.render(),
        (BaseSystem, German) => BaseSystemDe { v }.render(),
        (HardwareAgent, English) => HardwareAgentEn { v }.render(),
        (HardwareAgent, Spanish) => HardwareAgentEs { v }.render(),
        (SoftwareAgent, English) => SoftwareAgentEn { v }.render(),
        (SoftwareAgent, Spanish) => SoftwareAgentEs { v }.render(),
        (PasswordAgent, English) => PasswordAgentEn { v }.render(),
        (PasswordAgent, Spanish) => PasswordAgentEs { v }.render(),
        (GeneralAgent, English) => GeneralAgentEn { v }.render(),
        (ReactFormat, English) => ReactFormatEn { v }.render(),
        (DetailedClassifier, English) => DetailedClassifierEn { v }.render(),
        (WorkflowPlanner, English) => WorkflowPlannerEn { v }.render(),
        (ActionRecommender, English) => ActionRecommenderEn { v }.render(),
        (Greeting, English) => GreetingEn { v }.render(),
        (Greeting, Spanish) => GreetingEs { v }.render(),
        (Greeting, French) => GreetingFr { v }.render(),
        (Greeting, German) => GreetingDe { v }.render(),
        // The persona carries its own "Respond in ..." line for other languages.
        (ConversationPersona, _) => ConversationPersonaEn { v }.render(),
        _ => return None,
    };
    Some(rendered)
}
