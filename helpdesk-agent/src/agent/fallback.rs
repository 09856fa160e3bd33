use metrics::counter;
use tracing::info;
use helpdesk_common::model::model::{Employee, IssueType, Language};
use helpdesk_prompt::prompt::prompt::time_greeting;
use crate::agent::classifier::is_bare_greeting;

/// Canned replies used whenever the model cannot answer.
#[derive(Clone, Debug)]
pub struct Fallback {
    assistant_name: String,
}

fn any_in(message: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| message.contains(n))
}

impl Fallback {

    pub fn new(assistant_name: &str) -> Self {
        Self { assistant_name: assistant_name.to_string() }
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn response(&self, message: &str, employee: Option<&Employee>, issue_type: Option<IssueType>, timed_out: bool) -> String {
        info!("Generating fallback response. Issue type: {:?}, timed out: {}", issue_type, timed_out);
        let label = issue_type.map(|t| t.as_ref().to_string()).unwrap_or_else(|| String::from("none"));
        counter!("helpdesk_fallback_responses_total", "issue_type" => label).increment(1);

        let greeting = match employee.and_then(|e| e.first_name()) {
            Some(first) => format!("Hi {}, ", first),
            None => String::from("Hello, "),
        };

        if timed_out {
            return format!("{greeting}I apologize for the delay. Our system is experiencing some momentary slowness. Could you please provide some additional details about your issue so I can assist you better once our systems are back to normal speed?");
        }

        if is_bare_greeting(message) {
            return format!("{greeting}I'm {}, your IT support specialist. How can I help you today?", self.assistant_name);
        }

        let message = message.to_lowercase();
        let body = match issue_type {
            Some(IssueType::Password) => {
                if any_in(&message, &["reset", "forgot"]) {
                    "I understand you need to reset your password. I'd be happy to help with that. For security reasons, I'll need to verify your identity first. Could you please confirm your department and employee ID?"
                } else if message.contains("locked") {
                    "I see that your account is locked. This typically happens after multiple incorrect password attempts. Let me help you regain access. First, could you tell me which system or application you're trying to access?"
                } else {
                    "I understand you're having an issue with authentication or accessing your account. To help you better, could you specify which system or application you're having trouble accessing?"
                }
            }
            Some(IssueType::Hardware) => {
                if any_in(&message, &["slow", "performance", "freezing", "frozen"]) {
                    "I'm sorry to hear your device is running slowly. This could be due to several factors such as low disk space, too many applications running, or outdated software. Could you tell me which operating system you're using, and approximately when you started noticing the issue?"
                } else if any_in(&message, &["printer", "print", "scanning"]) {
                    "I understand you're having an issue with a printer. Let me help troubleshoot that. First, could you tell me the model of the printer, and whether it's connected via network or USB?"
                } else if any_in(&message, &["wifi", "internet", "connection", "network"]) {
                    "I see you're experiencing network connectivity issues. Let's try to resolve this. Are you having trouble connecting to the WiFi, or is your device connected but you can't access specific websites or services?"
                } else {
                    "Thank you for reaching out about your hardware issue. To help me troubleshoot effectively, could you tell me which specific device you're having problems with, and what symptoms you're experiencing?"
                }
            }
            Some(IssueType::Software) => {
                if any_in(&message, &["install", "download", "setup"]) {
                    "I understand you need help installing software. To assist you better, could you tell me which application you're trying to install, and what error or issue you're encountering during the installation process?"
                } else if any_in(&message, &["update", "upgrade", "patch"]) {
                    "I see you're having issues with a software update. These can sometimes be tricky. Could you let me know which program needs updating, and what happens when you try to update it?"
                } else if any_in(&message, &["office", "excel", "word", "powerpoint", "outlook"]) {
                    "I understand you're experiencing an issue with Microsoft Office. To help you more effectively, could you specify which Office application is giving you trouble, and describe what happens when the problem occurs?"
                } else {
                    "I understand you're having a software issue. To help me troubleshoot effectively, could you tell me which specific application you're having problems with, and what error messages or unexpected behaviors you're seeing?"
                }
            }
            _ => "Thank you for reaching out to IT support. I'd like to help with your issue, but I need a bit more information. Could you provide more details about what you're experiencing so I can better assist you?",
        };
        format!("{greeting}{body}")
    }

    /// Static time-of-day greeting, personalised when the employee is known.
    pub fn initial_greeting(&self, employee: Option<&Employee>, hour: u32) -> String {
        let time = time_greeting(hour, Language::English);
        match employee {
            Some(employee) => {
                let first = employee.first_name().unwrap_or("there");
                let mut greeting = format!("{time}, {first}! I'm {}, your IT support specialist.", self.assistant_name);
                if let Some(department) = employee.department.as_deref().filter(|d| !d.is_empty()) {
                    greeting.push_str(&format!(" I see you're from the {department} department."));
                }
                greeting.push_str(" How can I help you with your IT needs today?");
                greeting
            }
            None => format!("{time}! I'm {}, your IT support specialist. How can I help you today?", self.assistant_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(department: Option<&str>) -> Employee {
        Employee {
            employee_id: String::from("E001"),
            name: String::from("Ana Lopez"),
            department: department.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_prefix_and_timeout() {
        let fallback = Fallback::new("Helpdesk Assistant");
        let known = employee(None);
        assert!(fallback.response("anything", Some(&known), None, false).starts_with("Hi Ana, Thank you for reaching out"));
        assert!(fallback.response("anything", None, Some(IssueType::Hardware), true).starts_with("Hello, I apologize for the delay."));
    }

    #[test]
    fn test_bare_greeting_introduces_assistant() {
        let fallback = Fallback::new("Helpdesk Assistant");
        assert_eq!(
            fallback.response("Hello", None, None, false),
            "Hello, I'm Helpdesk Assistant, your IT support specialist. How can I help you today?"
        );
    }

    #[test]
    fn test_issue_specific_branches() {
        let fallback = Fallback::new("Helpdesk Assistant");
        assert!(fallback.response("I forgot my password", None, Some(IssueType::Password), false).contains("reset your password"));
        assert!(fallback.response("account locked again", None, Some(IssueType::Password), false).contains("your account is locked"));
        assert!(fallback.response("the printer jams", None, Some(IssueType::Hardware), false).contains("model of the printer"));
        assert!(fallback.response("no wifi today", None, Some(IssueType::Hardware), false).contains("network connectivity"));
        assert!(fallback.response("need to install Zoom", None, Some(IssueType::Software), false).contains("installing software"));
        assert!(fallback.response("Outlook crashes", None, Some(IssueType::Software), false).contains("Microsoft Office"));
        assert!(fallback.response("strange thing", None, Some(IssueType::General), false).contains("need a bit more information"));
    }

    #[test]
    fn test_initial_greeting() {
        let fallback = Fallback::new("Helpdesk Assistant");
        let with_dept = employee(Some("Finance"));
        assert_eq!(
            fallback.initial_greeting(Some(&with_dept), 9),
            "Good morning, Ana! I'm Helpdesk Assistant, your IT support specialist. I see you're from the Finance department. How can I help you with your IT needs today?"
        );
        let without_dept = employee(Some(""));
        assert!(!fallback.initial_greeting(Some(&without_dept), 14).contains("department"));
        assert_eq!(
            fallback.initial_greeting(None, 20),
            "Good evening! I'm Helpdesk Assistant, your IT support specialist. How can I help you today?"
        );
    }
}
