use std::sync::Arc;
use crate::knowledge::knowledge::{find_entry, KnowledgeBase, SystemEntry};
use crate::tool::tool::{split_pair, KnowledgeTool, Tool};

/// Password agent tools. MFA guidance is only offered when enabled in config.
pub fn password_tools(knowledge: Arc<KnowledgeBase>, enable_mfa: bool) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(KnowledgeTool::new(
            "get_reset_procedure",
            "Get the password reset procedure for a specific system. Input should be the system name (e.g. windows, email, vpn, erp).",
            knowledge.clone(),
            get_reset_procedure,
        )),
        Arc::new(KnowledgeTool::new(
            "check_password_policy",
            "Get the password policy for a specific system. Input should be the system name.",
            knowledge.clone(),
            check_password_policy,
        )),
        Arc::new(KnowledgeTool::new(
            "get_account_lockout_info",
            "Get information about account lockouts for a specific system. Input should be the system name.",
            knowledge.clone(),
            get_account_lockout_info,
        )),
    ];
    if enable_mfa {
        tools.push(Arc::new(KnowledgeTool::new(
            "get_mfa_help",
            "Get help with multi-factor authentication issues. Input should be the MFA system and issue description separated by a semicolon.",
            knowledge,
            get_mfa_help,
        )));
    }
    tools
}

fn lookup_system<'a>(entries: &'a [SystemEntry], system_name: &str) -> Option<&'a SystemEntry> {
    let query = system_name.trim().to_lowercase();
    find_entry(entries, &query, |e| e.system.as_str())
}

pub fn get_reset_procedure(knowledge: &KnowledgeBase, system_name: &str) -> String {
    match lookup_system(&knowledge.password.reset_procedures, system_name) {
        Some(entry) => format!("Password reset procedure for {}:\n{}", entry.system, entry.text),
        None => format!(
            "No specific reset procedure found for {}. Here is our general password reset guidance:\n\n{}",
            system_name.trim(), knowledge.password.reset_generic
        ),
    }
}

pub fn check_password_policy(knowledge: &KnowledgeBase, system_name: &str) -> String {
    match lookup_system(&knowledge.password.policies, system_name) {
        Some(entry) => format!("Password policy for {}:\n{}", entry.system, entry.text),
        None => format!(
            "No specific password policy found for {}. Here is our general enterprise password policy:\n\n{}",
            system_name.trim(), knowledge.password.policy_generic
        ),
    }
}

pub fn get_account_lockout_info(knowledge: &KnowledgeBase, system_name: &str) -> String {
    match lookup_system(&knowledge.password.lockout, system_name) {
        Some(entry) => format!("Account lockout information for {}:\n{}", entry.system, entry.text),
        None => format!(
            "No specific account lockout information found for {}. Here is our general account lockout guidance:\n\n{}",
            system_name.trim(), knowledge.password.lockout_generic
        ),
    }
}

pub fn get_mfa_help(knowledge: &KnowledgeBase, input: &str) -> String {
    let Some((system, issue)) = split_pair(input) else {
        return String::from("Invalid input format. Please provide system name and issue description separated by a semicolon.");
    };

    let help = find_entry(&knowledge.password.mfa, &system, |m| m.system.as_str())
        .and_then(|entry| find_entry(&entry.issues, &issue, |i| i.issue.as_str()).map(|i| (entry, i)));

    match help {
        Some((entry, known)) => format!("MFA help for {} - {}:\n{}", entry.system, known.issue, known.help),
        None => format!(
            "No specific MFA guidance found for {}. Here is our general MFA guidance:\n\n{}",
            system, knowledge.password.mfa_generic
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::embedded().unwrap())
    }

    #[test]
    fn test_mfa_tool_is_gated() {
        let without: Vec<String> = password_tools(knowledge(), false).iter().map(|t| t.name().to_string()).collect();
        assert_eq!(without, vec!["get_reset_procedure", "check_password_policy", "get_account_lockout_info"]);

        let with = password_tools(knowledge(), true);
        assert!(with.iter().any(|t| t.name() == "get_mfa_help"));
    }

    #[test]
    fn test_reset_procedure_and_generic_fallback() {
        let kb = knowledge();
        assert!(get_reset_procedure(&kb, "Windows").starts_with("Password reset procedure for windows:"));
        let generic = get_reset_procedure(&kb, "mainframe");
        assert!(generic.starts_with("No specific reset procedure found for mainframe."));
        assert!(generic.contains("self-service portal"));
    }

    #[test]
    fn test_policy_and_lockout() {
        let kb = knowledge();
        assert!(check_password_policy(&kb, "erp system").contains("Expires every 60 days"));
        assert!(get_account_lockout_info(&kb, "ERP").contains("3 failed attempts"));
        assert!(get_account_lockout_info(&kb, "sap").starts_with("No specific account lockout information found for sap."));
    }

    #[test]
    fn test_mfa_help() {
        let kb = knowledge();
        let help = get_mfa_help(&kb, "Microsoft Authenticator;got a new phone");
        assert!(help.starts_with("MFA help for microsoft authenticator - new phone:"));
        assert!(get_mfa_help(&kb, "yubikey;lost").contains("general MFA guidance"));
        assert!(get_mfa_help(&kb, "sms").starts_with("Invalid input format"));
    }
}
