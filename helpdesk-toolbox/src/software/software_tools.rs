use std::sync::Arc;
use crate::knowledge::knowledge::{find_entry, mutual_match, KnowledgeBase};
use crate::tool::tool::{split_pair, KnowledgeTool, Tool};

pub fn software_tools(knowledge: Arc<KnowledgeBase>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(KnowledgeTool::new(
            "get_software_info",
            "Get information about a specific software application. Input should be the software name.",
            knowledge.clone(),
            get_software_info,
        )),
        Arc::new(KnowledgeTool::new(
            "troubleshoot_software",
            "Get troubleshooting steps for common software issues. Input should be software name and issue description separated by a semicolon.",
            knowledge.clone(),
            troubleshoot_software,
        )),
        Arc::new(KnowledgeTool::new(
            "check_software_compatibility",
            "Check if software is compatible with an operating system. Input should be software name and OS separated by a semicolon.",
            knowledge.clone(),
            check_software_compatibility,
        )),
        Arc::new(KnowledgeTool::new(
            "get_software_alternatives",
            "Get alternative software suggestions. Input should be the software name.",
            knowledge,
            get_software_alternatives,
        )),
    ]
}

pub fn get_software_info(knowledge: &KnowledgeBase, software_name: &str) -> String {
    let query = software_name.trim().to_lowercase();
    match find_entry(&knowledge.software.catalog, &query, |s| s.key.as_str()) {
        Some(info) => format!(
            "Software: {}\nDescription: {}\nCurrent Version: {}\nLicense Type: {}\nSupport Link: {}",
            info.name, info.description, info.current_version, info.license_type, info.support_link
        ),
        None => format!(
            "Software '{}' not found in our database. Please check spelling or provide more details.",
            software_name.trim()
        ),
    }
}

pub fn troubleshoot_software(knowledge: &KnowledgeBase, input: &str) -> String {
    let Some((software, issue)) = split_pair(input) else {
        return String::from("Invalid input format. Please provide software name and issue description separated by a semicolon.");
    };

    let Some(entry) = find_entry(&knowledge.software.troubleshooting, &software, |s| s.software.as_str()) else {
        return format!(
            "No specific troubleshooting information for {}. Here are general troubleshooting steps:\n{}",
            software, knowledge.software.general_steps
        );
    };

    match find_entry(&entry.issues, &issue, |i| i.issue.as_str()) {
        Some(known) => format!("Troubleshooting steps for {} - {}:\n{}", entry.software, known.issue, known.steps),
        None => format!(
            "No specific troubleshooting steps found for '{}' with {}. Here are general troubleshooting steps:\n{}",
            issue, entry.software, knowledge.software.general_steps
        ),
    }
}

pub fn check_software_compatibility(knowledge: &KnowledgeBase, input: &str) -> String {
    let Some((software, os)) = split_pair(input) else {
        return String::from("Invalid input format. Please provide software name and OS separated by a semicolon.");
    };

    let Some(entry) = find_entry(&knowledge.software.compatibility, &software, |c| c.software.as_str()) else {
        return format!("No compatibility information available for {} with any operating system.", software);
    };

    match entry.systems.iter().find(|s| mutual_match(&s.os, &os)) {
        Some(system) => format!(
            "{} compatibility with {}: {}",
            title_case(&entry.software), title_case(&system.os), system.status
        ),
        None => format!(
            "No compatibility information available for {} with {}. Please contact IT support for more information.",
            title_case(&entry.software), os
        ),
    }
}

pub fn get_software_alternatives(knowledge: &KnowledgeBase, software_name: &str) -> String {
    let query = software_name.trim().to_lowercase();
    match find_entry(&knowledge.software.alternatives, &query, |a| a.software.as_str()) {
        Some(entry) => {
            let lines: Vec<String> = entry.options.iter()
                .enumerate()
                .map(|(i, alt)| format!("{}. {}: {}", i + 1, alt.name, alt.description))
                .collect();
            format!("Alternatives to {}:\n{}", title_case(&entry.software), lines.join("\n"))
        }
        None => format!(
            "No alternative suggestions available for {}. Please contact IT support for recommendations.",
            software_name.trim()
        ),
    }
}

fn title_case(value: &str) -> String {
    value.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knowledge() -> KnowledgeBase {
        KnowledgeBase::embedded().unwrap()
    }

    #[test]
    fn test_software_info_partial_name() {
        let kb = knowledge();
        let info = get_software_info(&kb, "Office");
        assert!(info.starts_with("Software: Microsoft Office 365"));
        assert!(get_software_info(&kb, "Notepad++").contains("not found in our database"));
    }

    #[test]
    fn test_troubleshoot_software() {
        let kb = knowledge();
        let steps = troubleshoot_software(&kb, "zoom;no audio in meetings");
        assert!(steps.starts_with("Troubleshooting steps for zoom - audio:"));

        let general = troubleshoot_software(&kb, "slack;won't sync");
        assert!(general.contains("general troubleshooting steps"));
        assert!(troubleshoot_software(&kb, "zoom").starts_with("Invalid input format"));
    }

    #[test]
    fn test_compatibility() {
        let kb = knowledge();
        assert_eq!(
            check_software_compatibility(&kb, "AutoCAD;macOS"),
            "Autocad compatibility with Macos: Not available for macOS. Use AutoCAD for Mac or virtualization."
        );
        assert!(check_software_compatibility(&kb, "autocad;linux").contains("No compatibility information available for Autocad with linux"));
        assert!(check_software_compatibility(&kb, "gimp;windows").contains("with any operating system"));
    }

    #[test]
    fn test_alternatives() {
        let kb = knowledge();
        let alternatives = get_software_alternatives(&kb, "zoom");
        assert!(alternatives.starts_with("Alternatives to Zoom:\n1. Microsoft Teams"));
        assert!(get_software_alternatives(&kb, "vim").contains("No alternative suggestions available for vim"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("adobe creative cloud"), "Adobe Creative Cloud");
    }
}
