use std::sync::Arc;
use crate::device::device_tools::device_tools;
use crate::directory::directory::Directory;
use crate::directory::directory_tools::EmployeeDevicesTool;
use crate::knowledge::knowledge::{find_entry, KnowledgeBase};
use crate::tool::tool::{split_pair, KnowledgeTool, Tool};

pub fn hardware_tools(knowledge: Arc<KnowledgeBase>, directory: Arc<dyn Directory>) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(EmployeeDevicesTool::new(directory)),
        Arc::new(KnowledgeTool::new(
            "check_device_status",
            "Check the status of a specific device. Input should be a device ID.",
            knowledge.clone(),
            check_device_status,
        )),
        Arc::new(KnowledgeTool::new(
            "troubleshoot_hardware",
            "Get troubleshooting steps for common hardware issues. Input should be device type (laptop, desktop, printer) and issue description separated by a semicolon.",
            knowledge.clone(),
            troubleshoot_hardware,
        )),
    ];
    tools.extend(device_tools(knowledge));
    tools
}

pub fn check_device_status(knowledge: &KnowledgeBase, device_id: &str) -> String {
    match knowledge.devices.device(device_id) {
        Some(device) => {
            let issues = if device.status.issues_detected.is_empty() {
                String::from("None")
            } else {
                device.status.issues_detected.join(", ")
            };
            format!(
                "Device Status: {}\nLast Checked: {}\nIssues: {}",
                device.status.status, device.status.last_check, issues
            )
        }
        None => String::from("Device not found in monitoring system."),
    }
}

pub fn troubleshoot_hardware(knowledge: &KnowledgeBase, input: &str) -> String {
    let Some((device_type, issue)) = split_pair(input) else {
        return String::from("Invalid input format. Please provide device type and issue description separated by a semicolon.");
    };

    let Some(device) = knowledge.hardware.troubleshooting.iter().find(|d| d.device_type == device_type) else {
        return format!("No troubleshooting information available for device type: {}", device_type);
    };

    match find_entry(&device.issues, &issue, |i| i.issue.as_str()) {
        Some(known) => format!("Troubleshooting steps for {} - {}:\n{}", device_type, known.issue, known.steps),
        None => format!(
            "No specific troubleshooting steps found for '{}' with {}. Here are general troubleshooting steps:\n{}",
            issue, device_type, knowledge.hardware.general_steps
        ),
    }
}
