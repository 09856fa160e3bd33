use std::sync::Arc;
use serde::Deserialize;
use crate::knowledge::knowledge::{find_entry, KnowledgeBase};
use crate::tool::tool::{KnowledgeTool, Tool};

/// Asset inventory tools, shared by the hardware agent.
pub fn device_tools(knowledge: Arc<KnowledgeBase>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(KnowledgeTool::new(
            "get_device_specs",
            "Get detailed specifications for a device. Input should be the device ID.",
            knowledge.clone(),
            get_device_specs,
        )),
        Arc::new(KnowledgeTool::new(
            "get_device_history",
            "Get maintenance and issue history for a device. Input should be the device ID.",
            knowledge.clone(),
            get_device_history,
        )),
        Arc::new(KnowledgeTool::new(
            "check_device_software_compatibility",
            "Check if a software is compatible with a device. Input should be a JSON string with device_id and software_name, or device_id;software_name.",
            knowledge.clone(),
            check_device_software_compatibility,
        )),
        Arc::new(KnowledgeTool::new(
            "get_common_issue_solutions",
            "Get solutions for common issues with a device type. Input should be the device type (laptop, desktop, printer, monitor).",
            knowledge,
            get_common_issue_solutions,
        )),
    ]
}

pub fn get_device_specs(knowledge: &KnowledgeBase, device_id: &str) -> String {
    let Some(d) = knowledge.devices.device(device_id) else {
        return format!("Device ID {} not found in the asset database.", device_id.trim());
    };
    format!(
        "Specifications for device {}:\nType: {}\nManufacturer: {}\nModel: {}\nOS: {} {}\nCPU: {}\nRAM: {}\nStorage: {}\nDisplay: {}\nGraphics: {}\nNetwork: {}\nLast Updated: {}",
        d.device_id, d.device_type, d.manufacturer, d.model, d.os, d.os_version,
        d.cpu, d.ram, d.storage, d.display, d.graphics, d.network, d.last_updated
    )
}

pub fn get_device_history(knowledge: &KnowledgeBase, device_id: &str) -> String {
    let device = knowledge.devices.device(device_id);
    match device {
        Some(d) if !d.history.is_empty() => {
            let events: Vec<String> = d.history.iter()
                .map(|e| format!("- {} [{}]: {}", e.date, e.kind, e.description))
                .collect();
            format!("History for device {}:\n{}", d.device_id, events.join("\n"))
        }
        _ => format!("No history found for device ID {}.", device_id.trim()),
    }
}

#[derive(Deserialize)]
struct CompatibilityQuery {
    device_id: String,
    software_name: String,
}

fn parse_compatibility_query(input: &str) -> Option<CompatibilityQuery> {
    if let Ok(query) = serde_json::from_str::<CompatibilityQuery>(input) {
        return Some(query);
    }
    let (device_id, software_name) = input.split_once(';')?;
    Some(CompatibilityQuery {
        device_id: device_id.trim().to_string(),
        software_name: software_name.trim().to_string(),
    })
}

pub fn check_device_software_compatibility(knowledge: &KnowledgeBase, input: &str) -> String {
    let Some(query) = parse_compatibility_query(input) else {
        return String::from("Invalid input format. Please provide input as JSON with device_id and software_name, or as 'device_id;software_name'.");
    };
    let software_name = query.software_name.as_str();

    let Some(device) = knowledge.devices.device(&query.device_id) else {
        return format!("Device ID {} not found in the asset database.", query.device_id);
    };

    let software_lower = software_name.to_lowercase();
    let Some(requirement) = knowledge.devices.software_requirements.iter()
        .find(|r| software_lower.contains(&r.software)) else {
        return format!("No compatibility information found for {}.", software_name);
    };

    let Some(platform) = device.platform().and_then(|p| requirement.platforms.get(p)) else {
        return format!("{} is not compatible with {}.", software_name, device.os);
    };

    if platform.compatible == Some(false) {
        return format!(
            "{} is not compatible with {}. {}",
            software_name, device.os, platform.notes.as_deref().unwrap_or("")
        ).trim_end().to_string();
    }

    let summary = format!("(ID: {}, {}, {} {})", device.device_id, device.device_type, device.os, device.os_version);
    let recommended = platform.recommended_ram_gb.unwrap_or(0);
    if device.ram_gb() < recommended {
        format!(
            "{} may not work optimally with the device {}.\n\nCompatibility issues:\n- RAM: Device has {} but {} recommends {}GB",
            software_name, summary, device.ram, software_name, recommended
        )
    } else {
        format!("{} is compatible with the device {}.", software_name, summary)
    }
}

pub fn get_common_issue_solutions(knowledge: &KnowledgeBase, device_type: &str) -> String {
    let query = device_type.trim().to_lowercase();
    let Some(entry) = find_entry(&knowledge.devices.common_issues, &query, |c| c.device_type.as_str()) else {
        return format!("No common issue solutions found for device type: {}", device_type.trim());
    };

    let mut out = format!("Common issues and solutions for {} devices:\n", entry.device_type);
    for issue in &entry.issues {
        out.push_str(&format!("\n{}:\n", issue.issue));
        for (i, solution) in issue.solutions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, solution));
        }
    }
    out.trim_end().to_string()
}
