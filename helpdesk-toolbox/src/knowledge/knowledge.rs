use std::collections::HashMap;
use serde::Deserialize;
use helpdesk_common::error::error::{Error, Result};

const HARDWARE_JSON: &str = include_str!("../../resources/knowledge/hardware.json");
const SOFTWARE_JSON: &str = include_str!("../../resources/knowledge/software.json");
const PASSWORD_JSON: &str = include_str!("../../resources/knowledge/password.json");
const DEVICES_JSON: &str = include_str!("../../resources/knowledge/devices.json");

/// Reference data the knowledge tools answer from.
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    pub hardware: HardwareKnowledge,
    pub software: SoftwareKnowledge,
    pub password: PasswordKnowledge,
    pub devices: DeviceInventory,
}

impl KnowledgeBase {

    /// Parses the knowledge files compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            hardware: parse("hardware", HARDWARE_JSON)?,
            software: parse("software", SOFTWARE_JSON)?,
            password: parse("password", PASSWORD_JSON)?,
            devices: parse("devices", DEVICES_JSON)?,
        })
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, source: &str) -> Result<T> {
    serde_json::from_str(source).map_err(|e| Error::ConfigParse {
        path: format!("knowledge/{}.json", name),
        cause: e.to_string(),
    })
}

#[derive(Clone, Debug, Deserialize)]
pub struct IssueSteps {
    pub issue: String,
    pub steps: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceIssues {
    pub device_type: String,
    pub issues: Vec<IssueSteps>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HardwareKnowledge {
    pub troubleshooting: Vec<DeviceIssues>,
    pub general_steps: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SoftwareInfo {
    pub key: String,
    pub name: String,
    pub description: String,
    pub current_version: String,
    pub support_link: String,
    pub license_type: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SoftwareIssues {
    pub software: String,
    pub issues: Vec<IssueSteps>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OsStatus {
    pub os: String,
    pub status: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SoftwareCompatibility {
    pub software: String,
    pub systems: Vec<OsStatus>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Alternative {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SoftwareAlternatives {
    pub software: String,
    pub options: Vec<Alternative>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SoftwareKnowledge {
    pub catalog: Vec<SoftwareInfo>,
    pub troubleshooting: Vec<SoftwareIssues>,
    pub general_steps: String,
    pub compatibility: Vec<SoftwareCompatibility>,
    pub alternatives: Vec<SoftwareAlternatives>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SystemEntry {
    pub system: String,
    #[serde(alias = "procedure", alias = "policy", alias = "info")]
    pub text: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MfaIssue {
    pub issue: String,
    pub help: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MfaSystem {
    pub system: String,
    pub issues: Vec<MfaIssue>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PasswordKnowledge {
    pub reset_procedures: Vec<SystemEntry>,
    pub reset_generic: String,
    pub policies: Vec<SystemEntry>,
    pub policy_generic: String,
    pub mfa: Vec<MfaSystem>,
    pub mfa_generic: String,
    pub lockout: Vec<SystemEntry>,
    pub lockout_generic: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceStatus {
    pub status: String,
    pub last_check: String,
    pub uptime: String,
    pub cpu_usage: String,
    pub memory_usage: String,
    pub disk_usage: String,
    pub issues_detected: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HistoryEvent {
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceRecord {
    pub device_id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub manufacturer: String,
    pub model: String,
    pub os: String,
    pub os_version: String,
    pub cpu: String,
    pub ram: String,
    pub storage: String,
    pub display: String,
    pub graphics: String,
    pub network: String,
    pub last_updated: String,
    pub status: DeviceStatus,
    pub history: Vec<HistoryEvent>,
}

impl DeviceRecord {

    /// Installed memory in whole gigabytes, 0 when not expressed in GB.
    pub fn ram_gb(&self) -> u32 {
        self.ram.strip_suffix("GB")
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0)
    }

    pub fn platform(&self) -> Option<&'static str> {
        let os = self.os.to_lowercase();
        if os.contains("windows") {
            Some("windows")
        } else if os.contains("macos") {
            Some("macos")
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommonIssue {
    pub issue: String,
    pub solutions: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommonIssues {
    pub device_type: String,
    pub issues: Vec<CommonIssue>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlatformRequirement {
    #[serde(default)]
    pub recommended_ram_gb: Option<u32>,
    #[serde(default)]
    pub compatible: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SoftwareRequirement {
    pub software: String,
    pub platforms: HashMap<String, PlatformRequirement>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeviceInventory {
    pub devices: Vec<DeviceRecord>,
    pub common_issues: Vec<CommonIssues>,
    pub software_requirements: Vec<SoftwareRequirement>,
}

impl DeviceInventory {
    pub fn device(&self, device_id: &str) -> Option<&DeviceRecord> {
        let device_id = device_id.trim();
        self.devices.iter().find(|d| d.device_id.eq_ignore_ascii_case(device_id))
    }
}

/// Key and query match when either contains the other.
pub fn mutual_match(key: &str, query: &str) -> bool {
    !query.is_empty() && (key.contains(query) || query.contains(key))
}

/// Exact key first, then the first key that mutually matches `query`.
///
/// `query` is expected to be lower-cased already.
pub fn find_entry<'a, T>(entries: &'a [T], query: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    entries.iter()
        .find(|e| key(e) == query)
        .or_else(|| entries.iter().find(|e| mutual_match(key(e), query)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_knowledge_parses() {
        let knowledge = KnowledgeBase::embedded().unwrap();
        assert_eq!(knowledge.hardware.troubleshooting.len(), 3);
        assert_eq!(knowledge.software.catalog.len(), 5);
        assert_eq!(knowledge.devices.devices.len(), 5);
        assert!(knowledge.password.policies.iter().any(|p| p.system == "windows"));
    }

    #[test]
    fn test_device_helpers() {
        let knowledge = KnowledgeBase::embedded().unwrap();
        let laptop = knowledge.devices.device("d001").unwrap();
        assert_eq!(laptop.ram_gb(), 16);
        assert_eq!(laptop.platform(), Some("windows"));

        let printer = knowledge.devices.device("D005").unwrap();
        assert_eq!(printer.ram_gb(), 0);
        assert_eq!(printer.platform(), None);
    }

    #[test]
    fn test_find_entry_prefers_exact_key() {
        let keys = vec!["slow", "slow performance"];
        assert_eq!(find_entry(&keys, "slow performance", |k| *k), Some(&"slow performance"));
        assert_eq!(find_entry(&keys, "very slow today", |k| *k), Some(&"slow"));
        assert_eq!(find_entry(&keys, "", |k| *k), None);
    }
}
