use std::fmt::Debug;
use async_trait::async_trait;
use helpdesk_common::error::error::Result;
use helpdesk_common::model::model::{ConversationLogEntry, Device, Employee, SupportAgentRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ContactKind {
    Email,
    Phone,
    Id,
}

/// The existing employee/device/agent database the assistant reads from and logs to.
#[async_trait]
pub trait Directory: Send + Sync + Debug {
    async fn find_employee_by_contact(&self, kind: ContactKind, value: &str) -> Result<Option<Employee>>;

    async fn get_employee_devices(&self, employee_id: &str) -> Result<Vec<Device>>;

    async fn find_agent_by_specialization(&self, specialization: &str) -> Result<Option<SupportAgentRecord>>;

    /// Returns `true` when the service accepted the entry.
    async fn log_conversation(&self, entry: &ConversationLogEntry) -> Result<bool>;
}

/// Keeps digits and `+`.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect()
}

fn last_digits(value: &str, n: usize) -> &str {
    let len = value.len();
    if len >= n { &value[len - n..] } else { value }
}

/// Exact match on the normalised number first, then a partial match
/// (containment either way, or the same last 8 digits).
pub fn match_phone<'a>(employees: &'a [Employee], phone: &str) -> Option<&'a Employee> {
    let search = normalize_phone(phone);
    if search.is_empty() {
        return None;
    }
    let alternative = search.strip_prefix('+').map(str::to_string);

    let normalized: Vec<(&Employee, String)> = employees.iter()
        .filter_map(|e| e.phone.as_deref().map(|p| (e, normalize_phone(p))))
        .filter(|(_, p)| !p.is_empty())
        .collect();

    let exact = normalized.iter().find(|(_, p)| {
        *p == search || alternative.as_deref().is_some_and(|alt| p.replace('+', "") == alt)
    });
    if let Some((employee, _)) = exact {
        return Some(*employee);
    }

    normalized.iter()
        .find(|(_, p)| {
            p.contains(&search) || search.contains(p.as_str()) || last_digits(p, 8) == last_digits(&search, 8)
        })
        .map(|(employee, _)| *employee)
}

/// Case-insensitive exact match, then substring match.
pub fn match_email<'a>(employees: &'a [Employee], email: &str) -> Option<&'a Employee> {
    let search = email.trim().to_lowercase();
    if search.is_empty() {
        return None;
    }
    let with_email = || employees.iter()
        .filter_map(|e| e.email.as_deref().map(|m| (e, m.to_lowercase())));

    with_email().find(|(_, m)| *m == search)
        .or_else(|| with_email().find(|(_, m)| m.contains(&search)))
        .map(|(employee, _)| employee)
}

/// First active agent with the specialisation, otherwise the first active agent.
pub fn pick_agent<'a>(agents: &'a [SupportAgentRecord], specialization: &str) -> Option<&'a SupportAgentRecord> {
    agents.iter()
        .find(|a| a.is_active() && a.specialization == specialization)
        .or_else(|| agents.iter().find(|a| a.is_active()))
}
