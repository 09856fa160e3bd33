use std::time::Duration;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use helpdesk_common::config::config::DirectoryConfig;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::{ConversationLogEntry, Device, Employee, SupportAgentRecord};
use crate::directory::directory::{match_email, match_phone, pick_agent, ContactKind, Directory};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

/// Client for the directory REST service. The bearer token is fetched lazily,
/// cached, and refreshed once when the service answers 401.
#[derive(Debug)]
pub struct HttpDirectory {
    base_url: String,
    username: String,
    password: String,
    client: reqwest::Client,
    token: Mutex<Option<String>>,
}

impl HttpDirectory {

    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::DirectoryRequest { cause: e.to_string() })?;

        Ok(Self {
            base_url: config.baseurl.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            client,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self) -> Result<String> {
        let response = self.client.post(self.url("/login"))
            .json(&LoginRequest { username: &self.username, password: &self.password })
            .send()
            .await
            .map_err(|e| Error::DirectoryAuth { cause: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::DirectoryAuth { cause: format!("login returned {}: {}", status.as_u16(), body) });
        }

        let login = response.json::<LoginResponse>()
            .await
            .map_err(|e| Error::DirectoryAuth { cause: e.to_string() })?;
        let token = login.token.ok_or_else(|| Error::DirectoryAuth { cause: String::from("login response has no token") })?;
        info!("Obtained directory service token");
        Ok(token)
    }

    async fn token(&self, refresh: bool) -> Result<String> {
        let mut cached = self.token.lock().await;
        if !refresh {
            if let Some(token) = cached.as_ref() {
                return Ok(token.clone());
            }
        }
        let token = self.login().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Sends an authorised request, retrying once with a fresh token on 401.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.token(false).await?;
        let response = build(&token).send()
            .await
            .map_err(|e| Error::DirectoryRequest { cause: e.to_string() })?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Directory token rejected, logging in again");
        let token = self.token(true).await?;
        build(&token).send()
            .await
            .map_err(|e| Error::DirectoryRequest { cause: e.to_string() })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        let response = self.send(|token| self.client.get(&url).bearer_auth(token).query(query)).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::DirectoryStatus { path: path.to_string(), status: status.as_u16(), body });
        }
        response.json::<T>()
            .await
            .map_err(|e| Error::DirectoryRequest { cause: e.to_string() })
    }

    async fn employees(&self) -> Result<Vec<Employee>> {
        let employees: Vec<Employee> = self.get_json("/employees", &[]).await?;
        info!("Found {} employees in directory", employees.len());
        Ok(employees)
    }
}

#[async_trait]
impl Directory for HttpDirectory {

    async fn find_employee_by_contact(&self, kind: ContactKind, value: &str) -> Result<Option<Employee>> {
        info!("Searching for employee by {}: {}", kind.as_ref(), value);
        let found = match kind {
            ContactKind::Email => match_email(&self.employees().await?, value).cloned(),
            ContactKind::Phone => match_phone(&self.employees().await?, value).cloned(),
            ContactKind::Id => {
                match self.get_json::<Employee>(&format!("/employees/{}", value.trim()), &[]).await {
                    Ok(employee) => Some(employee),
                    Err(Error::DirectoryStatus { status: 404, .. }) => None,
                    Err(e) => return Err(e),
                }
            }
        };
        match &found {
            Some(employee) => info!("Matched employee {}", employee.name),
            None => warn!("No employee found by {}: {}", kind.as_ref(), value),
        }
        Ok(found)
    }

    async fn get_employee_devices(&self, employee_id: &str) -> Result<Vec<Device>> {
        let devices: Vec<Device> = self.get_json("/devices", &[("employee_id", employee_id)]).await?;
        info!("Found {} devices for employee {}", devices.len(), employee_id);
        Ok(devices)
    }

    async fn find_agent_by_specialization(&self, specialization: &str) -> Result<Option<SupportAgentRecord>> {
        let agents: Vec<SupportAgentRecord> = self.get_json("/agents", &[]).await?;
        let agent = pick_agent(&agents, specialization).cloned();
        match &agent {
            Some(a) => info!("Using support agent {} for {}", a.agent_name, specialization),
            None => warn!("No active support agent found"),
        }
        Ok(agent)
    }

    async fn log_conversation(&self, entry: &ConversationLogEntry) -> Result<bool> {
        let url = self.url("/conversations");
        let response = self.send(|token| self.client.post(&url).bearer_auth(token).json(entry)).await?;
        if response.status() == StatusCode::CREATED {
            info!("Logged conversation message for {}", entry.conversation_id);
            return Ok(true);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!("Failed to log conversation ({}): {}", status, body);
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use helpdesk_common::model::model::ChatMessage;
    use super::*;

    fn directory(url: &str) -> HttpDirectory {
        HttpDirectory::new(&DirectoryConfig {
            baseurl: format!("{}/api", url),
            username: String::from("svc"),
            password: String::from("secret"),
            seed_file: None,
        }).unwrap()
    }

    const EMPLOYEES: &str = r#"[
        {"employee_id": 1, "name": "Ana Lopez", "email": "ana.lopez@corp.com", "phone": "+34 600 123 456"},
        {"employee_id": 2, "name": "Bo Chen", "email": "bo.chen@corp.com", "phone": "+1 555 010 2030"}
    ]"#;

    #[tokio::test]
    async fn test_login_is_cached_across_requests() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let login = server.mock("POST", "/api/login")
            .match_body(Matcher::Json(serde_json::json!({"username": "svc", "password": "secret"})))
            .with_status(200)
            .with_body(r#"{"token": "t-1"}"#)
            .expect(1)
            .create_async().await;
        let employees = server.mock("GET", "/api/employees")
            .match_header("authorization", "Bearer t-1")
            .with_status(200)
            .with_body(EMPLOYEES)
            .expect(2)
            .create_async().await;

        let dir = directory(&server.url());
        let by_phone = dir.find_employee_by_contact(ContactKind::Phone, "0034600123456").await?;
        assert_eq!(by_phone.map(|e| e.name), Some(String::from("Ana Lopez")));
        let by_email = dir.find_employee_by_contact(ContactKind::Email, "BO.CHEN@corp.com").await?;
        assert_eq!(by_email.map(|e| e.employee_id), Some(String::from("2")));

        login.assert_async().await;
        employees.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_token_refreshed_once_on_unauthorized() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let dir = directory(&server.url());
        *dir.token.lock().await = Some(String::from("stale"));

        server.mock("POST", "/api/login")
            .with_status(200)
            .with_body(r#"{"token": "fresh"}"#)
            .expect(1)
            .create_async().await;
        server.mock("GET", "/api/agents")
            .match_header("authorization", "Bearer stale")
            .with_status(401)
            .create_async().await;
        server.mock("GET", "/api/agents")
            .match_header("authorization", "Bearer fresh")
            .with_status(200)
            .with_body(r#"[{"agent_id": 7, "agent_name": "Sam", "specialization": "Password", "status": "Active"}]"#)
            .create_async().await;

        let agent = dir.find_agent_by_specialization("Hardware").await?;
        assert_eq!(agent.map(|a| a.agent_id), Some(String::from("7")));
        Ok(())
    }

    #[tokio::test]
    async fn test_devices_and_missing_employee_id() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/api/login").with_status(200).with_body(r#"{"token": "t"}"#).create_async().await;
        server.mock("GET", "/api/devices")
            .match_query(Matcher::UrlEncoded(String::from("employee_id"), String::from("1")))
            .with_status(200)
            .with_body(r#"[{"device_id": "D001", "device_name": "Latitude 7420", "os_type": "Windows", "os_version": "11", "employee_id": 1}]"#)
            .create_async().await;
        server.mock("GET", "/api/employees/99").with_status(404).with_body("not found").create_async().await;

        let dir = directory(&server.url());
        let devices = dir.get_employee_devices("1").await?;
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].summary(), "Latitude 7420 - Windows 11");
        assert!(dir.find_employee_by_contact(ContactKind::Id, "99").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_log_conversation_success_only_on_created() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/api/login").with_status(200).with_body(r#"{"token": "t"}"#).create_async().await;
        let created = server.mock("POST", "/api/conversations")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "user_id": "1", "agent_id": "7", "message_type": "User input", "issue_status": "In Progress"
            })))
            .with_status(201)
            .with_body("{}")
            .create_async().await;

        let dir = directory(&server.url());
        let entry = ConversationLogEntry::new("conv-1", "1", "7", &ChatMessage::user("my screen flickers"));
        assert!(dir.log_conversation(&entry).await?);
        created.assert_async().await;

        created.remove_async().await;
        server.mock("POST", "/api/conversations").with_status(200).with_body("{}").create_async().await;
        assert!(!dir.log_conversation(&entry).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_login_is_an_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/api/login").with_status(403).with_body("denied").create_async().await;

        let dir = directory(&server.url());
        let result = dir.get_employee_devices("1").await;
        assert!(matches!(result, Err(Error::DirectoryAuth { .. })));
    }
}
