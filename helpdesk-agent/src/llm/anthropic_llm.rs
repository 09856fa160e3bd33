use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use helpdesk_common::config::config::GatewayConfig;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::Role;
use crate::llm::llm::{http_client, request_error, response_error, GenerateText, GenerationSettings, LLMResult};
use crate::llm::prompt::Prompt;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone, Debug)]
pub struct AnthropicLLM {
    gateway: String,
    api_key: String,
    base_url: String,
    model: String,
    settings: GenerationSettings,
    client: Arc<reqwest::Client>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnthropicMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<AnthropicMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnthropicGenerateResponse {
    pub content: Vec<Content>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Content {
    pub r#type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl AnthropicLLM {

    pub fn new(gateway: &str, config: &GatewayConfig, settings: GenerationSettings) -> Result<Self> {
        let client = http_client(&settings).map_err(|e| Error::LlmRequest {
            gateway: gateway.to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self {
            gateway: gateway.to_string(),
            api_key: config.api_key.clone(),
            base_url: config.baseurl.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            settings,
            client: Arc::new(client),
        })
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    /// System-role history entries are folded into the system prompt; the
    /// Messages API only accepts user and assistant turns.
    fn request(&self, prompt: &Prompt) -> AnthropicRequest {
        let mut system = prompt.system.clone();
        let mut messages = Vec::new();
        for message in &prompt.messages {
            match message.role {
                Role::System => {
                    system.push_str("\n\n");
                    system.push_str(&message.content);
                }
                role => messages.push(AnthropicMessage { role, content: message.content.clone() }),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            system,
            messages,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stop_sequences: prompt.stop.clone(),
        }
    }
}

impl LLMResult {
    pub fn from_anthropic(response: &AnthropicGenerateResponse) -> Option<Self> {
        let text: Vec<&str> = response.content.iter()
            .filter(|c| c.r#type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(LLMResult::new(text.join("")))
        }
    }
}

impl GenerateText for AnthropicLLM {

    async fn generate(&self, prompt: &Prompt) -> Result<LLMResult> {
        let url_str = format!("{}/v1/messages", self.base_url);
        let request_obj = self.request(prompt);
        debug!("Request Body: {:?}", request_obj);

        let response = self.client.post(&url_str)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("User-Agent", "Helpdesk Assistant")
            .json(&request_obj)
            .send()
            .await
            .map_err(|e| request_error(&self.gateway, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LlmStatus { gateway: self.gateway.clone(), status: status.as_u16(), body });
        }

        let res = response.json::<AnthropicGenerateResponse>()
            .await
            .map_err(|e| response_error(&self.gateway, e))?;
        if let Some(usage) = &res.usage {
            info!("{} used {} input / {} output tokens", self.gateway, usage.input_tokens, usage.output_tokens);
        }

        LLMResult::from_anthropic(&res).ok_or_else(|| Error::LlmResponse {
            gateway: self.gateway.clone(),
            cause: String::from("response has no text content"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use mockito::Matcher;
    use crate::llm::prompt::PromptMessage;
    use super::*;

    fn gateway(url: &str) -> AnthropicLLM {
        gateway_with(url, GenerationSettings::default())
    }

    fn gateway_with(url: &str, settings: GenerationSettings) -> AnthropicLLM {
        let config = GatewayConfig {
            baseurl: url.to_string(),
            api_key: String::from("ak-test"),
            model: String::from("claude-3-5-sonnet-20240620"),
            provider: String::from("anthropic"),
        };
        AnthropicLLM::new("anthropic_gateway", &config, settings).unwrap()
    }

    #[test]
    fn test_system_messages_fold_into_system_prompt() {
        let prompt = Prompt::new_messages("Base.", vec![
            PromptMessage { role: Role::System, content: String::from("User is Ana.") },
            PromptMessage::user("hello"),
        ]);
        let request = gateway("http://localhost").request(&prompt);
        assert_eq!(request.system, "Base.\n\nUser is Ana.");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_generate() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/v1/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "system": "You are SecurityBot.",
                "stop_sequences": ["\nObservation:"]
            })))
            .with_status(200)
            .with_body(r#"{"content": [{"type": "text", "text": "Final Answer: "}, {"type": "text", "text": "Use the portal."}], "model": "claude", "stop_reason": "end_turn", "usage": {"input_tokens": 10, "output_tokens": 5}}"#)
            .create_async().await;

        let prompt = Prompt::new_simple("You are SecurityBot.", "forgot my password").with_stop("\nObservation:");
        let result = gateway(&server.url()).generate(&prompt).await?;
        assert_eq!(result.message, "Final Answer: Use the portal.");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_gateway_is_a_timeout() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/messages")
            .with_status(200)
            .with_body_from_request(|_| {
                std::thread::sleep(Duration::from_millis(500));
                br#"{"content": [{"type": "text", "text": "late"}]}"#.to_vec()
            })
            .create_async().await;

        let settings = GenerationSettings { timeout: Duration::from_millis(50), ..Default::default() };
        let result = gateway_with(&server.url(), settings).generate(&Prompt::new_simple("sys", "hi")).await;
        match result {
            Err(e) => assert!(e.is_timeout(), "expected a timeout, got {:?}", e),
            Ok(result) => panic!("unexpected reply: {:?}", result),
        }
    }
}
