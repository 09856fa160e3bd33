use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use helpdesk_common::config::config::GatewayConfig;
use helpdesk_common::error::error::{Error, Result};
use helpdesk_common::model::model::Role;
use crate::llm::llm::{http_client, request_error, response_error, GenerateText, GenerationSettings, LLMResult};
use crate::llm::prompt::Prompt;

/// Any gateway speaking the OpenAI chat completions protocol (OpenAI, DeepSeek, Qwen).
#[derive(Clone, Debug)]
pub struct OpenAILLM {
    gateway: String,
    api_key: String,
    base_url: String,
    model: String,
    settings: GenerationSettings,
    client: Arc<reqwest::Client>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OpenAIRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<OpenAIRequestMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct OpenAIRequestMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OpenAIGenerateResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<OpenAIGenerateResponseChoice>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<OpenAIGenerateResponseUsage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OpenAIGenerateResponseChoice {
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub index: u32,
    pub message: OpenAIGenerateResponseMessage,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OpenAIGenerateResponseMessage {
    pub content: Option<String>,
    pub role: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OpenAIGenerateResponseUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl OpenAILLM {

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

    fn request(&self, prompt: &Prompt) -> OpenAIRequest {
        let mut messages = vec![OpenAIRequestMessage { role: Role::System, content: prompt.system.clone() }];
        messages.extend(prompt.messages.iter().map(|m| OpenAIRequestMessage { role: m.role, content: m.content.clone() }));

        OpenAIRequest {
            model: self.model.clone(),
            stream: false,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            stop: prompt.stop.clone(),
        }
    }
}

impl LLMResult {
    pub fn from_openai(response: &OpenAIGenerateResponse) -> Option<Self> {
        response.choices.iter()
            .min_by_key(|c| c.index)
            .and_then(|c| c.message.content.clone())
            .map(LLMResult::new)
    }
}

impl GenerateText for OpenAILLM {

    async fn generate(&self, prompt: &Prompt) -> Result<LLMResult> {
        let url_str = format!("{}/v1/chat/completions", self.base_url);
        let request_obj = self.request(prompt);
        debug!("Request Body: {:?}", request_obj);

        let response = self.client.post(&url_str)
            .bearer_auth(&self.api_key)
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

        let res = response.json::<OpenAIGenerateResponse>()
            .await
            .map_err(|e| response_error(&self.gateway, e))?;
        if let Some(usage) = &res.usage {
            info!("{} used {} tokens", self.gateway, usage.total_tokens);
        }

        LLMResult::from_openai(&res).ok_or_else(|| Error::LlmResponse {
            gateway: self.gateway.clone(),
            cause: String::from("response has no message content"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use mockito::Matcher;
    use crate::llm::prompt::PromptMessage;
    use super::*;

    fn gateway(url: &str) -> OpenAILLM {
        gateway_with(url, GenerationSettings::default())
    }

    fn gateway_with(url: &str, settings: GenerationSettings) -> OpenAILLM {
        let config = GatewayConfig {
            baseurl: url.to_string(),
            api_key: String::from("sk-test"),
            model: String::from("deepseek-chat"),
            provider: String::from("openai"),
        };
        OpenAILLM::new("deepseek_gateway", &config, settings).unwrap()
    }

    #[test]
    fn test_parse() {
        let data = r#"{
          "id": "chatcmpl-292e278f",
          "choices": [{"finish_reason": "stop", "index": 0, "message": {"content": "Hello! How can I assist you today?", "role": "assistant"}}],
          "created": 1723733419,
          "model": "deepseek-chat",
          "object": "chat.completion",
          "usage": {"prompt_tokens": 12, "completion_tokens": 10, "total_tokens": 22}
        }"#;
        let response: OpenAIGenerateResponse = serde_json::from_str(data).unwrap();
        assert_eq!(LLMResult::from_openai(&response).unwrap().message, "Hello! How can I assist you today?");
    }

    #[tokio::test]
    async fn test_generate_sends_system_history_and_stop() -> anyhow::Result<()> {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "deepseek-chat",
                "stop": ["\nObservation:"],
                "messages": [
                    {"role": "system", "content": "You are TechBot."},
                    {"role": "user", "content": "my laptop is slow"},
                    {"role": "assistant", "content": "Which model?"},
                    {"role": "user", "content": "Latitude"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "Final Answer: Restart it."}}]}"#)
            .create_async().await;

        let prompt = Prompt::new_messages("You are TechBot.", vec![
            PromptMessage::user("my laptop is slow"),
            PromptMessage::assistant("Which model?"),
            PromptMessage::user("Latitude"),
        ]).with_stop("\nObservation:");

        let result = gateway(&server.url()).generate(&prompt).await?;
        assert_eq!(result.message, "Final Answer: Restart it.");
        mock.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_body("rate limited")
            .create_async().await;

        let result = gateway(&server.url()).generate(&Prompt::new_simple("sys", "hi")).await;
        match result {
            Err(Error::LlmStatus { status, body, .. }) => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_a_response_error() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async().await;

        let result = gateway(&server.url()).generate(&Prompt::new_simple("sys", "hi")).await;
        assert!(matches!(result, Err(Error::LlmResponse { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_gateway_is_a_timeout() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body_from_request(|_| {
                std::thread::sleep(Duration::from_millis(500));
                br#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "late"}}]}"#.to_vec()
            })
            .create_async().await;

        let settings = GenerationSettings { timeout: Duration::from_millis(50), ..Default::default() };
        let result = gateway_with(&server.url(), settings).generate(&Prompt::new_simple("sys", "hi")).await;
        match result {
            Err(e) => {
                assert!(e.is_timeout(), "expected a timeout, got {:?}", e);
                assert!(matches!(e, Error::LlmTimeout { ref gateway } if gateway == "deepseek_gateway"));
            }
            Ok(result) => panic!("unexpected reply: {:?}", result),
        }
    }
}
