use std::time::Duration;
use serde::{Deserialize, Serialize};
use helpdesk_common::config::config::LlmConfig;
use helpdesk_common::error::error::{Error, Result};
use crate::llm::prompt::Prompt;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LLMResult {
    pub message: String,
}

impl LLMResult {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// Sampling and transport settings shared by every gateway.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl From<&LlmConfig> for GenerationSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 1000, timeout: Duration::from_secs(30) }
    }
}

pub trait GenerateText {

    async fn generate(&self, prompt: &Prompt) -> Result<LLMResult>;
}

/// Builds the shared HTTP client used by a gateway.
pub(crate) fn http_client(settings: &GenerationSettings) -> reqwest::Result<reqwest::Client> {
    reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(settings.timeout)
        .build()
}

/// Maps a failed send, treating an expired client timeout as a gateway timeout.
pub(crate) fn request_error(gateway: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::LlmTimeout { gateway: gateway.to_string() }
    } else {
        Error::LlmRequest { gateway: gateway.to_string(), cause: e.to_string() }
    }
}

/// Maps a failed body read. The client timeout still applies while the body streams.
pub(crate) fn response_error(gateway: &str, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::LlmTimeout { gateway: gateway.to_string() }
    } else {
        Error::LlmResponse { gateway: gateway.to_string(), cause: e.to_string() }
    }
}
