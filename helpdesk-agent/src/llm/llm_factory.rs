use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use metrics::counter;
use tracing::{info, warn};
use helpdesk_common::config::config::Config;
use helpdesk_common::error::error::{Error, Result};
use crate::llm::anthropic_llm::AnthropicLLM;
use crate::llm::llm::{GenerateText, GenerationSettings, LLMResult};
use crate::llm::openai_llm::OpenAILLM;
use crate::llm::prompt::Prompt;
use crate::llm::scripted_llm::ScriptedLLM;

#[derive(Clone, Debug)]
pub enum LLM {
    AnthropicLLM(AnthropicLLM),
    OpenAILLM(OpenAILLM),
    ScriptedLLM(ScriptedLLM),
}

impl LLM {

    pub fn gateway(&self) -> &str {
        match self {
            LLM::AnthropicLLM(llm) => llm.gateway(),
            LLM::OpenAILLM(llm) => llm.gateway(),
            LLM::ScriptedLLM(llm) => llm.gateway(),
        }
    }

    pub async fn execute(&self, prompt: &Prompt) -> Result<LLMResult> {
        let result = match self {
            LLM::AnthropicLLM(llm) => llm.generate(prompt).await,
            LLM::OpenAILLM(llm) => llm.generate(prompt).await,
            LLM::ScriptedLLM(llm) => llm.generate(prompt).await,
        };
        if let Err(e) = &result {
            warn!("LLM call to {} failed: {}", self.gateway(), e);
            counter!("helpdesk_llm_failures_total", "gateway" => self.gateway().to_string()).increment(1);
        }
        result
    }
}

impl From<ScriptedLLM> for LLM {
    fn from(llm: ScriptedLLM) -> Self {
        LLM::ScriptedLLM(llm)
    }
}

struct LLMRegistry {
    items: HashMap<String, LLM>,
}

impl LLMRegistry {
    fn new() -> Self {
        LLMRegistry { items: HashMap::new() }
    }

    fn register(&mut self, key: String, item: LLM) {
        self.items.insert(key, item);
    }

    fn get(&self, key: &str) -> Option<&LLM> {
        self.items.get(key)
    }
}

/// Builds gateway clients from config and reuses them per gateway name.
pub struct LLMFactory {
    config: Config,
    registry: Arc<Mutex<LLMRegistry>>,
}

impl LLMFactory {

    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Arc::new(Mutex::new(LLMRegistry::new())),
        }
    }

    /// The gateway named by `llm.gateway`.
    pub fn default_instance(&self) -> Result<LLM> {
        let name = self.config.config.llm.gateway.clone();
        self.instance(&name)
    }

    pub fn instance(&self, key: &str) -> Result<LLM> {
        let mut registry = self.registry.lock().map_err(|e| Error::LlmRequest {
            gateway: key.to_string(),
            cause: e.to_string(),
        })?;

        if let Some(llm) = registry.get(key) {
            return Ok(llm.clone());
        }

        let gateway = self.config.gateway(key)?;
        let settings = GenerationSettings::from(&self.config.config.llm);
        let llm = match gateway.provider.to_lowercase().as_str() {
            "openai" | "deepseek" | "qwen" => LLM::OpenAILLM(OpenAILLM::new(key, gateway, settings)?),
            "anthropic" => LLM::AnthropicLLM(AnthropicLLM::new(key, gateway, settings)?),
            "scripted" => LLM::ScriptedLLM(ScriptedLLM::new(key)),
            other => return Err(Error::UnsupportedProvider { provider: other.to_string() }),
        };
        info!("Created {} client for gateway {} ({})", gateway.provider, key, gateway.model);

        registry.register(key.to_string(), llm.clone());
        Ok(llm)
    }
}
