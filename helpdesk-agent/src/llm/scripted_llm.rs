use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use helpdesk_common::error::error::{Error, Result};
use crate::llm::llm::{GenerateText, LLMResult};
use crate::llm::prompt::Prompt;

/// In-process model that replays queued replies and records every prompt.
///
/// With nothing queued it fails, so callers take their fallback path. This is
/// what the `scripted` provider uses for offline runs.
#[derive(Clone, Debug, Default)]
pub struct ScriptedLLM {
    gateway: String,
    replies: Arc<Mutex<VecDeque<Result<String>>>>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

impl ScriptedLLM {

    pub fn new(gateway: &str) -> Self {
        Self { gateway: gateway.to_string(), ..Default::default() }
    }

    pub fn with_replies<I, S>(gateway: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let llm = Self::new(gateway);
        for reply in replies {
            llm.push_reply(reply);
        }
        llm
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.push(Ok(reply.into()));
    }

    pub fn push_error(&self, error: Error) {
        self.push(Err(error));
    }

    fn push(&self, item: Result<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(item);
        }
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn poisoned(&self) -> Error {
        Error::LlmResponse { gateway: self.gateway.clone(), cause: String::from("scripted model lock poisoned") }
    }
}

impl GenerateText for ScriptedLLM {

    async fn generate(&self, prompt: &Prompt) -> Result<LLMResult> {
        self.prompts.lock().map_err(|_| self.poisoned())?.push(prompt.clone());

        let next = self.replies.lock().map_err(|_| self.poisoned())?.pop_front();
        match next {
            Some(reply) => reply.map(LLMResult::new),
            None => Err(Error::LlmResponse {
                gateway: self.gateway.clone(),
                cause: String::from("no scripted reply available"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_fails() {
        let llm = ScriptedLLM::with_replies("test", ["one", "two"]);
        llm.push_error(Error::LlmTimeout { gateway: String::from("test") });

        assert_eq!(llm.generate(&Prompt::new_simple("s", "a")).await.unwrap().message, "one");
        assert_eq!(llm.generate(&Prompt::new_simple("s", "b")).await.unwrap().message, "two");
        assert!(llm.generate(&Prompt::new_simple("s", "c")).await.unwrap_err().is_timeout());
        assert!(llm.generate(&Prompt::new_simple("s", "d")).await.is_err());

        let seen: Vec<String> = llm.prompts().iter().filter_map(|p| p.last_user().map(String::from)).collect();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }
}
