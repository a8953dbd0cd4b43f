// AI Responder - produces a reply string for a single input string
// Stateless: no conversation memory, even though prior turns sit in the store

use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// System framing sent with every completion request.
const SYSTEM_PROMPT: &str = "You are an AI assistant for WhatsUp social media platform. \
    Be friendly, helpful, and engaging. Keep responses conversational and not too long.";

/// Output-length cap for the completion call.
const MAX_TOKENS: u32 = 150;

/// Local replies used when no completion service is configured, or when the
/// configured one fails. Never surfaced to the user as an error.
const CANNED_REPLIES: &[&str] = &[
    "That's interesting! Tell me more about it.",
    "Thanks for sharing! How has your day been otherwise?",
    "I hear you! What else is on your mind?",
    "Sounds great! Anything exciting coming up for you?",
    "I'm sorry, I'm having trouble connecting right now. Please try again later.",
];

/// Seam for the external completion service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, input: &str) -> anyhow::Result<String>;
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatTurn<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI chat-completions backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, input: &str) -> anyhow::Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatTurn {
                    role: "user",
                    content: input,
                },
            ],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatCompletionResponse>()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("completion response had no content"))
    }
}

/// The chat stub: delegates to the configured backend when available and
/// recovers locally on any failure.
#[derive(Clone)]
pub struct Responder {
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl Responder {
    /// Build from an optional API key; no key means canned replies only.
    pub fn from_api_key(api_key: Option<String>, model: String) -> Self {
        Self {
            backend: api_key
                .map(|key| Arc::new(OpenAiBackend::new(key, model)) as Arc<dyn CompletionBackend>),
        }
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn canned_only() -> Self {
        Self { backend: None }
    }

    /// Produce a reply for `input`. Infallible by design: a backend failure
    /// degrades to a canned reply rather than an error.
    pub async fn reply(&self, input: &str) -> String {
        if let Some(backend) = &self.backend {
            match backend.complete(input).await {
                Ok(reply) => return reply,
                Err(err) => {
                    warn!("responder: completion backend failed, falling back: {}", err);
                }
            }
        }
        Self::canned_reply()
    }

    fn canned_reply() -> String {
        CANNED_REPLIES
            .choose(&mut rand::rng())
            .map(|reply| reply.to_string())
            .unwrap_or_else(|| "Hello!".to_string())
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(&self, _input: &str) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    struct EchoBackend;

    #[async_trait]
    impl CompletionBackend for EchoBackend {
        async fn complete(&self, input: &str) -> anyhow::Result<String> {
            Ok(format!("echo: {}", input))
        }
    }

    #[tokio::test]
    async fn test_unconfigured_responder_uses_canned_reply() {
        let responder = Responder::canned_only();
        let reply = responder.reply("hello").await;
        assert!(CANNED_REPLIES.contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back() {
        let responder = Responder::with_backend(Arc::new(FailingBackend));
        let reply = responder.reply("hello").await;
        assert!(CANNED_REPLIES.contains(&reply.as_str()));
    }

    #[tokio::test]
    async fn test_backend_reply_passes_through() {
        let responder = Responder::with_backend(Arc::new(EchoBackend));
        assert_eq!(responder.reply("hello").await, "echo: hello");
    }
}
