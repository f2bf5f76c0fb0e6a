//! OpenAI chat-completions backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{SynthesisError, Synthesizer};
use crate::page_extractor::PageSignals;
use crate::utils::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SYNTHESIS_API_BASE, DEFAULT_SYNTHESIS_MODEL};

const SYSTEM_PROMPT: &str = "You are a web semantics expert. Given a summary of a web page, \
produce schema.org structured data describing it as JSON-LD. Return ONLY a JSON object. \
Use \"@context\": \"https://schema.org\". Include \"@type\", \"url\", \"name\" and \"description\" \
when possible, and nest related entities (organizations, people, addresses, offers) as objects.";

const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Synthesizer backed by an OpenAI-compatible chat-completions endpoint
#[derive(Clone)]
pub struct OpenAiSynthesizer {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSynthesizer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiSynthesizer {
    /// # Errors
    ///
    /// Returns [`SynthesisError::Transport`] if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SynthesisError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS * 2))
            .build()
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_SYNTHESIS_API_BASE.to_string(),
            model: DEFAULT_SYNTHESIS_MODEL.to_string(),
        })
    }

    /// Build from `OPENAI_API_KEY`.
    ///
    /// # Errors
    ///
    /// [`SynthesisError::Disabled`] when the variable is unset or empty.
    pub fn from_env() -> Result<Self, SynthesisError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Self::new(key.trim()),
            _ => Err(SynthesisError::Disabled),
        }
    }

    /// Set a custom base URL (proxies, compatible providers, test servers)
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn user_prompt(signals: &PageSignals) -> String {
        let mut prompt = format!("URL: {}\nTitle: {}\n", signals.url, signals.title);
        if let Some(description) = &signals.description {
            prompt.push_str("Description: ");
            prompt.push_str(description);
            prompt.push('\n');
        }
        prompt.push_str("Content excerpt:\n");
        prompt.push_str(&signals.text_excerpt);
        prompt
    }
}

#[async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn generate(&self, signals: &PageSignals) -> Result<Value, SynthesisError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: Self::user_prompt(signals),
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SynthesisError::Timeout
                } else {
                    SynthesisError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Quota(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Backend {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::MalformedResponse(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SynthesisError::MalformedResponse("response has no content".into()))?;

        log::debug!("{} returned {} chars for {}", self.model, content.len(), signals.url);

        serde_json::from_str(content.trim())
            .map_err(|e| SynthesisError::MalformedResponse(format!("content is not JSON: {e}")))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
