//! Schema synthesis for pages without embedded structured data.
//!
//! The generative backend is a swappable [`Synthesizer`]. The
//! [`SynthesisAdapter`] wraps it with the engine's policy: bounded input
//! signals, a small bounded retry budget with exponential backoff, and shape
//! validation of whatever the backend returns.

pub mod openai;

pub use openai::OpenAiSynthesizer;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::SynthesisOptions;
use crate::page_extractor::{CandidateOrigin, PageRecord, PageSignals, SchemaCandidate, page_signals};
use crate::utils::{
    DEFAULT_MAX_SIGNAL_CHARS, DEFAULT_SYNTHESIS_BACKOFF_MS, DEFAULT_SYNTHESIS_RETRIES,
    MAX_BACKOFF_MS,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    /// No backend is configured
    #[error("Synthesis is disabled (no backend configured)")]
    Disabled,

    #[error("Synthesis backend timed out")]
    Timeout,

    #[error("Synthesis backend quota exceeded: {0}")]
    Quota(String),

    #[error("Synthesis backend returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Malformed synthesis response: {0}")]
    MalformedResponse(String),

    #[error("Synthesis transport error: {0}")]
    Transport(String),
}

impl SynthesisError {
    /// Whether another attempt could plausibly succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Disabled => false,
            Self::Backend { status, .. } => *status >= 500,
            Self::Timeout | Self::Quota(_) | Self::MalformedResponse(_) | Self::Transport(_) => {
                true
            }
        }
    }

    const fn delay_multiplier(&self) -> u64 {
        match self {
            Self::Quota(_) => 3,
            _ => 1,
        }
    }
}

/// External generative capability: bounded page signals in, typed-object
/// tree out.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn generate(&self, signals: &PageSignals) -> Result<Value, SynthesisError>;

    /// Short name used in logs
    fn name(&self) -> &str {
        "synthesizer"
    }
}

/// Backend used when no API key is configured; every call fails with
/// [`SynthesisError::Disabled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSynthesizer;

#[async_trait]
impl Synthesizer for DisabledSynthesizer {
    async fn generate(&self, _signals: &PageSignals) -> Result<Value, SynthesisError> {
        Err(SynthesisError::Disabled)
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Pick the synthesis backend for a session: the OpenAI-compatible backend
/// when `OPENAI_API_KEY` is set, otherwise [`DisabledSynthesizer`].
#[must_use]
pub fn synthesizer_from_env(options: &SynthesisOptions) -> Arc<dyn Synthesizer> {
    match OpenAiSynthesizer::from_env() {
        Ok(backend) => {
            let backend = backend
                .with_base_url(options.api_base.as_str())
                .with_model(options.model.as_str());
            log::info!("Synthesis enabled with model {}", backend.model());
            Arc::new(backend)
        }
        Err(SynthesisError::Disabled) => {
            log::info!("OPENAI_API_KEY not set; pages without structured data stay unschematized");
            Arc::new(DisabledSynthesizer)
        }
        Err(e) => {
            log::warn!("Synthesis backend unavailable ({e}); continuing without synthesis");
            Arc::new(DisabledSynthesizer)
        }
    }
}

/// A synthesized tree must be an object, or an array holding at least one
/// object.
fn check_shape(tree: Value) -> Result<Value, SynthesisError> {
    match &tree {
        Value::Object(obj) if !obj.is_empty() => Ok(tree),
        Value::Array(items) if items.iter().any(Value::is_object) => Ok(tree),
        Value::Object(_) => Err(SynthesisError::MalformedResponse(
            "empty object".into(),
        )),
        other => Err(SynthesisError::MalformedResponse(format!(
            "expected an object or array of objects, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array without objects",
        Value::Object(_) => "object",
    }
}

/// Engine-side wrapper around a [`Synthesizer`]
#[derive(Clone)]
pub struct SynthesisAdapter {
    backend: Arc<dyn Synthesizer>,
    max_retries: u8,
    backoff_ms: u64,
    max_signal_chars: usize,
}

impl std::fmt::Debug for SynthesisAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisAdapter")
            .field("backend", &self.backend.name())
            .field("max_retries", &self.max_retries)
            .field("backoff_ms", &self.backoff_ms)
            .field("max_signal_chars", &self.max_signal_chars)
            .finish()
    }
}

impl SynthesisAdapter {
    pub fn new(backend: Arc<dyn Synthesizer>) -> Self {
        Self {
            backend,
            max_retries: DEFAULT_SYNTHESIS_RETRIES,
            backoff_ms: DEFAULT_SYNTHESIS_BACKOFF_MS,
            max_signal_chars: DEFAULT_MAX_SIGNAL_CHARS,
        }
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u8, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_ms = backoff_ms;
        self
    }

    #[must_use]
    pub fn with_max_signal_chars(mut self, max_signal_chars: usize) -> Self {
        self.max_signal_chars = max_signal_chars;
        self
    }

    fn backoff(&self, attempt: u8, error: &SynthesisError) -> Duration {
        let exp = self.backoff_ms.saturating_mul(1u64 << attempt.min(16));
        let ms = exp.saturating_mul(error.delay_multiplier()).min(MAX_BACKOFF_MS);
        Duration::from_millis(ms)
    }

    /// Generate a candidate for a page that had no embedded structured data.
    ///
    /// The backend sees only the bounded [`PageSignals`] of the page. It is
    /// called at most `1 + max_retries` times.
    ///
    /// # Errors
    ///
    /// Returns the last backend error once the retry budget is spent, or
    /// immediately for non-retryable errors.
    pub async fn synthesize(&self, record: &PageRecord) -> Result<SchemaCandidate, SynthesisError> {
        let signals = page_signals(record, self.max_signal_chars);
        log::debug!(
            "Requesting synthesis for {} ({} signal chars)",
            record.url,
            signals.char_len()
        );
        let mut attempt: u8 = 0;

        loop {
            let result = self
                .backend
                .generate(&signals)
                .await
                .and_then(check_shape);

            match result {
                Ok(tree) => {
                    log::info!("Synthesized schema for {} via {}", record.url, self.backend.name());
                    return Ok(SchemaCandidate::new(
                        record.url.clone(),
                        CandidateOrigin::Synthesized,
                        0,
                        record.sequence,
                        tree,
                    ));
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt, &e);
                    log::debug!(
                        "Synthesis attempt {} for {} failed ({e}), retrying in {delay:?}",
                        attempt + 1,
                        record.url
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::warn!("Synthesis failed for {}: {e}", record.url);
                    return Err(e);
                }
            }
        }
    }
}
