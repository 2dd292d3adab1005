//! Model client trait and normalized request/response types.
//!
//! The [`ModelClient`] trait abstracts over LLM providers, translating between
//! normalized [`ModelRequest`]/[`ModelResponse`] types and provider-specific
//! HTTP APIs. Built-in implementations: [`OpenAiClient`], [`MockModel`].
//!
//! ## Architecture
//!
//! ```text
//! Generator ──► ModelRequest ──► ModelClient::complete() ──► ModelResponse
//!                                        │
//!                             ┌──────────┴──────────┐
//!                        OpenAiClient            MockModel
//!                     /v1/chat/completions    canned responses
//! ```

pub mod backoff;
pub mod mock;
pub mod openai;

pub use backoff::{BackoffConfig, JitterStrategy};
pub use mock::MockModel;
pub use openai::OpenAiClient;

use crate::error::Result;
use crate::LessonError;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;

/// Type alias for the callback invoked before each transport retry.
///
/// Arguments: `(attempt_number, delay_before_retry, reason_for_retry)`.
pub type RetryCallback<'a> = Option<&'a mut (dyn FnMut(u32, std::time::Duration, &str) + Send)>;

/// A normalized model request, provider-agnostic.
///
/// [`Generator`](crate::generate::Generator) builds this from the lesson
/// request and its prompt template. The [`ModelClient`] translates it into
/// the provider-specific HTTP request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Model identifier (e.g. `"gpt-4o-mini"`, `"llama3.2:3b"`).
    pub model: String,

    /// If `Some`, sent as a system message ahead of the prompt.
    pub system_prompt: Option<String>,

    /// The user prompt text.
    pub prompt: String,

    /// Sampling configuration (temperature, max_tokens, json_mode).
    pub config: ModelConfig,
}

/// Sampling and output configuration for a model call.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative). Default: 0.7.
    pub temperature: f64,

    /// Maximum tokens to generate. Default: 2048.
    ///
    /// Lessons that hit this limit arrive truncated, which is why the
    /// extraction layer can close off a cut JSON document.
    pub max_tokens: u32,

    /// Request JSON-format output from the model. Default: `false`.
    pub json_mode: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            json_mode: false,
        }
    }
}

/// A normalized model response.
#[derive(Debug)]
pub struct ModelResponse {
    /// The generated text content.
    pub text: String,

    /// HTTP status code (for diagnostics).
    pub status: u16,

    /// Provider-specific metadata (token counts, timing, model info).
    /// Stored as raw JSON since each provider returns different fields.
    pub metadata: Option<serde_json::Value>,
}

/// Abstraction over LLM providers.
///
/// Implementors translate between the normalized [`ModelRequest`]/
/// [`ModelResponse`] and the provider's HTTP API.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Execute a model call and return the full response text.
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse>;

    /// Human-readable name for events and diagnostics.
    fn name(&self) -> &'static str;
}

/// Check whether a [`LessonError`] is retryable under the backoff config.
///
/// Retryable conditions:
/// - [`LessonError::HttpError`] with a status in `config.retryable_statuses`
/// - [`LessonError::Request`] (connection/transport errors)
pub fn is_retryable(error: &LessonError, config: &BackoffConfig) -> bool {
    match error {
        LessonError::HttpError { status, .. } => config.retryable_statuses.contains(status),
        LessonError::Request(_) => true,
        _ => false,
    }
}

/// Execute a model call with transport-level retry and exponential backoff.
///
/// Wraps [`ModelClient::complete()`] with automatic retry on transient
/// failures (429, 5xx, connection errors). The [`BackoffConfig`] determines
/// delay strategy and retry count; a `Retry-After` header from the provider
/// overrides the calculated delay when `respect_retry_after` is set.
///
/// Returns the first successful response, or the last error once retries
/// are exhausted.
///
/// # Arguments
///
/// * `model` — The model client to call
/// * `client` — HTTP client for making requests
/// * `base_url` — Base URL for the API
/// * `request` — The normalized model request
/// * `config` — Backoff configuration
/// * `on_retry` — Optional callback invoked before each retry with (attempt, delay, reason)
pub async fn with_backoff(
    model: &Arc<dyn ModelClient>,
    client: &Client,
    base_url: &str,
    request: &ModelRequest,
    config: &BackoffConfig,
    mut on_retry: RetryCallback<'_>,
) -> Result<ModelResponse> {
    let mut last_error: Option<LessonError> = None;

    for attempt in 0..=config.max_retries {
        // Wait for backoff delay (not on first attempt)
        if attempt > 0 {
            let delay = if let Some(LessonError::HttpError {
                retry_after: Some(ra),
                ..
            }) = &last_error
            {
                if config.respect_retry_after {
                    *ra
                } else {
                    config.delay_for_attempt(attempt - 1)
                }
            } else {
                config.delay_for_attempt(attempt - 1)
            };

            let reason = last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default();

            if let Some(ref mut cb) = on_retry {
                cb(attempt, delay, &reason);
            }

            tokio::time::sleep(delay).await;
        }

        match model.complete(client, base_url, request).await {
            Ok(response) => return Ok(response),
            Err(e) => {
                if attempt < config.max_retries && is_retryable(&e, config) {
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
        }
    }

    // Should not reach here, but just in case
    Err(last_error.unwrap_or(LessonError::Other(
        "backoff loop exited unexpectedly".into(),
    )))
}
