/*!
 * Provider implementations for the AI services used by the pipeline.
 *
 * This module contains client implementations for various LLM providers:
 * - OpenAI: chat completions API
 * - Anthropic: messages API (exposed as the `claude` provider)
 * - Gemini: Google generative language API
 * - Ollama: local LLM server
 * - Mock: scripted backend for tests
 *
 * Every client implements the wire-level `Provider` trait and the
 * prompt-level `CompletionBackend` trait that translation and outline
 * generation are written against.
 */

use async_trait::async_trait;
use log::warn;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::app_config::{AiProvider, TranslationConfig};
use crate::errors::{AppError, ProviderError, TranslationError};

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Sampling settings for one completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    /// Sampling temperature
    pub temperature: f32,

    /// Output token ceiling; `None` lets the backend pick
    pub max_tokens: Option<u32>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: None,
        }
    }
}

impl GenerationSettings {
    /// Settings used for outline generation
    pub fn outline() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: Some(2000),
        }
    }
}

/// Prompt-in, text-out view of a provider
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Which provider serves the requests
    fn provider(&self) -> AiProvider;

    /// Model name sent with each request
    fn model(&self) -> &str;

    /// Settings used by `complete`
    fn settings(&self) -> GenerationSettings {
        GenerationSettings::default()
    }

    /// Run one completion with explicit settings
    async fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ProviderError>;

    /// Make one cheap round trip to check the provider is reachable
    async fn check_connection(&self) -> Result<(), ProviderError>;

    /// Run one completion with the backend's own settings
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, ProviderError> {
        let settings = self.settings();
        self.generate(system, prompt, &settings).await
    }
}

/// Retry with exponential backoff for HTTP calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Base backoff in milliseconds, doubled per attempt
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self { max_retries, backoff_base_ms }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the retries are used up
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let backoff_ms = self.backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(16));
                    warn!(
                        "{} request failed: {} - attempt {}/{}, retrying in {}ms",
                        label, e, attempt, self.max_retries + 1, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Join an API path onto a configured base endpoint
///
/// The base keeps its own path (`https://api.openai.com/v1` + `chat/completions`).
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, ProviderError> {
    let mut base = base.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    Url::parse(&base)
        .and_then(|url| url.join(path.trim_start_matches('/')))
        .map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint '{}': {}", base, e)))
}

/// Build an HTTP client with the configured request timeout
pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .unwrap_or_default()
}

/// Read an error body from a failed response and map it to a provider error
pub(crate) async fn error_from_response(label: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());
    log::error!("{} API error ({}): {}", label, status, error_text);
    ProviderError::from_status(status.as_u16(), error_text)
}

/// Build the completion backend for a provider
///
/// An explicit API key wins over the configured one. Providers that need a
/// key fail with `MissingApiKey` when neither is set.
pub fn backend_for(
    provider: AiProvider,
    model: Option<&str>,
    api_key: Option<&str>,
    config: &TranslationConfig,
) -> Result<Arc<dyn CompletionBackend>, TranslationError> {
    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.api_key_for(provider));

    if provider.requires_api_key() && api_key.is_empty() {
        return Err(TranslationError::MissingApiKey(provider.display_name().to_string()));
    }

    let model = model
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.model_for(provider));
    let endpoint = config.endpoint_for(provider);
    let timeout_secs = config.timeout_for(provider);
    let retry = RetryPolicy::new(config.retry_count_for(provider), config.common.retry_backoff_ms);
    let settings = GenerationSettings {
        temperature: config.common.temperature,
        max_tokens: if provider.is_local() { None } else { Some(config.common.max_tokens) },
    };

    let backend: Arc<dyn CompletionBackend> = match provider {
        AiProvider::OpenAI => Arc::new(
            openai::OpenAI::new(api_key, endpoint, timeout_secs, retry).with_defaults(model, settings),
        ),
        AiProvider::Claude => Arc::new(
            anthropic::Anthropic::new(api_key, endpoint, timeout_secs, retry).with_defaults(model, settings),
        ),
        AiProvider::Gemini => Arc::new(
            gemini::Gemini::new(api_key, endpoint, timeout_secs, retry).with_defaults(model, settings),
        ),
        AiProvider::Ollama => Arc::new(
            ollama::Ollama::new(endpoint, timeout_secs, retry).with_defaults(model, settings),
        ),
    };

    Ok(backend)
}

/// Build the backend for a provider and check that it answers
pub async fn check_provider(
    provider: AiProvider,
    model: Option<&str>,
    api_key: Option<&str>,
    config: &TranslationConfig,
) -> Result<Arc<dyn CompletionBackend>, AppError> {
    let backend = backend_for(provider, model, api_key, config)?;
    backend.check_connection().await?;
    Ok(backend)
}

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod ollama;
pub mod openai;
