use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::AiProvider;
use crate::errors::ProviderError;

use super::{
    endpoint_url, error_from_response, http_client, CompletionBackend, GenerationSettings, Provider,
    RetryPolicy,
};

/// Bounds for the output budget of a local generation
const MIN_NUM_PREDICT: u32 = 3000;
const MAX_NUM_PREDICT: u32 = 8000;

/// Ollama client for interacting with Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Retry behaviour for transient failures
    retry: RetryPolicy,
    /// Model used by `CompletionBackend`
    model: String,
    /// Settings used by `CompletionBackend::complete`
    settings: GenerationSettings,
}

/// Generate request for the Ollama API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Generation options for the Ollama API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_count: Option<u64>,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: Some(false),
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Set the output token budget
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }
}

/// Output budget for a prompt, about 1.5 tokens per input character plus headroom
pub fn num_predict_for(prompt: &str) -> u32 {
    let chars = prompt.chars().count() as u32;
    let estimated = chars.saturating_mul(3) / 2 + 1000;
    estimated.clamp(MIN_NUM_PREDICT, MAX_NUM_PREDICT)
}

/// Parse a generate response, tolerating streamed JSON lines
fn parse_generation_body(body: &str) -> Result<GenerationResponse, ProviderError> {
    if let Ok(response) = serde_json::from_str::<GenerationResponse>(body) {
        return Ok(response);
    }

    // Streaming output: one JSON object per line, text split across them
    let mut text = String::new();
    let mut model = String::new();
    let mut eval_count = None;
    let mut parsed_any = false;

    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        parsed_any = true;
        if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
            text.push_str(part);
        }
        if let Some(name) = value.get("model").and_then(|v| v.as_str()) {
            model = name.to_string();
        }
        if value.get("done").and_then(|v| v.as_bool()).unwrap_or(false) {
            eval_count = value.get("eval_count").and_then(|v| v.as_u64());
        }
    }

    if !parsed_any {
        let preview: String = body.chars().take(500).collect();
        error!("Failed to parse Ollama API response. Raw response (first 500 chars): {}", preview);
        return Err(ProviderError::ParseError("Response contains invalid JSON".to_string()));
    }

    Ok(GenerationResponse {
        model,
        response: text,
        done: true,
        prompt_eval_count: None,
        eval_count,
    })
}

impl Ollama {
    /// Create a new Ollama client for a base URL such as `http://localhost:11434`
    pub fn new(base_url: impl Into<String>, timeout_secs: u64, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.into(),
            client: http_client(timeout_secs),
            retry,
            model: crate::app_config::default_model(AiProvider::Ollama),
            settings: GenerationSettings::default(),
        }
    }

    /// Set the model and settings used through `CompletionBackend`
    pub fn with_defaults(mut self, model: impl Into<String>, settings: GenerationSettings) -> Self {
        self.model = model.into();
        self.settings = settings;
        self
    }

    async fn send(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/generate")?;

        let response = self.client.post(url).json(request).send().await?;
        if !response.status().is_success() {
            return Err(error_from_response("Ollama", response).await);
        }

        let body = response.text().await?;
        parse_generation_body(&body)
    }

    /// Get the Ollama API version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = endpoint_url(&self.base_url, "api/version")?;
        let response: serde_json::Value = self.client.get(url).send().await?.json().await?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.retry.run("Ollama", || self.send(&request)).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let version = self.version().await?;
        debug!("Connected to Ollama {}", version);
        Ok(())
    }

    fn extract_text(response: &GenerationResponse) -> String {
        response.response.clone()
    }
}

#[async_trait]
impl CompletionBackend for Ollama {
    fn provider(&self) -> AiProvider {
        AiProvider::Ollama
    }

    async fn check_connection(&self) -> Result<(), ProviderError> {
        Provider::test_connection(self).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn settings(&self) -> GenerationSettings {
        self.settings
    }

    async fn generate(
        &self,
        system: Option<&str>,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, ProviderError> {
        let num_predict = settings.max_tokens.unwrap_or_else(|| num_predict_for(prompt));
        debug!("Ollama request: {} prompt chars, num_predict {}", prompt.chars().count(), num_predict);

        let mut request = GenerationRequest::new(self.model.clone(), prompt)
            .temperature(settings.temperature)
            .num_predict(num_predict);
        if let Some(system) = system {
            request = request.system(system);
        }

        let response = Provider::complete(self, request).await?;
        Ok(Self::extract_text(&response))
    }
}
