use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::AiProvider;
use crate::errors::ProviderError;

use super::{
    endpoint_url, error_from_response, http_client, CompletionBackend, GenerationSettings, Provider,
    RetryPolicy,
};

/// OpenAI client for the chat completions API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for bearer authentication
    api_key: String,
    /// Base URL, usually `https://api.openai.com/v1`
    endpoint: String,
    /// Retry behaviour for transient failures
    retry: RetryPolicy,
    /// Model used by `CompletionBackend`
    model: String,
    /// Settings used by `CompletionBackend::complete`
    settings: GenerationSettings,
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl OpenAIRequest {
    /// Create a new request for a model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token ceiling
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: http_client(timeout_secs),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            retry,
            model: crate::app_config::default_model(AiProvider::OpenAI),
            settings: GenerationSettings::default(),
        }
    }

    /// Set the model and settings used through `CompletionBackend`
    pub fn with_defaults(mut self, model: impl Into<String>, settings: GenerationSettings) -> Self {
        self.model = model.into();
        self.settings = settings;
        self
    }

    async fn send(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let url = endpoint_url(&self.endpoint, "chat/completions")?;

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("OpenAI", response).await);
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI response: {}", e)))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        self.retry.run("OpenAI", || self.send(&request)).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = OpenAIRequest::new(self.model.clone())
            .add_message("user", "Hello")
            .max_tokens(10);
        Provider::complete(self, request).await.map(|_| ())
    }

    fn extract_text(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for OpenAI {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenAI
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
        let mut request = OpenAIRequest::new(self.model.clone()).temperature(settings.temperature);
        if let Some(system) = system {
            request = request.add_message("system", system);
        }
        request = request.add_message("user", prompt);
        if let Some(max_tokens) = settings.max_tokens {
            request = request.max_tokens(max_tokens);
        }

        let response = Provider::complete(self, request).await?;
        Ok(Self::extract_text(&response))
    }
}
