use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::AiProvider;
use crate::errors::ProviderError;

use super::{
    endpoint_url, error_from_response, http_client, CompletionBackend, GenerationSettings, Provider,
    RetryPolicy,
};

/// Gemini client for the generative language API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key sent in the `x-goog-api-key` header
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Retry behaviour for transient failures
    retry: RetryPolicy,
    /// Model used by `CompletionBackend`, e.g. `models/gemini-2.5-flash`
    model: String,
    /// Settings used by `CompletionBackend::complete`
    settings: GenerationSettings,
}

/// A `generateContent` call, addressed to one model
#[derive(Debug, Clone)]
pub struct GeminiRequest {
    pub model: String,
    pub body: GenerateContentBody,
}

/// Body of a `generateContent` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentBody {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// `generateContent` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

impl GeminiRequest {
    /// Create a single-turn request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            body: GenerateContentBody {
                contents: vec![GeminiContent {
                    role: Some("user".to_string()),
                    parts: vec![GeminiPart { text: prompt.into() }],
                }],
                system_instruction: None,
                generation_config: None,
            },
        }
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.body.system_instruction = Some(GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: system.into() }],
        });
        self
    }

    /// Set sampling parameters
    pub fn generation_config(mut self, temperature: f32, max_output_tokens: Option<u32>) -> Self {
        self.body.generation_config = Some(GeminiGenerationConfig {
            temperature: Some(temperature),
            max_output_tokens,
        });
        self
    }

    /// API path for the model, accepting names with or without `models/`
    pub fn path(&self) -> String {
        let model = self.model.trim_start_matches('/');
        if model.starts_with("models/") {
            format!("v1beta/{}:generateContent", model)
        } else {
            format!("v1beta/models/{}:generateContent", model)
        }
    }
}

impl Gemini {
    /// Create a new Gemini client
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
            model: crate::app_config::default_model(AiProvider::Gemini),
            settings: GenerationSettings::default(),
        }
    }

    /// Set the model and settings used through `CompletionBackend`
    pub fn with_defaults(mut self, model: impl Into<String>, settings: GenerationSettings) -> Self {
        self.model = model.into();
        self.settings = settings;
        self
    }

    async fn send(&self, request: &GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let url = endpoint_url(&self.endpoint, &request.path())?;

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request.body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response("Gemini", response).await);
        }

        response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Gemini response: {}", e)))
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        self.retry.run("Gemini", || self.send(&request)).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = GeminiRequest::new(self.model.clone(), "Hello").generation_config(0.0, Some(10));
        Provider::complete(self, request).await.map(|_| ())
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionBackend for Gemini {
    fn provider(&self) -> AiProvider {
        AiProvider::Gemini
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
        let mut request = GeminiRequest::new(self.model.clone(), prompt)
            .generation_config(settings.temperature, settings.max_tokens);
        if let Some(system) = system {
            request = request.system(system);
        }

        let response = Provider::complete(self, request).await?;
        let text = Self::extract_text(&response);
        if text.is_empty() {
            return Err(ProviderError::ParseError("Gemini returned no candidates".to_string()));
        }
        Ok(text)
    }
}
