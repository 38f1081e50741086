/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scripted completion backend that simulates different
 * behaviors:
 * - `MockBackend::working()` - Answers every numbered item
 * - `MockBackend::dropping_last()` - Leaves out the last item of each batch
 * - `MockBackend::chatty()` - Answers without markers, wrapped in boilerplate
 * - `MockBackend::intermittent(n)` - Fails every nth request
 * - `MockBackend::failing()` - Always fails with an error
 * - `MockBackend::empty()` - Returns an empty response
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::app_config::AiProvider;
use crate::errors::ProviderError;
use crate::providers::{CompletionBackend, GenerationSettings, Provider};

// @const: Numbered item line inside a batch prompt
static PROMPT_ITEM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(\d+)\] (.*)$").unwrap());

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Answers every item with its marker
    Working,
    /// Answers all but the last item
    DropLast,
    /// Answers without markers, after a boilerplate line
    Chatty,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
}

/// Scripted completion backend
#[derive(Debug, Clone)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Provider reported to callers
    provider: AiProvider,
    /// Prefix put in front of every answered item
    prefix: String,
    /// Request counter for intermittent failures
    request_count: Arc<AtomicUsize>,
    /// Prompts received so far, shared between clones
    prompts: Arc<Mutex<Vec<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str) -> String>,
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            provider: AiProvider::Ollama,
            prefix: "TR:".to_string(),
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn dropping_last() -> Self {
        Self::new(MockBehavior::DropLast)
    }

    pub fn chatty() -> Self {
        Self::new(MockBehavior::Chatty)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Report a different provider
    pub fn with_provider(mut self, provider: AiProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Set a custom response generator, used in `Working` mode
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Numbered items found in a batch prompt
    pub fn prompt_items(prompt: &str) -> Vec<(usize, String)> {
        prompt
            .lines()
            .filter_map(|line| {
                let caps = PROMPT_ITEM_REGEX.captures(line)?;
                let index = caps[1].parse().ok()?;
                Some((index, caps[2].to_string()))
            })
            .collect()
    }

    fn answer(&self, prompt: &str, skip_last: bool, with_markers: bool) -> String {
        let mut items = Self::prompt_items(prompt);
        if skip_last {
            items.pop();
        }

        let lines: Vec<String> = items
            .into_iter()
            .map(|(i, text)| {
                if with_markers {
                    format!("[{}] {} {}", i, self.prefix, text)
                } else {
                    format!("{} {}", self.prefix, text)
                }
            })
            .collect();

        if with_markers {
            lines.join("\n")
        } else {
            format!("Sure, here are the translations:\n\n{}", lines.join("\n"))
        }
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn provider(&self) -> AiProvider {
        self.provider
    }

    async fn check_connection(&self) -> Result<(), ProviderError> {
        Provider::test_connection(self).await
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        _system: Option<&str>,
        prompt: &str,
        _settings: &GenerationSettings,
    ) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        match self.behavior {
            MockBehavior::Working => Ok(match self.custom_response {
                Some(generator) => generator(prompt),
                None => self.answer(prompt, false, true),
            }),
            MockBehavior::DropLast => Ok(self.answer(prompt, true, true)),
            MockBehavior::Chatty => Ok(self.answer(prompt, false, false)),
            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.answer(prompt, false, true))
                }
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),
            MockBehavior::Empty => Ok(String::new()),
        }
    }
}

#[async_trait]
impl Provider for MockBackend {
    type Request = String;
    type Response = String;

    async fn complete(&self, request: String) -> Result<String, ProviderError> {
        CompletionBackend::complete(self, None, &request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn extract_text(response: &String) -> String {
        response.clone()
    }
}
