/*!
 * Generic per-item translation.
 *
 * The fallback path when no AI provider is selected: every non-empty text is
 * translated on its own through a `TextTranslator`, with a bounded number of
 * requests in flight. A failed item keeps its original text.
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::Semaphore;
use url::Url;

use crate::pipeline::ProgressSink;

use super::cache::{truncate_text, TranslationCache};

/// Public web endpoint used by `GoogleWebTranslator`
pub const GOOGLE_WEB_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translates one text at a time
#[async_trait]
pub trait TextTranslator: Send + Sync {
    async fn translate_one(&self, text: &str, source_language: &str, target_language: &str) -> Result<String>;
}

/// Client for the keyless Google web translation endpoint
#[derive(Debug, Clone)]
pub struct GoogleWebTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleWebTranslator {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_endpoint(GOOGLE_WEB_ENDPOINT, timeout_secs)
    }

    /// Point the client at a different endpoint
    pub fn with_endpoint(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Request URL for one text
    pub fn request_url(&self, text: &str, source_language: &str, target_language: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("client", "gtx"),
                ("sl", source_language),
                ("tl", target_language),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .with_context(|| format!("Invalid translation endpoint: {}", self.endpoint))
    }
}

impl Default for GoogleWebTranslator {
    fn default() -> Self {
        Self::new(30)
    }
}

#[async_trait]
impl TextTranslator for GoogleWebTranslator {
    async fn translate_one(&self, text: &str, source_language: &str, target_language: &str) -> Result<String> {
        let url = self.request_url(text, source_language, target_language)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Translation request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Translation endpoint responded with {}", status));
        }

        let body: Value = response.json().await.context("Invalid translation response")?;
        extract_web_translation(&body)
    }
}

/// Concatenate the sentence chunks of a web translation response
///
/// The body is a nested array whose first element lists
/// `[translated, original, ...]` chunks.
pub fn extract_web_translation(body: &Value) -> Result<String> {
    let chunks = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Unexpected translation response shape"))?;

    let translated: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(anyhow!("Empty translation in response"));
    }

    Ok(translated)
}

/// Translate every text through `translator`, keeping order and length
///
/// Blank texts are passed through untouched. Cached translations skip the
/// translator. `progress` receives the completed percentage after each item.
pub async fn batch_translate(
    translator: Arc<dyn TextTranslator>,
    texts: &[String],
    source_language: &str,
    target_language: &str,
    concurrency: usize,
    cache: &TranslationCache,
    progress: Option<&dyn ProgressSink>,
) -> Vec<String> {
    let total = texts.len();
    if total == 0 {
        return Vec::new();
    }

    info!(
        "Translating {} subtitles item by item from {} to {} ({} concurrent)",
        total, source_language, target_language, concurrency.max(1)
    );

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let completed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let tasks = texts.iter().enumerate().map(|(index, text)| {
        let translator = Arc::clone(&translator);
        let semaphore = Arc::clone(&semaphore);
        let completed = &completed;
        let failed = &failed;

        async move {
            let translated = if text.trim().is_empty() {
                text.clone()
            } else if let Some(hit) = cache.get(text, source_language, target_language) {
                hit
            } else {
                let _permit = semaphore.acquire().await.ok();
                match translator.translate_one(text, source_language, target_language).await {
                    Ok(translated) => {
                        cache.store(text, source_language, target_language, &translated);
                        translated
                    }
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        warn!("Translation failed for text {} ('{}'): {}", index, truncate_text(text, 30), e);
                        text.clone()
                    }
                }
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(sink) = progress {
                sink.on_progress(done as f64 * 100.0 / total as f64);
            }

            translated
        }
    });

    let translations = join_all(tasks).await;

    let failures = failed.load(Ordering::Relaxed);
    if failures > 0 {
        warn!("{} of {} texts kept their original text", failures, total);
    }
    debug!("Cache stats after batch: {:?}", cache.stats());

    translations
}
