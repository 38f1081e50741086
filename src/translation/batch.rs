/*!
 * Adaptive batch translation.
 *
 * Texts are sent to a completion backend in contiguous batches whose size is
 * recomputed from the remaining texts before every dispatch: characters are
 * accumulated up to a provider-dependent target, with a cap on the number of
 * items. Local models get a small target because their output budget is
 * tight.
 *
 * The result always has one entry per input. Items the backend did not
 * return, and whole batches whose request failed, fall back to the source
 * text.
 */

use std::ops::Range;
use std::time::Instant;

use log::{debug, info, warn};

use crate::app_config::{AiProvider, TranslationConfig};
use crate::pipeline::ProgressSink;
use crate::providers::CompletionBackend;

use super::parser::{parse_numbered_response, Slots};
use super::prompts::{batch_prompt, SUBTITLE_TRANSLATOR_SYSTEM};

/// Size limits for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Accumulated character target
    pub target_chars: usize,

    /// Hard cap on items per batch
    pub max_items: usize,
}

impl BatchLimits {
    pub fn new(target_chars: usize, max_items: usize) -> Self {
        Self {
            target_chars,
            max_items: max_items.max(1),
        }
    }

    /// Built-in limits for a provider
    pub fn for_provider(provider: AiProvider) -> Self {
        Self::new(crate::app_config::default_max_chars_per_batch(provider), 5)
    }

    /// Limits for a provider, honoring the provider config overrides
    pub fn from_config(provider: AiProvider, config: &TranslationConfig) -> Self {
        Self::new(config.max_chars_for(provider), config.max_items_for(provider))
    }
}

/// Plans and dispatches translation batches
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    limits: BatchLimits,
}

impl BatchScheduler {
    pub fn new(limits: BatchLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Number of leading items of `remaining` that form the next batch
    ///
    /// Zero only for empty input. A first item longer than the target still
    /// forms a batch of one.
    pub fn next_batch_len<S: AsRef<str>>(&self, remaining: &[S]) -> usize {
        if remaining.is_empty() {
            return 0;
        }

        let mut accumulated = 0;
        let mut count = 0;

        for text in remaining {
            let len = text.as_ref().chars().count();
            if accumulated + len > self.limits.target_chars {
                break;
            }
            accumulated += len;
            count += 1;
            if count >= self.limits.max_items {
                break;
            }
        }

        count.clamp(1, self.limits.max_items)
    }

    /// Batch ranges for a whole list, computed the same way `translate` does
    pub fn plan<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut start = 0;

        while start < texts.len() {
            let len = self.next_batch_len(&texts[start..]);
            ranges.push(start..start + len);
            start += len;
        }

        ranges
    }

    /// Translate `texts`, one output per input in the same order
    pub async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        backend: &dyn CompletionBackend,
        progress: Option<&dyn ProgressSink>,
    ) -> Vec<String> {
        if texts.is_empty() {
            return Vec::new();
        }

        // Blank texts stay as they are and never reach the backend
        let positions: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, _)| i)
            .collect();
        let pending: Vec<&str> = positions.iter().map(|&i| texts[i].as_str()).collect();

        let mut translations: Vec<String> = texts.to_vec();
        if pending.is_empty() {
            debug!("All {} subtitles are blank, nothing to translate", texts.len());
            return translations;
        }

        let started = Instant::now();
        let mut done = 0;
        let mut batch_num = 0;

        info!(
            "Translating {} subtitles with {} ({}) from {} to {}",
            pending.len(),
            backend.provider(),
            backend.model(),
            source_language,
            target_language
        );

        while done < pending.len() {
            let len = self.next_batch_len(&pending[done..]);
            let batch = &pending[done..done + len];
            batch_num += 1;

            let batch_chars: usize = batch.iter().map(|t| t.chars().count()).sum();
            debug!(
                "Batch {}: {} items ({}/{} chars, {} remaining)",
                batch_num,
                len,
                batch_chars,
                self.limits.target_chars,
                pending.len() - done - len
            );

            let prompt = batch_prompt(batch, source_language, target_language);
            match backend.complete(Some(SUBTITLE_TRANSLATOR_SYSTEM), &prompt).await {
                Ok(response) => {
                    let slots = parse_numbered_response(&response, batch.len());
                    let translated = reconcile(batch, slots, batch_num);
                    for (offset, text) in translated.into_iter().enumerate() {
                        translations[positions[done + offset]] = text;
                    }
                }
                Err(e) => {
                    warn!("Translation batch {} failed, keeping original text: {}", batch_num, e);
                }
            }

            done += len;
            if let Some(sink) = progress {
                sink.on_progress(done as f64 * 100.0 / pending.len() as f64);
            }
        }

        info!(
            "Translation complete: {} items in {} batches ({:.1}s)",
            pending.len(),
            batch_num,
            started.elapsed().as_secs_f64()
        );

        translations
    }
}

/// Fill each slot the backend left empty with its source text
fn reconcile(batch: &[&str], slots: Slots, batch_num: usize) -> Vec<String> {
    let missing = slots.iter().filter(|slot| slot.is_none()).count();
    if missing > 0 {
        warn!("Batch {}: {} of {} translations missing", batch_num, missing, batch.len());
    }

    batch
        .iter()
        .enumerate()
        .map(|(i, original)| match slots.get(i).cloned().flatten() {
            Some(text) => text,
            None => {
                debug!("Missing translation at index {}, using original: '{}'", i, original);
                original.to_string()
            }
        })
        .collect()
}
