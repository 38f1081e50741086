/*!
 * AI outline generation.
 *
 * The outline prompt carries the video title, the start of its description
 * and its subtitles. Long videos are sampled: the first, middle and last
 * hundred subtitles stand in for the whole transcript.
 */

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, info};

use crate::app_config::TranslationConfig;
use crate::pipeline::{OutlineRequest, OutlineResult, OutlineService};
use crate::providers::{backend_for, CompletionBackend, GenerationSettings};
use crate::translation::prompts::display_language;

// @const: Subtitles sent in full up to this count
pub const FULL_TRANSCRIPT_LIMIT: usize = 300;

// @const: Subtitles per sampled section
pub const SAMPLE_SECTION_LEN: usize = 100;

// @const: Description characters kept in the prompt
pub const DESCRIPTION_LIMIT: usize = 500;

// @const: Placeholder between sampled sections
pub const OMISSION_MARKER: &str = "...[middle portion omitted]...";

/// System prompt for outline requests
pub const OUTLINE_SYSTEM: &str = "You are a professional video content analyst. You extract the key information from subtitles and descriptions and produce clear, structured outlines.";

/// Subtitles included in the prompt, with a note describing the selection
pub fn sample_subtitles(subtitles: &[String]) -> (Vec<String>, String) {
    let total = subtitles.len();
    if total <= FULL_TRANSCRIPT_LIMIT {
        return (subtitles.to_vec(), format!("Full subtitles ({} segments)", total));
    }

    let middle_start = (total - SAMPLE_SECTION_LEN) / 2;
    let mut selected = Vec::with_capacity(FULL_TRANSCRIPT_LIMIT + 2);
    selected.extend_from_slice(&subtitles[..SAMPLE_SECTION_LEN]);
    selected.push(OMISSION_MARKER.to_string());
    selected.extend_from_slice(&subtitles[middle_start..middle_start + SAMPLE_SECTION_LEN]);
    selected.push(OMISSION_MARKER.to_string());
    selected.extend_from_slice(&subtitles[total - SAMPLE_SECTION_LEN..]);

    let note = format!(
        "Subtitle excerpt ({} of {} segments sampled evenly: beginning, middle, end)",
        FULL_TRANSCRIPT_LIMIT, total
    );
    (selected, note)
}

/// Build the user prompt for an outline
pub fn prepare_outline_prompt(title: &str, description: &str, subtitles: &[String], language: &str) -> String {
    let (selected, note) = sample_subtitles(subtitles);
    let description: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    let language_name = display_language(language);

    format!(
        "Analyze the content of the following video and produce a detailed outline.

Video title: {title}

Video description:
{description}

{note}:
{subtitles}

Please provide:
1. **Summary** (2-3 sentences describing what the video is about)
2. **Key points** (3-5 main points, one sentence each)
3. **Detailed outline** (the main sections in chronological order, each with a topic and a short explanation)

Answer in {language_name}, using a clear structured format.",
        subtitles = selected.join("\n")
    )
}

/// Outline service backed by a completion backend
pub struct AiOutlineService {
    config: TranslationConfig,
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl AiOutlineService {
    /// Build backends per request from the translation config
    pub fn new(config: TranslationConfig) -> Self {
        Self { config, backend: None }
    }

    /// Always use the given backend, ignoring the request's provider settings
    pub fn with_backend(config: TranslationConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            config,
            backend: Some(backend),
        }
    }

    fn backend_for_request(&self, request: &OutlineRequest) -> Result<Arc<dyn CompletionBackend>> {
        match &self.backend {
            Some(backend) => Ok(Arc::clone(backend)),
            None => Ok(backend_for(
                request.provider,
                request.model.as_deref(),
                request.api_key.as_deref(),
                &self.config,
            )?),
        }
    }
}

#[async_trait]
impl OutlineService for AiOutlineService {
    async fn generate_outline(&self, request: OutlineRequest) -> Result<OutlineResult> {
        let backend = self.backend_for_request(&request)?;
        let prompt = prepare_outline_prompt(&request.title, &request.description, &request.subtitles, &request.language);

        info!(
            "Generating outline with {} ({}) from {} subtitles",
            backend.provider(),
            backend.model(),
            request.subtitles.len()
        );
        debug!("Outline prompt is {} characters", prompt.chars().count());

        let outline = backend
            .generate(Some(OUTLINE_SYSTEM), &prompt, &GenerationSettings::outline())
            .await
            .map_err(|e| anyhow!("{} API error: {}", backend.provider().display_name(), e))?;

        if outline.trim().is_empty() {
            return Err(anyhow!("{} returned an empty outline", backend.provider().display_name()));
        }

        Ok(OutlineResult {
            outline: outline.trim().to_string(),
            provider: backend.provider().to_lowercase_string(),
            model: backend.model().to_string(),
        })
    }
}
