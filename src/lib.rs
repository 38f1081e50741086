/*!
 * # vidslides
 *
 * A Rust library that turns long-form videos into slide decks: one still
 * frame per caption segment, paired with the caption text, optionally
 * translated and summarized by an AI provider.
 *
 * ## Features
 *
 * - Background jobs with staged progress reporting and per-stage fallbacks
 * - Sentence reconstruction for auto-generated captions:
 *   - punctuation-driven merge for punctuated captions
 *   - language-aware heuristic merge for ja, ko, zh and th captions
 * - Adaptive batch translation through AI providers:
 *   - Ollama (local LLM)
 *   - OpenAI API
 *   - Anthropic API
 *   - Gemini API
 * - Per-item web translation fallback with caching
 * - AI video outlines
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `segmentation`: sentence boundary rules and the caption merge engine
 * - `keyframes`: screenshot timestamp selection
 * - `translation`: batch scheduling, response parsing and the web translator
 * - `pipeline`: job state, collaborators and the staged orchestrator
 * - `outline`: outline prompt sampling and generation
 * - `providers`: client implementations for the LLM providers
 * - `subtitle_processor`: SRT parsing and writing
 * - `app_config`: configuration management
 * - `language_utils`: language tag utilities
 * - `file_utils`: file system operations
 * - `errors`: custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod file_utils;
pub mod keyframes;
pub mod language_utils;
pub mod outline;
pub mod pipeline;
pub mod providers;
pub mod segmentation;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{AiProvider, Config};
pub use errors::{AppError, PipelineError, ProviderError, SubtitleError, TranslationError};
pub use keyframes::{select_timestamps, text_at, ScreenshotPosition};
pub use pipeline::{JobSnapshot, JobStatus, Pipeline, PipelineServices, ProcessRequest, ProcessResult};
pub use segmentation::{MergeConfig, MergeOutcome, SubtitleOptimizer};
pub use subtitle_processor::{SubtitleCollection, SubtitleSegment};
pub use translation::{BatchLimits, BatchScheduler};
