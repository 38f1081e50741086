use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::segmentation::MergeConfig;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default caption language code, `auto` to take the first available track
    pub source_language: String,

    /// Default translation target language code
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Subtitle merge tunables
    #[serde(default)]
    pub merge: MergeConfig,

    /// Job pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// AI provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    // @provider: OpenAI chat completions
    OpenAI,
    // @provider: Anthropic messages API
    Claude,
    // @provider: Google Gemini
    Gemini,
    // @provider: Ollama (local)
    #[default]
    Ollama,
}

impl AiProvider {
    /// All supported providers
    pub const ALL: [AiProvider; 4] = [Self::OpenAI, Self::Claude, Self::Gemini, Self::Ollama];

    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Claude => "claude".to_string(),
            Self::Gemini => "gemini".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    /// Whether requests need an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Whether the provider runs locally with a tight output budget
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for AiProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retries for this provider, falls back to the common setting
    #[serde(default)]
    pub retry_count: Option<u32>,

    // @field: Character target per translation batch, 0 for the provider default
    #[serde(default)]
    pub max_chars_per_batch: usize,

    // @field: Item cap per translation batch
    #[serde(default = "default_max_items_per_batch")]
    pub max_items_per_batch: usize,
}

impl ProviderConfig {
    // @param provider: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider: AiProvider) -> Self {
        Self {
            provider_type: provider.to_lowercase_string(),
            model: default_model(provider),
            api_key: String::new(),
            endpoint: default_endpoint(provider),
            timeout_secs: if provider.is_local() {
                default_local_timeout_secs()
            } else {
                default_timeout_secs()
            },
            retry_count: None,
            max_chars_per_batch: default_max_chars_per_batch(provider),
            max_items_per_batch: default_max_items_per_batch(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Provider used by the CLI translate command
    #[serde(default)]
    pub provider: AiProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token ceiling for remote providers
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Concurrent requests for the per-item web translator
    #[serde(default = "default_web_concurrency")]
    pub web_concurrency: usize,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            web_concurrency: default_web_concurrency(),
        }
    }
}

/// Job pipeline settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Progress events kept per job
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Frames between compression progress reports
    #[serde(default = "default_frame_progress_interval")]
    pub frame_progress_interval: usize,

    /// Where per-video result snapshots are stored
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Where translated subtitle files are written
    #[serde(default = "default_subtitles_dir")]
    pub subtitles_dir: PathBuf,

    /// Whether completed jobs are saved to `results_dir`
    #[serde(default = "default_true")]
    pub persist_results: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            frame_progress_interval: default_frame_progress_interval(),
            results_dir: default_results_dir(),
            subtitles_dir: default_subtitles_dir(),
            persist_results: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_local_timeout_secs() -> u64 {
    300
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // doubled on each retry
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_web_concurrency() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_history_capacity() -> usize {
    200
}

fn default_frame_progress_interval() -> usize {
    5
}

fn default_max_items_per_batch() -> usize {
    5
}

/// Character target per batch; the local model has a much smaller output budget
pub fn default_max_chars_per_batch(provider: AiProvider) -> usize {
    if provider.is_local() { 300 } else { 1000 }
}

pub fn default_model(provider: AiProvider) -> String {
    match provider {
        AiProvider::OpenAI => "gpt-4o-mini",
        AiProvider::Claude => "claude-sonnet-4-5-20250929",
        AiProvider::Gemini => "models/gemini-2.5-flash",
        AiProvider::Ollama => "llama3.2",
    }
    .to_string()
}

pub fn default_endpoint(provider: AiProvider) -> String {
    match provider {
        AiProvider::OpenAI => "https://api.openai.com/v1",
        AiProvider::Claude => "https://api.anthropic.com",
        AiProvider::Gemini => "https://generativelanguage.googleapis.com",
        AiProvider::Ollama => "http://localhost:11434",
    }
    .to_string()
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidslides")
}

fn default_results_dir() -> PathBuf {
    data_dir().join("results")
}

fn default_subtitles_dir() -> PathBuf {
    data_dir().join("subtitles")
}

impl Config {
    /// Load the configuration file, creating it with defaults when missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let file = File::open(path)
                .context(format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .context(format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());

        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .context(format!("Failed to write config to file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)?;
        crate::language_utils::validate_language_code(&self.target_language)?;

        let merge = &self.merge;
        if merge.min_chars > merge.target_chars || merge.target_chars > merge.max_chars {
            return Err(anyhow!(
                "Merge limits must satisfy min_chars <= target_chars <= max_chars ({} / {} / {})",
                merge.min_chars, merge.target_chars, merge.max_chars
            ));
        }
        if !(0.0..=1.0).contains(&merge.punctuation_ratio) {
            return Err(anyhow!("punctuation_ratio must be between 0 and 1, got {}", merge.punctuation_ratio));
        }
        if merge.sample_size == 0 || merge.max_chars == 0 {
            return Err(anyhow!("sample_size and max_chars must be positive"));
        }

        if self.pipeline.history_capacity == 0 {
            return Err(anyhow!("history_capacity must be positive"));
        }
        if self.pipeline.frame_progress_interval == 0 {
            return Err(anyhow!("frame_progress_interval must be positive"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "auto".to_string(),
            target_language: "zh-TW".to_string(),
            translation: TranslationConfig::default(),
            merge: MergeConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider: AiProvider) -> Option<&ProviderConfig> {
        let provider_str = provider.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type.eq_ignore_ascii_case(&provider_str))
    }

    /// Model for a provider, falling back to its default
    pub fn model_for(&self, provider: AiProvider) -> String {
        self.get_provider_config(provider)
            .map(|p| p.model.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_model(provider))
    }

    /// Configured API key for a provider, empty when none
    pub fn api_key_for(&self, provider: AiProvider) -> String {
        self.get_provider_config(provider)
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Endpoint for a provider, falling back to its default
    pub fn endpoint_for(&self, provider: AiProvider) -> String {
        self.get_provider_config(provider)
            .map(|p| p.endpoint.clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| default_endpoint(provider))
    }

    /// Request timeout for a provider
    pub fn timeout_for(&self, provider: AiProvider) -> u64 {
        self.get_provider_config(provider)
            .map(|p| p.timeout_secs)
            .filter(|t| *t > 0)
            .unwrap_or_else(|| ProviderConfig::new(provider).timeout_secs)
    }

    /// Retry count for a provider
    pub fn retry_count_for(&self, provider: AiProvider) -> u32 {
        self.get_provider_config(provider)
            .and_then(|p| p.retry_count)
            .unwrap_or(self.common.retry_count)
    }

    /// Batch character target for a provider
    pub fn max_chars_for(&self, provider: AiProvider) -> usize {
        self.get_provider_config(provider)
            .map(|p| p.max_chars_per_batch)
            .filter(|c| *c > 0)
            .unwrap_or_else(|| default_max_chars_per_batch(provider))
    }

    /// Batch item cap for a provider
    pub fn max_items_for(&self, provider: AiProvider) -> usize {
        self.get_provider_config(provider)
            .map(|p| p.max_items_per_batch)
            .filter(|c| *c > 0)
            .unwrap_or_else(default_max_items_per_batch)
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        self.model_for(self.provider)
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.api_key_for(self.provider)
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.endpoint_for(self.provider)
    }

    /// Fail when the active provider needs a key and none is configured
    pub fn validate_credentials(&self) -> Result<()> {
        if self.provider.requires_api_key() && self.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider",
                self.provider.display_name()
            ));
        }
        Ok(())
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            available_providers: AiProvider::ALL.iter().map(|p| ProviderConfig::new(*p)).collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}
