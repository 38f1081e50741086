// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vidslides::app_config::{AiProvider, Config, LogLevel};
use vidslides::pipeline::{ProgressSink, ResultStore};
use vidslides::errors::AppError;
use vidslides::providers::{backend_for, check_provider};
use vidslides::segmentation::merge::{SubtitleOptimizer, optimize_srt_file};
use vidslides::subtitle_processor::{SubtitleCollection, SubtitleSegment, write_srt};
use vidslides::translation::{
    BatchLimits, BatchScheduler, GoogleWebTranslator, TranslationCache, batch_translate,
};

/// CLI Wrapper for AiProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    Openai,
    Claude,
    Gemini,
    Ollama,
}

impl From<CliProvider> for AiProvider {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::Openai => AiProvider::OpenAI,
            CliProvider::Claude => AiProvider::Claude,
            CliProvider::Gemini => AiProvider::Gemini,
            CliProvider::Ollama => AiProvider::Ollama,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Merge caption fragments in an SRT file into sentence-level segments
    Optimize(OptimizeArgs),

    /// Translate an SRT file
    Translate(TranslateArgs),

    /// Check that an AI provider is reachable with the configured credentials
    Check(CheckArgs),

    /// List saved processing results, newest first
    History {
        /// Results directory (defaults to the configured one)
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// Generate shell completions for vidslides
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct OptimizeArgs {
    /// Input SRT file
    #[arg(value_name = "INPUT_SRT")]
    input: PathBuf,

    /// Output file (defaults to <stem>.optimized.srt next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Caption language code, enables language-specific sentence endings
    #[arg(short, long)]
    language: Option<String>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// AI provider to check
    #[arg(short, long, value_enum)]
    provider: CliProvider,

    /// Model name to check with
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long, env = "VIDSLIDES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input SRT file
    #[arg(value_name = "INPUT_SRT")]
    input: PathBuf,

    /// Output file (defaults to <stem>.<target>.srt next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// AI provider; without one the web translator is used
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long, env = "VIDSLIDES_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Source language code (e.g., 'en', 'ja', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'zh-TW', 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,
}

/// vidslides - video to slides toolkit
///
/// Offline tools around the video-to-slides pipeline: caption optimization,
/// subtitle translation and result history.
#[derive(Parser, Debug)]
#[command(name = "vidslides")]
#[command(version)]
#[command(about = "Caption optimization and translation tools for video slide decks")]
#[command(long_about = "vidslides merges auto-generated captions into sentences, translates subtitles with AI providers, and lists saved slide deck results.

EXAMPLES:
    vidslides optimize talk.en.srt -l en               # Merge caption fragments
    vidslides translate talk.en.srt -t zh-TW           # Translate with the web translator
    vidslides translate talk.ja.srt -p ollama -t en    # Translate with a local model
    vidslides check -p ollama                          # Check a provider is reachable
    vidslides history                                  # List saved results
    vidslides completions bash > vidslides.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short = 'L', long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The level is lowered or raised once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "vidslides", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Optimize(args) => run_optimize(&config, args),
        Commands::Translate(args) => run_translate(config, args).await,
        Commands::Check(args) => Ok(run_check(&config, args).await?),
        Commands::History { results_dir } => run_history(&config, results_dir),
        Commands::Completions { .. } => Ok(()),
    }
}

// @loads: Config file with CLI overrides, then applies the log level
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    Ok(config)
}

fn run_optimize(config: &Config, args: OptimizeArgs) -> Result<()> {
    if !args.input.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", args.input));
    }

    let optimizer = SubtitleOptimizer::new(config.merge.clone());
    let (output, outcome) = optimize_srt_file(
        &optimizer,
        &args.input,
        args.output.as_deref(),
        args.language.as_deref(),
    )?;

    info!(
        "{} strategy: {} -> {} segments ({:.1}% reduction)",
        outcome.strategy,
        outcome.original_count,
        outcome.optimized_count,
        outcome.reduction_percent()
    );
    if !outcome.exceeds_reduction(config.merge.min_reduction_percent) {
        warn!(
            "Reduction is below {:.0}%; the pipeline would keep the original captions",
            config.merge.min_reduction_percent
        );
    }
    info!("Success: {:?}", output);

    Ok(())
}

async fn run_translate(config: Config, args: TranslateArgs) -> Result<()> {
    if !args.input.is_file() {
        return Err(anyhow!("Input file does not exist: {:?}", args.input));
    }

    let source_language = args.source_language.clone().unwrap_or_else(|| config.source_language.clone());
    let target_language = args.target_language.clone().unwrap_or_else(|| config.target_language.clone());
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_translation_path(&args.input, &target_language));

    if output.exists() && !args.force_overwrite {
        warn!("Output file already exists: {:?}. Use -f to force overwrite.", output);
        return Ok(());
    }

    let collection = SubtitleCollection::from_srt_file(&args.input, Some(source_language.clone()))?;
    let texts = collection.texts();
    if texts.is_empty() {
        warn!("No subtitles found in {:?}", args.input);
        return Ok(());
    }

    let progress_bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg} {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar.set_message("Translating");

    let bar = progress_bar.clone();
    let update_bar = move |percent: f64| bar.set_position(percent.clamp(0.0, 100.0) as u64);
    let on_progress: &dyn ProgressSink = &update_bar;

    let translations = match args.provider.clone().map(AiProvider::from) {
        Some(provider) => {
            let backend = backend_for(
                provider,
                args.model.as_deref(),
                args.api_key.as_deref(),
                &config.translation,
            )?;
            info!("🚀 vidslides: {} - {}", provider.display_name(), backend.model());

            let scheduler = BatchScheduler::new(BatchLimits::from_config(provider, &config.translation));
            scheduler
                .translate(&texts, &source_language, &target_language, backend.as_ref(), Some(on_progress))
                .await
        }
        None => {
            info!("🚀 vidslides: web translation");
            let translator = Arc::new(GoogleWebTranslator::default());
            batch_translate(
                translator,
                &texts,
                &source_language,
                &target_language,
                config.translation.common.web_concurrency,
                &TranslationCache::default(),
                Some(on_progress),
            )
            .await
        }
    };
    progress_bar.finish_and_clear();

    let translated: Vec<SubtitleSegment> = collection
        .entries
        .iter()
        .zip(translations)
        .map(|(entry, text)| SubtitleSegment::new(entry.index, entry.start_time, entry.end_time, text))
        .collect();
    write_srt(&output, &translated)?;

    info!("Success: {:?}", output);
    Ok(())
}

async fn run_check(config: &Config, args: CheckArgs) -> Result<(), AppError> {
    let provider = AiProvider::from(args.provider);
    info!("Checking {}...", provider.display_name());

    let backend = check_provider(provider, args.model.as_deref(), args.api_key.as_deref(), &config.translation).await?;
    info!("Success: {} ({}) is reachable", provider.display_name(), backend.model());

    Ok(())
}

fn run_history(config: &Config, results_dir: Option<PathBuf>) -> Result<()> {
    let dir = results_dir.unwrap_or_else(|| config.pipeline.results_dir.clone());
    let store = ResultStore::new(dir);
    let saved = store.list()?;

    if saved.is_empty() {
        info!("No saved results in {:?}", store.dir());
        return Ok(());
    }

    let mut stdout = std::io::stdout();
    for entry in &saved {
        writeln!(
            stdout,
            "{}  {}  {} frames  {}",
            entry.timestamp, entry.video_id, entry.result.total_frames, entry.result.title
        )?;
    }
    info!("{} saved results", saved.len());

    Ok(())
}

// @generates: Output path for a translated subtitle file
fn default_translation_path(input: &Path, target_language: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitles".to_string());
    input.with_file_name(format!("{}.{}.srt", stem, target_language))
}
