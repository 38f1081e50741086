/*!
 * Common test utilities for the vidslides test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use vidslides::app_config::Config;
use vidslides::subtitle_processor::SubtitleSegment;

// Re-export the mock collaborators module
pub mod mock_collaborators;

/// Route library logs through env_logger, once per test binary
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Uploaded-style captions: punctuated, sentence-sized
pub const HUMAN_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
Welcome to the talk.

2
00:00:05,000 --> 00:00:09,000
Today we look at caption merging.

3
00:00:10,000 --> 00:00:14,000
Let's get started.
";

/// Auto-generated style captions: short, unpunctuated, back to back
pub fn auto_srt() -> String {
    let words = [
        "so today we are", "going to talk", "about how captions", "get generated by",
        "speech recognition", "and why they", "often come without", "any punctuation",
        "which makes them", "hard to read", "when you take", "screenshots of them",
    ];

    words
        .iter()
        .enumerate()
        .map(|(i, text)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                SubtitleSegment::format_timestamp(i as f64),
                SubtitleSegment::format_timestamp(i as f64 + 1.0),
                text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fragments with the given texts, one second each, back to back
pub fn fragments(texts: &[&str]) -> Vec<SubtitleSegment> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| SubtitleSegment::new(i + 1, i as f64, i as f64 + 1.0, *text))
        .collect()
}

/// Config whose output directories live under `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.pipeline.results_dir = dir.join("results");
    config.pipeline.subtitles_dir = dir.join("subtitles");
    config
}

/// All text with whitespace removed, for concatenation checks
pub fn squash<'a, I: IntoIterator<Item = &'a str>>(texts: I) -> String {
    texts
        .into_iter()
        .flat_map(|t| t.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}
