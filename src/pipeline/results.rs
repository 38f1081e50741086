/*!
 * Job results and their on-disk history.
 *
 * A completed job produces a `ProcessResult`. When persistence is enabled it
 * is wrapped in a `SavedResult` and written to `<results_dir>/<video_id>.json`,
 * replacing any earlier result for the same video.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::file_utils::FileManager;

/// One captured slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 1-based position in the slide sequence
    pub index: usize,
    /// Seconds into the video
    pub timestamp: f64,
    pub path: PathBuf,
    pub filename: String,
    pub subtitle: Option<String>,
    pub subtitle_translated: Option<String>,
    pub size_bytes: u64,
}

/// Output of a completed job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub video_id: String,
    pub title: String,
    pub total_frames: usize,
    pub frames: Vec<Frame>,
    /// Caption language to subtitle file
    pub subtitles: HashMap<String, PathBuf>,
    /// Seconds spent in the pipeline
    pub processing_time: f64,
    #[serde(default)]
    pub ai_outline: Option<String>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub translated_subtitle: Option<PathBuf>,
}

/// A persisted result with its job metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResult {
    pub job_id: String,
    pub video_id: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub result: ProcessResult,
}

/// Directory of saved results, one file per video
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a video's result is stored in
    pub fn path_for(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", video_id))
    }

    /// Save a result, replacing an earlier one for the same video
    pub fn save(&self, job_id: &str, result: &ProcessResult) -> Result<PathBuf> {
        let saved = SavedResult {
            job_id: job_id.to_string(),
            video_id: result.video_id.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            result: result.clone(),
        };

        let path = self.path_for(&result.video_id);
        let json = serde_json::to_string_pretty(&saved).context("Failed to serialize result")?;
        FileManager::write_atomic(&path, &json)?;

        info!("Result saved to {}", path.display());
        Ok(path)
    }

    /// Load one video's saved result, if any
    pub fn load(&self, video_id: &str) -> Result<Option<SavedResult>> {
        let path = self.path_for(video_id);
        if !FileManager::file_exists(&path) {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    /// All saved results, newest first
    ///
    /// Files that cannot be read or parsed are skipped.
    pub fn list(&self) -> Result<Vec<SavedResult>> {
        let mut results: Vec<SavedResult> = FileManager::find_files(&self.dir, "json")?
            .iter()
            .filter_map(|path| match Self::read(path) {
                Ok(saved) => Some(saved),
                Err(e) => {
                    warn!("Failed to load {}: {:#}", path.display(), e);
                    None
                }
            })
            .collect();

        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!("Loaded {} saved results from {}", results.len(), self.dir.display());
        Ok(results)
    }

    /// Delete a video's saved result; returns whether one existed
    pub fn delete(&self, video_id: &str) -> Result<bool> {
        FileManager::remove_file_if_exists(self.path_for(video_id))
    }

    fn read(path: &Path) -> Result<SavedResult> {
        let content = FileManager::read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid result file: {:?}", path))
    }
}
