/*!
 * Services the pipeline drives but does not implement.
 *
 * Video download, caption retrieval, audio transcription, frame capture and
 * outline generation are reached through these traits. Long-running calls
 * report their own percentage through a `ProgressSink`.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_config::AiProvider;

use super::request::VideoQuality;

/// Receives completion percentages (0 to 100) from a running operation
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, percent: f64) {
        self(percent)
    }
}

/// Video metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Seconds
    #[serde(default)]
    pub duration: f64,
    /// Languages with uploader-provided captions
    #[serde(default)]
    pub available_subtitles: Vec<String>,
    /// Languages with machine-generated captions
    #[serde(default)]
    pub automatic_captions: Vec<String>,
}

/// One downloaded caption file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    pub language: String,
    pub path: PathBuf,
    /// Machine-generated rather than uploaded
    pub auto_generated: bool,
}

/// Caption files in preference order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionSet {
    pub tracks: Vec<CaptionTrack>,
}

impl CaptionSet {
    pub fn new(tracks: Vec<CaptionTrack>) -> Self {
        Self { tracks }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The first track, which the pipeline uses
    pub fn primary(&self) -> Option<&CaptionTrack> {
        self.tracks.first()
    }

    /// Language to file path
    pub fn paths(&self) -> HashMap<String, PathBuf> {
        self.tracks
            .iter()
            .map(|track| (track.language.clone(), track.path.clone()))
            .collect()
    }
}

/// Output of an audio transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub subtitle_path: PathBuf,
    /// Detected language
    pub language: String,
}

/// A screenshot written by a `FrameCapture`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedFrame {
    /// Seconds into the video
    pub timestamp: f64,
    pub path: PathBuf,
    pub filename: String,
    /// Caption text shown at `timestamp`
    pub subtitle: String,
    pub size_bytes: u64,
}

/// Input for outline generation
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineRequest {
    pub title: String,
    pub description: String,
    /// Every subtitle text of the video, in order
    pub subtitles: Vec<String>,
    pub provider: AiProvider,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// Language the outline is written in
    pub language: String,
}

/// Generated outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineResult {
    pub outline: String,
    /// Provider that produced it, lowercase
    pub provider: String,
    pub model: String,
}

/// Video metadata, download and captions
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn get_info(&self, url: &str) -> Result<VideoInfo>;

    /// Download the video and return its local path
    async fn download(&self, url: &str, quality: VideoQuality, progress: &dyn ProgressSink) -> Result<PathBuf>;

    /// Download caption files; an empty set means none were found
    async fn get_captions(
        &self,
        url: &str,
        requested_languages: Option<&[String]>,
        info: &VideoInfo,
    ) -> Result<CaptionSet>;
}

/// Speech-to-text over a downloaded video
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        video_path: &Path,
        video_id: &str,
        api_key: &str,
        language_hint: Option<&str>,
    ) -> Result<Transcription>;
}

/// Screenshot extraction
#[async_trait]
pub trait FrameCapture: Send + Sync {
    /// One frame per timestamp; `subtitles` is parallel to `timestamps`
    async fn extract_frames(
        &self,
        video_path: &Path,
        video_id: &str,
        timestamps: &[f64],
        subtitles: &[String],
        quality: VideoQuality,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<CapturedFrame>>;

    /// Recompress a frame in place and return its new size in bytes
    async fn compress_frame(&self, path: &Path) -> Result<u64>;
}

/// Produces a structured summary of a video
#[async_trait]
pub trait OutlineService: Send + Sync {
    async fn generate_outline(&self, request: OutlineRequest) -> Result<OutlineResult>;
}
