/*!
 * Mock pipeline collaborators for testing
 *
 * Each mock records how it was called so tests can assert on the stages the
 * pipeline ran and the data it passed along.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;

use vidslides::pipeline::{
    CaptionSet, CaptionTrack, CapturedFrame, FrameCapture, OutlineRequest, OutlineResult, OutlineService,
    ProgressSink, Transcriber, Transcription, VideoInfo, VideoQuality, VideoSource,
};
use vidslides::translation::TextTranslator;

/// Video info used by the mock source
pub fn sample_info() -> VideoInfo {
    VideoInfo {
        id: "vid123".to_string(),
        title: "Caption Talk".to_string(),
        description: "A talk about captions".to_string(),
        duration: 12.0,
        available_subtitles: Vec::new(),
        automatic_captions: vec!["en".to_string()],
    }
}

/// Video source serving a fixed info and caption set
pub struct MockVideoSource {
    info: VideoInfo,
    captions: CaptionSet,
    video_path: PathBuf,
    fail_info: bool,
    caption_calls: AtomicUsize,
}

impl MockVideoSource {
    pub fn new(video_path: PathBuf, captions: CaptionSet) -> Self {
        Self {
            info: sample_info(),
            captions,
            video_path,
            fail_info: false,
            caption_calls: AtomicUsize::new(0),
        }
    }

    /// Source with a single caption track
    pub fn with_track(video_path: PathBuf, language: &str, path: PathBuf, auto_generated: bool) -> Self {
        Self::new(
            video_path,
            CaptionSet::new(vec![CaptionTrack {
                language: language.to_string(),
                path,
                auto_generated,
            }]),
        )
    }

    /// Source without any captions
    pub fn without_captions(video_path: PathBuf) -> Self {
        Self::new(video_path, CaptionSet::default())
    }

    pub fn failing_info(mut self) -> Self {
        self.fail_info = true;
        self
    }

    pub fn caption_calls(&self) -> usize {
        self.caption_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSource for MockVideoSource {
    async fn get_info(&self, _url: &str) -> Result<VideoInfo> {
        if self.fail_info {
            return Err(anyhow!("Video unavailable"));
        }
        Ok(self.info.clone())
    }

    async fn download(&self, _url: &str, _quality: VideoQuality, progress: &dyn ProgressSink) -> Result<PathBuf> {
        for percent in [0.0, 50.0, 100.0] {
            progress.on_progress(percent);
        }
        Ok(self.video_path.clone())
    }

    async fn get_captions(
        &self,
        _url: &str,
        _requested_languages: Option<&[String]>,
        _info: &VideoInfo,
    ) -> Result<CaptionSet> {
        self.caption_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.captions.clone())
    }
}

/// Transcriber returning a fixed file or a fixed error
pub struct MockTranscriber {
    outcome: Result<Transcription, String>,
    calls: AtomicUsize,
}

impl MockTranscriber {
    pub fn succeeding(subtitle_path: PathBuf, language: &str) -> Self {
        Self {
            outcome: Ok(Transcription {
                subtitle_path,
                language: language.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Transcriber that must never be reached
    pub fn unused() -> Self {
        Self::failing("transcriber should not be called")
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(
        &self,
        _video_path: &Path,
        _video_id: &str,
        _api_key: &str,
        _language_hint: Option<&str>,
    ) -> Result<Transcription> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().map_err(|e| anyhow!(e))
    }
}

/// Frame capture that records its input instead of running ffmpeg
pub struct MockFrameCapture {
    frames_dir: PathBuf,
    failure: Option<String>,
    timestamps: Mutex<Vec<f64>>,
    subtitles: Mutex<Vec<String>>,
    compressed: AtomicUsize,
}

impl MockFrameCapture {
    pub fn new(frames_dir: PathBuf) -> Self {
        Self {
            frames_dir,
            failure: None,
            timestamps: Mutex::new(Vec::new()),
            subtitles: Mutex::new(Vec::new()),
            compressed: AtomicUsize::new(0),
        }
    }

    pub fn failing(frames_dir: PathBuf, message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(frames_dir)
        }
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.timestamps.lock().clone()
    }

    pub fn subtitles(&self) -> Vec<String> {
        self.subtitles.lock().clone()
    }

    pub fn compressed(&self) -> usize {
        self.compressed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameCapture for MockFrameCapture {
    async fn extract_frames(
        &self,
        _video_path: &Path,
        video_id: &str,
        timestamps: &[f64],
        subtitles: &[String],
        _quality: VideoQuality,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<CapturedFrame>> {
        if let Some(message) = &self.failure {
            return Err(anyhow!(message.clone()));
        }

        self.timestamps.lock().extend_from_slice(timestamps);
        self.subtitles.lock().extend_from_slice(subtitles);

        let total = timestamps.len().max(1) as f64;
        let frames = timestamps
            .iter()
            .zip(subtitles)
            .enumerate()
            .map(|(i, (&timestamp, subtitle))| {
                progress.on_progress((i + 1) as f64 * 100.0 / total);
                let filename = format!("{}_{:04}.jpg", video_id, i + 1);
                CapturedFrame {
                    timestamp,
                    path: self.frames_dir.join(&filename),
                    filename,
                    subtitle: subtitle.clone(),
                    size_bytes: 4096,
                }
            })
            .collect();

        Ok(frames)
    }

    async fn compress_frame(&self, _path: &Path) -> Result<u64> {
        self.compressed.fetch_add(1, Ordering::SeqCst);
        Ok(1024)
    }
}

/// Outline service returning a fixed outline or a fixed error
pub struct MockOutlineService {
    fail: bool,
    requests: Mutex<Vec<OutlineRequest>>,
}

impl MockOutlineService {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<OutlineRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl OutlineService for MockOutlineService {
    async fn generate_outline(&self, request: OutlineRequest) -> Result<OutlineResult> {
        let provider = request.provider.to_lowercase_string();
        let title = request.title.clone();
        self.requests.lock().push(request);

        if self.fail {
            return Err(anyhow!("outline provider unreachable"));
        }

        Ok(OutlineResult {
            outline: format!("# {}\n- Captions", title),
            provider,
            model: "mock-model".to_string(),
        })
    }
}

/// Per-item translator that prefixes every text with `[tl] `
#[derive(Default)]
pub struct MockTextTranslator {
    fail_on: Option<String>,
    calls: AtomicUsize,
}

impl MockTextTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translator that errors on exactly this input
    pub fn failing_on(text: &str) -> Self {
        Self {
            fail_on: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl TextTranslator for MockTextTranslator {
    async fn translate_one(&self, text: &str, _source_language: &str, _target_language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_deref() == Some(text) {
            return Err(anyhow!("translation service returned 503"));
        }
        Ok(format!("[tl] {}", text))
    }
}
