/*!
 * Staged video-to-slides job runner.
 *
 * A submitted job runs on its own task and walks a fixed sequence of stages:
 * metadata, download, captions (platform or transcribed), optional caption
 * optimization, parsing, keyframe selection, optional translation, frame
 * capture and compression, optional outline, and finalization. Each stage
 * reports into a fixed slice of the 0-100 progress range.
 *
 * Optional stages degrade instead of failing the job: a failed caption
 * optimization keeps the original captions, an unavailable AI backend falls
 * back to the web translator, a failed translated-file write or outline is
 * logged and skipped. Every other error fails the job with the error's
 * message.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};

use crate::app_config::{AiProvider, Config};
use crate::errors::PipelineError;
use crate::keyframes::{select_timestamps, text_at};
use crate::outline::AiOutlineService;
use crate::providers::{backend_for, CompletionBackend};
use crate::segmentation::{optimize_srt_file, SubtitleOptimizer};
use crate::subtitle_processor::{write_srt, SubtitleCollection, SubtitleSegment};
use crate::translation::{batch_translate, BatchLimits, BatchScheduler, GoogleWebTranslator, TextTranslator, TranslationCache};

use super::collaborators::{
    FrameCapture, OutlineRequest, OutlineService, ProgressSink, Transcriber, VideoInfo, VideoSource,
};
use super::job::{JobId, JobSnapshot, JobStatus};
use super::registry::{JobHandle, JobRegistry};
use super::request::ProcessRequest;
use super::results::{Frame, ProcessResult, ResultStore};

/// Map a 0-100 sub-operation percentage into a stage's progress slice
///
/// `base + floor(percent * factor)`, with `percent` clamped to 0-100.
pub fn scale_progress(base: u8, factor: f64, percent: f64) -> u8 {
    let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let offset = (percent * factor).floor() as u8;
    base.saturating_add(offset).min(100)
}

/// External services used by the pipeline
#[derive(Clone)]
pub struct PipelineServices {
    pub video_source: Arc<dyn VideoSource>,
    pub transcriber: Arc<dyn Transcriber>,
    pub frame_capture: Arc<dyn FrameCapture>,
    pub outline: Arc<dyn OutlineService>,
    pub text_translator: Arc<dyn TextTranslator>,
    /// Backend used for AI translation instead of one built from config
    pub ai_backend: Option<Arc<dyn CompletionBackend>>,
}

impl PipelineServices {
    /// Services with the built-in outline generator and web translator
    pub fn new(
        config: &Config,
        video_source: Arc<dyn VideoSource>,
        transcriber: Arc<dyn Transcriber>,
        frame_capture: Arc<dyn FrameCapture>,
    ) -> Self {
        Self {
            video_source,
            transcriber,
            frame_capture,
            outline: Arc::new(AiOutlineService::new(config.translation.clone())),
            text_translator: Arc::new(GoogleWebTranslator::default()),
            ai_backend: None,
        }
    }

    pub fn with_outline_service(mut self, outline: Arc<dyn OutlineService>) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_text_translator(mut self, translator: Arc<dyn TextTranslator>) -> Self {
        self.text_translator = translator;
        self
    }

    pub fn with_ai_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.ai_backend = Some(backend);
        self
    }
}

/// Progress reporting for one running job
struct JobReporter {
    id: JobId,
    handle: JobHandle,
}

impl JobReporter {
    fn report(&self, step: &str, progress: u8, message: impl Into<String>) {
        let message = message.into();
        debug!("Job {} [{}] {}% {}", short_id(&self.id), step, progress, message);
        self.handle.lock().update(step, None, Some(progress), message);
    }

    fn transition(&self, status: JobStatus, step: &str, progress: u8, message: impl Into<String>) {
        self.handle.lock().update(step, Some(status), Some(progress), message);
    }
}

/// Caption file chosen for the rest of the pipeline
struct SelectedCaptions {
    subtitles: HashMap<String, PathBuf>,
    language: String,
    path: PathBuf,
    auto_generated: bool,
}

/// Background job runner
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    services: PipelineServices,
    registry: JobRegistry,
    results: ResultStore,
    optimizer: SubtitleOptimizer,
    cache: TranslationCache,
}

impl Pipeline {
    pub fn new(config: Config, services: PipelineServices) -> Self {
        let registry = JobRegistry::new(config.pipeline.history_capacity);
        let results = ResultStore::new(config.pipeline.results_dir.clone());
        let optimizer = SubtitleOptimizer::new(config.merge.clone());

        Self {
            config: Arc::new(config),
            services,
            registry,
            results,
            optimizer,
            cache: TranslationCache::new(true),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Register a job and start it on a background task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, request: ProcessRequest) -> JobId {
        let (job_id, _) = self.registry.create();
        info!("Job {} queued for {}", short_id(&job_id), request.url);

        let pipeline = self.clone();
        let task_id = job_id.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline.run(&task_id, request).await {
                error!("Job {} could not run: {}", short_id(&task_id), e);
            }
        });

        job_id
    }

    /// Current state of a job, `None` for unknown ids
    pub fn status(&self, job_id: &str) -> Option<JobSnapshot> {
        self.registry.snapshot(job_id)
    }

    /// Run a registered job to completion and return its final state
    pub async fn run(&self, job_id: &str, request: ProcessRequest) -> Result<JobSnapshot, PipelineError> {
        let handle = self
            .registry
            .get(job_id)
            .ok_or_else(|| PipelineError::JobNotFound(job_id.to_string()))?;
        let job = JobReporter {
            id: job_id.to_string(),
            handle: Arc::clone(&handle),
        };

        match self.execute(&job, &request).await {
            Ok(result) => {
                if self.config.pipeline.persist_results {
                    if let Err(e) = self.results.save(job_id, &result) {
                        warn!("Failed to save result for job {}: {:#}", short_id(job_id), e);
                    }
                }
                info!(
                    "Job {} completed: {} frames in {:.1}s",
                    short_id(job_id),
                    result.total_frames,
                    result.processing_time
                );
                handle.lock().complete(result, "Processing complete");
            }
            Err(e) => {
                error!("Job {} failed: {}", short_id(job_id), e);
                handle.lock().fail(e.to_string());
            }
        }

        let snapshot = handle.lock().snapshot();
        Ok(snapshot)
    }

    async fn execute(&self, job: &JobReporter, request: &ProcessRequest) -> Result<ProcessResult, PipelineError> {
        job.transition(JobStatus::Processing, "prepare", 5, "Starting job");
        let started = Instant::now();

        job.report("metadata", 10, "Fetching video info");
        let info = self.services.video_source.get_info(&request.url).await?;
        job.report("metadata", 12, format!("Video info fetched: {}", info.title));

        job.report("download_video", 20, "Downloading video");
        let download_progress = |percent: f64| {
            job.report(
                "download_video",
                scale_progress(20, 0.15, percent),
                format!("Downloading video... {}%", percent.clamp(0.0, 100.0) as u8),
            )
        };
        let video_path = self
            .services
            .video_source
            .download(&request.url, request.quality, &download_progress)
            .await?;
        job.report("download_video", 35, "Video downloaded");

        let mut captions = self.acquire_captions(job, request, &info, &video_path).await?;
        job.report("subtitle_selection", 50, format!("Using {} subtitles", captions.language));

        self.optimize_captions(job, &mut captions);

        job.report("subtitle_parse", 58, "Parsing subtitles");
        let collection = SubtitleCollection::from_srt_file(&captions.path, Some(captions.language.clone()))?;
        let segments = collection.entries;
        job.report("subtitle_parse", 62, format!("Parsed {} subtitle segments", segments.len()));

        let timestamps = select_timestamps(&segments, request.screenshot_position, request.screenshot_offset);
        job.report("keyframe_selection", 65, format!("Selected {} screenshot timestamps", timestamps.len()));

        let texts: Vec<String> = timestamps.iter().map(|&t| text_at(t, &segments)).collect();

        let mut translated_texts = None;
        let mut translated_subtitle = None;
        match request.translate_to.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(target) => {
                job.report("translate", 68, format!("Translating subtitles to {}", target));
                let translations = self.translate_texts(job, request, &texts, &captions.language, target).await;
                translated_subtitle = self.write_translated_srt(&info.id, target, &segments, &translations);
                translated_texts = Some(translations);
                job.report("translate", 72, "Subtitle translation complete");
            }
            None => job.report("translate", 72, "Translation not requested, skipping"),
        }

        job.report("frame_capture", 75, "Capturing frames");
        let capture_progress = |percent: f64| {
            job.report(
                "frame_capture",
                scale_progress(75, 0.10, percent),
                format!("Capturing frames... {}%", percent.clamp(0.0, 100.0) as u8),
            )
        };
        let captured = self
            .services
            .frame_capture
            .extract_frames(&video_path, &info.id, &timestamps, &texts, request.quality, &capture_progress)
            .await?;
        job.report("frame_capture", 85, format!("Captured {} frames", captured.len()));

        job.report("frame_optimize", 86, "Compressing frames");
        let total = captured.len();
        let interval = self.config.pipeline.frame_progress_interval.max(1);
        let mut frames = Vec::with_capacity(total);

        for (i, frame) in captured.into_iter().enumerate() {
            let size_bytes = self.services.frame_capture.compress_frame(&frame.path).await?;
            let subtitle_translated = translated_texts.as_ref().and_then(|t| t.get(i).cloned());

            frames.push(Frame {
                index: i + 1,
                timestamp: frame.timestamp,
                path: frame.path,
                filename: frame.filename,
                subtitle: Some(frame.subtitle),
                subtitle_translated,
                size_bytes,
            });

            let done = i + 1;
            if done % interval == 0 || done == total {
                let percent = done as f64 * 100.0 / total as f64;
                job.report(
                    "frame_optimize",
                    scale_progress(86, 0.04, percent),
                    format!("Compressing frames... {}/{}", done, total),
                );
            }
        }
        job.report("frame_optimize", 90, "Frames optimized");

        let (ai_outline, ai_provider) = self.generate_outline(job, request, &info, &segments).await;

        job.report("finalize", 98, "Assembling results");

        Ok(ProcessResult {
            video_id: info.id,
            title: info.title,
            total_frames: frames.len(),
            frames,
            subtitles: captions.subtitles,
            processing_time: started.elapsed().as_secs_f64(),
            ai_outline,
            ai_provider,
            translated_subtitle,
        })
    }

    /// Transcribe or download captions, with the platform captions as fallback
    async fn acquire_captions(
        &self,
        job: &JobReporter,
        request: &ProcessRequest,
        info: &VideoInfo,
        video_path: &Path,
    ) -> Result<SelectedCaptions, PipelineError> {
        job.report("fetch_subtitles", 38, "Fetching subtitles");
        let requested = request.subtitle_languages.as_deref();

        let transcription_error = match request.whisper_api_key.as_deref().filter(|_| request.wants_transcription()) {
            Some(api_key) => {
                job.report("ai_transcription", 40, "Transcribing audio");
                match self.services.transcriber.transcribe(video_path, &info.id, api_key, None).await {
                    Ok(transcription) => {
                        job.report(
                            "ai_transcription",
                            45,
                            format!("Transcription complete ({})", transcription.language),
                        );
                        let mut subtitles = HashMap::new();
                        subtitles.insert(transcription.language.clone(), transcription.subtitle_path.clone());
                        return Ok(SelectedCaptions {
                            subtitles,
                            language: transcription.language,
                            path: transcription.subtitle_path,
                            auto_generated: false,
                        });
                    }
                    Err(e) => {
                        warn!("Transcription failed for {}: {:#}", info.id, e);
                        job.report(
                            "ai_transcription",
                            38,
                            format!("Transcription failed ({}), falling back to platform subtitles", e),
                        );
                        Some(e.to_string())
                    }
                }
            }
            None => {
                job.report("fetch_subtitles", 40, "Downloading platform subtitles");
                None
            }
        };

        let caption_set = self.services.video_source.get_captions(&request.url, requested, info).await?;

        let Some(primary) = caption_set.primary() else {
            return Err(match transcription_error {
                Some(e) => PipelineError::TranscriptionFallback(e),
                None => PipelineError::NoCaptions,
            });
        };

        let message = if transcription_error.is_some() {
            "Switched to platform subtitles"
        } else {
            "Subtitles downloaded"
        };
        job.report("fetch_subtitles", 47, message);

        Ok(SelectedCaptions {
            subtitles: caption_set.paths(),
            language: primary.language.clone(),
            path: primary.path.clone(),
            auto_generated: primary.auto_generated,
        })
    }

    /// Merge machine-generated captions when it shrinks them enough
    fn optimize_captions(&self, job: &JobReporter, captions: &mut SelectedCaptions) {
        if !captions.auto_generated {
            job.report("subtitle_optimize", 50, "Uploaded subtitles, skipping optimization");
            return;
        }

        job.report("subtitle_optimize", 52, "Optimizing auto-generated subtitles");
        let min_reduction = self.optimizer.config().min_reduction_percent;

        match optimize_srt_file(&self.optimizer, &captions.path, None, Some(&captions.language)) {
            Ok((optimized_path, outcome)) if outcome.exceeds_reduction(min_reduction) => {
                captions
                    .subtitles
                    .insert(captions.language.clone(), optimized_path.clone());
                captions.path = optimized_path;
                job.report(
                    "subtitle_optimize",
                    55,
                    format!("Subtitles optimized, {:.1}% fewer segments", outcome.reduction_percent()),
                );
            }
            Ok((_, outcome)) => {
                debug!(
                    "Optimization reduced segments by {:.2}%, below {:.1}%",
                    outcome.reduction_percent(),
                    min_reduction
                );
                job.report("subtitle_optimize", 53, "Optimization changed little, keeping original subtitles");
            }
            Err(e) => {
                warn!("Subtitle optimization failed: {:#}", e);
                job.report("subtitle_optimize", 52, "Subtitle optimization failed, keeping original subtitles");
            }
        }
    }

    /// Translate keyframe texts through the AI backend or the web translator
    async fn translate_texts(
        &self,
        job: &JobReporter,
        request: &ProcessRequest,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Vec<String> {
        let progress = |percent: f64| {
            job.report(
                "translate",
                scale_progress(68, 0.04, percent),
                format!("Translating subtitles... {}%", percent.clamp(0.0, 100.0) as u8),
            )
        };
        let progress: &dyn ProgressSink = &progress;

        if let Some(provider) = request.outline_provider() {
            match self.ai_backend(provider, request) {
                Ok(backend) => {
                    job.report("translate", 69, format!("Translating subtitles with {}", provider));
                    let limits = BatchLimits::from_config(provider, &self.config.translation);
                    return BatchScheduler::new(limits)
                        .translate(texts, source_language, target_language, backend.as_ref(), Some(progress))
                        .await;
                }
                Err(e) => warn!("AI translation unavailable, falling back to web translation: {}", e),
            }
        }

        batch_translate(
            Arc::clone(&self.services.text_translator),
            texts,
            source_language,
            target_language,
            self.config.translation.common.web_concurrency,
            &self.cache,
            Some(progress),
        )
        .await
    }

    fn ai_backend(
        &self,
        provider: AiProvider,
        request: &ProcessRequest,
    ) -> Result<Arc<dyn CompletionBackend>, crate::errors::TranslationError> {
        if let Some(backend) = &self.services.ai_backend {
            return Ok(Arc::clone(backend));
        }
        backend_for(
            provider,
            request.ai_model.as_deref(),
            request.api_key.as_deref(),
            &self.config.translation,
        )
    }

    /// Write the translated SRT; a failure is logged and yields `None`
    fn write_translated_srt(
        &self,
        video_id: &str,
        target_language: &str,
        segments: &[SubtitleSegment],
        translations: &[String],
    ) -> Option<PathBuf> {
        let path = self
            .config
            .pipeline
            .subtitles_dir
            .join(format!("{}.{}.translated.srt", video_id, target_language));

        let translated: Vec<SubtitleSegment> = segments
            .iter()
            .zip(translations)
            .enumerate()
            .map(|(i, (segment, text))| SubtitleSegment::new(i + 1, segment.start_time, segment.end_time, text.clone()))
            .collect();

        match write_srt(&path, &translated) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write translated subtitles to {}: {:#}", path.display(), e);
                None
            }
        }
    }

    /// Generate the outline when requested; failures are logged and skipped
    async fn generate_outline(
        &self,
        job: &JobReporter,
        request: &ProcessRequest,
        info: &VideoInfo,
        segments: &[SubtitleSegment],
    ) -> (Option<String>, Option<String>) {
        let Some(provider) = request.outline_provider() else {
            job.report("ai_outline", 92, "AI outline not requested, skipping");
            return (None, None);
        };

        job.report("ai_outline", 92, format!("Generating outline with {}", provider));
        let outline_request = OutlineRequest {
            title: info.title.clone(),
            description: info.description.clone(),
            subtitles: segments.iter().map(|s| s.text.clone()).collect(),
            provider,
            model: request.ai_model.clone(),
            api_key: request.api_key.clone(),
            language: request
                .translate_to
                .clone()
                .unwrap_or_else(|| self.config.target_language.clone()),
        };

        match self.services.outline.generate_outline(outline_request).await {
            Ok(outline) => {
                job.report("ai_outline", 95, "AI outline generated");
                (Some(outline.outline), Some(outline.provider))
            }
            Err(e) => {
                warn!("AI outline generation failed: {:#}", e);
                job.report("ai_outline", 95, "AI outline generation failed, skipping");
                (None, None)
            }
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
