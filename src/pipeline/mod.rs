/*!
 * Background job pipeline.
 *
 * - `request`: what a job is asked to do
 * - `collaborators`: traits for the services the pipeline drives
 * - `job` / `registry`: job state, progress history and the job table
 * - `results`: job output and the on-disk result history
 * - `orchestrator`: the staged runner
 */

pub use self::collaborators::{
    CaptionSet, CaptionTrack, CapturedFrame, FrameCapture, OutlineRequest, OutlineResult, OutlineService,
    ProgressSink, Transcriber, Transcription, VideoInfo, VideoSource,
};
pub use self::job::{Job, JobId, JobSnapshot, JobStatus, ProgressEvent};
pub use self::orchestrator::{scale_progress, Pipeline, PipelineServices};
pub use self::registry::{JobHandle, JobRegistry};
pub use self::request::{ProcessRequest, VideoQuality};
pub use self::results::{Frame, ProcessResult, ResultStore, SavedResult};

pub mod collaborators;
pub mod job;
pub mod orchestrator;
pub mod registry;
pub mod request;
pub mod results;
