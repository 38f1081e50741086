/*!
 * Tests for the job state machine, its history and the job registry
 */

use std::collections::HashMap;

use vidslides::pipeline::{Job, JobRegistry, JobStatus, ProcessResult};

fn empty_result() -> ProcessResult {
    ProcessResult {
        video_id: "vid".to_string(),
        title: "Title".to_string(),
        total_frames: 0,
        frames: Vec::new(),
        subtitles: HashMap::new(),
        processing_time: 0.5,
        ai_outline: None,
        ai_provider: None,
        translated_subtitle: None,
    }
}

#[test]
fn test_update_withManyEvents_shouldKeepNewestWithinCapacity() {
    let mut job = Job::new("job", 3);
    for step in 1..=5u8 {
        job.update(&format!("step{}", step), Some(JobStatus::Processing), Some(step * 10), "working");
    }

    let steps: Vec<&str> = job.history().map(|e| e.step.as_str()).collect();
    assert_eq!(steps, vec!["step3", "step4", "step5"]);
    assert_eq!(job.progress(), 50);
}

#[test]
fn test_update_shouldRecordMonotonicProgress() {
    let mut job = Job::new("job", 50);
    for progress in [5, 20, 12, 40, 38, 100] {
        job.update("stage", Some(JobStatus::Processing), Some(progress), "tick");
    }

    let recorded: Vec<u8> = job.history().map(|e| e.progress).collect();
    assert!(recorded.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", recorded);
    assert_eq!(job.progress(), 100);
}

#[test]
fn test_update_withProgressAbove100_shouldClamp() {
    let mut job = Job::new("job", 10);
    job.update("stage", None, Some(250), "overflow");

    assert_eq!(job.progress(), 100);
}

#[test]
fn test_complete_shouldSetResultAndFinalEvent() {
    let mut job = Job::new("job", 10);
    job.update("prepare", Some(JobStatus::Processing), Some(5), "Starting job");

    assert!(job.complete(empty_result(), "Processing complete"));
    assert_eq!(job.status(), JobStatus::Completed);
    assert_eq!(job.progress(), 100);
    assert_eq!(job.current_step(), "complete");
    assert!(job.result().is_some());
    assert!(job.error().is_none());

    let last = job.history().last().expect("history has events");
    assert_eq!(last.status, JobStatus::Completed);
}

#[test]
fn test_fail_shouldKeepProgressAndRecordError() {
    let mut job = Job::new("job", 10);
    job.update("frame_capture", Some(JobStatus::Processing), Some(75), "Capturing frames");

    assert!(job.fail("ffmpeg exited with status 1"));
    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(job.progress(), 75);
    assert_eq!(job.error(), Some("ffmpeg exited with status 1"));
    assert_eq!(job.message(), "Processing failed: ffmpeg exited with status 1");
    assert!(job.result().is_none());
}

#[test]
fn test_terminal_job_shouldIgnoreFurtherUpdates() {
    let mut job = Job::new("job", 10);
    job.fail("boom");
    let events_before = job.history().count();

    assert!(!job.update("late", Some(JobStatus::Processing), Some(90), "late report"));
    assert!(!job.complete(empty_result(), "late completion"));
    assert!(!job.fail("second failure"));

    assert_eq!(job.status(), JobStatus::Failed);
    assert_eq!(job.error(), Some("boom"));
    assert_eq!(job.history().count(), events_before);
}

#[test]
fn test_history_timestamps_shouldBeRfc3339Utc() {
    let job = Job::new("job", 10);
    let event = job.history().next().expect("queued event");

    assert!(event.timestamp.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(&event.timestamp).is_ok());
}

#[test]
fn test_job_status_shouldParseAndDisplay() {
    for status in [JobStatus::Pending, JobStatus::Processing, JobStatus::Completed, JobStatus::Failed] {
        let parsed: JobStatus = status.to_string().parse().expect("valid status");
        assert_eq!(parsed, status);
    }
    assert!("cancelled".parse::<JobStatus>().is_err());
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
}

#[test]
fn test_snapshot_shouldSerializeWithSnakeCaseStatus() {
    let mut job = Job::new("job-json", 10);
    job.update("download_video", Some(JobStatus::Processing), Some(20), "Downloading video");

    let json = serde_json::to_value(job.snapshot()).expect("serializable snapshot");
    assert_eq!(json["status"], "processing");
    assert_eq!(json["current_step"], "download_video");
    assert_eq!(json["history"].as_array().map(|h| h.len()), Some(2));
}

#[test]
fn test_registry_create_shouldIssueUniqueIds() {
    let registry = JobRegistry::new(10);
    let (first, _) = registry.create();
    let (second, handle) = registry.create();

    assert_ne!(first, second);
    assert_eq!(first.len(), 36);
    assert_eq!(registry.len(), 2);

    handle.lock().update("prepare", Some(JobStatus::Processing), Some(5), "Starting job");
    let snapshot = registry.snapshot(&second).expect("registered job");
    assert_eq!(snapshot.status, JobStatus::Processing);
    assert_eq!(registry.snapshot(&first).map(|s| s.status), Some(JobStatus::Pending));
}

#[test]
fn test_registry_snapshot_withUnknownId_shouldBeNone() {
    let registry = JobRegistry::new(10);

    assert!(registry.is_empty());
    assert!(registry.snapshot("missing").is_none());
    assert!(registry.get("missing").is_none());
}
