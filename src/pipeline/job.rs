/*!
 * Job state and progress history.
 *
 * A job moves Pending -> Processing -> Completed | Failed. Progress only goes
 * up, every update is recorded in a bounded history, and once a job is
 * terminal it ignores further updates.
 */

use std::collections::VecDeque;
use std::fmt;

use chrono::{SecondsFormat, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use super::results::ProcessResult;

/// Job identifier (UUID v4 string)
pub type JobId = String;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Submitted, task not started yet
    Pending,
    /// Stages running
    Processing,
    /// Result available
    Completed,
    /// Error available
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// One recorded progress update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// RFC 3339, UTC
    pub timestamp: String,
    pub status: JobStatus,
    pub step: String,
    pub message: String,
    pub progress: u8,
}

/// Mutable state of one job
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    status: JobStatus,
    progress: u8,
    current_step: String,
    message: String,
    history: VecDeque<ProgressEvent>,
    history_capacity: usize,
    result: Option<ProcessResult>,
    error: Option<String>,
}

impl Job {
    /// Create a pending job with its `queued` event recorded
    pub fn new(id: impl Into<JobId>, history_capacity: usize) -> Self {
        let mut job = Self {
            id: id.into(),
            status: JobStatus::Pending,
            progress: 0,
            current_step: "queued".to_string(),
            message: String::new(),
            history: VecDeque::new(),
            history_capacity: history_capacity.max(1),
            result: None,
            error: None,
        };
        job.update("queued", None, Some(0), "Job queued");
        job
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn history(&self) -> impl Iterator<Item = &ProgressEvent> {
        self.history.iter()
    }

    pub fn result(&self) -> Option<&ProcessResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record a progress update
    ///
    /// A progress value below the current one keeps the current one. Returns
    /// `false` when the job is already terminal and the update was dropped.
    pub fn update(
        &mut self,
        step: &str,
        status: Option<JobStatus>,
        progress: Option<u8>,
        message: impl Into<String>,
    ) -> bool {
        let message = message.into();

        if self.is_terminal() {
            warn!(
                "Job {} is {}, ignoring update '{}' ({})",
                self.id, self.status, step, message
            );
            return false;
        }

        if let Some(status) = status {
            self.status = status;
        }
        if let Some(progress) = progress {
            self.progress = progress.min(100).max(self.progress);
        }
        self.message = message;
        self.current_step = step.to_string();

        self.history.push_back(ProgressEvent {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: self.status,
            step: self.current_step.clone(),
            message: self.message.clone(),
            progress: self.progress,
        });
        while self.history.len() > self.history_capacity {
            self.history.pop_front();
        }

        true
    }

    /// Store the result and mark the job completed
    pub fn complete(&mut self, result: ProcessResult, message: impl Into<String>) -> bool {
        if self.is_terminal() {
            warn!("Job {} is {}, ignoring completion", self.id, self.status);
            return false;
        }
        self.result = Some(result);
        self.update("complete", Some(JobStatus::Completed), Some(100), message)
    }

    /// Store the error and mark the job failed, progress unchanged
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            warn!("Job {} is {}, ignoring failure", self.id, self.status);
            return false;
        }
        let error = error.into();
        let message = format!("Processing failed: {}", error);
        self.error = Some(error);
        self.update("failed", Some(JobStatus::Failed), None, message)
    }

    /// Copy of the current state for readers
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            job_id: self.id.clone(),
            status: self.status,
            progress: self.progress,
            message: self.message.clone(),
            current_step: self.current_step.clone(),
            history: self.history.iter().cloned().collect(),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

/// Read-only copy of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub current_step: String,
    pub history: Vec<ProgressEvent>,
    pub result: Option<ProcessResult>,
    pub error: Option<String>,
}
