use crate::types::Job;
use chrono::{DateTime, Utc};
use reqwest::Url;

/// Lifecycle stage of the tracked job. Terminal variants carry their payload so an
/// artifact URL can only exist on `Completed` and an error message only on `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Starting,
    Processing,
    Completed { artifact_url: Url },
    Failed { error_message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// A job is active while it is being submitted or rendered.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Processing)
    }
}

/// Snapshot of the controller's belief about the current job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobState {
    pub status: JobStatus,
    pub job: Option<Job>,
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
}

impl JobState {
    pub fn idle() -> Self {
        Self { status: JobStatus::Idle, job: None, progress: 0, updated_at: Utc::now() }
    }

    pub fn job_id(&self) -> Option<&str> {
        self.job.as_ref().map(|job| job.id.as_str())
    }

    pub fn artifact_url(&self) -> Option<&Url> {
        match &self.status {
            JobStatus::Completed { artifact_url } => Some(artifact_url),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Failed { error_message } => Some(error_message),
            _ => None,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::idle()
    }
}
