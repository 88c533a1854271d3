use crate::api::ServiceError;

/// Input rejected before any request is sent.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("unknown video style '{0}'")]
    UnknownStyle(String),

    #[error("unsupported duration {0}s (expected one of 15, 30, 45, 60)")]
    UnsupportedDuration(u32),

    #[error("job {0} is still in progress; reset before starting another")]
    JobActive(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to start generation: {0}")]
    Submission(#[source] ServiceError),

    #[error("job tracking was stopped before the backend accepted the request")]
    Cancelled,
}
