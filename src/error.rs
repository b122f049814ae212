use crate::models::TaskId;
use thiserror::Error;

/// Failures of task store operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid task: {0}")]
    Validation(String),

    #[error("could not reach task store: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("malformed response from task store: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("task store returned {status}: {body}")]
    Server { status: u16, body: String },
}
