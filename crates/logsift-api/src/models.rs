//! Response bodies for the HTTP endpoints.

use logsift_commons::{FileId, JobId};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: &'static str,
    pub job_id: JobId,
    pub file_id: FileId,
}

#[derive(Debug, Serialize)]
pub struct QueueStatusResponse {
    pub completed: usize,
    pub waiting: usize,
    pub active: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
