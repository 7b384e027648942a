//! WebSocket wire protocol for live observers.
//!
//! Server → client messages are JSON objects tagged by `event`:
//!
//! ```json
//! {"event": "progress", "jobId": "j-1", "progress": 40}
//! {"event": "progress", "jobId": "j-1", "progress": 100}
//! {"event": "completed", "jobId": "j-1", "data": { ...LogStats... }}
//! {"event": "failed", "jobId": "j-2", "error": "download failed: 404"}
//! ```
//!
//! There is no client → server protocol beyond connect/disconnect; inbound
//! text frames are ignored.

use crate::events::QueueEvent;
use crate::ids::JobId;
use crate::models::LogStats;
use serde::{Deserialize, Serialize};

/// A server → client live event message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EventMessage {
    #[serde(rename_all = "camelCase")]
    Progress { job_id: JobId, progress: u8 },

    #[serde(rename_all = "camelCase")]
    Completed { job_id: JobId, data: LogStats },

    #[serde(rename_all = "camelCase")]
    Failed { job_id: JobId, error: String },
}

impl EventMessage {
    /// Synthetic 100% progress message, sent right before `completed` so
    /// observers always see a job reach 100.
    pub fn full_progress(job_id: JobId) -> Self {
        EventMessage::Progress {
            job_id,
            progress: 100,
        }
    }
}

impl From<QueueEvent> for EventMessage {
    fn from(event: QueueEvent) -> Self {
        match event {
            QueueEvent::Progress { job_id, percent } => EventMessage::Progress {
                job_id,
                progress: percent,
            },
            QueueEvent::Completed { job_id, stats } => EventMessage::Completed {
                job_id,
                data: stats,
            },
            QueueEvent::Failed { job_id, error } => EventMessage::Failed { job_id, error },
        }
    }
}
