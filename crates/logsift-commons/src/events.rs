//! Queue lifecycle events.
//!
//! The queue emits these on a best-effort broadcast channel; the event
//! broadcaster fans them out to live observers. Delivery is at-least-once
//! with no cross-job ordering guarantee, but within one job the progress
//! events always precede the terminal event.

use crate::ids::JobId;
use crate::models::LogStats;

/// A lifecycle event for one job.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// Percent complete in `[0, 100]`, non-decreasing within a job.
    Progress { job_id: JobId, percent: u8 },
    /// Terminal: the job succeeded and its stats were persisted.
    Completed { job_id: JobId, stats: LogStats },
    /// Terminal: the job exhausted its attempts.
    Failed { job_id: JobId, error: String },
}

impl QueueEvent {
    /// The job this event belongs to.
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueEvent::Progress { job_id, .. }
            | QueueEvent::Completed { job_id, .. }
            | QueueEvent::Failed { job_id, .. } => job_id,
        }
    }

    /// True for `Completed` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueueEvent::Progress { .. })
    }
}
