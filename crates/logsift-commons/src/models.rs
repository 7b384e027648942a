//! Core entities shared by the queue, the workers, and the API layer.

use crate::ids::{FileId, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a job.
///
/// Transitions: `Queued → Leased → Succeeded`, or `Leased → Queued`
/// (retry with a fresh attempt counter) and finally `Leased → Failed`
/// once the attempt ceiling is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Waiting for a worker slot.
    Queued,
    /// Exclusively owned by one worker slot.
    Leased,
    /// Terminal: pipeline finished and stats were persisted.
    Succeeded,
    /// Terminal: all attempts exhausted.
    Failed,
}

/// What the upload gateway hands to the queue: a reference to a stored
/// blob, nothing more.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub file_id: FileId,
    pub file_path: String,
}

/// A unit of work: "analyze this stored file".
///
/// `state` and `attempt` are mutated only by the queue and the leasing
/// worker; everything else is immutable after enqueue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub file_id: FileId,
    pub file_path: String,
    pub state: JobState,
    /// Zero-based attempt counter; incremented on each retry.
    pub attempt: u32,
    /// Unix timestamp in milliseconds when the job was enqueued.
    pub created_at: i64,
}

impl Job {
    /// Build a freshly queued job from a descriptor.
    pub fn queued(job_id: JobId, descriptor: JobDescriptor) -> Self {
        Self {
            job_id,
            file_id: descriptor.file_id,
            file_path: descriptor.file_path,
            state: JobState::Queued,
            attempt: 0,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, JobState::Succeeded | JobState::Failed)
    }
}

/// Aggregated signals extracted from one log file.
///
/// Created exactly once per successfully completed job, immutable after
/// creation. Field names are camelCase on the wire to match the live
/// event channel payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogStats {
    pub file_id: FileId,
    pub file_path: String,
    pub error_count: u64,
    /// Keyword -> number of lines containing it as a substring.
    pub keyword_counts: BTreeMap<String, u64>,
    /// Distinct IPv4-shaped strings, first match per line.
    #[serde(rename = "uniqueIPs")]
    pub unique_ips: Vec<String>,
    pub processed_at: DateTime<Utc>,
}

impl LogStats {
    /// Total distinct IPs seen in this file.
    #[inline]
    pub fn unique_ip_count(&self) -> usize {
        self.unique_ips.len()
    }
}
