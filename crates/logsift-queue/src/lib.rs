//! # logsift-queue
//!
//! Durable, FIFO-ish job queue for the Logsift processing pipeline.
//!
//! ## Contract
//! - `enqueue` assigns a unique job id and journals the job.
//! - `lease` hands a job to exactly one caller at a time; waiting callers
//!   suspend until a job arrives or the timeout elapses.
//! - `ack` marks a job Succeeded (idempotent) and emits the `Completed`
//!   event carrying the job's stats payload.
//! - `fail` re-enqueues with exponential backoff while attempts remain,
//!   otherwise marks the job permanently Failed and emits the single
//!   `Failed` terminal event.
//! - `stats` reports point-in-time counts by state.
//!
//! ## Durability
//! Every state transition is appended to a JSONL journal. `JobQueue::open`
//! replays the journal on startup; jobs found Leased at recovery consume
//! an attempt (re-queued while attempts remain, Failed otherwise).

pub mod error;
pub mod journal;
pub mod policy;
pub mod queue;

pub use error::{QueueError, Result};
pub use policy::RetryPolicy;
pub use queue::{JobQueue, QueueStats};
