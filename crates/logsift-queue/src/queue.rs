//! The job queue: leased dequeue, acknowledgement, retry with backoff,
//! counts by state, and the lifecycle event stream.

use crate::error::{QueueError, Result};
use crate::journal::{Journal, JournalRecord};
use crate::policy::RetryPolicy;
use logsift_commons::{Job, JobDescriptor, JobId, JobState, LogStats, QueueEvent};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

/// Capacity of the lifecycle event channel. Delivery is best-effort;
/// slow subscribers are lagged, never block the queue.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Point-in-time job counts by state. Eventually consistent with respect
/// to in-flight transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

struct QueueState {
    jobs: HashMap<JobId, Job>,
    waiting: VecDeque<JobId>,
}

impl QueueState {
    fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            waiting: VecDeque::new(),
        }
    }

    fn apply(&mut self, record: JournalRecord) {
        match record {
            JournalRecord::Enqueued { job } => {
                self.waiting.push_back(job.job_id.clone());
                self.jobs.insert(job.job_id.clone(), job);
            }
            JournalRecord::Leased { job_id } => {
                self.waiting.retain(|id| id != &job_id);
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Leased;
                }
            }
            JournalRecord::Retried { job_id, attempt, .. } => {
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Queued;
                    job.attempt = attempt;
                    if !self.waiting.contains(&job_id) {
                        self.waiting.push_back(job_id);
                    }
                }
            }
            JournalRecord::Acked { job_id } => {
                self.waiting.retain(|id| id != &job_id);
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Succeeded;
                }
            }
            JournalRecord::Failed { job_id, .. } => {
                self.waiting.retain(|id| id != &job_id);
                if let Some(job) = self.jobs.get_mut(&job_id) {
                    job.state = JobState::Failed;
                }
            }
        }
    }
}

struct Inner {
    state: Mutex<QueueState>,
    journal: Option<Journal>,
    notify: Notify,
    events: broadcast::Sender<QueueEvent>,
    policy: RetryPolicy,
}

/// Handle to the job queue. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Open a journal-backed queue, replaying any previous journal.
    ///
    /// Jobs found Leased in the journal were in flight when the process
    /// died; the interrupted run counts as a failed attempt, so they are
    /// re-queued while attempts remain and marked Failed otherwise.
    pub fn open(journal_path: impl AsRef<Path>, policy: RetryPolicy) -> Result<Self> {
        let journal = Journal::open(journal_path)?;
        let mut state = QueueState::new();
        for record in journal.replay()? {
            state.apply(record);
        }

        let queue = Self::from_parts(state, Some(journal), policy);
        queue.recover_interrupted()?;
        Ok(queue)
    }

    /// Queue without a journal. Used by tests and embedded setups where
    /// durability is not needed.
    pub fn in_memory(policy: RetryPolicy) -> Self {
        Self::from_parts(QueueState::new(), None, policy)
    }

    fn from_parts(state: QueueState, journal: Option<Journal>, policy: RetryPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                journal,
                notify: Notify::new(),
                events,
                policy,
            }),
        }
    }

    /// Enqueue a new job; returns its freshly assigned id.
    pub fn enqueue(&self, descriptor: JobDescriptor) -> Result<JobId> {
        let job = Job::queued(JobId::generate(), descriptor);
        let job_id = job.job_id.clone();

        let mut state = self.inner.state.lock();
        self.append(&JournalRecord::Enqueued { job: job.clone() })?;
        state.waiting.push_back(job_id.clone());
        state.jobs.insert(job_id.clone(), job);
        drop(state);

        self.inner.notify.notify_one();
        log::debug!("Job enqueued: {}", job_id);
        Ok(job_id)
    }

    /// Lease the next queued job, waiting up to `wait` when the queue is
    /// empty. Returns `None` on timeout rather than raising.
    ///
    /// Mutual exclusion: a job handed out here is in the Leased state and
    /// will not be returned to any other caller until it is re-queued by
    /// `fail`.
    pub async fn lease(&self, wait: Duration) -> Option<Job> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            // Arm the wakeup before checking so an enqueue between the
            // check and the await is not lost.
            let notified = self.inner.notify.notified();

            if let Some(job) = self.try_lease() {
                return Some(job);
            }

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return None;
            }
            if tokio::time::timeout(deadline - now, notified).await.is_err() {
                return self.try_lease();
            }
        }
    }

    fn try_lease(&self) -> Option<Job> {
        let mut state = self.inner.state.lock();
        while let Some(job_id) = state.waiting.pop_front() {
            let Some(job) = state.jobs.get_mut(&job_id) else {
                continue;
            };
            if job.state != JobState::Queued {
                // Stale entry (acked or failed while waiting); skip it.
                continue;
            }
            if let Err(e) = self.append(&JournalRecord::Leased { job_id: job_id.clone() }) {
                log::error!("Journal write failed while leasing {}: {}", job_id, e);
                state.waiting.push_front(job_id);
                return None;
            }
            job.state = JobState::Leased;
            log::debug!("Job leased: {} (attempt {})", job_id, job.attempt + 1);
            return Some(job.clone());
        }
        None
    }

    /// Mark a job Succeeded and emit its `Completed` event. Idempotent:
    /// acking a job that already succeeded is a no-op and emits nothing.
    pub fn ack(&self, job_id: &JobId, stats: LogStats) -> Result<()> {
        let mut state = self.inner.state.lock();
        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::UnknownJob(job_id.to_string()))?;

        if job.is_terminal() {
            return Ok(());
        }

        self.append(&JournalRecord::Acked { job_id: job_id.clone() })?;
        job.state = JobState::Succeeded;
        drop(state);

        log::info!("Job completed: {}", job_id);
        self.emit(QueueEvent::Completed {
            job_id: job_id.clone(),
            stats,
        });
        Ok(())
    }

    /// Record a failed attempt. Re-enqueues with backoff while the retry
    /// policy allows; otherwise marks the job permanently Failed and
    /// emits the single `Failed` terminal event.
    pub fn fail(&self, job_id: &JobId, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        let mut state = self.inner.state.lock();
        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::UnknownJob(job_id.to_string()))?;

        if job.is_terminal() {
            return Ok(());
        }

        let failed_attempt = job.attempt;
        let attempts_used = failed_attempt + 1;

        if self.inner.policy.allows_retry(attempts_used) {
            let next_attempt = failed_attempt + 1;
            self.append(&JournalRecord::Retried {
                job_id: job_id.clone(),
                attempt: next_attempt,
                error: error.clone(),
            })?;
            job.state = JobState::Queued;
            job.attempt = next_attempt;
            drop(state);

            let delay = self.inner.policy.delay_for(failed_attempt);
            log::warn!(
                "Job {} failed (attempt {}): {}; retrying in {:?}",
                job_id,
                attempts_used,
                error,
                delay
            );
            self.requeue_after(job_id.clone(), delay);
        } else {
            self.append(&JournalRecord::Failed {
                job_id: job_id.clone(),
                error: error.clone(),
            })?;
            job.state = JobState::Failed;
            drop(state);

            log::error!(
                "Job {} permanently failed after {} attempts: {}",
                job_id,
                attempts_used,
                error
            );
            self.emit(QueueEvent::Failed {
                job_id: job_id.clone(),
                error,
            });
        }
        Ok(())
    }

    /// Emit a progress event for a job in flight. Progress is ephemeral
    /// and never journaled.
    pub fn update_progress(&self, job_id: &JobId, percent: u8) {
        self.emit(QueueEvent::Progress {
            job_id: job_id.clone(),
            percent: percent.min(100),
        });
    }

    /// Point-in-time counts by state.
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.state.lock();
        let mut stats = QueueStats {
            waiting: 0,
            active: 0,
            completed: 0,
            failed: 0,
        };
        for job in state.jobs.values() {
            match job.state {
                JobState::Queued => stats.waiting += 1,
                JobState::Leased => stats.active += 1,
                JobState::Succeeded => stats.completed += 1,
                JobState::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Subscribe to the lifecycle event stream. Only events emitted after
    /// this call are delivered; there is no backfill.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot of a single job, if the queue knows it.
    pub fn get(&self, job_id: &JobId) -> Option<Job> {
        self.inner.state.lock().jobs.get(job_id).cloned()
    }

    fn append(&self, record: &JournalRecord) -> Result<()> {
        match &self.inner.journal {
            Some(journal) => journal.append(record),
            None => Ok(()),
        }
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is fine; events are best-effort.
        let _ = self.inner.events.send(event);
    }

    /// Push a retried job back onto the waiting list after its backoff
    /// delay. Zero-delay retries skip the timer entirely.
    fn requeue_after(&self, job_id: JobId, delay: Duration) {
        if delay.is_zero() {
            self.make_available(&job_id);
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.make_available(&job_id);
        });
    }

    fn make_available(&self, job_id: &JobId) {
        let mut state = self.inner.state.lock();
        let still_queued = state
            .jobs
            .get(job_id)
            .map(|j| j.state == JobState::Queued)
            .unwrap_or(false);
        if still_queued && !state.waiting.contains(job_id) {
            state.waiting.push_back(job_id.clone());
            drop(state);
            self.inner.notify.notify_one();
        }
    }

    /// Crash recovery: jobs replayed into the Leased state were running
    /// when the previous process died.
    fn recover_interrupted(&self) -> Result<()> {
        let interrupted: Vec<JobId> = {
            let state = self.inner.state.lock();
            state
                .jobs
                .values()
                .filter(|j| j.state == JobState::Leased)
                .map(|j| j.job_id.clone())
                .collect()
        };

        for job_id in interrupted {
            log::warn!("Recovering interrupted job from journal: {}", job_id);
            let mut state = self.inner.state.lock();
            let Some(job) = state.jobs.get_mut(&job_id) else {
                continue;
            };
            let attempts_used = job.attempt + 1;
            if self.inner.policy.allows_retry(attempts_used) {
                let next_attempt = job.attempt + 1;
                self.append(&JournalRecord::Retried {
                    job_id: job_id.clone(),
                    attempt: next_attempt,
                    error: "interrupted by restart".to_string(),
                })?;
                job.state = JobState::Queued;
                job.attempt = next_attempt;
                if !state.waiting.contains(&job_id) {
                    state.waiting.push_back(job_id.clone());
                }
            } else {
                self.append(&JournalRecord::Failed {
                    job_id: job_id.clone(),
                    error: "interrupted by restart".to_string(),
                })?;
                job.state = JobState::Failed;
            }
        }
        Ok(())
    }
}
