//! Fixed-size worker pool.
//!
//! Each slot loops: lease a job, run the pipeline, ack or fail, repeat.
//! Slots share nothing but the queue and the pipeline's stores; a job
//! failure is absorbed at the slot boundary and never kills the slot.

use crate::pipeline::Pipeline;
use logsift_commons::Job;
use logsift_queue::JobQueue;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a slot waits on an empty queue before re-checking shutdown.
const LEASE_WAIT: Duration = Duration::from_millis(500);

/// Handle to the running pool. Dropping it does not stop the workers;
/// call `shutdown` for an orderly stop.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Spawn `concurrency` independent slots against the queue.
    pub fn start(concurrency: usize, queue: JobQueue, pipeline: Pipeline) -> Self {
        let (shutdown, _) = watch::channel(false);
        let handles = (0..concurrency.max(1))
            .map(|slot| {
                let queue = queue.clone();
                let pipeline = pipeline.clone();
                let stop = shutdown.subscribe();
                tokio::spawn(run_slot(slot, queue, pipeline, stop))
            })
            .collect();
        log::info!("Worker pool started with {} slot(s)", concurrency.max(1));
        Self { handles, shutdown }
    }

    /// Stop leasing new jobs and wait for in-flight jobs to finish.
    /// Leased jobs are never aborted mid-run.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::error!("Worker slot ended abnormally: {}", e);
            }
        }
        log::info!("Worker pool stopped");
    }
}

async fn run_slot(slot: usize, queue: JobQueue, pipeline: Pipeline, stop: watch::Receiver<bool>) {
    log::debug!("Worker slot {} started", slot);
    loop {
        if *stop.borrow() {
            break;
        }
        if let Some(job) = queue.lease(LEASE_WAIT).await {
            execute(slot, &queue, &pipeline, job).await;
        }
    }
    log::debug!("Worker slot {} stopped", slot);
}

/// Run one leased job and report the outcome to the queue. All pipeline
/// errors end in `fail`; nothing escapes to the slot loop.
async fn execute(slot: usize, queue: &JobQueue, pipeline: &Pipeline, job: Job) {
    let job_id = job.job_id.clone();
    log::info!(
        "Slot {} processing job {} (file {}, attempt {})",
        slot,
        job_id,
        job.file_id,
        job.attempt + 1
    );

    let last_percent = Arc::new(AtomicU8::new(0));
    let progress_queue = queue.clone();
    let progress_job = job_id.clone();
    let progress_seen = last_percent.clone();
    let on_progress = move |percent| {
        progress_seen.store(percent, Ordering::Relaxed);
        progress_queue.update_progress(&progress_job, percent);
    };

    match pipeline.process(&job, on_progress).await {
        Ok(stats) => {
            // Observers must see 100 before the terminal event; emit it
            // only when the analyzer's cadence stopped short of 100.
            if last_percent.load(Ordering::Relaxed) < 100 {
                queue.update_progress(&job_id, 100);
            }
            if let Err(e) = queue.ack(&job_id, stats) {
                log::error!("Slot {} could not ack job {}: {}", slot, job_id, e);
            }
        }
        Err(e) => {
            if let Err(qe) = queue.fail(&job_id, e.to_string()) {
                log::error!("Slot {} could not fail job {}: {}", slot, job_id, qe);
            }
        }
    }
}
