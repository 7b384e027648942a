//! Bridge from the queue's event stream to the observer registry.
//!
//! One task per process consumes the queue's broadcast channel and fans
//! each event out over the registry. A `completed` event is preceded by
//! a synthetic 100% progress message unless the job's own progress
//! stream already reached 100, so every observer sees the job finish at
//! 100 exactly once.

use crate::registry::ObserverRegistry;
use logsift_commons::{EventMessage, JobId, QueueEvent};
use logsift_queue::JobQueue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Spawn the bridge task. It runs until the queue is dropped.
pub fn spawn_event_bridge(queue: &JobQueue, registry: Arc<ObserverRegistry>) -> JoinHandle<()> {
    let mut events = queue.subscribe();
    tokio::spawn(async move {
        let mut last_progress: HashMap<JobId, u8> = HashMap::new();
        loop {
            match events.recv().await {
                Ok(event) => dispatch(&registry, event, &mut last_progress),
                Err(RecvError::Lagged(skipped)) => {
                    // Progress is ephemeral; dropping some under load is
                    // acceptable, terminal events are re-queried via the
                    // stats endpoints.
                    log::warn!("Event bridge lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
        log::debug!("Event bridge stopped");
    })
}

fn dispatch(
    registry: &ObserverRegistry,
    event: QueueEvent,
    last_progress: &mut HashMap<JobId, u8>,
) {
    match &event {
        QueueEvent::Progress { job_id, percent } => {
            last_progress.insert(job_id.clone(), *percent);
        }
        QueueEvent::Completed { job_id, .. } => {
            if last_progress.remove(job_id) != Some(100) {
                registry.broadcast(EventMessage::full_progress(job_id.clone()));
            }
        }
        QueueEvent::Failed { job_id, .. } => {
            last_progress.remove(job_id);
        }
    }
    registry.broadcast(event.into());
}
