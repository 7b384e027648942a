//! Shared application state handed to every handler.

use crate::registry::ObserverRegistry;
use logsift_filestore::BlobStore;
use logsift_queue::JobQueue;
use logsift_store::ResultStore;
use std::sync::Arc;

/// Everything the HTTP layer needs, behind cheap clones.
#[derive(Clone)]
pub struct ApiState {
    pub queue: JobQueue,
    pub blobs: Arc<dyn BlobStore>,
    pub results: Arc<dyn ResultStore>,
    pub registry: Arc<ObserverRegistry>,
}
