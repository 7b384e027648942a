//! # logsift-jobs
//!
//! Background processing: the streaming log analyzer, the per-job
//! pipeline (resolve, download, analyze, persist), and the worker pool
//! that leases jobs from the queue and runs the pipeline on them.

pub mod analyzer;
pub mod error;
pub mod pipeline;
pub mod worker;

pub use analyzer::{analyze_file, RawStats};
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use worker::WorkerPool;
