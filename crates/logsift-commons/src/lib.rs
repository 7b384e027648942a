//! # logsift-commons
//!
//! Shared building blocks for the Logsift backend:
//! - Id newtypes (`JobId`, `FileId`, `ConnectionId`)
//! - Core models (`Job`, `JobState`, `LogStats`)
//! - Queue lifecycle events (`QueueEvent`)
//! - The WebSocket event wire protocol (`EventMessage`)
//!
//! Everything here is serialization-friendly and free of I/O so it can be
//! used from the queue, the worker crates, and the HTTP/WebSocket layer
//! without pulling their dependency trees along.

pub mod events;
pub mod ids;
pub mod models;
pub mod websocket;

pub use events::QueueEvent;
pub use ids::{ConnectionId, FileId, JobId};
pub use models::{Job, JobDescriptor, JobState, LogStats};
pub use websocket::EventMessage;
