//! # logsift-api
//!
//! HTTP and WebSocket surface: the upload endpoint that stores a file
//! and enqueues its job, queue status and stats queries, and the live
//! event channel that fans queue events out to connected observers.

pub mod actors;
pub mod broadcaster;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;

pub use broadcaster::spawn_event_bridge;
pub use middleware::BearerAuth;
pub use registry::{ObserverRegistry, OutboundEvent};
pub use state::ApiState;
