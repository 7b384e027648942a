//! # logsift-store
//!
//! Persistence for analysis results. Completed jobs write their
//! `LogStats` here; the HTTP layer reads single records back by file id
//! and serves a cross-file aggregate (total errors, top keywords, unique
//! IP count).

pub mod aggregate;
pub mod error;
pub mod result_store;

pub use aggregate::{aggregate, AggregateStats, KeywordCount};
pub use error::{Result, StoreError};
pub use result_store::{JsonlResultStore, ResultStore};
