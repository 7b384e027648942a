pub mod files;
pub mod health;
pub mod queue_status;
pub mod stats;
pub mod upload;
pub mod ws;
