//! Session statistics for the strain sensor agent.
//!
//! Counts what the agent ingested, dropped and published so a wearer or an
//! operator can check the link quality of a session.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, create_shared_log_with_persistence, SessionLog, SessionStats, SharedSessionLog};
