//! Configuration module for the terminal.

pub mod contracts;
pub mod gateway;

mod debug; // Private so every caller goes through crate::config::DEBUG_FLAGS
pub use debug::DEBUG_FLAGS;

pub mod metrics;
pub mod persistence;
pub mod plot;

// Re-export commonly used items
pub use contracts::CONTRACTS;
pub use gateway::GATEWAY;
pub use metrics::METRICS;
pub use persistence::PERSISTENCE;
