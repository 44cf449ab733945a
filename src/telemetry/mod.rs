//! Pipeline telemetry.
//!
//! Counts what flows through the capture pipeline — including every event
//! dropped at the queue or validity boundary — so back-pressure and data loss
//! are visible without inspecting the queue itself.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_stats, create_shared_stats_with_persistence, PipelineStats, SharedPipelineStats,
    StatsSnapshot,
};
