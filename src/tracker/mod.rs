//! Focus tracking: the state machine coordinating snapshots, history and
//! recovery summaries.

pub mod machine;
pub mod summary;

// Re-export commonly used types
pub use machine::{ActivityKind, FocusState, FocusTracker, TrackerConfig};
pub use summary::{build_recovery_summary, ActivityNote, RecoverySummary, MAX_RECENT_ACTIVITIES};
