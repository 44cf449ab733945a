//! Work-context model: snapshots, the ring buffer they live in, and the
//! bounded query-able history of recent contexts.

pub mod history;
pub mod ring;
pub mod snapshot;

// Re-export commonly used types
pub use history::{ContextHistory, DEFAULT_HISTORY_CAPACITY};
pub use ring::RingBuffer;
pub use snapshot::{
    ActivityMetrics, AppCategory, BrowserContext, ContextFlags, ContextSnapshot, IdeContext,
    MIN_MEANINGFUL_DURATION_S,
};
