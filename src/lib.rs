//! Refocus Agent - work-context capture and distraction recovery.
//!
//! This library watches a user's moment-to-moment work activity, keeps a
//! bounded history of recent work contexts, and decides when the user has
//! returned from a distraction so a recovery summary of prior context can be
//! shown.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Refocus Agent                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐    ┌───────────┐    ┌──────────┐               │
//! │  │  Sensor  │───▶│ SpscQueue │───▶│ Classify │               │
//! │  │ (events) │    │ (lock-    │    │ (titles) │               │
//! │  └──────────┘    │   free)   │    └────┬─────┘               │
//! │                  └───────────┘         ▼                     │
//! │  ┌───────────┐                  ┌──────────────┐             │
//! │  │ Telemetry │◀─────────────────│ FocusTracker │             │
//! │  └───────────┘                  │  + History   │             │
//! │                                 └──────┬───────┘             │
//! │                                        ▼                     │
//! │                                 RecoverySummary ──▶ presenter│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Exactly one thread produces [`EventRecord`]s into the queue and exactly
//! one consumes them; neither side ever blocks on the other. The
//! [`FocusTracker`] is safe to share between callers and takes the current
//! time as a parameter, so every timing decision is deterministic under test.
//!
//! # Example
//!
//! ```no_run
//! use refocus_agent::{classify, event::wall_clock_us, FocusTracker, TrackerConfig};
//!
//! let now = wall_clock_us();
//! let tracker = FocusTracker::new(TrackerConfig::default(), now);
//!
//! let snapshot = classify::classify("Code.exe", "main.rs - refocus - Visual Studio Code");
//! if let Some(summary) = tracker.on_window_change("Code.exe", snapshot, now) {
//!     println!("welcome back from {}", summary.distracting_app);
//! }
//! ```

pub mod classify;
pub mod config;
pub mod context;
pub mod event;
pub mod sensor;
pub mod telemetry;
pub mod tracker;

// Re-export key types at crate root for convenience
pub use config::{AgentConfig, ConfigError};
pub use context::{
    AppCategory, ContextHistory, ContextSnapshot, RingBuffer, DEFAULT_HISTORY_CAPACITY,
};
pub use event::{
    Consumer, EventKind, EventPayload, EventQueue, EventRecord, Producer, SpscQueue,
    EVENT_QUEUE_CAPACITY,
};
pub use sensor::{ScriptStep, ScriptedSensor, SensorError};
pub use telemetry::{create_shared_stats, PipelineStats, SharedPipelineStats, StatsSnapshot};
pub use tracker::{
    ActivityKind, FocusState, FocusTracker, RecoverySummary, TrackerConfig, MAX_RECENT_ACTIVITIES,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
