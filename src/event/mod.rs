//! Event capture primitives: the fixed-layout record and the lock-free queue
//! that carries records from the capture thread to the consumer.

pub mod queue;
pub mod record;

// Re-export commonly used types
pub use queue::{Consumer, Producer, SpscQueue};
pub use record::{
    wall_clock_us, ClickInfo, EventKind, EventPayload, EventRecord, FocusSwitchInfo, IdleSpan,
    KeyInfo, PointerMotion, WheelInfo, APP_NAME_LEN, MAX_PLAUSIBLE_TIMESTAMP_US,
    MIN_PLAUSIBLE_TIMESTAMP_US,
};

/// Default capacity of the capture queue (power of two, ~4 MiB of records).
pub const EVENT_QUEUE_CAPACITY: usize = 65_536;

/// The capture queue specialization used by the agent pipeline.
pub type EventQueue = SpscQueue<EventRecord, EVENT_QUEUE_CAPACITY>;
