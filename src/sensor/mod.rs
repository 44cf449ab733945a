//! Event sources feeding the capture queue.
//!
//! A platform capture backend is an external collaborator; this module ships
//! the scripted replay source used by the demo pipeline and tests. Any source
//! must uphold the producer boundary: validate records before enqueueing and
//! account for drops instead of retrying.

pub mod scripted;

// Re-export commonly used types
pub use scripted::{ScriptStep, ScriptedSensor, SensorError};
