//! Scripted event source.
//!
//! Replays a prepared list of timed events into the capture queue from a
//! background thread, standing in for a platform capture backend. The replay
//! honors the producer boundary contract: records failing the validity check
//! are dropped before the queue, and full-queue drops are counted, never
//! retried.

use crate::event::queue::Producer;
use crate::event::record::EventRecord;
use crate::telemetry::log::SharedPipelineStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One step of a replay script.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    /// Real time to wait before emitting the record.
    pub delay: Duration,
    /// The record to emit.
    pub record: EventRecord,
}

impl ScriptStep {
    /// A step emitted immediately after the previous one.
    pub fn immediate(record: EventRecord) -> Self {
        Self {
            delay: Duration::ZERO,
            record,
        }
    }

    /// A step emitted after a pause.
    pub fn after(delay: Duration, record: EventRecord) -> Self {
        Self { delay, record }
    }
}

/// Errors that can occur when driving a scripted sensor.
#[derive(Debug)]
pub enum SensorError {
    AlreadyRunning,
    ScriptConsumed,
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::AlreadyRunning => write!(f, "Sensor is already running"),
            SensorError::ScriptConsumed => write!(f, "Script was already replayed"),
        }
    }
}

impl std::error::Error for SensorError {}

/// A sensor that replays a fixed script of events.
pub struct ScriptedSensor<const N: usize> {
    script: Option<Vec<ScriptStep>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl<const N: usize> ScriptedSensor<N> {
    /// Create a sensor holding the given script.
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script: Some(script),
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Start replaying the script into `producer` on a background thread.
    ///
    /// The thread exits on its own once the script is exhausted, or earlier
    /// when [`stop`](Self::stop) is called.
    pub fn start(
        &mut self,
        mut producer: Producer<EventRecord, N>,
        stats: SharedPipelineStats,
    ) -> Result<(), SensorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SensorError::AlreadyRunning);
        }
        let script = self.script.take().ok_or(SensorError::ScriptConsumed)?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let handle = thread::spawn(move || {
            for step in script {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if !step.delay.is_zero() {
                    thread::sleep(step.delay);
                }

                // Malformed records never reach the queue.
                if !step.record.is_valid() {
                    stats.record_invalid_event();
                    continue;
                }

                match producer.try_push(step.record) {
                    Ok(()) => stats.record_event_emitted(),
                    // Queue full: drop and count, no retry.
                    Err(_) => stats.record_event_dropped(),
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop the replay and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    /// Whether the replay thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Block until the script is fully replayed.
    pub fn wait(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl<const N: usize> Drop for ScriptedSensor<N> {
    fn drop(&mut self) {
        self.stop();
    }
}
