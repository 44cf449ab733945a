//! Atomic counters for the capture pipeline.
//!
//! The queue never blocks and never retries, so dropped events are a normal
//! policy outcome; this log is where that accounting lands. Counters are
//! relaxed atomics shared between the producer and consumer contexts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Pipeline statistics for the current session.
#[derive(Debug)]
pub struct PipelineStats {
    /// Events accepted into the capture queue
    events_emitted: AtomicU64,
    /// Events dropped because the queue was full
    events_dropped_full: AtomicU64,
    /// Events dropped at the validity boundary
    events_dropped_invalid: AtomicU64,
    /// Context snapshots recorded into history
    snapshots_recorded: AtomicU64,
    /// Recovery summaries built
    summaries_built: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Unique identifier for this pipeline instance
    instance_id: Uuid,
    /// Device name for exported stats
    device: String,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl PipelineStats {
    /// Create a new stats log.
    pub fn new() -> Self {
        Self {
            events_emitted: AtomicU64::new(0),
            events_dropped_full: AtomicU64::new(0),
            events_dropped_invalid: AtomicU64::new(0),
            snapshots_recorded: AtomicU64::new(0),
            summaries_built: AtomicU64::new(0),
            session_start: Utc::now(),
            instance_id: Uuid::new_v4(),
            device: device_name(),
            persist_path: None,
        }
    }

    /// Create a stats log with persistence.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            tracing::debug!("no previous pipeline stats loaded: {e}");
        }

        stats
    }

    /// The unique identifier of this pipeline instance.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Record an event accepted into the queue.
    pub fn record_event_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event dropped on a full queue.
    pub fn record_event_dropped(&self) {
        self.events_dropped_full.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event discarded at the validity boundary.
    pub fn record_invalid_event(&self) {
        self.events_dropped_invalid.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a context snapshot entering history.
    pub fn record_snapshot(&self) {
        self.snapshots_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a recovery summary being built.
    pub fn record_summary(&self) {
        self.summaries_built.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            events_dropped_full: self.events_dropped_full.load(Ordering::Relaxed),
            events_dropped_invalid: self.events_dropped_invalid.load(Ordering::Relaxed),
            snapshots_recorded: self.snapshots_recorded.load(Ordering::Relaxed),
            summaries_built: self.summaries_built.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
            instance_id: self.instance_id,
            device: self.device.clone(),
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Pipeline statistics ({device}):\n\
             - Events captured: {emitted}\n\
             - Events dropped (queue full): {dropped}\n\
             - Events dropped (invalid): {invalid}\n\
             - Snapshots recorded: {snapshots}\n\
             - Recovery summaries built: {summaries}\n\
             - Session duration: {duration} seconds",
            device = stats.device,
            emitted = stats.events_emitted,
            dropped = stats.events_dropped_full,
            invalid = stats.events_dropped_invalid,
            snapshots = stats.snapshots_recorded,
            summaries = stats.summaries_built,
            duration = stats.session_duration_secs,
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.snapshot();
            let persisted = PersistedStats {
                events_emitted: stats.events_emitted,
                events_dropped_full: stats.events_dropped_full,
                events_dropped_invalid: stats.events_dropped_invalid,
                snapshots_recorded: stats.snapshots_recorded,
                summaries_built: stats.summaries_built,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.events_emitted
                    .store(persisted.events_emitted, Ordering::Relaxed);
                self.events_dropped_full
                    .store(persisted.events_dropped_full, Ordering::Relaxed);
                self.events_dropped_invalid
                    .store(persisted.events_dropped_invalid, Ordering::Relaxed);
                self.snapshots_recorded
                    .store(persisted.snapshots_recorded, Ordering::Relaxed);
                self.summaries_built
                    .store(persisted.summaries_built, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.events_emitted.store(0, Ordering::Relaxed);
        self.events_dropped_full.store(0, Ordering::Relaxed);
        self.events_dropped_invalid.store(0, Ordering::Relaxed);
        self.snapshots_recorded.store(0, Ordering::Relaxed);
        self.summaries_built.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of pipeline statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub events_emitted: u64,
    pub events_dropped_full: u64,
    pub events_dropped_invalid: u64,
    pub snapshots_recorded: u64,
    pub summaries_built: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
    pub instance_id: Uuid,
    pub device: String,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    events_emitted: u64,
    events_dropped_full: u64,
    events_dropped_invalid: u64,
    snapshots_recorded: u64,
    summaries_built: u64,
    last_updated: DateTime<Utc>,
}

fn device_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Thread-safe shared stats log.
pub type SharedPipelineStats = Arc<PipelineStats>;

/// Create a new shared stats log.
pub fn create_shared_stats() -> SharedPipelineStats {
    Arc::new(PipelineStats::new())
}

/// Create a new shared stats log with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedPipelineStats {
    Arc::new(PipelineStats::with_persistence(path))
}
