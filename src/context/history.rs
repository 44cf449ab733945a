//! Bounded history of recent work-context snapshots.
//!
//! Retains the most recent meaningful snapshots in insertion order and
//! answers newest-first queries. All queries scan at most the current entry
//! count and report misses as `None`/empty rather than errors.

use crate::context::ring::RingBuffer;
use crate::context::snapshot::ContextSnapshot;

/// Default number of retained snapshots (~10 minutes at 30 s intervals).
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Fixed-capacity, newest-first history of meaningful snapshots.
#[derive(Debug)]
pub struct ContextHistory {
    ring: RingBuffer<ContextSnapshot>,
}

impl ContextHistory {
    /// Create a history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create a history with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ring: RingBuffer::new(capacity),
        }
    }

    /// Record a snapshot, evicting the oldest entry at capacity.
    ///
    /// Snapshots that are not meaningful are filtered out here — a policy
    /// outcome, not an error — so the history invariant holds no matter who
    /// pushes. Returns whether the snapshot was kept.
    pub fn push(&mut self, snapshot: ContextSnapshot) -> bool {
        if !snapshot.is_meaningful() {
            return false;
        }
        self.ring.push(snapshot);
        true
    }

    /// The most recent snapshot.
    pub fn get_last(&self) -> Option<&ContextSnapshot> {
        self.ring.get(0)
    }

    /// Snapshot by recency: 0 is the most recent.
    pub fn get_at(&self, index: usize) -> Option<&ContextSnapshot> {
        self.ring.get(index)
    }

    /// Up to `max_count` most recent snapshots, newest first.
    pub fn get_recent(&self, max_count: usize) -> Vec<&ContextSnapshot> {
        self.ring.iter().take(max_count).collect()
    }

    /// Most recent snapshot for the given application, if any.
    pub fn find_by_app(&self, app_name: &str) -> Option<&ContextSnapshot> {
        self.ring.iter().find(|snap| snap.app_name == app_name)
    }

    /// Most recent snapshot that was both productive and meaningful.
    pub fn find_last_productive(&self) -> Option<&ContextSnapshot> {
        self.ring
            .iter()
            .find(|snap| snap.flags.is_productive && snap.is_meaningful())
    }

    /// Total seconds of productive context time across all entries.
    pub fn total_focus_seconds(&self) -> u64 {
        self.ring
            .iter()
            .filter(|snap| snap.flags.is_productive)
            .map(|snap| snap.duration_in_context_s as u64)
            .sum()
    }

    /// Iterate entries newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &ContextSnapshot> {
        self.ring.iter()
    }

    pub fn clear(&mut self) {
        self.ring.clear();
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl Default for ContextHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::snapshot::ActivityMetrics;

    fn snapshot(app: &str, timestamp_us: u64, productive: bool) -> ContextSnapshot {
        let mut snap = ContextSnapshot {
            app_name: app.to_string(),
            timestamp_us,
            duration_in_context_s: 30,
            activity: ActivityMetrics {
                keystrokes: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        snap.flags.is_productive = productive;
        snap
    }

    #[test]
    fn test_push_and_query_order() {
        let mut history = ContextHistory::new();
        assert!(history.push(snapshot("first", 1, true)));
        assert!(history.push(snapshot("second", 2, true)));

        assert_eq!(history.len(), 2);
        assert_eq!(history.get_last().unwrap().app_name, "second");
        assert_eq!(history.get_at(1).unwrap().app_name, "first");
        assert!(history.get_at(2).is_none());
    }

    #[test]
    fn test_non_meaningful_snapshots_filtered() {
        let mut history = ContextHistory::new();
        let mut idle = snapshot("idle-app", 1, true);
        idle.activity.keystrokes = 0;
        assert!(!history.push(idle));
        assert!(history.is_empty());
    }

    #[test]
    fn test_eviction_past_capacity() {
        let mut history = ContextHistory::with_capacity(4);
        for index in 0..6u64 {
            history.push(snapshot(&format!("app{index}"), index, true));
        }

        assert_eq!(history.len(), 4);
        assert_eq!(history.get_last().unwrap().app_name, "app5");
        // The first two entries are gone through every query.
        assert!(history.find_by_app("app0").is_none());
        assert!(history.find_by_app("app1").is_none());
        assert!(history.find_by_app("app2").is_some());
    }

    #[test]
    fn test_find_by_app_returns_most_recent() {
        let mut history = ContextHistory::new();
        history.push(snapshot("Code.exe", 1, true));
        history.push(snapshot("chrome.exe", 2, true));
        history.push(snapshot("Code.exe", 3, true));

        let found = history.find_by_app("Code.exe").unwrap();
        assert_eq!(found.timestamp_us, 3);
        assert!(history.find_by_app("slack.exe").is_none());
    }

    #[test]
    fn test_find_last_productive() {
        let mut history = ContextHistory::new();
        assert!(history.find_last_productive().is_none());

        history.push(snapshot("Code.exe", 1, true));
        history.push(snapshot("twitter", 2, false));

        let found = history.find_last_productive().unwrap();
        assert_eq!(found.app_name, "Code.exe");
    }

    #[test]
    fn test_total_focus_seconds_sums_productive_only() {
        let mut history = ContextHistory::new();
        history.push(snapshot("Code.exe", 1, true));
        history.push(snapshot("twitter", 2, false));
        history.push(snapshot("terminal", 3, true));

        // Two productive entries at 30 s each.
        assert_eq!(history.total_focus_seconds(), 60);
    }

    #[test]
    fn test_get_recent_bounded_by_count() {
        let mut history = ContextHistory::new();
        for index in 0..3u64 {
            history.push(snapshot(&format!("app{index}"), index, true));
        }

        let recent = history.get_recent(5);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].app_name, "app2");

        let recent = history.get_recent(2);
        assert_eq!(recent.len(), 2);
    }
}
