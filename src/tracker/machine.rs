//! Focus state machine.
//!
//! Turns the stream of window-focus and activity events into
//! FOCUSED / DISTRACTED / RECOVERING transitions and builds the recovery
//! summary exactly once per qualifying distraction episode.
//!
//! ```text
//!   ┌──────────┐  switch to distracting app   ┌─────────────┐
//!   │ FOCUSED  ├─────────────────────────────►│ DISTRACTED  │
//!   └────▲─────┘                              └──────┬──────┘
//!        │ dismissal        return to productive app │
//!        │             (short distraction: straight  │
//!   ┌────┴───────┐      back to FOCUSED, no summary) │
//!   │ RECOVERING │◄──────────────────────────────────┘
//!   └────────────┘   at/above threshold: build summary
//! ```
//!
//! All state lives in one structure behind a single lock; every public
//! operation holds the lock for its whole duration and does no blocking work
//! inside it. There are no asynchronous timers: callers pass the current time
//! into each entry point and all timing decisions are evaluated lazily there.

use crate::context::history::ContextHistory;
use crate::context::snapshot::{ActivityMetrics, AppCategory, ContextSnapshot};
use crate::tracker::summary::{build_recovery_summary, RecoverySummary};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info};

/// Focus/distraction cycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusState {
    /// User is in a productive context.
    Focused,
    /// User is in a distracting context.
    Distracted,
    /// User returned; a recovery summary is on screen awaiting dismissal.
    Recovering,
}

/// Input activity reported to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Keystroke,
    Click,
    PointerMove { dx: i32, dy: i32 },
    Wheel,
}

/// Tuning parameters for focus tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// How often to checkpoint the in-progress snapshot while focused.
    #[serde(with = "crate::config::duration_serde")]
    pub snapshot_interval: Duration,

    /// Minimum distraction length that triggers a recovery summary.
    #[serde(with = "crate::config::duration_serde")]
    pub min_distraction_for_recovery: Duration,

    /// Inactivity span after which the user is flagged idle.
    #[serde(with = "crate::config::duration_serde")]
    pub idle_timeout: Duration,

    /// Treat every return from distraction as qualifying for a summary.
    pub show_for_short_distractions: bool,

    /// Application names always treated as productive, overriding the
    /// classifier.
    pub productive_apps: Vec<String>,

    /// Application names always treated as distracting, overriding the
    /// classifier.
    pub distracting_apps: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: Duration::from_secs(30),
            min_distraction_for_recovery: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(120),
            show_for_short_distractions: false,
            productive_apps: Vec::new(),
            distracting_apps: Vec::new(),
        }
    }
}

impl TrackerConfig {
    /// Productivity decision for a context, with the custom app lists taking
    /// precedence over the classifier's category.
    pub fn is_productive_app(&self, app_name: &str, category: AppCategory) -> bool {
        if list_contains(&self.productive_apps, app_name) {
            return true;
        }
        if list_contains(&self.distracting_apps, app_name) {
            return false;
        }
        category.is_productive()
    }

    /// The recovery threshold actually applied on return from distraction.
    fn effective_recovery_threshold(&self) -> Duration {
        if self.show_for_short_distractions {
            Duration::ZERO
        } else {
            self.min_distraction_for_recovery
        }
    }
}

fn list_contains(list: &[String], name: &str) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(name))
}

/// The focus state machine.
///
/// Created once at startup and shared by the window-focus, input and tick
/// callers; all mutation goes through its own operations. The transition
/// function is total — every (state, event) pair has a defined outcome, so no
/// entry point can fail.
pub struct FocusTracker {
    inner: Mutex<TrackerInner>,
}

struct TrackerInner {
    config: TrackerConfig,
    state: FocusState,

    /// The snapshot currently accumulating activity.
    current: ContextSnapshot,
    history: ContextHistory,

    /// When the current focus session started.
    focus_session_start_us: u64,
    /// When the current distraction episode started.
    distraction_start_us: u64,
    /// When the last periodic checkpoint was taken.
    last_snapshot_us: u64,
    /// When input activity was last seen.
    last_activity_us: u64,

    /// The application that started the current distraction episode.
    distracting_app: String,

    /// Set when the idle timeout has been crossed. Observational only:
    /// crossing it causes no state transition.
    idle: bool,
}

impl FocusTracker {
    /// Create a tracker in the FOCUSED state at the given time.
    pub fn new(config: TrackerConfig, now_us: u64) -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                config,
                state: FocusState::Focused,
                current: ContextSnapshot {
                    timestamp_us: now_us,
                    ..Default::default()
                },
                history: ContextHistory::new(),
                focus_session_start_us: now_us,
                distraction_start_us: 0,
                last_snapshot_us: now_us,
                last_activity_us: now_us,
                distracting_app: String::new(),
                idle: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerInner> {
        // A poisoned lock only means another caller panicked mid-update;
        // the state itself is still coherent enough to continue tracking.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle a window focus change.
    ///
    /// Closes out the in-progress snapshot (finalizing its duration and
    /// pushing it to history when meaningful), applies the transition table,
    /// and adopts the newly classified context as the in-progress snapshot.
    ///
    /// Returns a [`RecoverySummary`] exactly on the DISTRACTED → RECOVERING
    /// transition, for the caller to hand to the presenter.
    pub fn on_window_change(
        &self,
        app_name: &str,
        classified: ContextSnapshot,
        now_us: u64,
    ) -> Option<RecoverySummary> {
        let mut inner = self.lock();
        let inner = &mut *inner;

        // The switch ends the current context period.
        inner.current.activity.context_switches += 1;
        inner.close_out_current(now_us);

        let now_productive = inner.config.is_productive_app(app_name, classified.category);
        let mut summary = None;

        match inner.state {
            FocusState::Focused => {
                if !now_productive {
                    inner.state = FocusState::Distracted;
                    inner.distraction_start_us = now_us;
                    inner.distracting_app = app_name.to_string();
                    info!(app = app_name, "focused -> distracted");
                }
            }
            FocusState::Distracted => {
                if now_productive {
                    let elapsed =
                        Duration::from_micros(now_us.saturating_sub(inner.distraction_start_us));
                    // Tie-break at exactly the threshold favors triggering.
                    if elapsed >= inner.config.effective_recovery_threshold() {
                        inner.state = FocusState::Recovering;
                        summary = Some(build_recovery_summary(
                            &inner.history,
                            inner.distraction_start_us,
                            now_us,
                            &inner.distracting_app,
                            inner.focus_session_start_us,
                        ));
                        info!(
                            app = app_name,
                            distraction_s = elapsed.as_secs(),
                            "distracted -> recovering"
                        );
                    } else {
                        inner.state = FocusState::Focused;
                        inner.focus_session_start_us = now_us;
                        debug!(
                            app = app_name,
                            distraction_s = elapsed.as_secs(),
                            "short distraction, back to focused"
                        );
                    }
                }
            }
            // Held until the presenter reports dismissal.
            FocusState::Recovering => {}
        }

        let mut next = classified;
        next.timestamp_us = now_us;
        next.flags.is_productive = now_productive;
        if now_productive && inner.state == FocusState::Focused {
            next.focus_streak_s =
                (now_us.saturating_sub(inner.focus_session_start_us) / 1_000_000) as u32;
        }
        inner.current = next;

        summary
    }

    /// Record input activity on the in-progress snapshot. Never transitions.
    pub fn on_activity(&self, kind: ActivityKind, now_us: u64) {
        let mut inner = self.lock();
        match kind {
            ActivityKind::Keystroke => inner.current.activity.keystrokes += 1,
            ActivityKind::Click => inner.current.activity.mouse_clicks += 1,
            ActivityKind::PointerMove { dx, dy } => {
                inner.current.activity.mouse_distance_px += dx.unsigned_abs() + dy.unsigned_abs();
            }
            ActivityKind::Wheel => {}
        }
        inner.last_activity_us = now_us;
        inner.idle = false;
    }

    /// Periodic heartbeat.
    ///
    /// While focused, checkpoints the in-progress snapshot once the snapshot
    /// interval has elapsed. Independently flags idleness once the idle
    /// timeout is crossed — deliberately with no state transition.
    pub fn on_tick(&self, now_us: u64) {
        let mut inner = self.lock();

        if inner.state == FocusState::Focused
            && now_us.saturating_sub(inner.last_snapshot_us)
                >= inner.config.snapshot_interval.as_micros() as u64
        {
            inner.checkpoint(now_us);
            inner.last_snapshot_us = now_us;
        }

        if !inner.idle
            && now_us.saturating_sub(inner.last_activity_us)
                > inner.config.idle_timeout.as_micros() as u64
        {
            inner.idle = true;
            debug!("idle timeout crossed");
        }
    }

    /// The presenter reports the recovery summary was acknowledged.
    ///
    /// Valid only from RECOVERING: transitions to FOCUSED, restarts the
    /// focus-session timer and zeroes the in-progress activity counters.
    /// Returns whether the dismissal applied.
    pub fn on_recovery_dismissed(&self, now_us: u64) -> bool {
        let mut inner = self.lock();
        if inner.state != FocusState::Recovering {
            return false;
        }
        inner.state = FocusState::Focused;
        inner.focus_session_start_us = now_us;
        inner.current.activity.keystrokes = 0;
        inner.current.activity.mouse_clicks = 0;
        inner.current.activity.mouse_distance_px = 0;
        info!("recovering -> focused");
        true
    }

    /// Current state.
    pub fn state(&self) -> FocusState {
        self.lock().state
    }

    /// Copy of the in-progress snapshot.
    pub fn current_context(&self) -> ContextSnapshot {
        self.lock().current.clone()
    }

    /// Seconds of focus in the current session; 0 outside the FOCUSED state.
    pub fn focus_duration_seconds(&self, now_us: u64) -> u32 {
        let inner = self.lock();
        if inner.state != FocusState::Focused {
            return 0;
        }
        (now_us.saturating_sub(inner.focus_session_start_us) / 1_000_000) as u32
    }

    /// Whether the idle timeout has been crossed since the last activity.
    pub fn is_idle(&self) -> bool {
        self.lock().idle
    }

    /// Number of snapshots currently retained in history.
    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Copies of up to `max_count` most recent history entries, newest first.
    pub fn recent_history(&self, max_count: usize) -> Vec<ContextSnapshot> {
        self.lock()
            .history
            .get_recent(max_count)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Replace the configuration.
    pub fn set_config(&self, config: TrackerConfig) {
        self.lock().config = config;
    }
}

impl TrackerInner {
    /// Finalize the in-progress snapshot and push it to history when
    /// meaningful.
    fn close_out_current(&mut self, now_us: u64) {
        if self.current.timestamp_us == 0 {
            return;
        }
        let duration =
            (now_us.saturating_sub(self.current.timestamp_us) / 1_000_000) as u32;
        self.current.duration_in_context_s = duration;
        self.current.activity.finalize(duration);

        if self.current.is_meaningful() {
            let snapshot = self.current.clone();
            debug!(
                app = snapshot.app_name.as_str(),
                duration_s = duration,
                "snapshot recorded"
            );
            self.history.push(snapshot);
        }
    }

    /// Periodic checkpoint: record the in-progress snapshot as productive
    /// time, then start a fresh one with the same identity.
    fn checkpoint(&mut self, now_us: u64) {
        // Checkpoints only happen in the FOCUSED state.
        self.current.flags.is_productive = true;
        self.close_out_current(now_us);

        let mut next = self.current.clone();
        next.timestamp_us = now_us;
        next.duration_in_context_s = 0;
        next.activity = ActivityMetrics::default();
        next.focus_streak_s =
            (now_us.saturating_sub(self.focus_session_start_us) / 1_000_000) as u32;
        self.current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;

    const SECOND_US: u64 = 1_000_000;
    const START_US: u64 = 1_700_000_000_000_000;

    fn test_config() -> TrackerConfig {
        TrackerConfig {
            min_distraction_for_recovery: Duration::from_secs(30),
            ..Default::default()
        }
    }

    fn ide_snapshot() -> ContextSnapshot {
        classify("Code.exe", "main.py:100 - src - MyProject - Visual Studio Code")
    }

    fn social_snapshot() -> ContextSnapshot {
        classify("chrome.exe", "Home / Twitter - Google Chrome")
    }

    fn type_a_while(tracker: &FocusTracker, keystrokes: u32, now_us: u64) {
        for _ in 0..keystrokes {
            tracker.on_activity(ActivityKind::Keystroke, now_us);
        }
    }

    #[test]
    fn test_initial_state_is_focused() {
        let tracker = FocusTracker::new(test_config(), START_US);
        assert_eq!(tracker.state(), FocusState::Focused);
    }

    #[test]
    fn test_switch_to_distracting_app() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);

        let summary =
            tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);
        assert!(summary.is_none());
        assert_eq!(tracker.state(), FocusState::Distracted);
    }

    #[test]
    fn test_short_distraction_returns_to_focused_without_summary() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);

        // Back after 10 s, below the 30 s threshold.
        let summary =
            tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 70 * SECOND_US);
        assert!(summary.is_none());
        assert_eq!(tracker.state(), FocusState::Focused);
    }

    #[test]
    fn test_long_distraction_triggers_recovery() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        type_a_while(&tracker, 50, START_US + 10 * SECOND_US);

        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);

        // Back after 45 s, above the threshold.
        let summary = tracker
            .on_window_change("Code.exe", ide_snapshot(), START_US + 105 * SECOND_US)
            .expect("summary expected for a qualifying distraction");
        assert_eq!(tracker.state(), FocusState::Recovering);
        assert_eq!(summary.distraction_duration_s, 45);
        assert_eq!(summary.distracting_app, "chrome.exe");
        assert!(summary.last_productive.is_some());
    }

    #[test]
    fn test_threshold_tie_favors_triggering() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);

        // Exactly the threshold.
        let summary =
            tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 90 * SECOND_US);
        assert!(summary.is_some());
        assert_eq!(tracker.state(), FocusState::Recovering);
    }

    #[test]
    fn test_recovering_holds_through_window_changes() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 120 * SECOND_US);
        assert_eq!(tracker.state(), FocusState::Recovering);

        // Neither productive nor distracting switches move the state.
        let summary = tracker.on_window_change(
            "chrome.exe",
            social_snapshot(),
            START_US + 130 * SECOND_US,
        );
        assert!(summary.is_none());
        assert_eq!(tracker.state(), FocusState::Recovering);
    }

    #[test]
    fn test_summary_built_once_per_episode() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);

        let first =
            tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 120 * SECOND_US);
        assert!(first.is_some());

        // Still recovering: further returns produce nothing.
        let second =
            tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 125 * SECOND_US);
        assert!(second.is_none());
    }

    #[test]
    fn test_dismissal_resets_counters_and_timer() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 60 * SECOND_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 120 * SECOND_US);
        type_a_while(&tracker, 7, START_US + 121 * SECOND_US);

        let dismissed = tracker.on_recovery_dismissed(START_US + 130 * SECOND_US);
        assert!(dismissed);
        assert_eq!(tracker.state(), FocusState::Focused);

        let current = tracker.current_context();
        assert_eq!(current.activity.keystrokes, 0);
        assert_eq!(current.activity.mouse_clicks, 0);
        assert_eq!(current.activity.mouse_distance_px, 0);

        // Focus session timer restarted at dismissal time.
        assert_eq!(
            tracker.focus_duration_seconds(START_US + 140 * SECOND_US),
            10
        );
    }

    #[test]
    fn test_dismissal_outside_recovering_is_rejected() {
        let tracker = FocusTracker::new(test_config(), START_US);
        assert!(!tracker.on_recovery_dismissed(START_US + SECOND_US));
        assert_eq!(tracker.state(), FocusState::Focused);
    }

    #[test]
    fn test_activity_accumulates_without_transitions() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);

        tracker.on_activity(ActivityKind::Keystroke, START_US + SECOND_US);
        tracker.on_activity(ActivityKind::Click, START_US + 2 * SECOND_US);
        tracker.on_activity(
            ActivityKind::PointerMove { dx: 3, dy: -4 },
            START_US + 3 * SECOND_US,
        );
        tracker.on_activity(ActivityKind::Wheel, START_US + 4 * SECOND_US);

        let current = tracker.current_context();
        assert_eq!(current.activity.keystrokes, 1);
        assert_eq!(current.activity.mouse_clicks, 1);
        assert_eq!(current.activity.mouse_distance_px, 7);
        assert_eq!(tracker.state(), FocusState::Focused);
    }

    #[test]
    fn test_meaningful_context_recorded_on_switch() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        type_a_while(&tracker, 40, START_US + 5 * SECOND_US);

        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 30 * SECOND_US);
        assert_eq!(tracker.history_len(), 1);

        let recent = tracker.recent_history(1);
        assert_eq!(recent[0].app_name, "Code.exe");
        assert_eq!(recent[0].duration_in_context_s, 30);
        assert_eq!(recent[0].activity.context_switches, 1);
    }

    #[test]
    fn test_trivial_context_not_recorded() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        // No activity at all: the context is not meaningful.
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 30 * SECOND_US);
        assert_eq!(tracker.history_len(), 0);
    }

    #[test]
    fn test_tick_checkpoints_while_focused() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        type_a_while(&tracker, 25, START_US + 10 * SECOND_US);

        tracker.on_tick(START_US + 31 * SECOND_US);
        assert_eq!(tracker.history_len(), 1);

        let recorded = &tracker.recent_history(1)[0];
        assert!(recorded.flags.is_productive);

        // The in-progress snapshot restarted with the same identity.
        let current = tracker.current_context();
        assert_eq!(current.app_name, "Code.exe");
        assert_eq!(current.activity.keystrokes, 0);
        assert_eq!(current.timestamp_us, START_US + 31 * SECOND_US);

        // The next tick inside the interval does nothing.
        tracker.on_tick(START_US + 40 * SECOND_US);
        assert_eq!(tracker.history_len(), 1);
    }

    #[test]
    fn test_tick_does_not_checkpoint_while_distracted() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US);
        type_a_while(&tracker, 25, START_US + 10 * SECOND_US);

        tracker.on_tick(START_US + 61 * SECOND_US);
        assert_eq!(tracker.history_len(), 0);
    }

    #[test]
    fn test_idle_flag_without_transition() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        assert!(!tracker.is_idle());

        tracker.on_tick(START_US + 121 * SECOND_US);
        assert!(tracker.is_idle());
        assert_eq!(tracker.state(), FocusState::Focused);

        tracker.on_activity(ActivityKind::Keystroke, START_US + 122 * SECOND_US);
        assert!(!tracker.is_idle());
    }

    #[test]
    fn test_custom_app_lists_override_classifier() {
        let config = TrackerConfig {
            distracting_apps: vec!["Code.exe".to_string()],
            ..test_config()
        };
        let tracker = FocusTracker::new(config, START_US);

        // The IDE is on the distracting list, so the switch distracts.
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US + SECOND_US);
        assert_eq!(tracker.state(), FocusState::Distracted);

        let config = TrackerConfig {
            productive_apps: vec!["chrome.exe".to_string()],
            ..test_config()
        };
        let tracker = FocusTracker::new(config, START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + SECOND_US);
        assert_eq!(tracker.state(), FocusState::Focused);
    }

    #[test]
    fn test_show_for_short_distractions() {
        let config = TrackerConfig {
            show_for_short_distractions: true,
            ..test_config()
        };
        let tracker = FocusTracker::new(config, START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);
        tracker.on_window_change("chrome.exe", social_snapshot(), START_US + 10 * SECOND_US);

        // Even a 2 s hop now qualifies.
        let summary =
            tracker.on_window_change("Code.exe", ide_snapshot(), START_US + 12 * SECOND_US);
        assert!(summary.is_some());
        assert_eq!(tracker.state(), FocusState::Recovering);
    }

    #[test]
    fn test_focus_streak_accumulates_across_productive_switches() {
        let tracker = FocusTracker::new(test_config(), START_US);
        tracker.on_window_change("Code.exe", ide_snapshot(), START_US);

        let terminal = classify("WindowsTerminal.exe", "MINGW64:/c/dev/refocus");
        tracker.on_window_change("WindowsTerminal.exe", terminal, START_US + 40 * SECOND_US);

        let current = tracker.current_context();
        assert_eq!(current.focus_streak_s, 40);
    }
}
