//! Recovery summary construction.
//!
//! When the user returns from a qualifying distraction, the state machine
//! compiles everything the presenter needs to restore mental context: the
//! last productive snapshot, the distraction window, and a short list of
//! recent activities. Built exactly once per episode, handed off, and not
//! retained by the machine.

use crate::context::history::ContextHistory;
use crate::context::snapshot::ContextSnapshot;
use serde::{Deserialize, Serialize};

/// Maximum number of recent activity descriptions in a summary.
pub const MAX_RECENT_ACTIVITIES: usize = 5;

/// One line of the "what was I doing" list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityNote {
    pub timestamp_us: u64,
    /// e.g. "Working in main.py:234".
    pub description: String,
}

/// Everything the presenter needs to render a recovery prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverySummary {
    /// What the user was doing before the distraction, when history has it.
    pub last_productive: Option<ContextSnapshot>,

    /// When the distraction began, microseconds since the Unix epoch.
    pub distraction_start_us: u64,
    /// When the user returned.
    pub distraction_end_us: u64,
    /// Length of the distraction, seconds.
    pub distraction_duration_s: u32,
    /// The application that pulled the user away.
    pub distracting_app: String,

    /// Up to [`MAX_RECENT_ACTIVITIES`] recent contexts, newest first.
    pub recent_activities: Vec<ActivityNote>,

    /// Productive time accumulated before the distraction began, seconds.
    pub focus_duration_before_s: u32,
}

/// Build a recovery summary from history and the distraction window.
///
/// Deterministic and read-only: the same inputs always produce the same
/// summary. Focus-duration-before sums productive history entries stamped
/// before the distraction started; when there are none, it falls back to the
/// span between the focus-session start and the distraction start.
pub fn build_recovery_summary(
    history: &ContextHistory,
    distraction_start_us: u64,
    distraction_end_us: u64,
    distracting_app: &str,
    focus_session_start_us: u64,
) -> RecoverySummary {
    let last_productive = history.find_last_productive().cloned();

    let recent_activities = history
        .get_recent(MAX_RECENT_ACTIVITIES)
        .into_iter()
        .map(|snap| ActivityNote {
            timestamp_us: snap.timestamp_us,
            description: format!("Working in {}", snap.brief_description()),
        })
        .collect();

    let focus_before: u64 = history
        .iter()
        .filter(|snap| snap.flags.is_productive && snap.timestamp_us < distraction_start_us)
        .map(|snap| snap.duration_in_context_s as u64)
        .sum();
    let focus_duration_before_s = if focus_before > 0 {
        focus_before as u32
    } else {
        (distraction_start_us.saturating_sub(focus_session_start_us) / 1_000_000) as u32
    };

    RecoverySummary {
        last_productive,
        distraction_start_us,
        distraction_end_us,
        distraction_duration_s: (distraction_end_us.saturating_sub(distraction_start_us)
            / 1_000_000) as u32,
        distracting_app: distracting_app.to_string(),
        recent_activities,
        focus_duration_before_s,
    }
}
