//! Work-context snapshots.
//!
//! A [`ContextSnapshot`] is a point-in-time description of what the user is
//! doing: application identity, parsed file/project or browser hints, and
//! activity counters accumulated while the context was active. Snapshots are
//! produced by the classifier, enriched by the state machine, and retained in
//! the context history.

use serde::{Deserialize, Serialize};

/// Minimum time in a context before a snapshot is worth keeping.
pub const MIN_MEANINGFUL_DURATION_S: u32 = 5;

/// Application classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppCategory {
    #[default]
    Unknown,
    Ide,
    Terminal,
    Documentation,
    Productivity,
    /// Browsers are neutral until the title says otherwise.
    Browser,
    SocialMedia,
    Communication,
    Entertainment,
    Shopping,
}

impl AppCategory {
    /// Whether this category is currently treated as productive.
    ///
    /// An explicit per-category table; Unknown and Browser stay on the
    /// productive side so an unclassified window never counts as a
    /// distraction on its own.
    pub fn is_productive(self) -> bool {
        match self {
            AppCategory::Unknown
            | AppCategory::Ide
            | AppCategory::Terminal
            | AppCategory::Documentation
            | AppCategory::Productivity
            | AppCategory::Browser => true,
            AppCategory::SocialMedia
            | AppCategory::Communication
            | AppCategory::Entertainment
            | AppCategory::Shopping => false,
        }
    }
}

/// Editor context parsed from an IDE window title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeContext {
    /// File being edited (name or path, as the title exposes it).
    pub file_path: String,
    /// Line number when the title carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Function name when detectable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Project or workspace name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

/// Browsing context parsed from a browser window title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserContext {
    /// Site or domain being browsed.
    pub domain: String,
    /// Most recent search query, when the title exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_search_query: Option<String>,
}

/// Input activity accumulated while a context was active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    pub keystrokes: u32,
    pub mouse_clicks: u32,
    /// Total pointer travel, Manhattan distance in pixels.
    pub mouse_distance_px: u32,
    /// Application switches that ended a context period.
    pub context_switches: u32,
    /// Characters per minute, derived at finalization.
    pub typing_speed_cpm: f32,
    /// Derived engagement estimate, 0 to 100.
    pub focus_score: f32,
}

impl ActivityMetrics {
    /// Derive the rate metrics once the context duration is known.
    ///
    /// Sustained typing raises the score, frequent context switches lower it.
    pub fn finalize(&mut self, duration_s: u32) {
        if duration_s == 0 {
            return;
        }
        self.typing_speed_cpm = self.keystrokes as f32 * 60.0 / duration_s as f32;

        let typing = (self.typing_speed_cpm / 300.0).clamp(0.0, 1.0);
        let clicking = (self.mouse_clicks as f32 / duration_s as f32).clamp(0.0, 1.0);
        let switch_penalty = (self.context_switches as f32 * 0.15).clamp(0.0, 1.0);
        self.focus_score =
            ((typing * 0.7 + clicking * 0.3) * (1.0 - 0.5 * switch_penalty) * 100.0)
                .clamp(0.0, 100.0);
    }
}

/// Status flags for a context period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextFlags {
    /// IDE shows an unsaved-changes indicator.
    pub has_unsaved_changes: bool,
    /// A debug session is active.
    pub is_debugging: bool,
    /// A build is in progress.
    pub is_building: bool,
    /// Whether this period counted as productive time.
    pub is_productive: bool,
}

/// Point-in-time capture of work context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// When this context period started, microseconds since the Unix epoch.
    pub timestamp_us: u64,
    /// How long the user stayed in this context, seconds.
    pub duration_in_context_s: u32,
    /// Focus streak across context switches, seconds.
    pub focus_streak_s: u32,

    /// Process name, e.g. "Code.exe".
    pub app_name: String,
    /// Full window title at classification time.
    pub window_title: String,
    pub process_id: u32,
    pub window_id: u32,
    pub category: AppCategory,

    /// Present when the classifier detected an IDE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ide: Option<IdeContext>,
    /// Present when the classifier detected a browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser: Option<BrowserContext>,

    pub activity: ActivityMetrics,
    pub flags: ContextFlags,
}

impl ContextSnapshot {
    /// Whether this snapshot is worth keeping in history.
    ///
    /// Requires an application name, at least
    /// [`MIN_MEANINGFUL_DURATION_S`] seconds in the context, and some input
    /// activity (keystrokes or clicks).
    pub fn is_meaningful(&self) -> bool {
        !self.app_name.is_empty()
            && self.duration_in_context_s >= MIN_MEANINGFUL_DURATION_S
            && (self.activity.keystrokes > 0 || self.activity.mouse_clicks > 0)
    }

    /// Short human-readable description: "main.py:234", a browsed domain, or
    /// the bare application name.
    pub fn brief_description(&self) -> String {
        if let Some(ide) = &self.ide {
            if !ide.file_path.is_empty() {
                let file_name = ide
                    .file_path
                    .rsplit(['/', '\\'])
                    .next()
                    .unwrap_or(ide.file_path.as_str());
                return match ide.line_number {
                    Some(line) => format!("{file_name}:{line}"),
                    None => file_name.to_string(),
                };
            }
        }
        if let Some(browser) = &self.browser {
            if !browser.domain.is_empty() {
                return browser.domain.clone();
            }
        }
        self.app_name.clone()
    }
}
