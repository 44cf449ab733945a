//! Fixed-layout sensor event records.
//!
//! Every discrete user action (key press, mouse action, window focus change,
//! idle transition) is captured as one [`EventRecord`]. Records are exactly
//! one cache line wide so that queue storage is a contiguous, prefetch-friendly
//! array with no false sharing between adjacent slots.

use chrono::Utc;

/// Bound for the embedded application name, including the NUL terminator.
pub const APP_NAME_LEN: usize = 24;

/// Earliest plausible event timestamp (2020-01-01 UTC, microseconds).
pub const MIN_PLAUSIBLE_TIMESTAMP_US: u64 = 1_577_836_800_000_000;

/// Latest plausible event timestamp (2050-01-01 UTC, microseconds).
pub const MAX_PLAUSIBLE_TIMESTAMP_US: u64 = 2_524_608_000_000_000;

/// Key press/release details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct KeyInfo {
    /// Platform virtual key code.
    pub virtual_key: u32,
    /// Hardware scan code.
    pub scan_code: u32,
    /// Modifier bit flags (shift, control, alt, meta).
    pub modifiers: u32,
}

/// Pointer motion details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct PointerMotion {
    /// Screen X coordinate (can be negative on multi-monitor setups).
    pub x: i32,
    /// Screen Y coordinate.
    pub y: i32,
    /// Derived speed in pixels per second.
    pub speed_px_s: u32,
}

/// Mouse click details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ClickInfo {
    pub x: i32,
    pub y: i32,
    /// 1 = left, 2 = right, 3 = middle, 4/5 = extra buttons.
    pub button: u32,
}

/// Scroll wheel details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct WheelInfo {
    /// Scroll amount; positive is up/right.
    pub delta: i32,
    /// 0 = vertical, 1 = horizontal.
    pub axis: u32,
}

/// Window focus switch details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct FocusSwitchInfo {
    /// Window identifier that lost focus.
    pub prev_window: u32,
    /// Window identifier that gained focus.
    pub window: u32,
    /// Pre-classified category hint from the capture layer, 0 if unknown.
    pub category_hint: u32,
}

/// Idle span details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct IdleSpan {
    /// Length of the idle period in milliseconds.
    pub duration_ms: u32,
}

/// Kind-specific event payload.
///
/// The discriminant doubles as the event kind tag, so a record can never
/// carry a payload that disagrees with its kind; matching on the variant is
/// the only way to read the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, u32)]
pub enum EventPayload {
    KeyPress(KeyInfo) = 1,
    KeyRelease(KeyInfo) = 2,
    PointerMove(PointerMotion) = 3,
    Click(ClickInfo) = 4,
    Wheel(WheelInfo) = 5,
    FocusSwitch(FocusSwitchInfo) = 6,
    IdleStart(IdleSpan) = 7,
    IdleEnd(IdleSpan) = 8,
}

/// Classification of user actions, mirroring the payload variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventKind {
    KeyPress = 1,
    KeyRelease = 2,
    PointerMove = 3,
    Click = 4,
    Wheel = 5,
    FocusSwitch = 6,
    IdleStart = 7,
    IdleEnd = 8,
}

impl EventPayload {
    /// The kind tag for this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::KeyPress(_) => EventKind::KeyPress,
            EventPayload::KeyRelease(_) => EventKind::KeyRelease,
            EventPayload::PointerMove(_) => EventKind::PointerMove,
            EventPayload::Click(_) => EventKind::Click,
            EventPayload::Wheel(_) => EventKind::Wheel,
            EventPayload::FocusSwitch(_) => EventKind::FocusSwitch,
            EventPayload::IdleStart(_) => EventKind::IdleStart,
            EventPayload::IdleEnd(_) => EventKind::IdleEnd,
        }
    }
}

/// One captured sensor event.
///
/// Layout is fixed at exactly 64 bytes, aligned to a 64-byte boundary:
///
/// ```text
/// offset  size  field
/// ------  ----  -----
/// 0       8     timestamp_us
/// 8       4     process_id
/// 12      4     window_id
/// 16      24    app_name (NUL-terminated UTF-8)
/// 40      16    payload (4-byte tag + 12-byte variant data)
/// 56      8     reserved
/// ```
#[derive(Debug, Clone, Copy)]
#[repr(C, align(64))]
pub struct EventRecord {
    /// Microseconds since the Unix epoch.
    pub timestamp_us: u64,
    /// Operating system process identifier.
    pub process_id: u32,
    /// Operating system window identifier.
    pub window_id: u32,
    app_name: [u8; APP_NAME_LEN],
    payload: EventPayload,
    _reserved: [u8; 8],
}

const _: () = assert!(std::mem::size_of::<EventRecord>() == 64);
const _: () = assert!(std::mem::align_of::<EventRecord>() == 64);
const _: () = assert!(std::mem::size_of::<EventPayload>() == 16);

impl EventRecord {
    /// Create a fully populated record.
    ///
    /// The application name is truncated (at a character boundary) to fit the
    /// 24-byte field and is always NUL-terminated.
    pub fn new(
        timestamp_us: u64,
        process_id: u32,
        window_id: u32,
        app_name: &str,
        payload: EventPayload,
    ) -> Self {
        let mut name = [0u8; APP_NAME_LEN];
        let mut len = app_name.len().min(APP_NAME_LEN - 1);
        while len > 0 && !app_name.is_char_boundary(len) {
            len -= 1;
        }
        name[..len].copy_from_slice(&app_name.as_bytes()[..len]);

        Self {
            timestamp_us,
            process_id,
            window_id,
            app_name: name,
            payload,
            _reserved: [0; 8],
        }
    }

    /// Create a record stamped with the current wall-clock time.
    pub fn now(process_id: u32, window_id: u32, app_name: &str, payload: EventPayload) -> Self {
        Self::new(wall_clock_us(), process_id, window_id, app_name, payload)
    }

    /// The event kind, derived from the payload tag.
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The kind-specific payload.
    pub fn payload(&self) -> EventPayload {
        self.payload
    }

    /// The application name up to its NUL terminator.
    pub fn app_name(&self) -> &str {
        let end = self
            .app_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(APP_NAME_LEN);
        std::str::from_utf8(&self.app_name[..end]).unwrap_or("")
    }

    /// Sanity check performed by producers before enqueueing.
    ///
    /// A record is valid when its timestamp falls in the plausible operating
    /// range and the name field is NUL-terminated within its bound. Invalid
    /// records are dropped at the producer boundary and never enter the queue.
    pub fn is_valid(&self) -> bool {
        (MIN_PLAUSIBLE_TIMESTAMP_US..=MAX_PLAUSIBLE_TIMESTAMP_US).contains(&self.timestamp_us)
            && self.app_name.contains(&0)
    }
}

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn wall_clock_us() -> u64 {
    Utc::now().timestamp_micros().max(0) as u64
}
