//! Integration tests for the capture pipeline: scripted sensor → lock-free
//! queue → classifier → focus state machine.

use refocus_agent::{
    classify::classify,
    context::{ActivityMetrics, ContextHistory, ContextSnapshot},
    event::{EventPayload, EventRecord, FocusSwitchInfo, KeyInfo, SpscQueue},
    sensor::{ScriptStep, ScriptedSensor},
    telemetry::create_shared_stats,
    tracker::{ActivityKind, FocusState, FocusTracker, TrackerConfig},
};
use std::thread;
use std::time::Duration;

const SECOND_US: u64 = 1_000_000;
/// An arbitrary but plausible session start (2023-11-14, epoch micros).
const START_US: u64 = 1_700_000_000_000_000;

fn key_press(timestamp_us: u64, app: &str, window: u32) -> EventRecord {
    EventRecord::new(
        timestamp_us,
        100,
        window,
        app,
        EventPayload::KeyPress(KeyInfo {
            virtual_key: 65,
            scan_code: 30,
            modifiers: 0,
        }),
    )
}

fn focus_switch(timestamp_us: u64, app: &str, prev_window: u32, window: u32) -> EventRecord {
    EventRecord::new(
        timestamp_us,
        100,
        window,
        app,
        EventPayload::FocusSwitch(FocusSwitchInfo {
            prev_window,
            window,
            category_hint: 0,
        }),
    )
}

#[test]
fn test_queue_carries_records_across_threads_without_loss() {
    const TOTAL: u64 = 50_000;
    let (mut producer, mut consumer) = SpscQueue::<EventRecord, 512>::new();

    let writer = thread::spawn(move || {
        let mut sent = 0u64;
        while sent < TOTAL {
            let record = key_press(START_US + sent, "Code.exe", 1);
            match producer.try_push(record) {
                Ok(()) => sent += 1,
                Err(_) => thread::yield_now(),
            }
        }
    });

    let mut expected = 0u64;
    while expected < TOTAL {
        match consumer.try_pop() {
            Some(record) => {
                // Timestamps are strictly sequential, so any loss,
                // duplication or reorder would show immediately.
                assert_eq!(record.timestamp_us, START_US + expected);
                assert_eq!(record.app_name(), "Code.exe");
                expected += 1;
            }
            None => thread::yield_now(),
        }
    }
    writer.join().unwrap();
    assert!(consumer.try_pop().is_none());
}

#[test]
fn test_full_queue_rejects_and_preserves_contents() {
    let (mut producer, mut consumer) = SpscQueue::<u32, 16>::new();

    let mut accepted = 0u32;
    while producer.try_push(accepted).is_ok() {
        accepted += 1;
    }
    assert!(producer.is_full());

    // The rejected item comes back and nothing inside moves.
    assert_eq!(producer.try_push(4242), Err(4242));

    for expected in 0..accepted {
        assert_eq!(consumer.try_pop(), Some(expected));
    }
    assert_eq!(consumer.try_pop(), None);
}

#[test]
fn test_history_eviction_after_overflow() {
    let capacity = 20;
    let mut history = ContextHistory::with_capacity(capacity);
    let overflow = 6;

    for index in 0..(capacity + overflow) {
        let mut snap = ContextSnapshot {
            app_name: format!("app{index}"),
            timestamp_us: START_US + index as u64 * SECOND_US,
            duration_in_context_s: 30,
            activity: ActivityMetrics {
                keystrokes: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        snap.flags.is_productive = true;
        assert!(history.push(snap));
    }

    assert_eq!(history.len(), capacity);
    assert_eq!(
        history.get_at(0).unwrap().app_name,
        format!("app{}", capacity + overflow - 1)
    );
    // The first entries pushed are unreachable through every query.
    for index in 0..overflow {
        assert!(history.find_by_app(&format!("app{index}")).is_none());
    }
    assert_eq!(
        history.total_focus_seconds(),
        30 * capacity as u64
    );
}

#[test]
fn test_scripted_pipeline_emits_recovery_summary() {
    let ide_title = "main.py:234 - src - neural-notes - Visual Studio Code";
    let twitter_title = "Home / Twitter - Google Chrome";

    // Simulated clock rides the record timestamps; real delays stay tiny.
    let mut script = vec![ScriptStep::immediate(focus_switch(
        START_US,
        "Code.exe",
        0,
        1,
    ))];
    for index in 0..30u64 {
        script.push(ScriptStep::immediate(key_press(
            START_US + (1 + index) * SECOND_US,
            "Code.exe",
            1,
        )));
    }
    script.push(ScriptStep::immediate(focus_switch(
        START_US + 40 * SECOND_US,
        "chrome.exe",
        1,
        2,
    )));
    script.push(ScriptStep::immediate(focus_switch(
        START_US + 95 * SECOND_US,
        "Code.exe",
        2,
        1,
    )));

    let (producer, mut consumer) = SpscQueue::<EventRecord, 256>::new();
    let stats = create_shared_stats();
    let mut sensor = ScriptedSensor::new(script);
    sensor.start(producer, stats.clone()).unwrap();
    sensor.wait();

    let tracker = FocusTracker::new(TrackerConfig::default(), START_US);
    let mut summaries = Vec::new();

    while let Some(record) = consumer.try_pop() {
        let now_us = record.timestamp_us;
        match record.payload() {
            EventPayload::FocusSwitch(_) => {
                let title = match record.app_name() {
                    "Code.exe" => ide_title,
                    _ => twitter_title,
                };
                let snapshot = classify(record.app_name(), title);
                if let Some(summary) = tracker.on_window_change(record.app_name(), snapshot, now_us)
                {
                    summaries.push(summary);
                }
            }
            EventPayload::KeyPress(_) => tracker.on_activity(ActivityKind::Keystroke, now_us),
            _ => {}
        }
        tracker.on_tick(now_us);
    }

    assert_eq!(stats.snapshot().events_emitted, 33);
    assert_eq!(stats.snapshot().events_dropped_full, 0);

    // Exactly one qualifying distraction: 55 simulated seconds on Twitter.
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.distraction_duration_s, 55);
    assert_eq!(summary.distracting_app, "chrome.exe");
    assert_eq!(tracker.state(), FocusState::Recovering);

    let last = summary.last_productive.as_ref().unwrap();
    assert_eq!(last.app_name, "Code.exe");
    assert_eq!(last.brief_description(), "main.py:234");

    // Dismissal completes the cycle.
    assert!(tracker.on_recovery_dismissed(START_US + 100 * SECOND_US));
    assert_eq!(tracker.state(), FocusState::Focused);
}

#[test]
fn test_short_detour_produces_no_summary_through_pipeline() {
    let tracker = FocusTracker::new(TrackerConfig::default(), START_US);

    let ide = classify("Code.exe", "lib.rs - refocus - Visual Studio Code");
    tracker.on_window_change("Code.exe", ide.clone(), START_US);
    for index in 0..20u64 {
        tracker.on_activity(ActivityKind::Keystroke, START_US + index * SECOND_US);
    }

    let social = classify("chrome.exe", "Home / Twitter - Google Chrome");
    tracker.on_window_change("chrome.exe", social, START_US + 30 * SECOND_US);
    assert_eq!(tracker.state(), FocusState::Distracted);

    // Ten seconds is below the default 30 s threshold.
    let summary = tracker.on_window_change("Code.exe", ide, START_US + 40 * SECOND_US);
    assert!(summary.is_none());
    assert_eq!(tracker.state(), FocusState::Focused);
}

#[test]
fn test_recovery_duration_tracks_elapsed_time() {
    let config = TrackerConfig {
        min_distraction_for_recovery: Duration::from_secs(30),
        ..Default::default()
    };
    let tracker = FocusTracker::new(config, START_US);

    let ide = classify("Code.exe", "lib.rs - refocus - Visual Studio Code");
    tracker.on_window_change("Code.exe", ide.clone(), START_US);
    tracker.on_activity(ActivityKind::Keystroke, START_US + SECOND_US);

    let social = classify("chrome.exe", "Home / Twitter - Google Chrome");
    tracker.on_window_change("chrome.exe", social, START_US + 10 * SECOND_US);

    let away_s = 73;
    let summary = tracker
        .on_window_change(
            "Code.exe",
            ide,
            START_US + (10 + away_s) * SECOND_US,
        )
        .expect("distraction exceeded the threshold");

    // With an injected clock the reported duration is exact.
    assert_eq!(summary.distraction_duration_s, away_s as u32);
}
