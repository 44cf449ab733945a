//! Refocus Agent CLI
//!
//! Work-context capture and distraction recovery.

use clap::{Parser, Subcommand};
use refocus_agent::{
    classify::classify,
    config::AgentConfig,
    event::{
        wall_clock_us, ClickInfo, EventPayload, EventQueue, EventRecord, FocusSwitchInfo, KeyInfo,
        PointerMotion, WheelInfo,
    },
    sensor::{ScriptStep, ScriptedSensor},
    telemetry::{create_shared_stats_with_persistence, PipelineStats},
    tracker::{ActivityKind, FocusTracker, RecoverySummary},
    VERSION,
};
use std::collections::HashMap;
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "refocus")]
#[command(version = VERSION)]
#[command(about = "Work-context capture and distraction recovery", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the built-in scenario through the full capture pipeline
    Demo {
        /// Print recovery summaries as JSON instead of the rendered card
        #[arg(long)]
        json: bool,
    },

    /// Classify a window title and print the resulting snapshot
    Classify {
        /// Process name, e.g. "Code.exe"
        app: String,
        /// Full window title
        title: String,
    },

    /// Show persisted pipeline statistics
    Stats,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { json } => cmd_demo(json),
        Commands::Classify { app, title } => cmd_classify(&app, &title),
        Commands::Stats => cmd_stats(),
        Commands::Config => cmd_config(),
    }
}

/// Simulated window registry: the capture layer knows only window ids, so
/// titles are resolved out-of-band like a real backend would.
type WindowRegistry = HashMap<u32, (String, String)>;

const SECOND_US: u64 = 1_000_000;

fn cmd_demo(json: bool) {
    println!("Refocus Agent v{VERSION}");
    println!();
    println!("Replaying the built-in scenario: a coding session, a Twitter");
    println!("detour past the distraction threshold, and the return to work.");
    println!();

    let config = AgentConfig::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let stats = create_shared_stats_with_persistence(config.stats_path());
    let start_us = wall_clock_us();
    let tracker = FocusTracker::new(config.tracker.clone(), start_us);
    let (script, registry) = demo_script(start_us);

    // Ctrl+C stops the replay early.
    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    }) {
        eprintln!("Warning: Could not install Ctrl+C handler: {e}");
    }

    let (producer, mut consumer) = EventQueue::new();
    let mut sensor = ScriptedSensor::new(script);
    if let Err(e) = sensor.start(producer, stats.clone()) {
        eprintln!("Error starting sensor: {e}");
        std::process::exit(1);
    }

    let mut last_pointer: Option<(i32, i32)> = None;
    let mut recorded_snapshots = 0;
    let mut last_event_us = start_us;

    loop {
        if stop_rx.try_recv().is_ok() {
            println!();
            println!("Stopping replay...");
            sensor.stop();
            break;
        }

        let record = match consumer.try_pop() {
            Some(record) => record,
            None if sensor.is_running() => {
                thread::sleep(Duration::from_millis(1));
                continue;
            }
            None => break,
        };

        last_event_us = record.timestamp_us;
        forward_event(
            &tracker,
            &registry,
            &record,
            start_us,
            &mut last_pointer,
            |summary, now_us| {
                stats.record_summary();
                present_summary(summary, json);
                // The demo acknowledges the card on the user's behalf.
                tracker.on_recovery_dismissed(now_us + SECOND_US);
                println!("(summary dismissed, back to focused)");
                println!();
            },
        );

        // Heartbeat rides the replayed clock.
        tracker.on_tick(record.timestamp_us);

        let len = tracker.history_len();
        for _ in recorded_snapshots..len {
            stats.record_snapshot();
        }
        recorded_snapshots = recorded_snapshots.max(len);
    }

    tracker.on_tick(last_event_us);

    println!();
    println!("{}", stats.summary());
    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not persist stats: {e}");
    }
}

/// Feed one queue record into the state machine.
fn forward_event(
    tracker: &FocusTracker,
    registry: &WindowRegistry,
    record: &EventRecord,
    start_us: u64,
    last_pointer: &mut Option<(i32, i32)>,
    mut on_summary: impl FnMut(&RecoverySummary, u64),
) {
    let now_us = record.timestamp_us;
    match record.payload() {
        EventPayload::FocusSwitch(info) => {
            let (app, title) = registry
                .get(&info.window)
                .cloned()
                .unwrap_or_else(|| (record.app_name().to_string(), String::new()));
            let snapshot = classify(&app, &title);
            println!(
                "[{:>3}s] focus: {app} - {title}",
                now_us.saturating_sub(start_us) / SECOND_US
            );
            if let Some(summary) = tracker.on_window_change(&app, snapshot, now_us) {
                on_summary(&summary, now_us);
            }
        }
        EventPayload::KeyPress(_) => tracker.on_activity(ActivityKind::Keystroke, now_us),
        EventPayload::KeyRelease(_) => {}
        EventPayload::Click(_) => tracker.on_activity(ActivityKind::Click, now_us),
        EventPayload::PointerMove(motion) => {
            let (dx, dy) = match *last_pointer {
                Some((x, y)) => (motion.x - x, motion.y - y),
                None => (0, 0),
            };
            *last_pointer = Some((motion.x, motion.y));
            tracker.on_activity(ActivityKind::PointerMove { dx, dy }, now_us);
        }
        EventPayload::Wheel(_) => tracker.on_activity(ActivityKind::Wheel, now_us),
        // No transition is defined for idle events; the tick path owns the
        // idle flag.
        EventPayload::IdleStart(_) | EventPayload::IdleEnd(_) => {}
    }
}

fn present_summary(summary: &RecoverySummary, json: bool) {
    println!();
    if json {
        match serde_json::to_string_pretty(summary) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => eprintln!("Error rendering summary: {e}"),
        }
        return;
    }

    println!("┌────────────────────────────────────────────────────────┐");
    println!("│ Welcome back                                           │");
    println!("└────────────────────────────────────────────────────────┘");
    println!(
        "  You were away {}s in {}",
        summary.distraction_duration_s, summary.distracting_app
    );
    if let Some(last) = &summary.last_productive {
        println!("  You were working on: {}", last.brief_description());
        if last.activity.keystrokes > 0 {
            println!("  ({} keystrokes in that context)", last.activity.keystrokes);
        }
    }
    println!(
        "  Focused for {}s before the distraction",
        summary.focus_duration_before_s
    );
    if !summary.recent_activities.is_empty() {
        println!("  Recent activity:");
        for note in &summary.recent_activities {
            println!("    - {}", note.description);
        }
    }
}

/// The built-in scenario: edit code, drift to Twitter for ~55 simulated
/// seconds, come back. Timestamps carry the simulated clock; the real delays
/// just keep the replay readable.
fn demo_script(start_us: u64) -> (Vec<ScriptStep>, WindowRegistry) {
    let mut registry = WindowRegistry::new();
    registry.insert(
        101,
        (
            "Code.exe".to_string(),
            "main.py:234 - src - neural-notes - Visual Studio Code".to_string(),
        ),
    );
    registry.insert(
        202,
        (
            "chrome.exe".to_string(),
            "Home / Twitter - Google Chrome".to_string(),
        ),
    );

    let at = |secs: u64| start_us + secs * SECOND_US;
    let mut steps = Vec::new();
    let mut push = |step: ScriptStep| steps.push(step);

    // Settle into the editor.
    push(ScriptStep::after(
        Duration::from_millis(5),
        EventRecord::new(
            at(0),
            4100,
            101,
            "Code.exe",
            EventPayload::FocusSwitch(FocusSwitchInfo {
                prev_window: 0,
                window: 101,
                category_hint: 0,
            }),
        ),
    ));

    // A burst of typing with some pointer travel.
    for index in 0..40u64 {
        let ts = at(1 + index / 2);
        push(ScriptStep::immediate(EventRecord::new(
            ts,
            4100,
            101,
            "Code.exe",
            EventPayload::KeyPress(KeyInfo {
                virtual_key: 65 + (index % 20) as u32,
                scan_code: 30,
                modifiers: 0,
            }),
        )));
        push(ScriptStep::immediate(EventRecord::new(
            ts,
            4100,
            101,
            "Code.exe",
            EventPayload::KeyRelease(KeyInfo {
                virtual_key: 65 + (index % 20) as u32,
                scan_code: 30,
                modifiers: 0,
            }),
        )));
    }
    for index in 0..5i32 {
        push(ScriptStep::immediate(EventRecord::new(
            at(22),
            4100,
            101,
            "Code.exe",
            EventPayload::PointerMove(PointerMotion {
                x: 400 + index * 30,
                y: 300 + index * 10,
                speed_px_s: 250,
            }),
        )));
    }
    push(ScriptStep::immediate(EventRecord::new(
        at(24),
        4100,
        101,
        "Code.exe",
        EventPayload::Click(ClickInfo {
            x: 520,
            y: 340,
            button: 1,
        }),
    )));

    // Keep typing past the snapshot interval so a checkpoint lands.
    for index in 0..10u64 {
        push(ScriptStep::immediate(EventRecord::new(
            at(31 + index),
            4100,
            101,
            "Code.exe",
            EventPayload::KeyPress(KeyInfo {
                virtual_key: 70 + index as u32,
                scan_code: 33,
                modifiers: 0,
            }),
        )));
    }

    // The detour.
    push(ScriptStep::after(
        Duration::from_millis(20),
        EventRecord::new(
            at(42),
            5200,
            202,
            "chrome.exe",
            EventPayload::FocusSwitch(FocusSwitchInfo {
                prev_window: 101,
                window: 202,
                category_hint: 0,
            }),
        ),
    ));
    for index in 0..12u64 {
        push(ScriptStep::immediate(EventRecord::new(
            at(44 + index * 4),
            5200,
            202,
            "chrome.exe",
            EventPayload::Wheel(WheelInfo {
                delta: -3,
                axis: 0,
            }),
        )));
    }

    // Back to work after ~55 simulated seconds away.
    push(ScriptStep::after(
        Duration::from_millis(20),
        EventRecord::new(
            at(97),
            4100,
            101,
            "Code.exe",
            EventPayload::FocusSwitch(FocusSwitchInfo {
                prev_window: 202,
                window: 101,
                category_hint: 0,
            }),
        ),
    ));
    for index in 0..6u64 {
        push(ScriptStep::immediate(EventRecord::new(
            at(99 + index),
            4100,
            101,
            "Code.exe",
            EventPayload::KeyPress(KeyInfo {
                virtual_key: 72,
                scan_code: 35,
                modifiers: 0,
            }),
        )));
    }

    (steps, registry)
}

fn cmd_classify(app: &str, title: &str) {
    let snapshot = classify(app, title);
    match serde_json::to_string_pretty(&snapshot) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("Error rendering snapshot: {e}"),
    }
}

fn cmd_stats() {
    let config = AgentConfig::load().unwrap_or_default();
    let stats_path = config.stats_path();

    if !stats_path.exists() {
        println!("No pipeline statistics recorded yet.");
        println!("Run `refocus demo` to exercise the pipeline.");
        return;
    }

    let stats = PipelineStats::with_persistence(stats_path);
    println!("{}", stats.summary());
}

fn cmd_config() {
    let config = AgentConfig::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", AgentConfig::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
