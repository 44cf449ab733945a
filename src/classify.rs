//! Heuristic window-title classifier.
//!
//! Turns a raw `(process name, window title)` pair into a structured
//! [`ContextSnapshot`]. App-specific parsers are tried in order, most
//! specific first; a process-name table and a generic fallback guarantee a
//! usable snapshot for every input. The classifier never fails, stamps no
//! timestamps, and is idempotent for the same input.
//!
//! Accuracy here is best-effort: "main.py in VS Code" without a line number
//! beats showing nothing at all.

use crate::context::snapshot::{AppCategory, BrowserContext, ContextSnapshot, IdeContext};

/// Sites that mark a browser context as reference/documentation work.
const PRODUCTIVE_SITES: &[&str] = &[
    "GitHub",
    "Stack Overflow",
    "stackoverflow",
    "MDN",
    "docs.",
    "documentation",
    "Wikipedia",
    "Microsoft Learn",
    "Google Docs",
    "Notion",
    "localhost",
    "127.0.0.1",
];

/// Sites that mark a browser context as distracting, with their category.
const DISTRACTING_SITES: &[(&str, AppCategory)] = &[
    ("YouTube", AppCategory::Entertainment),
    ("Netflix", AppCategory::Entertainment),
    ("Twitch", AppCategory::Entertainment),
    ("Twitter", AppCategory::SocialMedia),
    ("Facebook", AppCategory::SocialMedia),
    ("Instagram", AppCategory::SocialMedia),
    ("Reddit", AppCategory::SocialMedia),
    ("TikTok", AppCategory::SocialMedia),
    ("Discord", AppCategory::Communication),
    ("Amazon", AppCategory::Shopping),
    ("eBay", AppCategory::Shopping),
];

/// Classify a window into a context snapshot.
///
/// Always succeeds: when no parser recognizes the title, the snapshot falls
/// back to a process-name category with the raw title preserved.
pub fn classify(app_name: &str, window_title: &str) -> ContextSnapshot {
    let mut snapshot = ContextSnapshot {
        app_name: app_name.to_string(),
        window_title: window_title.to_string(),
        ..Default::default()
    };

    let recognized = parse_vscode(window_title, &mut snapshot)
        || parse_jetbrains(window_title, &mut snapshot)
        || parse_office(window_title, &mut snapshot)
        || parse_terminal(window_title, &mut snapshot)
        || parse_browser(window_title, &mut snapshot);

    if !recognized {
        snapshot.category = category_for_process(app_name);
    }
    snapshot.flags.is_productive = snapshot.category.is_productive();
    snapshot
}

/// Fallback classification from the process name alone.
fn category_for_process(app_name: &str) -> AppCategory {
    let name = app_name.to_lowercase();
    let matches = |needles: &[&str]| needles.iter().any(|needle| name.contains(needle));

    if matches(&["code", "devenv", "idea", "pycharm", "clion", "rider", "zed"]) {
        AppCategory::Ide
    } else if matches(&["terminal", "powershell", "cmd", "alacritty", "wezterm", "kitty"]) {
        AppCategory::Terminal
    } else if matches(&["chrome", "firefox", "edge", "safari", "brave"]) {
        AppCategory::Browser
    } else if matches(&["slack", "discord", "teams", "zoom"]) {
        AppCategory::Communication
    } else if matches(&["word", "excel", "powerpnt", "notion", "obsidian"]) {
        AppCategory::Productivity
    } else if matches(&["steam", "spotify", "vlc"]) {
        AppCategory::Entertainment
    } else {
        AppCategory::Unknown
    }
}

/// VS Code: "filename - folder - project - Visual Studio Code", with
/// optional ":line" suffix on the filename and a leading unsaved marker.
fn parse_vscode(title: &str, out: &mut ContextSnapshot) -> bool {
    if !title.ends_with("Visual Studio Code")
        && !title.ends_with("VS Code")
        && !title.ends_with("Code")
    {
        return false;
    }

    out.category = AppCategory::Ide;
    out.flags.has_unsaved_changes = title.starts_with('●') || title.starts_with("• ");

    let body = title
        .trim_start_matches('●')
        .trim_start_matches('•')
        .trim_start();

    let parts: Vec<&str> = body.split(" - ").collect();
    if parts.len() < 2 {
        // Welcome page or similar; the raw title is all we have.
        return true;
    }

    let mut ide = IdeContext::default();
    let mut file = parts[0].trim();
    if let Some((name, line)) = file.rsplit_once(':') {
        if let Ok(line_number) = line.parse::<u32>() {
            ide.line_number = Some(line_number);
            file = name;
        }
    }
    ide.file_path = file.to_string();

    // Project name is usually the second-to-last segment before the app name.
    if parts.len() >= 3 {
        ide.project_name = Some(parts[parts.len() - 2].trim().to_string());
    }

    out.flags.is_debugging = title.contains("[Debug]") || title.contains("Debugging");
    out.ide = Some(ide);
    true
}

/// JetBrains IDEs: "project – filename – IDE Name", en-dash separated.
fn parse_jetbrains(title: &str, out: &mut ContextSnapshot) -> bool {
    const JETBRAINS_IDES: &[&str] = &[
        "IntelliJ IDEA",
        "PyCharm",
        "WebStorm",
        "CLion",
        "Rider",
        "GoLand",
        "RubyMine",
    ];
    if !JETBRAINS_IDES.iter().any(|ide| title.contains(ide)) {
        return false;
    }

    out.category = AppCategory::Ide;

    // JetBrains uses an en-dash; fall back to a hyphen just in case.
    let separator = if title.contains(" – ") { " – " } else { " - " };
    let parts: Vec<&str> = title.split(separator).collect();

    let mut ide = IdeContext::default();
    if parts.len() >= 2 {
        ide.project_name = Some(parts[0].trim().to_string());
        ide.file_path = parts[1].trim().to_string();
    }
    out.ide = Some(ide);
    true
}

/// Microsoft Office: "Document Name - Microsoft Application".
fn parse_office(title: &str, out: &mut ContextSnapshot) -> bool {
    let is_office = title.ends_with("Word")
        || title.ends_with("Excel")
        || title.ends_with("PowerPoint")
        || title.ends_with("Outlook")
        || title.ends_with("OneNote")
        || title.contains("Microsoft Word")
        || title.contains("Microsoft Excel");
    if !is_office {
        return false;
    }

    out.category = AppCategory::Productivity;
    if let Some((document, _)) = title.split_once(" - ") {
        let document = document.trim();
        out.flags.has_unsaved_changes = document.contains('*');
        out.ide = Some(IdeContext {
            file_path: document.trim_end_matches('*').trim().to_string(),
            ..Default::default()
        });
    }
    true
}

/// Terminals, including Git Bash with its embedded working directory.
fn parse_terminal(title: &str, out: &mut ContextSnapshot) -> bool {
    const TERMINAL_MARKERS: &[&str] = &[
        "PowerShell",
        "cmd.exe",
        "Command Prompt",
        "Windows Terminal",
        "MINGW",
        "Git Bash",
        "Bash",
        "Terminal",
    ];
    if !TERMINAL_MARKERS.iter().any(|marker| title.contains(marker)) {
        return false;
    }

    out.category = AppCategory::Terminal;

    // Git Bash exposes the working directory: "MINGW64:/c/Users/dev/project"
    if title.contains("MINGW64:") || title.contains("MINGW32:") {
        if let Some((_, path)) = title.split_once(':') {
            out.ide = Some(IdeContext {
                file_path: path.trim().to_string(),
                ..Default::default()
            });
        }
    }
    true
}

/// Browsers: site tables decide the category, search queries are extracted.
fn parse_browser(title: &str, out: &mut ContextSnapshot) -> bool {
    let is_browser = title.ends_with("Google Chrome")
        || title.ends_with("Chrome")
        || title.ends_with("Microsoft Edge")
        || title.ends_with("Edge")
        || title.ends_with("Mozilla Firefox")
        || title.ends_with("Firefox");
    if !is_browser {
        return false;
    }

    // Neutral until a known site tips the balance.
    out.category = AppCategory::Browser;
    let mut browser = BrowserContext::default();

    for site in PRODUCTIVE_SITES {
        if title.contains(site) {
            out.category = AppCategory::Documentation;
            browser.domain = (*site).to_string();
            break;
        }
    }
    for (site, category) in DISTRACTING_SITES {
        if title.contains(site) {
            out.category = *category;
            browser.domain = (*site).to_string();
            break;
        }
    }

    // "query - Google Search - Google Chrome"
    if title.contains("- Google Search") || title.contains("- Bing") || title.contains("- DuckDuckGo")
    {
        if let Some((query, _)) = title.split_once(" - ") {
            browser.last_search_query = Some(query.trim().to_string());
        }
        // Searching counts as reference work.
        out.category = AppCategory::Documentation;
    }

    out.browser = Some(browser);
    true
}
