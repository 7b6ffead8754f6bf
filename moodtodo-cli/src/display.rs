//! Task display formatting module
//!
//! Handles colored output and different view modes for tasks

use chrono::{Duration, Local, Utc};
use colored::*;

use moodtodo_core::date::{format_deadline_human, format_timestamp};
use moodtodo_core::{Bucket, Mood, Task};

/// Display mode for task list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMode {
    /// Minimal one-line format
    Compact,
    /// Full info with formatted dates
    Detailed,
    /// Balanced view with clear status indicators (default)
    Default,
}

/// Check if terminal supports colors
pub fn supports_color() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn mood_glyph(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "😊",
        Mood::Stressful => "😰",
        Mood::Creative => "✨",
        Mood::Boring => "😴",
        Mood::Urgent => "🔥",
    }
}

fn checkbox(task: &Task) -> &'static str {
    match task.bucket() {
        Bucket::Active => "[ ]",
        Bucket::Later => "[~]",
        Bucket::Done => "[✓]",
    }
}

fn deadline_str(task: &Task, mode: DisplayMode, use_color: bool) -> String {
    let Some(deadline) = task.finish_before else {
        return String::new();
    };

    let now = Utc::now();
    let text = match mode {
        DisplayMode::Compact => format!("(before {})", format_timestamp(deadline)),
        _ => format!("(before {})", format_deadline_human(deadline, Local::now())),
    };

    if !use_color {
        return text;
    }

    if task.done {
        text.green().to_string()
    } else if task.is_overdue(now) {
        text.red().bold().to_string()
    } else if deadline - now <= Duration::days(1) {
        text.yellow().to_string()
    } else {
        text.normal().to_string()
    }
}

fn progress_str(task: &Task) -> String {
    let (checked, total) = task.checklist_progress();
    if total == 0 {
        String::new()
    } else {
        format!("[{}/{}]", checked, total)
    }
}

/// Format a task for display
pub fn format_task(task: &Task, mode: DisplayMode, use_color: bool) -> String {
    let title = if use_color && task.done {
        task.text.green().to_string()
    } else if use_color && task.do_later {
        task.text.dimmed().to_string()
    } else {
        task.text.clone()
    };

    let id_str = if use_color {
        task.id.short().cyan().to_string()
    } else {
        task.id.short()
    };

    let mood_str = task
        .mood
        .map(|m| format!(" {}", mood_glyph(m)))
        .unwrap_or_default();

    match mode {
        DisplayMode::Compact => {
            let mut line = format!("{} {} {}{}", checkbox(task), task.id.short(), title, mood_str);
            let deadline = deadline_str(task, mode, use_color);
            if !deadline.is_empty() {
                line.push(' ');
                line.push_str(&deadline);
            }
            line
        }
        DisplayMode::Detailed => format_task_detailed(task, use_color),
        DisplayMode::Default => {
            let extras: Vec<String> = [progress_str(task), deadline_str(task, mode, use_color)]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();

            if extras.is_empty() {
                format!("{} {} {}{}", checkbox(task), id_str, title, mood_str)
            } else {
                format!(
                    "{} {} {}{} {}",
                    checkbox(task),
                    id_str,
                    title,
                    mood_str,
                    extras.join(" ")
                )
            }
        }
    }
}

/// Multi-line view with every field
pub fn format_task_detailed(task: &Task, use_color: bool) -> String {
    let title = if use_color {
        task.text.bold().to_string()
    } else {
        task.text.clone()
    };

    let mut parts = vec![
        format!("{} [ID: {}]", checkbox(task), task.id),
        format!("Text: {}", title),
        format!("Status: {}", task.bucket().as_str()),
    ];

    match task.mood {
        Some(mood) => parts.push(format!("Mood: {} {}", mood_glyph(mood), mood)),
        None => parts.push("Mood: (none)".to_string()),
    }

    if !task.description.is_empty() {
        parts.push(format!("Description: {}", task.description));
    }

    if let Some(deadline) = task.finish_before {
        let human = format_deadline_human(deadline, Local::now());
        let human = if use_color && task.is_overdue(Utc::now()) {
            human.red().bold().to_string()
        } else {
            human
        };
        parts.push(format!(
            "Finish before: {} ({})",
            format_timestamp(deadline),
            human
        ));
    }

    if !task.checklist.is_empty() {
        parts.push(format!("Checklist {}:", progress_str(task)));
        for (n, item) in task.checklist.iter().enumerate() {
            let mark = if item.checked { "[x]" } else { "[ ]" };
            parts.push(format!("  {}. {} {}", n + 1, mark, item.text));
        }
    }

    parts.push(format!("Created: {}", format_timestamp(task.created_at)));
    parts.push(format!("Modified: {}", format_timestamp(task.last_modified)));
    if !task.history.is_empty() {
        parts.push(format!("Edits: {}", task.history.len()));
    }

    parts.join("\n  ")
}

/// Format a summary line for task list
pub fn format_summary(
    total: usize,
    active: usize,
    later: usize,
    done: usize,
    overdue: usize,
    use_color: bool,
) -> String {
    let paint = |text: String, color: Color| {
        if use_color {
            text.color(color).to_string()
        } else {
            text
        }
    };

    let parts = vec![
        format!("{} total", total),
        format!("{} active", active),
        paint(format!("{} later", later), Color::BrightBlack),
        paint(format!("{} done", done), Color::Green),
        if overdue > 0 {
            paint(format!("{} overdue", overdue), Color::Red)
        } else {
            String::new()
        },
    ];

    let summary: Vec<&str> = parts.iter().filter(|s| !s.is_empty()).map(|s| s.as_str()).collect();

    format!("[{}]", summary.join(" | "))
}
