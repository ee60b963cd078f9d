//! Human-facing reply formatting.
//!
//! Confirmation strings for created todos and events, including the
//! friendly datetime range ("tomorrow, 9am–10am") used in event replies.
//! Everything takes an explicit `now` anchor so the wording is testable.

use chrono::{Duration, NaiveDateTime};

use valet_core::EventSlots;
use valet_store::Todo;

/// Confirmation for a locally stored todo.
pub fn todo_reply(todo: &Todo) -> String {
    let due = match todo.due {
        Some(d) => d.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => "no due date".to_string(),
    };
    format!("Created todo '{}' (due: {}).", todo.text, due)
}

/// Confirmation for a task saved to the remote workspace.
pub fn workspace_task_reply(text: &str, url: Option<&str>) -> String {
    match url {
        Some(url) => format!("Saved '{text}' to your workspace.\nView it at: {url}"),
        None => format!("Saved '{text}' to your workspace."),
    }
}

/// Confirmation for a created calendar event.
pub fn event_reply(slots: &EventSlots, link: Option<&str>, now: NaiveDateTime) -> String {
    let human = human_range(slots.start, slots.end, now);
    match link {
        Some(link) => format!(
            "Created calendar event '{}' for {human}.\nGo to calendar event: {link}",
            slots.title
        ),
        None => format!("Created calendar event '{}' for {human}.", slots.title),
    }
}

/// Append the degradation annotation to a fallback reply.
///
/// Users must never be misled about where their data landed: when the
/// workspace was tried and failed, the reply says so explicitly.
pub fn annotate_degraded(reply: &str) -> String {
    format!(
        "{reply}\nNote: the workspace provider was unavailable, so this was \
         saved to your local task list instead."
    )
}

/// A friendly description of a datetime range, e.g. "tomorrow, 11pm–12am"
/// or "Nov 15, 9am–10:30am".
pub fn human_range(start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> String {
    let today = now.date();
    let tomorrow = today + Duration::days(1);

    let date_label = if start.date() == today {
        "today".to_string()
    } else if start.date() == tomorrow {
        "tomorrow".to_string()
    } else {
        format!("{} {}", start.format("%b"), start.date().format("%-d"))
    };

    format!("{date_label}, {}–{}", clock_label(start), clock_label(end))
}

/// Render a time as "3pm" or "11:30pm".
fn clock_label(dt: NaiveDateTime) -> String {
    use chrono::Timelike;

    let hour24 = dt.hour();
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    let ampm = if hour24 < 12 { "am" } else { "pm" };

    if dt.minute() == 0 {
        format!("{hour12}{ampm}")
    } else {
        format!("{hour12}:{:02}{ampm}", dt.minute())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
