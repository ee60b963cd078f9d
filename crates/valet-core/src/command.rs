//! Explicit command grammar — the deterministic fast path.
//!
//! Recognizes two literal prefixes on the normalized utterance, `todo:` and
//! `event:`, and splits their bodies into typed slots.  This parser never
//! calls a language model; it is a pure string transform and is the first
//! thing tried on every turn.
//!
//! Syntax:
//! - `todo: <text>` or `todo: <text> | <due>`
//! - `event: <title> | <start> | <end>`

use tracing::debug;

use crate::datetime::parse_datetime;
use crate::error::{CoreError, CoreResult};
use crate::types::{EventSlots, TaskSlots, Utterance};

/// The prefix that marks an explicit task command.
const TODO_PREFIX: &str = "todo:";

/// The prefix that marks an explicit event command.
const EVENT_PREFIX: &str = "event:";

/// A recognized explicit command with fully typed slots.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `todo: ...` — create a task.
    CreateTask(TaskSlots),
    /// `event: ...` — create a calendar event.
    CreateEvent(EventSlots),
}

/// Try to parse an explicit command out of the utterance.
///
/// Returns `None` when no command prefix is present (the caller should fall
/// through to intent classification), `Some(Err(_))` when a prefix matched
/// but the body is malformed (a rejected turn with a corrective message),
/// and `Some(Ok(_))` on success.
pub fn parse_command(utterance: &Utterance) -> Option<CoreResult<Command>> {
    let normalized = utterance.normalized();

    // Prefix detection happens on the normalized view; the body is sliced
    // out of the trimmed original so its casing survives.  The `get` guards
    // against exotic input whose lowercased form shifts byte offsets.
    if normalized.starts_with(TODO_PREFIX)
        && let Some(body) = utterance.trimmed().get(TODO_PREFIX.len()..)
    {
        let body = body.trim();
        debug!(body, "todo command matched");
        return Some(parse_todo_body(body).map(Command::CreateTask));
    }

    if normalized.starts_with(EVENT_PREFIX)
        && let Some(body) = utterance.trimmed().get(EVENT_PREFIX.len()..)
    {
        let body = body.trim();
        debug!(body, "event command matched");
        return Some(parse_event_body(body).map(Command::CreateEvent));
    }

    None
}

/// Parse `<text>[ | <due>]`, splitting on the first `|` only.
fn parse_todo_body(body: &str) -> CoreResult<TaskSlots> {
    let (text, due) = match body.split_once('|') {
        Some((text_part, due_part)) => {
            let due_part = due_part.trim();
            let due = if due_part.is_empty() {
                None
            } else {
                Some(parse_datetime(due_part)?)
            };
            (text_part.trim(), due)
        }
        None => (body, None),
    };

    if text.is_empty() {
        return Err(CoreError::validation(
            "Todo text must not be empty. Use: todo: Buy milk | 2025-11-15",
        ));
    }

    Ok(TaskSlots::new(text, due))
}

/// Parse `<title> | <start> | <end>`, splitting on all `|`.
fn parse_event_body(body: &str) -> CoreResult<EventSlots> {
    let parts: Vec<&str> = body.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(CoreError::validation(
            "Invalid event syntax. Use: event: Title | 2025-11-15 09:00 | 2025-11-15 10:00",
        ));
    }

    let title = parts[0];
    if title.is_empty() {
        return Err(CoreError::validation(
            "Event title must not be empty. Use: event: Title | 2025-11-15 09:00 | 2025-11-15 10:00",
        ));
    }

    let start = parse_datetime(parts[1])?;
    let end = parse_datetime(parts[2])?;

    let slots = EventSlots::new(title, start, end);
    // An explicit command with a reversed range is rejected outright; the
    // user typed both instants and can correct them.
    if !slots.range_is_valid() {
        return Err(CoreError::validation(format!(
            "Event end ({end}) must be after its start ({start})."
        )));
    }

    Ok(slots)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
