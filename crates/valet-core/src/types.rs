//! Core domain types for turn processing.
//!
//! These types model the data flowing through a single turn: the incoming
//! utterance, the classified intent, the structured slots an intent needs to
//! execute, and the final dispatch result returned to the caller.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// A single incoming user utterance.
///
/// Holds the raw input string plus a normalized (trimmed, lowercased) view
/// that is used only for command-prefix matching.  Neither view is mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct Utterance {
    raw: String,
    normalized: String,
}

impl Utterance {
    /// Wrap a raw input string, deriving the normalized view.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = raw.trim().to_lowercase();
        Self { raw, normalized }
    }

    /// The original input, untouched.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The raw input with surrounding whitespace removed, original casing
    /// preserved.  Command bodies are sliced out of this view.
    pub fn trimmed(&self) -> &str {
        self.raw.trim()
    }

    /// The trimmed, lowercased view used for prefix matching.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

// ---------------------------------------------------------------------------
// Intent
// ---------------------------------------------------------------------------

/// The closed classification of an utterance's purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Create a personal task/reminder.
    Task,
    /// Schedule a calendar event.
    Event,
    /// Ask a question (no tool call).
    Question,
}

impl Intent {
    /// Collapse a raw classifier reply to an intent.
    ///
    /// Normalization: uppercase the reply and take the first
    /// whitespace-delimited token.  Any token outside {TODO, EVENT, QA} —
    /// including an empty reply — maps to [`Intent::Question`], the safe
    /// default.  This is total over model output; it never fails.
    pub fn from_label(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.split_whitespace().next().unwrap_or("") {
            "TODO" => Self::Task,
            "EVENT" => Self::Event,
            _ => Self::Question,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Event => write!(f, "event"),
            Self::Question => write!(f, "question"),
        }
    }
}

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Structured fields for the task-creation intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSlots {
    /// What the task is about.  Contextual times that belong to the subject
    /// matter (a flight time, a meeting start) stay in here; only an explicit
    /// deadline maps to `due`.
    pub text: String,
    /// Optional deadline.
    pub due: Option<NaiveDateTime>,
}

impl TaskSlots {
    /// Construct task slots.  `text` must be non-empty after trimming.
    pub fn new(text: impl Into<String>, due: Option<NaiveDateTime>) -> Self {
        Self {
            text: text.into(),
            due,
        }
    }
}

/// Structured fields for the event-creation intent.
///
/// Invariant: `end > start`.  Use [`EventSlots::with_default_end`] when the
/// producing path supplies no end time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSlots {
    /// Short event title.
    pub title: String,
    /// Event start.
    pub start: NaiveDateTime,
    /// Event end, strictly after `start`.
    pub end: NaiveDateTime,
}

impl EventSlots {
    /// Construct event slots from explicit start and end.
    pub fn new(title: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            title: title.into(),
            start,
            end,
        }
    }

    /// Construct event slots, defaulting the end to one hour after the start
    /// when none is supplied.
    pub fn with_default_end(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Self {
        let end = end.unwrap_or(start + Duration::hours(1));
        Self {
            title: title.into(),
            start,
            end,
        }
    }

    /// Whether the range satisfies the `end > start` invariant.
    pub fn range_is_valid(&self) -> bool {
        self.end > self.start
    }
}

// ---------------------------------------------------------------------------
// Dispatch result
// ---------------------------------------------------------------------------

/// The outcome of one complete turn, produced exactly once per utterance.
///
/// Degraded replies (a fallback provider was used) are valid results, not
/// errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    /// The final reply text shown to the user.
    pub reply: String,
    /// Names of the capabilities/tools invoked, in invocation order.
    pub tools_used: Vec<String>,
    /// Identifiers of documents retrieved to support the reply, in rank order.
    pub retrieved_ids: Vec<String>,
}

impl DispatchResult {
    /// A result produced by invoking the named tools.
    pub fn with_tools(reply: impl Into<String>, tools_used: Vec<String>) -> Self {
        Self {
            reply: reply.into(),
            tools_used,
            retrieved_ids: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
