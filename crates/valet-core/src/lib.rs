//! # valet-core
//!
//! Core domain layer for Valet: the types a turn flows through, the
//! deterministic command grammar, flexible datetime parsing, and the
//! immutable application settings.
//!
//! This crate has no I/O.  Everything here is pure and synchronous; the
//! async collaborators (LLM, providers, storage) live in the sibling
//! crates and consume these types.

pub mod command;
pub mod config;
pub mod datetime;
pub mod error;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use command::{Command, parse_command};
pub use config::{
    CalendarSettings, LlmSettings, RetrievalSettings, Settings, WorkspaceSettings,
};
pub use datetime::parse_datetime;
pub use error::{CoreError, CoreResult};
pub use types::{DispatchResult, EventSlots, Intent, TaskSlots, Utterance};
