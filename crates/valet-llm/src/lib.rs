//! # valet-llm
//!
//! Language-model collaborators for Valet: the chat-completion client, the
//! intent classifier, and the slot extractor.
//!
//! The chat call itself is a black box behind the [`ChatCompletion`] trait
//! (text messages in, text out).  Everything layered on top is defensive
//! about model output: classification collapses unrecognized replies to the
//! question intent, and extraction falls back to documented defaults rather
//! than surfacing parse errors.  Only transport failure of the underlying
//! call escapes this crate.

pub mod classifier;
pub mod client;
pub mod decode;
pub mod error;
pub mod extractor;
pub mod types;

// ── re-exports ───────────────────────────────────────────────────────

pub use classifier::IntentClassifier;
pub use client::{ChatCompletion, HttpChatClient};
pub use decode::decode_object;
pub use error::{LlmError, LlmResult};
pub use extractor::SlotExtractor;
pub use types::{Message, Role};
