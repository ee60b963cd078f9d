//! # valet-engine
//!
//! The turn orchestrator: routes one utterance down the grammar fast path,
//! the classified task/event paths, or the retrieval-augmented question
//! path, dispatches to capability providers with cascading fallback, and
//! records every completed turn.
//!
//! The cascade is expressed as a flat, ordered list of provider attempts
//! with a uniform outcome type (see [`attempt`]) rather than nested
//! try/fallback handling, and the discovered remote capability set is
//! re-fetched on every turn.

pub mod attempt;
pub mod error;
pub mod logger;
pub mod reply;
pub mod turn;

// ── re-exports ───────────────────────────────────────────────────────

pub use attempt::{Attempt, AttemptOutcome, Attempted, run_attempts};
pub use error::{EngineError, EngineResult};
pub use logger::TurnLogger;
pub use turn::TurnEngine;
