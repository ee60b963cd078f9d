//! Ordered provider attempts with a uniform outcome type.
//!
//! Cascading try/fallback chains (remote, retry, local) are modeled as an
//! explicit list of attempts consumed by one combinator: run in order, stop
//! at the first success.  A retryable failure records a note and moves on
//! to the next attempt; a fatal failure aborts the chain.  The notes from
//! failed attempts let the caller annotate a degraded reply.

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// The uniform result of one provider attempt.
pub enum AttemptOutcome<T> {
    /// The attempt produced a value; the chain stops here.
    Success(T),
    /// The attempt failed but the next provider should be tried.  The note
    /// feeds the degradation annotation on the final reply.
    Retryable(String),
    /// The attempt failed in a way no later provider can fix.
    Fatal(EngineError),
}

/// One provider attempt in a dispatch chain.
pub struct Attempt<T> {
    /// Short provider label for log lines.
    pub label: &'static str,
    run: Box<dyn FnOnce() -> BoxFuture<'static, AttemptOutcome<T>> + Send>,
}

impl<T> Attempt<T> {
    /// Wrap a closure producing the attempt's future.
    pub fn new(
        label: &'static str,
        run: impl FnOnce() -> BoxFuture<'static, AttemptOutcome<T>> + Send + 'static,
    ) -> Self {
        Self {
            label,
            run: Box::new(run),
        }
    }
}

/// The value produced by a successful chain, plus the notes collected from
/// the attempts that failed before it.
pub struct Attempted<T> {
    /// The successful attempt's value.
    pub value: T,
    /// One note per failed attempt, in order.  Non-empty means the value
    /// came from a fallback provider.
    pub notes: Vec<String>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Attempted<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attempted")
            .field("value", &self.value)
            .field("notes", &self.notes)
            .finish()
    }
}

/// Run attempts in order, stopping at the first success.
///
/// Returns [`EngineError::AllAttemptsFailed`] when the chain is exhausted
/// and propagates the first fatal failure immediately.
pub async fn run_attempts<T>(attempts: Vec<Attempt<T>>) -> EngineResult<Attempted<T>> {
    let mut notes = Vec::new();

    for attempt in attempts {
        debug!(provider = attempt.label, "attempting dispatch");
        match (attempt.run)().await {
            AttemptOutcome::Success(value) => {
                return Ok(Attempted { value, notes });
            }
            AttemptOutcome::Retryable(note) => {
                warn!(provider = attempt.label, note = %note, "attempt failed, trying next provider");
                notes.push(note);
            }
            AttemptOutcome::Fatal(err) => {
                return Err(err);
            }
        }
    }

    Err(EngineError::AllAttemptsFailed {
        notes: notes.join("; "),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
