//! Error types for the valet-engine crate.

use thiserror::Error;

/// Alias for `Result<T, EngineError>`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort a turn.
///
/// Most failure modes do not end up here: classification ambiguity and
/// extraction failures resolve via their documented fallbacks, and remote
/// capability failures cascade to the local provider.  What remains is
/// malformed explicit commands (rejected turns), transport failure of the
/// chat collaborator, and exhaustion of every provider in a dispatch chain.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A core-layer failure, notably command validation.
    #[error(transparent)]
    Core(#[from] valet_core::CoreError),

    /// The chat collaborator is unreachable — the one failure without a
    /// fallback, since no intent can be determined without it.
    #[error(transparent)]
    Llm(#[from] valet_llm::LlmError),

    /// A provider failed outside any fallback chain (e.g. the calendar).
    #[error(transparent)]
    Provider(#[from] valet_providers::ProviderError),

    /// Every attempt in a dispatch chain failed.
    #[error("all providers failed: {notes}")]
    AllAttemptsFailed { notes: String },
}

impl EngineError {
    /// Whether this error is a rejected turn (user-correctable input).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(valet_core::CoreError::Validation { .. }))
    }
}
