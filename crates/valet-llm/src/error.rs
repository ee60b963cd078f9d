//! Error types for the valet-llm crate.

use thiserror::Error;

/// Alias for `Result<T, LlmError>`.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors surfaced by the chat-completion collaborator.
///
/// Transport-level failure is the one failure mode the turn pipeline cannot
/// recover from: no intent can be determined without the model.  Everything
/// downstream of a successful call (unparseable replies, missing keys) is
/// absorbed by the classifier and extractor fallbacks and never appears
/// here.
#[derive(Debug, Error)]
pub enum LlmError {
    /// An HTTP request to the chat provider failed (unreachable, non-2xx,
    /// or timed out).
    #[error("chat request failed: {reason}")]
    RequestFailed { reason: String },

    /// The provider's response envelope could not be parsed.
    #[error("chat response parse error: {reason}")]
    ParseFailed { reason: String },

    /// Client construction failed.
    #[error("chat client config error: {reason}")]
    Config { reason: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed {
            reason: err.to_string(),
        }
    }
}
