//! Error types for the valet-providers crate.
//!
//! [`ProviderError::UnknownField`] is the variant the dispatch fallback
//! policy keys on: it means the remote provider rejected one named payload
//! field, which earns exactly one retry with that field omitted.  Every
//! other invocation failure goes straight to the next provider in the
//! chain.

use thiserror::Error;

/// Alias for `Result<T, ProviderError>`.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors surfaced by capability providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Enumerating the provider's tool set failed.
    #[error("capability discovery failed: {reason}")]
    Discovery { reason: String },

    /// The invoked tool does not exist on the provider.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// The provider rejected one named payload field.
    #[error("provider rejected field `{field}`")]
    UnknownField { field: String },

    /// A tool invocation failed for any other reason.
    #[error("invocation of `{tool}` failed: {reason}")]
    Invocation { tool: String, reason: String },

    /// Provider construction failed (bad URL, missing settings).
    #[error("provider config error: {reason}")]
    Config { reason: String },

    /// An outbound HTTP call failed (unreachable, timed out).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The local store failed.
    #[error("store error: {0}")]
    Store(#[from] valet_store::StoreError),

    /// The chat collaborator failed (retrieval answering path).
    #[error("llm error: {0}")]
    Llm(#[from] valet_llm::LlmError),
}
