//! Turn logging.
//!
//! Persists one immutable record per completed turn.  Side effect only: a
//! failure to persist is reported through tracing and never alters or
//! hides the reply already computed.

use tracing::{debug, warn};

use valet_core::{DispatchResult, Utterance};
use valet_store::TurnStore;

/// Writes turn records after dispatch.
#[derive(Clone)]
pub struct TurnLogger {
    turns: TurnStore,
}

impl TurnLogger {
    /// Create a logger over the given turn store.
    pub fn new(turns: TurnStore) -> Self {
        Self { turns }
    }

    /// Record one completed turn.  Never fails the caller.
    pub async fn record(&self, utterance: &Utterance, result: &DispatchResult) {
        match self
            .turns
            .record(
                utterance.raw(),
                &result.reply,
                &result.tools_used,
                &result.retrieved_ids,
            )
            .await
        {
            Ok(()) => debug!("turn record persisted"),
            Err(e) => warn!(error = %e, "failed to persist turn record"),
        }
    }
}
