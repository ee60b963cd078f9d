//! LLM-backed intent classification.
//!
//! Sends a fixed one-word-answer instruction plus the utterance to the chat
//! collaborator and collapses the reply to a closed [`Intent`].  Malformed
//! model output is never an error here; only transport failure of the
//! underlying call propagates.

use std::sync::Arc;

use tracing::debug;

use valet_core::{Intent, Utterance};

use crate::client::ChatCompletion;
use crate::error::LlmResult;
use crate::types::Message;

/// System instruction for intent classification.
///
/// Reproduced verbatim in tests; the one-word reply contract is what makes
/// the normalization in [`Intent::from_label`] safe.
const CLASSIFY_PROMPT: &str = "\
You are an intent classifier for a personal assistant.
Given a single user message, decide if the primary intent is:
- TODO: creating or updating a personal todo/reminder/task.
- EVENT: scheduling or modifying a calendar event/meeting.
- QA: asking a question or chatting (no tool call).
Reply with exactly one word: TODO, EVENT, or QA.";

/// Classifies utterances into the closed intent set.
pub struct IntentClassifier {
    chat: Arc<dyn ChatCompletion>,
}

impl IntentClassifier {
    /// Create a classifier backed by the given chat collaborator.
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    /// Classify an utterance.
    ///
    /// Total over model output: any reply outside the closed set — empty,
    /// verbose, or otherwise malformed — resolves to [`Intent::Question`].
    /// Errors only on transport failure of the chat call.
    pub async fn classify(&self, utterance: &Utterance) -> LlmResult<Intent> {
        let messages = [
            Message::system(CLASSIFY_PROMPT),
            Message::user(utterance.trimmed()),
        ];

        let raw = self.chat.complete(&messages).await?;
        let intent = Intent::from_label(&raw);
        debug!(reply = %raw.trim(), %intent, "utterance classified");
        Ok(intent)
    }
}
