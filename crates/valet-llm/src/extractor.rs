//! LLM-backed slot extraction for the task and event intents.
//!
//! Each entry point issues one chat call whose system instruction demands a
//! single JSON object, decodes it best-effort, and falls back to a
//! documented default when the model's output is unusable.  The fallbacks
//! guarantee a slots object always comes back: the user is never blocked by
//! a bad extraction, only by transport failure of the chat call itself.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use valet_core::{EventSlots, TaskSlots, Utterance, parse_datetime};

use crate::client::ChatCompletion;
use crate::decode::{decode_object, string_field};
use crate::error::LlmResult;
use crate::types::Message;

/// System instruction for task extraction.
///
/// The contextual-time rule lives in the prompt, not in code: a flight time
/// belongs to the task's subject matter and stays in `text`; only an
/// explicit deadline phrase maps to `due`.
const TASK_PROMPT: &str = "\
You extract todo information from natural language.
Given one user message, output ONLY a JSON object with keys:
{ \"text\": string, \"due\": string | null }.
- 'due' should be an ISO 8601 datetime (e.g. 2025-11-15T09:00:00) or null.
- Only an explicit deadline maps to 'due'. Times that are part of the task \
itself (a flight time, a meeting being prepared for) stay in 'text'.
- Today is {today}. Interpret relative dates like 'today', 'tomorrow', or \
weekdays relative to this date.
Do not include any explanation text, only the JSON.";

/// System instruction for event extraction.
const EVENT_PROMPT: &str = "\
You extract calendar event details from natural language.
Given one user message, output ONLY a JSON object with keys:
{ \"title\": string, \"start\": string, \"end\": string }.
- 'start' and 'end' must be full ISO 8601 datetimes (e.g. 2025-11-15T09:00:00).
- Today is {today}. Interpret relative dates like 'today', 'tomorrow', or \
weekdays relative to this date.
- Assume the user means their local timezone; do not add a timezone suffix.
- If the user does not specify an end time, set 'end' to exactly 1 hour \
after 'start'.
Do not include any explanation text, only the JSON.";

/// Extracts structured slots from natural-language utterances.
pub struct SlotExtractor {
    chat: Arc<dyn ChatCompletion>,
}

impl SlotExtractor {
    /// Create an extractor backed by the given chat collaborator.
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    /// Extract task slots.
    ///
    /// Fallback on any unusable model output: the raw utterance becomes the
    /// task text with no due date.  `now` anchors relative-date resolution
    /// so retries within the same turn stay consistent.
    pub async fn extract_task(
        &self,
        utterance: &Utterance,
        now: NaiveDateTime,
    ) -> LlmResult<TaskSlots> {
        let raw = self.ask(TASK_PROMPT, utterance, now).await?;

        let slots = match decode_object(&raw) {
            Some(obj) => {
                let text = string_field(&obj, "text")
                    .unwrap_or_else(|| utterance.trimmed().to_string());
                // An unparseable due date degrades to "no due date" rather
                // than poisoning the whole extraction.
                let due = string_field(&obj, "due").and_then(|d| parse_datetime(&d).ok());
                TaskSlots::new(text, due)
            }
            None => {
                warn!(reply = %raw.trim(), "task extraction unusable, using raw text");
                TaskSlots::new(utterance.trimmed(), None)
            }
        };

        debug!(text = %slots.text, due = ?slots.due, "task slots extracted");
        Ok(slots)
    }

    /// Extract event slots.
    ///
    /// Fallback on any unusable model output: the raw utterance becomes the
    /// title and the event is scheduled for `now + 1 day`, one hour long —
    /// an event is always schedulable even under total extraction failure.
    /// A reversed range coming out of extraction is auto-corrected to one
    /// hour after the start.
    pub async fn extract_event(
        &self,
        utterance: &Utterance,
        now: NaiveDateTime,
    ) -> LlmResult<EventSlots> {
        let raw = self.ask(EVENT_PROMPT, utterance, now).await?;

        let slots = match decode_event(&raw) {
            Some(slots) => slots,
            None => {
                warn!(reply = %raw.trim(), "event extraction unusable, scheduling for tomorrow");
                let start = now + Duration::days(1);
                EventSlots::with_default_end(utterance.trimmed(), start, None)
            }
        };

        let slots = if slots.range_is_valid() {
            slots
        } else {
            warn!(start = %slots.start, end = %slots.end, "reversed range from extraction, correcting end");
            EventSlots::with_default_end(slots.title, slots.start, None)
        };

        debug!(title = %slots.title, start = %slots.start, end = %slots.end, "event slots extracted");
        Ok(slots)
    }

    /// Issue one extraction call with the date anchor substituted in.
    async fn ask(
        &self,
        prompt: &str,
        utterance: &Utterance,
        now: NaiveDateTime,
    ) -> LlmResult<String> {
        let system = prompt.replace("{today}", &now.date().to_string());
        let messages = [Message::system(system), Message::user(utterance.trimmed())];
        self.chat.complete(&messages).await
    }
}

/// Decode an event object from raw model text, `None` when any required
/// piece is missing or malformed.
fn decode_event(raw: &str) -> Option<EventSlots> {
    let obj = decode_object(raw)?;
    let title = string_field(&obj, "title")?;
    let start = parse_datetime(&string_field(&obj, "start")?).ok()?;
    let end = string_field(&obj, "end").and_then(|e| parse_datetime(&e).ok());
    Some(EventSlots::with_default_end(title, start, end))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::error::LlmError;

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 14)
            .unwrap()
            .and_hms_opt(17, 30, 0)
            .unwrap()
    }

    struct FixedChat(&'static str);

    #[async_trait]
    impl ChatCompletion for FixedChat {
        async fn complete(&self, _messages: &[Message]) -> LlmResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingChat;

    #[async_trait]
    impl ChatCompletion for FailingChat {
        async fn complete(&self, _messages: &[Message]) -> LlmResult<String> {
            Err(LlmError::RequestFailed {
                reason: "connection refused".into(),
            })
        }
    }

    fn extractor(reply: &'static str) -> SlotExtractor {
        SlotExtractor::new(Arc::new(FixedChat(reply)))
    }

    #[tokio::test]
    async fn task_extraction_happy_path() {
        let slots = extractor(r#"{"text": "Pay rent", "due": "2025-11-15T09:00:00"}"#)
            .extract_task(&Utterance::new("pay rent tomorrow morning"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.text, "Pay rent");
        assert_eq!(slots.due.unwrap().to_string(), "2025-11-15 09:00:00");
    }

    #[tokio::test]
    async fn task_extraction_null_due() {
        let slots = extractor(r#"{"text": "Buy milk", "due": null}"#)
            .extract_task(&Utterance::new("buy milk"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.text, "Buy milk");
        assert!(slots.due.is_none());
    }

    #[tokio::test]
    async fn task_extraction_non_json_falls_back_to_raw_text() {
        let slots = extractor("I couldn't find a task in that.")
            .extract_task(&Utterance::new("  remind me about the thing  "), anchor())
            .await
            .unwrap();
        assert_eq!(slots.text, "remind me about the thing");
        assert!(slots.due.is_none());
    }

    #[tokio::test]
    async fn task_extraction_bad_due_is_dropped() {
        let slots = extractor(r#"{"text": "Pay rent", "due": "whenever"}"#)
            .extract_task(&Utterance::new("pay rent"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.text, "Pay rent");
        assert!(slots.due.is_none());
    }

    #[tokio::test]
    async fn task_extraction_empty_reply_never_errors() {
        let slots = extractor("")
            .extract_task(&Utterance::new("do the thing"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.text, "do the thing");
    }

    #[tokio::test]
    async fn event_extraction_happy_path() {
        let reply = r#"{"title": "Coffee", "start": "2025-11-15T09:00:00", "end": "2025-11-15T10:00:00"}"#;
        let slots = extractor(reply)
            .extract_event(&Utterance::new("coffee at 9 tomorrow"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.title, "Coffee");
        assert_eq!(slots.start.to_string(), "2025-11-15 09:00:00");
        assert_eq!(slots.end.to_string(), "2025-11-15 10:00:00");
    }

    #[tokio::test]
    async fn event_extraction_missing_end_defaults_to_one_hour() {
        let reply = r#"{"title": "Standup", "start": "2025-11-15T09:00:00"}"#;
        let slots = extractor(reply)
            .extract_event(&Utterance::new("standup at 9"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.end.to_string(), "2025-11-15 10:00:00");
    }

    #[tokio::test]
    async fn event_extraction_malformed_json_schedules_tomorrow() {
        let slots = extractor("{title: Coffee, when: soonish")
            .extract_event(&Utterance::new("coffee with john"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.title, "coffee with john");
        // Tomorrow, same time, one hour long.
        assert_eq!(slots.start.to_string(), "2025-11-15 17:30:00");
        assert_eq!(slots.end.to_string(), "2025-11-15 18:30:00");
    }

    #[tokio::test]
    async fn event_extraction_reversed_range_is_corrected() {
        let reply = r#"{"title": "Backwards", "start": "2025-11-15T10:00:00", "end": "2025-11-15T09:00:00"}"#;
        let slots = extractor(reply)
            .extract_event(&Utterance::new("backwards meeting"), anchor())
            .await
            .unwrap();
        assert_eq!(slots.start.to_string(), "2025-11-15 10:00:00");
        assert_eq!(slots.end.to_string(), "2025-11-15 11:00:00");
    }

    #[tokio::test]
    async fn transport_failure_propagates() {
        let extractor = SlotExtractor::new(Arc::new(FailingChat));
        let err = extractor
            .extract_task(&Utterance::new("buy milk"), anchor())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RequestFailed { .. }));
    }
}
