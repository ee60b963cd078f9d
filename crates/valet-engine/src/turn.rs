//! The turn orchestrator.
//!
//! One utterance in, one [`DispatchResult`] out.  The flow per turn:
//!
//! ```text
//! START ── grammar match ──────────────────────────┐
//!   │ no match                                     │
//! CLASSIFY ──► TASK_PATH / EVENT_PATH / QA_PATH ──►│
//!                                                  ▼
//!                                              DISPATCH ──► LOGGED ──► DONE
//! ```
//!
//! The explicit command grammar is tried first and skips classification and
//! extraction entirely.  Task dispatch resolves the dynamically discovered
//! workspace tool set on every turn and cascades to the local provider when
//! the remote fails; event dispatch always goes to the built-in calendar;
//! the question path delegates to the retrieval answerer.  Each turn is
//! independent — the orchestrator carries no state across turns.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use valet_core::{
    Command, DispatchResult, EventSlots, Intent, TaskSlots, Utterance, parse_command,
};
use valet_llm::{ChatCompletion, IntentClassifier, SlotExtractor};
use valet_providers::{
    CALENDAR_TOOL, Calendar, CapabilityProvider, LOCAL_TASK_TOOL, LocalTaskProvider,
    ProviderError, QuestionAnswerer, ToolDescriptor, resolve_create_tool, strip_field,
};

use crate::attempt::{Attempt, AttemptOutcome, run_attempts};
use crate::error::EngineResult;
use crate::logger::TurnLogger;
use crate::reply;

/// Processes one utterance per call, fresh state each time.
pub struct TurnEngine {
    classifier: IntentClassifier,
    extractor: SlotExtractor,
    workspace: Option<Arc<dyn CapabilityProvider>>,
    local_tasks: LocalTaskProvider,
    calendar: Arc<dyn Calendar>,
    answerer: Arc<dyn QuestionAnswerer>,
    logger: TurnLogger,
}

impl TurnEngine {
    /// Assemble the engine from its collaborators.
    ///
    /// `workspace` is `None` when no remote provider is configured; task
    /// dispatch then uses the local provider directly.
    pub fn new(
        chat: Arc<dyn ChatCompletion>,
        workspace: Option<Arc<dyn CapabilityProvider>>,
        local_tasks: LocalTaskProvider,
        calendar: Arc<dyn Calendar>,
        answerer: Arc<dyn QuestionAnswerer>,
        logger: TurnLogger,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(Arc::clone(&chat)),
            extractor: SlotExtractor::new(chat),
            workspace,
            local_tasks,
            calendar,
            answerer,
            logger,
        }
    }

    /// Process one turn: route, dispatch, log, reply.
    ///
    /// Validation failures of explicit commands reject the turn and produce
    /// no dispatch result (and therefore no turn record).  Logging failure
    /// never affects the returned result.
    pub async fn handle(&self, message: &str) -> EngineResult<DispatchResult> {
        let utterance = Utterance::new(message);
        let now = Utc::now().naive_utc();

        let result = self.route(&utterance, now).await?;
        self.logger.record(&utterance, &result).await;

        Ok(result)
    }

    /// Route the utterance down the grammar fast path or through
    /// classification, then dispatch.
    async fn route(&self, utterance: &Utterance, now: NaiveDateTime) -> EngineResult<DispatchResult> {
        if let Some(parsed) = parse_command(utterance) {
            // Grammar matched: classification and extraction are skipped.
            return match parsed? {
                Command::CreateTask(slots) => {
                    debug!("explicit todo command");
                    self.dispatch_task(slots).await
                }
                Command::CreateEvent(slots) => {
                    debug!("explicit event command");
                    self.dispatch_event(slots, now).await
                }
            };
        }

        let intent = self.classifier.classify(utterance).await?;
        info!(%intent, "utterance classified");

        match intent {
            Intent::Task => {
                let slots = self.extractor.extract_task(utterance, now).await?;
                self.dispatch_task(slots).await
            }
            Intent::Event => {
                let slots = self.extractor.extract_event(utterance, now).await?;
                self.dispatch_event(slots, now).await
            }
            Intent::Question => {
                let answer = self.answerer.answer(utterance.trimmed()).await?;
                Ok(DispatchResult {
                    reply: answer.reply,
                    tools_used: Vec::new(),
                    retrieved_ids: answer.doc_ids,
                })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Task dispatch
    // -----------------------------------------------------------------------

    /// Dispatch task slots: remote workspace first when one resolves, local
    /// store as the cascading fallback.
    async fn dispatch_task(&self, slots: TaskSlots) -> EngineResult<DispatchResult> {
        match self.resolve_remote().await {
            Some((provider, tool)) => {
                let remote_attempt = {
                    let provider = Arc::clone(&provider);
                    let tool = tool.clone();
                    let slots = slots.clone();
                    Attempt::new("workspace", move || {
                        Box::pin(async move { invoke_remote(provider, tool, slots).await })
                    })
                };

                let local_attempt = {
                    let local = self.local_tasks.clone();
                    let slots = slots.clone();
                    Attempt::new("local task list", move || {
                        Box::pin(async move {
                            match local.create(&slots).await {
                                Ok(todo) => AttemptOutcome::Success(DispatchResult::with_tools(
                                    reply::todo_reply(&todo),
                                    vec![LOCAL_TASK_TOOL.to_string()],
                                )),
                                Err(e) => AttemptOutcome::Fatal(e.into()),
                            }
                        })
                    })
                };

                let attempted = run_attempts(vec![remote_attempt, local_attempt]).await?;
                let mut result = attempted.value;
                if !attempted.notes.is_empty() {
                    // The value came from a fallback provider; say so.
                    result.reply = reply::annotate_degraded(&result.reply);
                }
                Ok(result)
            }
            None => {
                // No remote attempt was made, so no degradation annotation.
                let todo = self.local_tasks.create(&slots).await?;
                Ok(DispatchResult::with_tools(
                    reply::todo_reply(&todo),
                    vec![LOCAL_TASK_TOOL.to_string()],
                ))
            }
        }
    }

    /// Discover the workspace tool set for this turn and resolve the
    /// creation capability.
    ///
    /// The discovered set is per-invocation by contract: the remote side's
    /// operations can change between calls, so nothing is cached here.
    async fn resolve_remote(&self) -> Option<(Arc<dyn CapabilityProvider>, ToolDescriptor)> {
        let provider = self.workspace.as_ref()?;

        let tools = match provider.discover().await {
            Ok(tools) => tools,
            Err(e) => {
                // Nothing was discovered, so no remote attempt happens and
                // the local provider takes over silently.
                warn!(error = %e, "workspace discovery failed, using local provider");
                return None;
            }
        };

        match resolve_create_tool(&tools) {
            Some(resolution) => {
                info!(tool = %resolution.tool.name, rule = resolution.rule, "workspace capability resolved");
                Some((Arc::clone(provider), resolution.tool.clone()))
            }
            None => {
                debug!(count = tools.len(), "no workspace capability matched");
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Dispatch event slots to the built-in calendar provider.  No remote
    /// alternative exists for events.
    async fn dispatch_event(
        &self,
        slots: EventSlots,
        now: NaiveDateTime,
    ) -> EngineResult<DispatchResult> {
        let event = self.calendar.create_event(&slots, None).await?;
        info!(title = %slots.title, uid = %event.uid, "event dispatched");

        Ok(DispatchResult::with_tools(
            reply::event_reply(&slots, event.link.as_deref(), now),
            vec![CALENDAR_TOOL.to_string()],
        ))
    }
}

// ---------------------------------------------------------------------------
// Remote invocation with the one-shot field-omission retry
// ---------------------------------------------------------------------------

/// Invoke the resolved workspace capability.
///
/// When the provider rejects one named payload field, retry exactly once
/// with that field stripped.  A second failure, or any other failure, is
/// retryable — the chain falls back to the local provider.  There is never
/// a third remote call.
async fn invoke_remote(
    provider: Arc<dyn CapabilityProvider>,
    tool: ToolDescriptor,
    slots: TaskSlots,
) -> AttemptOutcome<DispatchResult> {
    let payload = provider.task_payload(&slots);

    let first = provider.invoke(&tool.name, payload.clone()).await;
    match first {
        Ok(result) => AttemptOutcome::Success(remote_success(&tool, &slots, &result)),
        Err(ProviderError::UnknownField { field }) => {
            warn!(tool = %tool.name, field = %field, "provider rejected field, retrying without it");

            let mut stripped = payload;
            strip_field(&mut stripped, &field);

            match provider.invoke(&tool.name, stripped).await {
                Ok(result) => AttemptOutcome::Success(remote_success(&tool, &slots, &result)),
                Err(e) => AttemptOutcome::Retryable(format!(
                    "workspace rejected the task even without `{field}`: {e}"
                )),
            }
        }
        Err(e) => AttemptOutcome::Retryable(format!("workspace invocation failed: {e}")),
    }
}

/// Build the dispatch result for a successful remote invocation.
fn remote_success(tool: &ToolDescriptor, slots: &TaskSlots, result: &Value) -> DispatchResult {
    let url = find_url(result);
    DispatchResult::with_tools(
        reply::workspace_task_reply(&slots.text, url.as_deref()),
        vec![tool.name.clone()],
    )
}

/// Depth-first search for a `url` string anywhere in the success envelope.
fn find_url(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(url) = map.get("url").and_then(Value::as_str) {
                return Some(url.to_string());
            }
            map.values().find_map(find_url)
        }
        Value::Array(items) => items.iter().find_map(find_url),
        _ => None,
    }
}
