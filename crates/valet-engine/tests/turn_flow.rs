//! End-to-end turn flow tests with scripted collaborators.
//!
//! Every external seam (chat, workspace, calendar, retrieval) is an
//! in-process fake, so these tests pin down the routing and fallback
//! behavior of the orchestrator itself: grammar bypasses the classifier,
//! validation rejects the turn, the one-shot field-omission retry never
//! issues a third remote call, and degraded replies say where data landed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use valet_core::{EventSlots, TaskSlots};
use valet_engine::{EngineError, TurnEngine, TurnLogger};
use valet_llm::{ChatCompletion, LlmError, LlmResult, Message};
use valet_providers::{
    Calendar, CalendarEvent, CapabilityProvider, LocalTaskProvider, ProviderError,
    ProviderResult, QuestionAnswerer, RetrievedAnswer, ToolDescriptor,
};
use valet_store::{Database, TodoStore, TurnStore};

// ═══════════════════════════════════════════════════════════════════════
//  Scripted collaborators
// ═══════════════════════════════════════════════════════════════════════

/// Chat fake that pops scripted replies and counts calls.
struct ScriptedChat {
    replies: Mutex<VecDeque<&'static str>>,
    calls: Mutex<usize>,
}

impl ScriptedChat {
    fn new(replies: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            calls: Mutex::new(0),
        })
    }

    fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(&self, _messages: &[Message]) -> LlmResult<String> {
        *self.calls.lock().unwrap() += 1;
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => Ok(reply.to_string()),
            None => Err(LlmError::RequestFailed {
                reason: "scripted chat exhausted".into(),
            }),
        }
    }
}

/// Chat fake that is always unreachable.
struct DownChat;

#[async_trait]
impl ChatCompletion for DownChat {
    async fn complete(&self, _messages: &[Message]) -> LlmResult<String> {
        Err(LlmError::RequestFailed {
            reason: "connection refused".into(),
        })
    }
}

/// One scripted invocation outcome for the workspace fake.
enum ScriptedOutcome {
    Ok(Value),
    UnknownField(&'static str),
    Fail(&'static str),
}

/// Workspace fake with a fixed tool set and scripted invocation outcomes.
///
/// Panics on an invocation with no scripted outcome left — that is exactly
/// the forbidden "third call" the retry policy must never make.
struct ScriptedWorkspace {
    tools: Vec<ToolDescriptor>,
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
    invocations: Mutex<Vec<(String, Value)>>,
}

impl ScriptedWorkspace {
    fn new(tool_names: &[&str], outcomes: Vec<ScriptedOutcome>) -> Arc<Self> {
        Arc::new(Self {
            tools: tool_names
                .iter()
                .map(|n| ToolDescriptor::new(*n, ""))
                .collect(),
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            invocations: Mutex::new(Vec::new()),
        })
    }

    fn invocations(&self) -> Vec<(String, Value)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityProvider for ScriptedWorkspace {
    fn id(&self) -> &str {
        "workspace"
    }

    async fn discover(&self) -> ProviderResult<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }

    async fn invoke(&self, tool: &str, payload: Value) -> ProviderResult<Value> {
        self.invocations
            .lock()
            .unwrap()
            .push((tool.to_string(), payload));

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected extra workspace invocation");
        match outcome {
            ScriptedOutcome::Ok(v) => Ok(v),
            ScriptedOutcome::UnknownField(field) => Err(ProviderError::UnknownField {
                field: field.to_string(),
            }),
            ScriptedOutcome::Fail(reason) => Err(ProviderError::Invocation {
                tool: tool.to_string(),
                reason: reason.to_string(),
            }),
        }
    }

    fn task_payload(&self, slots: &TaskSlots) -> Value {
        let mut properties = json!({
            "Name": { "title": [ { "text": { "content": slots.text } } ] },
        });
        if let Some(due) = slots.due {
            properties["Due"] = json!({
                "date": { "start": due.format("%Y-%m-%dT%H:%M:%S").to_string() }
            });
        }
        json!({ "parent": { "database_id": "db-test" }, "properties": properties })
    }
}

/// Calendar fake that records the slots it is given.
struct RecordingCalendar {
    created: Mutex<Vec<EventSlots>>,
}

impl RecordingCalendar {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            created: Mutex::new(Vec::new()),
        })
    }

    fn created(&self) -> Vec<EventSlots> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl Calendar for RecordingCalendar {
    async fn create_event(
        &self,
        slots: &EventSlots,
        _description: Option<&str>,
    ) -> ProviderResult<CalendarEvent> {
        self.created.lock().unwrap().push(slots.clone());
        Ok(CalendarEvent {
            uid: "evt-1".into(),
            link: Some("https://cal.example/evt-1.ics".into()),
        })
    }
}

/// Answerer fake with a fixed reply and document ids.
struct FixedAnswerer;

#[async_trait]
impl QuestionAnswerer for FixedAnswerer {
    async fn answer(&self, _question: &str) -> ProviderResult<RetrievedAnswer> {
        Ok(RetrievedAnswer {
            reply: "From your notes: two things.".into(),
            doc_ids: vec!["notes/a.md".into(), "notes/b.md".into()],
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Harness
// ═══════════════════════════════════════════════════════════════════════

struct Harness {
    engine: TurnEngine,
    todos: TodoStore,
    turns: TurnStore,
    calendar: Arc<RecordingCalendar>,
}

async fn harness(
    chat: Arc<dyn ChatCompletion>,
    workspace: Option<Arc<dyn CapabilityProvider>>,
) -> Harness {
    let db = Database::open_in_memory().unwrap();
    db.run_migrations().await.unwrap();

    let todos = TodoStore::new(db.clone());
    let turns = TurnStore::new(db);
    let calendar = RecordingCalendar::new();

    let engine = TurnEngine::new(
        chat,
        workspace,
        LocalTaskProvider::new(todos.clone()),
        Arc::clone(&calendar) as Arc<dyn Calendar>,
        Arc::new(FixedAnswerer),
        TurnLogger::new(turns.clone()),
    );

    Harness {
        engine,
        todos,
        turns,
        calendar,
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Grammar fast path
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn todo_command_never_reaches_the_classifier() {
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat.clone(), None).await;

    let result = h.engine.handle("todo: Buy milk | 2025-11-15").await.unwrap();

    assert_eq!(chat.call_count(), 0);
    assert!(result.reply.contains("Created todo 'Buy milk'"));
    assert!(result.reply.contains("2025-11-15T00:00:00"));
    assert_eq!(result.tools_used, vec!["create_todo".to_string()]);

    let todos = h.todos.list(None).await.unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].text, "Buy milk");
}

#[tokio::test]
async fn malformed_event_command_rejects_the_turn() {
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat.clone(), None).await;

    let err = h.engine.handle("event: Coffee | 2025-11-15 09:00").await.unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("event: Title"));

    // No classification, no event, no turn record.
    assert_eq!(chat.call_count(), 0);
    assert!(h.calendar.created().is_empty());
    assert!(h.turns.recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn event_command_dispatches_to_the_calendar() {
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, None).await;

    let result = h
        .engine
        .handle("event: Coffee | 2025-11-15 09:00 | 2025-11-15 10:00")
        .await
        .unwrap();

    let created = h.calendar.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "Coffee");
    assert_eq!(created[0].start.to_string(), "2025-11-15 09:00:00");
    assert_eq!(created[0].end.to_string(), "2025-11-15 10:00:00");

    assert!(result.reply.contains("Created calendar event 'Coffee'"));
    assert!(result.reply.contains("https://cal.example/evt-1.ics"));
    assert_eq!(result.tools_used, vec!["create_event".to_string()]);
}

// ═══════════════════════════════════════════════════════════════════════
//  Classified paths
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn question_path_carries_retrieved_ids_into_the_record() {
    let chat = ScriptedChat::new(&["QA"]);
    let h = harness(chat, None).await;

    let result = h.engine.handle("what did I write about rust?").await.unwrap();

    assert_eq!(result.reply, "From your notes: two things.");
    assert!(result.tools_used.is_empty());
    assert_eq!(result.retrieved_ids, vec!["notes/a.md", "notes/b.md"]);

    let records = h.turns.recent(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].retrieved_doc_ids.as_deref(), Some("notes/a.md,notes/b.md"));
    assert_eq!(records[0].tools_used, None);
}

#[tokio::test]
async fn hedged_classifier_reply_takes_the_question_path() {
    let chat = ScriptedChat::new(&["maybe todo?"]);
    let h = harness(chat, None).await;

    let result = h.engine.handle("hmm, not sure").await.unwrap();
    assert_eq!(result.reply, "From your notes: two things.");
}

#[tokio::test]
async fn classified_task_without_workspace_stays_local_and_silent() {
    let chat = ScriptedChat::new(&["TODO", r#"{"text": "Call mom", "due": null}"#]);
    let h = harness(chat, None).await;

    let result = h.engine.handle("remind me to call mom").await.unwrap();

    assert!(result.reply.contains("Created todo 'Call mom'"));
    assert!(!result.reply.contains("Note:"));
    assert_eq!(result.tools_used, vec!["create_todo".to_string()]);
}

#[tokio::test]
async fn classified_event_with_malformed_extraction_still_schedules() {
    let chat = ScriptedChat::new(&["EVENT", "sorry, no JSON today"]);
    let h = harness(chat, None).await;

    let result = h.engine.handle("coffee with john").await.unwrap();

    // The fallback schedules tomorrow, same time, one hour long.
    let created = h.calendar.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].title, "coffee with john");
    assert_eq!(
        created[0].end - created[0].start,
        chrono::Duration::hours(1)
    );
    assert!(result.reply.contains("Created calendar event 'coffee with john'"));
}

#[tokio::test]
async fn chat_transport_failure_fails_the_turn() {
    let h = harness(Arc::new(DownChat), None).await;

    let err = h.engine.handle("remind me to call mom").await.unwrap_err();
    assert!(matches!(err, EngineError::Llm(LlmError::RequestFailed { .. })));
    assert!(h.turns.recent(10).await.unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
//  Workspace resolution and the fallback cascade
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn resolved_workspace_capability_handles_the_task() {
    let ws = ScriptedWorkspace::new(
        &["API-get-self", "API-post-page"],
        vec![ScriptedOutcome::Ok(json!({
            "content": [{"type": "text", "text": "created"}],
            "structuredContent": {"url": "https://ws.example/p/1"}
        }))],
    );
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, Some(ws.clone() as Arc<dyn CapabilityProvider>)).await;

    let result = h.engine.handle("todo: Ship the report | 2025-11-15").await.unwrap();

    let invocations = ws.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].0, "API-post-page");
    assert_eq!(
        invocations[0].1["properties"]["Name"]["title"][0]["text"]["content"],
        "Ship the report"
    );

    assert!(result.reply.contains("Saved 'Ship the report' to your workspace"));
    assert!(result.reply.contains("https://ws.example/p/1"));
    assert_eq!(result.tools_used, vec!["API-post-page".to_string()]);

    // The task went remote; nothing lands in the local store.
    assert!(h.todos.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_field_earns_exactly_one_retry_without_it() {
    let ws = ScriptedWorkspace::new(
        &["API-post-page"],
        vec![
            ScriptedOutcome::UnknownField("Due"),
            ScriptedOutcome::Ok(json!({"content": []})),
        ],
    );
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, Some(ws.clone() as Arc<dyn CapabilityProvider>)).await;

    let result = h.engine.handle("todo: Pay rent | 2025-11-15").await.unwrap();

    let invocations = ws.invocations();
    assert_eq!(invocations.len(), 2);
    // First call carries the Due property, the retry does not.
    assert!(invocations[0].1["properties"].get("Due").is_some());
    assert!(invocations[1].1["properties"].get("Due").is_none());

    // The retry succeeded remotely: no degradation annotation.
    assert!(result.reply.contains("to your workspace"));
    assert!(!result.reply.contains("local task list"));
    assert!(h.todos.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_retry_falls_back_to_the_local_provider() {
    let ws = ScriptedWorkspace::new(
        &["API-post-page"],
        vec![
            ScriptedOutcome::UnknownField("Due"),
            ScriptedOutcome::Fail("still malformed"),
            // No third outcome: a third invocation would panic.
        ],
    );
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, Some(ws.clone() as Arc<dyn CapabilityProvider>)).await;

    let result = h.engine.handle("todo: Pay rent | 2025-11-15").await.unwrap();

    assert_eq!(ws.invocations().len(), 2);

    // The reply must state the degradation, and the todo must exist locally.
    assert!(result.reply.contains("Created todo 'Pay rent'"));
    assert!(result.reply.contains("local task list instead"));
    assert_eq!(result.tools_used, vec!["create_todo".to_string()]);
    assert_eq!(h.todos.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn non_field_failure_skips_the_retry_and_falls_back() {
    let ws = ScriptedWorkspace::new(
        &["API-post-page"],
        vec![ScriptedOutcome::Fail("rate limited")],
    );
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, Some(ws.clone() as Arc<dyn CapabilityProvider>)).await;

    let result = h.engine.handle("todo: Pay rent").await.unwrap();

    // One remote call only, then straight to the local provider.
    assert_eq!(ws.invocations().len(), 1);
    assert!(result.reply.contains("local task list instead"));
    assert_eq!(h.todos.list(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unresolvable_tool_set_uses_local_provider_silently() {
    let ws = ScriptedWorkspace::new(&["API-get-self", "API-post-search"], vec![]);
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, Some(ws.clone() as Arc<dyn CapabilityProvider>)).await;

    let result = h.engine.handle("todo: Buy milk").await.unwrap();

    assert!(ws.invocations().is_empty());
    assert!(result.reply.contains("Created todo 'Buy milk'"));
    // No remote attempt was made, so no degradation annotation either.
    assert!(!result.reply.contains("local task list instead"));
}

#[tokio::test]
async fn turn_record_written_for_dispatched_turns() {
    let chat = ScriptedChat::new(&[]);
    let h = harness(chat, None).await;

    h.engine.handle("todo: Buy milk").await.unwrap();

    let records = h.turns.recent(10).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].user_message, "todo: Buy milk");
    assert_eq!(records[0].tools_used.as_deref(), Some("create_todo"));
    assert!(records[0].assistant_reply.contains("Created todo 'Buy milk'"));
}
