//! # valet-providers
//!
//! Capability providers for Valet.
//!
//! Two kinds live here.  The built-in providers are statically bound: the
//! local todo store and the CalDAV calendar.  The remote workspace provider
//! is different — its operations are discovered at call time under names
//! that vary between servers, so the [`resolver`] selects one by name
//! pattern and the engine falls back to the built-ins when it is missing
//! or misbehaving.  The retrieval-augmented answerer for the question path
//! also lives here.

pub mod calendar;
pub mod error;
pub mod resolver;
pub mod retrieval;
pub mod tasks;
pub mod traits;
pub mod workspace;

// ── re-exports ───────────────────────────────────────────────────────

pub use calendar::{CALENDAR_TOOL, Calendar, CalendarEvent, CaldavCalendar};
pub use error::{ProviderError, ProviderResult};
pub use resolver::{Resolution, resolve_create_tool};
pub use retrieval::{QuestionAnswerer, RetrievalAnswerer, RetrievedAnswer, Snippet};
pub use tasks::{LOCAL_TASK_TOOL, LocalTaskProvider};
pub use traits::{CapabilityProvider, ToolDescriptor, strip_field};
pub use workspace::McpWorkspace;
