//! The capability model.
//!
//! A capability is a named, invocable operation discovered from a provider
//! at runtime rather than bound at build time.  The resolver picks one by
//! name pattern; the orchestrator invokes it and falls back to the built-in
//! providers when it fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use valet_core::TaskSlots;

use crate::error::ProviderResult;

/// A named capability advertised by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Machine-readable operation name, as the provider spells it.
    pub name: String,
    /// Human-readable description, possibly empty.
    #[serde(default)]
    pub description: String,
}

impl ToolDescriptor {
    /// Construct a descriptor (mostly useful in tests).
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A provider whose operations are enumerated at call time.
///
/// The discovered set is valid for one turn only: callers must re-discover
/// on every turn because the remote side's operations can change between
/// calls.  Implementations must not cache across `discover` calls on the
/// caller's behalf.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// A stable identifier for log lines and degradation notes.
    fn id(&self) -> &str;

    /// Enumerate the currently available operations.
    async fn discover(&self) -> ProviderResult<Vec<ToolDescriptor>>;

    /// Invoke a named operation with a structured payload.
    async fn invoke(&self, tool: &str, payload: Value) -> ProviderResult<Value>;

    /// Map task slots onto this provider's creation payload shape.
    fn task_payload(&self, slots: &TaskSlots) -> Value;
}

/// Remove every occurrence of a named field from a JSON payload, at any
/// nesting depth.  Key comparison is case-insensitive because providers do
/// not agree on property-name casing in their error messages.
///
/// Used by the one-shot field-omission retry: the rejected field is
/// stripped wherever it appears rather than rebuilding the payload.
pub fn strip_field(value: &mut Value, field: &str) {
    match value {
        Value::Object(map) => {
            map.retain(|k, _| !k.eq_ignore_ascii_case(field));
            for v in map.values_mut() {
                strip_field(v, field);
            }
        }
        Value::Array(items) => {
            for v in items {
                strip_field(v, field);
            }
        }
        _ => {}
    }
}
