//! Assistant summarization workflow
//!
//! Narrates FIM scan results and vulnerability/alert records in natural
//! language by driving a conversation-thread state machine against the
//! summarization API.

pub mod workflow;

pub use workflow::{SummaryWorkflow, WorkflowConfig, WorkflowPhase};

use serde_json::Value;

/// Nesting depth beyond which containers are truncated.
const BOUND_DEPTH: usize = 2;
/// Entries kept per truncated container.
const BOUND_KEEP: usize = 2;
const OMITTED_MARKER: &str = "...omitted";

/// Size-bound a prompt payload: beyond depth 2, only the first 2 entries of
/// any object or array are kept, with an `"...omitted"` marker appended.
/// Full detail is not required for a useful summary.
pub fn bound_payload(value: &Value) -> Value {
    prune(value, 0)
}

fn prune(value: &Value, depth: usize) -> Value {
    match value {
        Value::Array(items) => {
            let keep = if depth >= BOUND_DEPTH {
                BOUND_KEEP.min(items.len())
            } else {
                items.len()
            };
            let mut out: Vec<Value> = items.iter().take(keep).map(|v| prune(v, depth + 1)).collect();
            if keep < items.len() {
                out.push(Value::String(OMITTED_MARKER.to_string()));
            }
            Value::Array(out)
        }
        Value::Object(map) => {
            let keep = if depth >= BOUND_DEPTH {
                BOUND_KEEP.min(map.len())
            } else {
                map.len()
            };
            let mut out = serde_json::Map::new();
            for (key, nested) in map.iter().take(keep) {
                out.insert(key.clone(), prune(nested, depth + 1));
            }
            if keep < map.len() {
                out.insert(OMITTED_MARKER.to_string(), Value::Bool(true));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}
