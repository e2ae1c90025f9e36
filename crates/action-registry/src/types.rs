//! The invocation contract every registered action implements (§4.2, §3).

use std::sync::Arc;

use agentcore_browser_context::BrowserContext;
use agentcore_core_types::{ActionId, TaskId};
use agentcore_event_bus::EventManager;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why `Action::call` refused to run at all, as opposed to the action
/// running and the *browser* failing (that goes through
/// `agentcore-error-recovery` and comes back as an `Ok(ActionResult::failed(..))`).
#[derive(Debug, Error, Clone)]
pub enum ActionError {
    #[error("invalid input for action: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Failed(String),
}

/// Everything one `Action::call` needs besides its JSON input: the browser
/// adapter to act on and the bus to emit intent events to. Cheap to clone;
/// every field is already an `Arc`.
#[derive(Clone)]
pub struct ActionExecCtx {
    pub task_id: TaskId,
    pub browser: Arc<dyn BrowserContext>,
    pub events: Arc<EventManager>,
    /// Cancelled once the enclosing task is stopped; threaded into long
    /// waits (`wait_for`, recovery strategies) so they return within one
    /// check interval instead of running to their own timeout.
    pub cancel: CancellationToken,
}

impl ActionExecCtx {
    pub fn new(task_id: TaskId, browser: Arc<dyn BrowserContext>, events: Arc<EventManager>) -> Self {
        Self {
            task_id,
            browser,
            events,
            cancel: CancellationToken::new(),
        }
    }

    /// Wires in a caller-owned token (typically cloned from
    /// `AgentContext::cancel_token`) so cancelling it aborts any wait this
    /// context's actions are blocked in.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// One entry in the mandatory action catalog (§4.2). `has_index` marks the
/// actions whose input carries a `highlight_index` the caller (and the
/// recovery layer) may need to rewrite on retry.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    fn has_index(&self) -> bool {
        false
    }

    /// JSON schema this action's input must validate against. An empty
    /// object (no `properties`/`required`) means "accept anything",
    /// matching the teacher's "no-params" actions (`done`, `go_back`, ...).
    fn schema(&self) -> Value {
        serde_json::json!({})
    }

    /// Short, human-readable description of what this call intends to do,
    /// used for the ACT_START/ACT_OK/ACT_FAIL event payload and for
    /// building the action-list fragment of the planner prompt.
    fn describe(&self, _input: &Value) -> String {
        self.name().to_string()
    }

    async fn call(&self, input: Value, ctx: &ActionExecCtx) -> Result<agentcore_core_types::ActionResult, ActionError>;
}

/// Reads the `index` field an action's input is expected to carry when
/// `has_index()` is true.
pub fn get_index_arg(input: &Value) -> Option<u32> {
    input.get("index").and_then(Value::as_u64).map(|v| v as u32)
}

/// Rewrites the `index` field in place; used by recovery-aware callers that
/// re-target an element and want to replay the same JSON input.
pub fn set_index_arg(input: &mut Value, index: u32) {
    if let Value::Object(map) = input {
        map.insert("index".to_string(), Value::from(index));
    }
}

fn schema_requires(fields: &[(&str, &str)], required: &[&str]) -> Value {
    let mut props = serde_json::Map::new();
    for (name, ty) in fields {
        props.insert((*name).to_string(), serde_json::json!({ "type": ty }));
    }
    serde_json::json!({
        "type": "object",
        "properties": Value::Object(props),
        "required": required,
    })
}

/// Validates `input` against a minimal JSON-schema-like description: only
/// `required`/`properties.*.type` are checked, which is all the catalog
/// actually needs. An empty schema (`{}`) always passes.
pub fn validate_against_schema(schema: &Value, input: &Value) -> Result<(), ActionError> {
    let Some(obj) = schema.as_object() else {
        return Ok(());
    };
    if obj.is_empty() {
        return Ok(());
    }
    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for field in &required {
        let Some(field_name) = field.as_str() else { continue };
        if input.get(field_name).is_none() {
            return Err(ActionError::InvalidInput(format!("missing required field `{field_name}`")));
        }
    }
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (field_name, prop_schema) in props {
            let Some(value) = input.get(field_name) else { continue };
            let Some(expected_ty) = prop_schema.get("type").and_then(Value::as_str) else {
                continue;
            };
            let matches = match expected_ty {
                "string" => value.is_string(),
                "number" => value.is_number(),
                "integer" => value.is_u64() || value.is_i64(),
                "boolean" => value.is_boolean(),
                "object" => value.is_object(),
                "array" => value.is_array(),
                _ => true,
            };
            if !matches {
                return Err(ActionError::InvalidInput(format!(
                    "field `{field_name}` expected type `{expected_ty}`, got `{value}`"
                )));
            }
        }
    }
    Ok(())
}

pub(crate) fn obj_schema(fields: &[(&str, &str)], required: &[&str]) -> Value {
    schema_requires(fields, required)
}
