//! [`ActionRegistry`]: the lookup table `invoke` dispatches through, plus
//! the intent-event emission every call goes through regardless of which
//! concrete action it resolves to (§4.2).

use std::collections::HashMap;
use std::sync::Arc;

use agentcore_core_types::{ActionId, ActionResult};
use agentcore_event_bus::{EventActor, EventBus, EventState, ExecutionEvent};
use serde_json::Value;

use crate::actions::*;
use crate::types::{validate_against_schema, Action, ActionExecCtx};

/// The mandatory browser action catalog. Construct with [`default_registry`]
/// unless a host needs to add or override an entry.
pub struct ActionRegistry {
    actions: HashMap<&'static str, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn register(&mut self, action: Arc<dyn Action>) {
        self.actions.insert(action.name(), action);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.actions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whether `name` resolves to an action whose input carries a
    /// `highlight_index` (used by the executor to decide whether a step's
    /// action list needs re-indexing after a DOM change).
    pub fn has_index(&self, name: &str) -> bool {
        self.actions.get(name).map(|a| a.has_index()).unwrap_or(false)
    }

    /// The action-list fragment of the planner/navigator prompt: one line
    /// per registered action, alphabetically.
    pub fn prompt(&self) -> String {
        self.names()
            .into_iter()
            .map(|name| format!("- {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Validates `input` against the action's schema, runs it, and emits
    /// ACT_START/ACT_OK/ACT_FAIL on `ctx.events` around the call. Unknown
    /// action names and schema failures are reported as a failed
    /// `ActionResult` rather than a panic or a bubbled error: the executor
    /// treats every outcome of `invoke` uniformly.
    pub async fn invoke(&self, name: &str, input: Value, ctx: &ActionExecCtx) -> ActionResult {
        let Some(action) = self.get(name) else {
            return ActionResult::failed(format!("unknown action: {name}"));
        };

        let action_id = ActionId::new();
        let intent = action.describe(&input);
        let _ = ctx
            .events
            .publish(ExecutionEvent::action(
                ctx.task_id.clone(),
                action_id.clone(),
                EventActor::Navigator,
                EventState::Start,
                intent.clone(),
            ))
            .await;

        let outcome = match validate_against_schema(&action.schema(), &input) {
            Ok(()) => {
                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => return ActionResult::cancelled(),
                    result = action.call(input, ctx) => result,
                }
            }
            Err(e) => Err(e),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(err) => ActionResult::failed(err.to_string()),
        };

        let (state, payload) = if result.is_error() {
            (EventState::Fail, result.error.clone().unwrap_or_else(|| "action failed".to_string()))
        } else {
            (EventState::Ok, result.extracted_content.clone().unwrap_or(intent))
        };
        let _ = ctx
            .events
            .publish(ExecutionEvent::action(ctx.task_id.clone(), action_id, EventActor::Navigator, state, payload))
            .await;

        result
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        default_registry()
    }
}

/// Builds a registry pre-populated with all 21 mandatory actions.
pub fn default_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Arc::new(Done));
    registry.register(Arc::new(SearchGoogle));
    registry.register(Arc::new(GoToUrl));
    registry.register(Arc::new(GoBack));
    registry.register(Arc::new(GoForward));
    registry.register(Arc::new(Refresh));
    registry.register(Arc::new(Wait));
    registry.register(Arc::new(ClickElement));
    registry.register(Arc::new(InputText));
    registry.register(Arc::new(SwitchTab));
    registry.register(Arc::new(OpenTab));
    registry.register(Arc::new(CloseTab));
    registry.register(Arc::new(CacheContent));
    registry.register(Arc::new(ScrollToPercent));
    registry.register(Arc::new(ScrollToTop));
    registry.register(Arc::new(ScrollToBottom));
    registry.register(Arc::new(PreviousPage));
    registry.register(Arc::new(NextPage));
    registry.register(Arc::new(ScrollToText));
    registry.register(Arc::new(SendKeys));
    registry.register(Arc::new(GetDropdownOptions));
    registry.register(Arc::new(SelectDropdownOption));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_browser_context::fake::FakeBrowserContext;
    use agentcore_browser_context::snapshot::BrowserState;
    use agentcore_core_types::TaskId;
    use agentcore_event_bus::new_event_manager;

    fn ctx_with(states: Vec<BrowserState>) -> ActionExecCtx {
        ActionExecCtx::new(TaskId::new(), FakeBrowserContext::new(states), new_event_manager(16))
    }

    #[test]
    fn default_registry_has_all_mandatory_actions() {
        let registry = default_registry();
        let expected = [
            "done",
            "search_google",
            "go_to_url",
            "go_back",
            "go_forward",
            "refresh",
            "wait",
            "click_element",
            "input_text",
            "switch_tab",
            "open_tab",
            "close_tab",
            "cache_content",
            "scroll_to_percent",
            "scroll_to_top",
            "scroll_to_bottom",
            "previous_page",
            "next_page",
            "scroll_to_text",
            "send_keys",
            "get_dropdown_options",
            "select_dropdown_option",
        ];
        for name in expected {
            assert!(registry.get(name).is_some(), "missing action {name}");
        }
        assert!(registry.has_index("click_element"));
        assert!(!registry.has_index("go_back"));
    }

    #[tokio::test]
    async fn invoke_reports_unknown_action_as_failed_result() {
        let registry = default_registry();
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let result = registry.invoke("does_not_exist", serde_json::json!({}), &ctx).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn invoke_reports_schema_violation_as_failed_result() {
        let registry = default_registry();
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let result = registry.invoke("go_to_url", serde_json::json!({}), &ctx).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn invoke_emits_start_and_terminal_events() {
        let registry = default_registry();
        let ctx = ctx_with(vec![BrowserState::empty("https://a", "A", "t1")]);
        let mut rx = ctx.events.subscribe();
        let _ = registry.invoke("go_back", serde_json::json!({}), &ctx).await;
        let start = rx.recv().await.unwrap();
        let terminal = rx.recv().await.unwrap();
        assert_eq!(start.state, EventState::Start);
        assert_eq!(terminal.state, EventState::Ok);
    }
}
