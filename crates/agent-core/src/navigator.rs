//! NavigatorAgent (§4.7): per-step contract — observe, ask the chat LLM for
//! an ordered action list, dispatch each action through the registry, and
//! classify the DOM delta between actions.

use std::sync::Arc;

use agentcore_action_registry::{ActionExecCtx, ActionRegistry};
use agentcore_browser_context::BrowserContext;
use agentcore_core_types::ActionResult;
use agentcore_dom_change::{self as dom_change, ChangeType, LastActionKind};
use agentcore_event_bus::EventManager;
use serde::{Deserialize, Serialize};

use crate::context::{AgentContext, HistoryEntry};
use crate::errors::AgentError;
use crate::llm::ChatLlm;
use crate::message_history::{Message, MessageHistoryStore};
use crate::prompt::format_element_tree;

/// One action as decoded from the LLM's JSON response. `input` is passed to
/// `ActionRegistry::invoke` verbatim; recovery-driven index rewrites happen
/// inside the registry, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorAction {
    pub name: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// The LLM's structured reply for one Navigator step (§4.7 step 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigatorDecision {
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub evaluation_previous_goal: Option<String>,
    #[serde(default)]
    pub memory: Option<String>,
    #[serde(default)]
    pub next_goal: Option<String>,
    pub actions: Vec<NavigatorAction>,
}

/// What one `NavigatorAgent::step` call produced, for the Executor to fold
/// into `AgentContext`.
pub struct NavigatorStepOutcome {
    pub entries: Vec<HistoryEntry>,
    pub is_done: bool,
    pub batch_aborted_early: bool,
}

pub struct NavigatorAgent {
    registry: Arc<ActionRegistry>,
}

impl NavigatorAgent {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    fn action_kind(name: &str) -> LastActionKind {
        match name {
            "click_element" => LastActionKind::Click,
            "input_text" | "send_keys" => LastActionKind::Input,
            "scroll_to_percent" | "scroll_to_top" | "scroll_to_bottom" | "previous_page" | "next_page"
            | "scroll_to_text" => LastActionKind::Scroll,
            "go_to_url" | "go_back" | "go_forward" | "refresh" | "search_google" => LastActionKind::Navigation,
            "wait" => LastActionKind::Wait,
            _ => LastActionKind::Other,
        }
    }

    /// Runs one Navigator step: build the state message, consult the LLM,
    /// then dispatch actions in order until the batch completes, a `done`
    /// action halts it, or a blocking/interactive DOM change switches the
    /// remainder of the batch off.
    #[allow(clippy::too_many_arguments)]
    pub async fn step(
        &self,
        ctx: &AgentContext,
        browser: &Arc<dyn BrowserContext>,
        events: &Arc<EventManager>,
        llm: &dyn ChatLlm,
        history_store: &mut dyn MessageHistoryStore,
        max_elements: usize,
    ) -> Result<NavigatorStepOutcome, AgentError> {
        let state = browser
            .get_state(false)
            .await
            .map_err(|e| AgentError::Other(e.to_string()))?;
        let element_tree = format_element_tree(&state, max_elements, true);

        let decision = llm
            .decide(history_store.messages(), &state.url, &element_tree, ctx.step_info())
            .await?;

        history_store.add_plan(
            &serde_json::to_string(&decision).unwrap_or_default(),
            crate::message_history::PlanPosition::Append,
        );

        let exec_ctx =
            ActionExecCtx::new(ctx.task_id(), Arc::clone(browser), Arc::clone(events)).with_cancel(ctx.cancel_token.clone());

        let mut entries = Vec::new();
        let mut is_done = false;
        let mut batch_aborted_early = false;
        let mut last_state = state;

        let cap = ctx.options.max_actions_per_step as usize;
        for action in decision.actions.iter().take(cap) {
            if ctx.is_stopped() || ctx.paused {
                batch_aborted_early = true;
                break;
            }

            let result: ActionResult = self.registry.invoke(&action.name, action.input.clone(), &exec_ctx).await;
            let done_now = result.is_done.unwrap_or(false);

            let new_state = browser.get_state(false).await.map_err(|e| AgentError::Other(e.to_string()))?;
            let change = dom_change::classify(&last_state, &new_state, Self::action_kind(&action.name));
            last_state = new_state;

            entries.push(HistoryEntry {
                step_number: ctx.n_steps,
                action_name: action.name.clone(),
                action_input: action.input.clone(),
                result,
                change_type: Some(change.change_type),
            });

            if done_now {
                is_done = true;
                break;
            }
            if change.should_switch_to_single_step() {
                batch_aborted_early = true;
                break;
            }
        }

        history_store.add_plan(
            &format!("executed {} action(s) this step", entries.len()),
            crate::message_history::PlanPosition::Append,
        );

        Ok(NavigatorStepOutcome { entries, is_done, batch_aborted_early })
    }
}

impl NavigatorStepOutcome {
    pub fn last_change(&self) -> Option<ChangeType> {
        self.entries.last().and_then(|e| e.change_type)
    }

    pub fn succeeded(&self) -> bool {
        self.entries.iter().all(|e| !e.result.is_error())
    }
}

/// Not part of the core state machine, but used by tests and hosts to turn
/// a `NavigatorDecision` into a single Navigator/Assistant message.
pub fn decision_message(decision: &NavigatorDecision) -> Message {
    Message::assistant(serde_json::to_string(decision).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_actions_from_json() {
        let json = serde_json::json!({
            "next_goal": "click submit",
            "actions": [{"name": "click_element", "input": {"index": 0}}],
        });
        let decision: NavigatorDecision = serde_json::from_value(json).unwrap();
        assert_eq!(decision.actions.len(), 1);
        assert_eq!(decision.actions[0].name, "click_element");
    }

    #[test]
    fn action_kind_maps_input_actions_to_input() {
        assert_eq!(NavigatorAgent::action_kind("input_text"), LastActionKind::Input);
        assert_eq!(NavigatorAgent::action_kind("go_to_url"), LastActionKind::Navigation);
        assert_eq!(NavigatorAgent::action_kind("frobnicate"), LastActionKind::Other);
    }
}
