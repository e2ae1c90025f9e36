//! Replay store (§6, optional) and the deterministic replay algorithm
//! (§4.9). Replaying the history of a run re-targets every action through
//! the action registry (which re-resolves via the element finder) rather
//! than trusting recorded `highlightIndex` values, which may have drifted.

use std::sync::Arc;
use std::time::Duration;

use agentcore_action_registry::{ActionExecCtx, ActionRegistry};
use agentcore_browser_context::BrowserContext;
use agentcore_core_types::{ActionResult, TaskId};
use agentcore_event_bus::EventBus as _;
use agentcore_event_bus::{EventManager, EventState, ExecutionEvent};
use serde::{Deserialize, Serialize};

/// One persisted step, matching the schema in §6 verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub url: String,
    pub title: String,
    pub selector_indices: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModelOutput {
    pub actions: Vec<crate::navigator::NavigatorAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStep {
    pub state: PersistedState,
    pub model_output: PersistedModelOutput,
    pub result: Vec<ActionResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedHistory {
    pub version: u32,
    pub history: Vec<PersistedStep>,
}

/// `storeAgentStepHistory` / `loadAgentStepHistory` (§6). A single
/// key/value interface; the core never writes to disk itself.
pub trait ReplayStore: Send + Sync {
    fn store_agent_step_history(&mut self, task_id: &TaskId, task: &str, history: PersistedHistory);
    fn load_agent_step_history(&self, session_id: &str) -> Option<PersistedHistory>;
}

#[derive(Debug, Default)]
pub struct InMemoryReplayStore {
    entries: std::collections::HashMap<String, (TaskId, String, PersistedHistory)>,
}

impl InMemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplayStore for InMemoryReplayStore {
    fn store_agent_step_history(&mut self, task_id: &TaskId, task: &str, history: PersistedHistory) {
        self.entries.insert(task_id.to_string(), (task_id.clone(), task.to_string(), history));
    }

    fn load_agent_step_history(&self, session_id: &str) -> Option<PersistedHistory> {
        self.entries.get(session_id).map(|(_, _, h)| h.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReplayOptions {
    pub max_retries: u32,
    pub skip_failures: bool,
    pub delay_between_actions: Duration,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self { max_retries: 2, skip_failures: false, delay_between_actions: Duration::from_millis(200) }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayStepOutcome {
    pub action_name: String,
    pub result: ActionResult,
}

/// Replays `history` step by step, re-targeting every action through the
/// registry rather than the recorded indices. Emits the same ACT_START /
/// ACT_OK / ACT_FAIL taxonomy as live execution (via
/// `ActionRegistry::invoke`, which already emits these).
pub async fn replay_history(
    task_id: TaskId,
    history: &PersistedHistory,
    registry: &ActionRegistry,
    browser: &Arc<dyn BrowserContext>,
    events: &Arc<EventManager>,
    options: ReplayOptions,
) -> Vec<ReplayStepOutcome> {
    let exec_ctx = ActionExecCtx::new(task_id.clone(), Arc::clone(browser), Arc::clone(events));
    let mut outcomes = Vec::new();

    for step in &history.history {
        for action in &step.model_output.actions {
            let mut attempt = 0;
            let mut result = registry.invoke(&action.name, action.input.clone(), &exec_ctx).await;
            while result.is_error() && attempt < options.max_retries {
                attempt += 1;
                tokio::time::sleep(options.delay_between_actions).await;
                result = registry.invoke(&action.name, action.input.clone(), &exec_ctx).await;
            }

            if result.is_error() && !options.skip_failures {
                let _ = events
                    .publish(ExecutionEvent::system(
                        task_id.clone(),
                        EventState::Fail,
                        format!("replay aborted on action {}: {}", action.name, result.error.clone().unwrap_or_default()),
                    ))
                    .await;
                outcomes.push(ReplayStepOutcome { action_name: action.name.clone(), result });
                return outcomes;
            }

            outcomes.push(ReplayStepOutcome { action_name: action.name.clone(), result });
            tokio::time::sleep(options.delay_between_actions).await;
        }
    }

    let _ = events
        .publish(ExecutionEvent::system(task_id, EventState::Ok, "replay completed"))
        .await;
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips() {
        let mut store = InMemoryReplayStore::new();
        let task_id = TaskId::new();
        let history = PersistedHistory { version: 1, history: vec![] };
        store.store_agent_step_history(&task_id, "go to example.com", history);
        assert!(store.load_agent_step_history(&task_id.to_string()).is_some());
        assert!(store.load_agent_step_history("missing").is_none());
    }
}
