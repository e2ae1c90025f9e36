//! PlannerAgent (§4.8, §3 `PlannerOutput`). Runs when a plan is due or after
//! a validator failure; may declare the task done without further
//! navigation if the current state already satisfies it.

use agentcore_browser_context::BrowserState;
use agentcore_core_types::wrap_untrusted;
use serde::{Deserialize, Serialize};

use crate::context::AgentContext;
use crate::errors::AgentError;
use crate::llm::ChatLlm;
use crate::message_history::{Message, MessageHistoryStore, PlanPosition};
use crate::prompt::format_state_summary;

/// Fields match §3 verbatim. `observation` is always wrapped in the
/// untrusted-content sentinel before it reaches message history — callers
/// must not insert `PlannerOutput::observation` unwrapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub observation: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub web_task: bool,
    pub done: bool,
}

impl PlannerOutput {
    /// `observation` as it must appear in message history: wrapped exactly
    /// once regardless of whether the LLM itself already wrapped it.
    pub fn wrapped_observation(&self) -> String {
        wrap_untrusted(&self.observation)
    }
}

pub struct PlannerAgent;

impl PlannerAgent {
    pub fn new() -> Self {
        Self
    }

    /// §4.8: run the planner, freeze `web_task` into `AgentContext` the
    /// first time it's observed, and record the (wrapped) observation into
    /// message history.
    pub async fn step(
        &self,
        ctx: &mut AgentContext,
        state: &BrowserState,
        llm: &dyn ChatLlm,
        history_store: &mut dyn MessageHistoryStore,
        validator_failed: bool,
    ) -> Result<PlannerOutput, AgentError> {
        let summary = format_state_summary(state);
        let output = llm
            .plan(history_store.messages(), &summary, ctx.current_task().text.as_str(), validator_failed)
            .await?;

        // §3 invariant: once `web_task` is set for a task, it is frozen.
        if ctx.web_task.is_none() {
            ctx.web_task = Some(output.web_task);
        }

        history_store.add_plan(&output.wrapped_observation(), PlanPosition::Append);
        Ok(output)
    }
}

impl Default for PlannerAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
fn debug_message(output: &PlannerOutput) -> Message {
    Message::assistant(output.wrapped_observation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_observation_is_idempotent_under_double_wrap() {
        let output = PlannerOutput {
            observation: "page shows a login form".to_string(),
            next_steps: vec!["click login".to_string()],
            web_task: true,
            done: false,
        };
        let once = output.wrapped_observation();
        let twice = wrap_untrusted(&once);
        assert_eq!(once, twice);
    }
}
