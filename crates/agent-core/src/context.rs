//! `Task` and `AgentContext` (§3): process-wide per-task state with
//! lifecycle equal to the task's lifetime, including any follow-up tasks
//! appended to it.

use agentcore_core_types::{ActionResult, TaskId};
use agentcore_dom_change::ChangeType;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::options::AgentOptions;

/// Immutable string issued by the user, plus an opaque id. Follow-up tasks
/// append to `AgentContext::tasks` without resetting step counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub text: String,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            task_id: TaskId::new(),
            text: text.into(),
        }
    }
}

/// Read by prompts: current step number against the configured bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepInfo {
    pub step_number: u32,
    pub max_steps: u32,
}

/// One planned action plus its execution outcome and the DOM-change
/// classification observed right after it, appended to `AgentContext::history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step_number: u32,
    pub action_name: String,
    pub action_input: serde_json::Value,
    pub result: ActionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_type: Option<ChangeType>,
}

/// Whether Navigator executes the full LLM-provided action batch or stops
/// after one action to re-observe (§3 ExecutionContext, driven by
/// `DomChange::should_switch_to_single_step`).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Batch,
    SingleStep,
    Adaptive,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub execution_mode: Option<ExecutionMode>,
    pub dom_change_history: Vec<ChangeType>,
}

impl ExecutionContext {
    pub fn record(&mut self, change: ChangeType) {
        self.dom_change_history.push(change);
    }
}

/// Process-wide per-task state shared (read/write) by the agent trio.
/// Executor owns this; agents hold a reference to it rather than to each
/// other (§9 — breaks the cyclic-reference pattern the source used).
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub tasks: Vec<Task>,
    pub n_steps: u32,
    pub consecutive_failures: u32,
    pub consecutive_validator_failures: u32,
    pub paused: bool,
    /// Cancelled by `cancel()`; checked at the executor loop's suspension
    /// points and threaded into every `ActionExecCtx` so an in-flight wait
    /// or recovery chain unblocks too, not just the step boundary.
    pub cancel_token: CancellationToken,
    pub options: AgentOptions,
    pub action_results: Vec<ActionResult>,
    pub history: Vec<HistoryEntry>,
    pub execution: ExecutionContext,
    /// Frozen once the Planner sets it for the current task: §3's
    /// `PlannerOutput.web_task` invariant.
    pub web_task: Option<bool>,
}

impl AgentContext {
    pub fn new(initial_task: Task, options: AgentOptions) -> Self {
        Self {
            tasks: vec![initial_task],
            n_steps: 0,
            consecutive_failures: 0,
            consecutive_validator_failures: 0,
            paused: false,
            cancel_token: CancellationToken::new(),
            options,
            action_results: Vec::new(),
            history: Vec::new(),
            execution: ExecutionContext::default(),
            web_task: None,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.tasks[0].task_id.clone()
    }

    pub fn current_task(&self) -> &Task {
        self.tasks.last().expect("at least one task")
    }

    pub fn step_info(&self) -> StepInfo {
        StepInfo {
            step_number: self.n_steps,
            max_steps: self.options.max_steps,
        }
    }

    /// §6 CLI surface: `addFollowUpTask`. Resets validator-prompt scope
    /// (the frozen `web_task` bit) and drops any `action_results` not
    /// tagged `include_in_memory`, per the Executor's follow-up-task rule.
    pub fn add_follow_up_task(&mut self, text: impl Into<String>) {
        self.tasks.push(Task::new(text));
        self.web_task = None;
        self.action_results.retain(|r| r.include_in_memory);
    }

    /// Step-boundary compaction of `action_results`: entries not tagged
    /// `include_in_memory` are dropped, the rest survive into the next step.
    pub fn compact_action_results(&mut self) {
        self.action_results.retain(|r| r.include_in_memory);
    }

    pub fn record_step(&mut self, entry: HistoryEntry) {
        if entry.result.include_in_memory {
            self.action_results.push(entry.result.clone());
        }
        self.history.push(entry);
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn cancel(&mut self) {
        self.cancel_token.cancel();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_task_resets_web_task_and_drops_transient_results() {
        let mut ctx = AgentContext::new(Task::new("find my invoice"), AgentOptions::default());
        ctx.web_task = Some(true);
        ctx.action_results.push(ActionResult::ok("transient"));
        ctx.action_results.push(ActionResult::ok("remembered").with_memory(true));

        ctx.add_follow_up_task("summarize the page");

        assert_eq!(ctx.tasks.len(), 2);
        assert!(ctx.web_task.is_none());
        assert_eq!(ctx.action_results.len(), 1);
        assert_eq!(ctx.action_results[0].extracted_content.as_deref(), Some("remembered"));
    }

    #[test]
    fn step_info_reflects_options_bound() {
        let ctx = AgentContext::new(Task::new("go to example.com"), AgentOptions::default().max_steps(20));
        let info = ctx.step_info();
        assert_eq!(info.step_number, 0);
        assert_eq!(info.max_steps, 20);
    }
}
