//! Executor (§4.9): the top-level state machine coordinating Planner,
//! Navigator and Validator. States: `Idle -> Running -> (Paused <-> Running)
//! -> Done | Failed | Cancelled`.

use std::sync::Arc;
use std::time::Duration;

use agentcore_action_registry::ActionRegistry;
use agentcore_browser_context::BrowserContext;
use agentcore_event_bus::{new_event_manager, EventBus, EventManager, EventState, ExecutionEvent};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};

use crate::context::{AgentContext, Task};
use crate::errors::AgentError;
use crate::llm::ChatLlm;
use crate::message_history::{InMemoryMessageHistory, MessageHistoryStore};
use crate::navigator::NavigatorAgent;
use crate::options::AgentOptions;
use crate::planner::PlannerAgent;
use crate::replay::{
    replay_history, InMemoryReplayStore, PersistedHistory, PersistedModelOutput, PersistedState, PersistedStep,
    ReplayOptions, ReplayStepOutcome, ReplayStore,
};
use crate::validator::ValidatorAgent;

const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorStatus {
    Idle,
    Running,
    Paused,
    Done,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorOutcome {
    pub status: ExecutorStatus,
    pub message: String,
    pub steps_taken: u32,
}

/// Wires the agent trio, action registry, browser adapter, event bus and
/// message/replay stores into one runnable unit. This is the object a
/// host constructs once per task.
pub struct Executor {
    browser: Arc<dyn BrowserContext>,
    events: Arc<EventManager>,
    registry: Arc<ActionRegistry>,
    llm: Arc<dyn ChatLlm>,
    navigator: NavigatorAgent,
    planner: PlannerAgent,
    validator: ValidatorAgent,
    history_store: Mutex<Box<dyn MessageHistoryStore>>,
    replay_store: Mutex<Box<dyn ReplayStore>>,
    ctx: Mutex<AgentContext>,
    status: Mutex<ExecutorStatus>,
}

impl Executor {
    pub fn new(
        task: impl Into<String>,
        options: AgentOptions,
        browser: Arc<dyn BrowserContext>,
        registry: Arc<ActionRegistry>,
        llm: Arc<dyn ChatLlm>,
    ) -> Self {
        let task = Task::new(task);
        let ctx = AgentContext::new(task, options);
        Self {
            browser,
            events: new_event_manager(256),
            registry: Arc::clone(&registry),
            llm,
            navigator: NavigatorAgent::new(registry),
            planner: PlannerAgent::new(),
            validator: ValidatorAgent::new(),
            history_store: Mutex::new(Box::new(InMemoryMessageHistory::new())),
            replay_store: Mutex::new(Box::new(InMemoryReplayStore::new())),
            ctx: Mutex::new(ctx),
            status: Mutex::new(ExecutorStatus::Idle),
        }
    }

    pub async fn get_current_task_id(&self) -> agentcore_core_types::TaskId {
        self.ctx.lock().await.task_id()
    }

    pub fn subscribe_execution_events(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.events.subscribe()
    }

    /// There is no persisted event buffer to clear — the bus is a live
    /// broadcast channel — so this drops any in-flight receivers by
    /// recreating the sender side the next event publishes against. Kept
    /// as a distinct no-op-shaped hook so hosts can call it without caring
    /// whether the bus is buffered.
    pub async fn clear_execution_events(&self) {
        let _ = self.events.subscribe();
    }

    pub async fn cancel(&self) {
        self.ctx.lock().await.cancel();
        *self.status.lock().await = ExecutorStatus::Cancelled;
    }

    pub async fn pause(&self) {
        self.ctx.lock().await.pause();
    }

    pub async fn resume(&self) {
        self.ctx.lock().await.resume();
    }

    pub async fn cleanup(&self) {
        self.browser.cleanup().await;
    }

    /// §6 `addFollowUpTask`. Resets validator-prompt scope and drops
    /// non-memory action results; does not reset `nSteps`.
    pub async fn add_follow_up_task(&self, task: impl Into<String>) {
        let mut ctx = self.ctx.lock().await;
        let task = Task::new(task);
        ctx.tasks.push(task.clone());
        ctx.web_task = None;
        ctx.action_results.retain(|r| r.include_in_memory);
        drop(ctx);
        self.history_store.lock().await.add_new_task(&task);
    }

    /// Runs the task to completion (or until cancelled/paused-forever).
    /// `nSteps` is only reset by constructing a fresh `AgentContext` (i.e.
    /// on the very first call); a subsequent `execute()` after a follow-up
    /// task continues the same step count, matching §8 S6.
    pub async fn execute(&self) -> ExecutorOutcome {
        *self.status.lock().await = ExecutorStatus::Running;
        let task_id = self.get_current_task_id().await;
        let _ = self.events.publish(ExecutionEvent::system(task_id.clone(), EventState::Start, "task started")).await;

        {
            let ctx = self.ctx.lock().await;
            let mut history_store = self.history_store.lock().await;
            if history_store.messages().is_empty() {
                history_store.init_task_messages(
                    "You are a browser automation agent. Decide the next actions from the browser state.",
                    ctx.current_task(),
                );
            }
        }

        let outcome = self.run_loop(task_id.clone()).await;

        let (state, payload) = match outcome.status {
            ExecutorStatus::Done => (EventState::Ok, outcome.message.clone()),
            ExecutorStatus::Cancelled => (EventState::Cancel, outcome.message.clone()),
            _ => (EventState::Fail, outcome.message.clone()),
        };
        let _ = self.events.publish(ExecutionEvent::system(task_id.clone(), state, payload)).await;

        *self.status.lock().await = outcome.status;

        let replay_enabled = self.ctx.lock().await.options.replay_historical_tasks;
        if replay_enabled {
            self.persist_history(task_id).await;
        }

        outcome
    }

    /// §6 `replayHistory(sessionId, ...)`. Looks up whatever this Executor
    /// itself persisted under `session_id` (only populated when
    /// `replay_historical_tasks` was set) and re-runs it through the live
    /// registry. Returns `None` if nothing was ever stored under that id.
    pub async fn replay(&self, session_id: &str, options: ReplayOptions) -> Option<Vec<ReplayStepOutcome>> {
        let history = self.replay_store.lock().await.load_agent_step_history(session_id)?;
        let task_id = self.get_current_task_id().await;
        Some(replay_history(task_id, &history, &self.registry, &self.browser, &self.events, options).await)
    }

    async fn persist_history(&self, task_id: agentcore_core_types::TaskId) {
        let ctx = self.ctx.lock().await;
        let persisted = PersistedHistory {
            version: 1,
            history: ctx
                .history
                .iter()
                .map(|entry| PersistedStep {
                    state: PersistedState { url: String::new(), title: String::new(), selector_indices: Vec::new() },
                    model_output: PersistedModelOutput {
                        actions: vec![crate::navigator::NavigatorAction {
                            name: entry.action_name.clone(),
                            input: entry.action_input.clone(),
                        }],
                    },
                    result: vec![entry.result.clone()],
                })
                .collect(),
        };
        let task_text = ctx.current_task().text.clone();
        drop(ctx);
        self.replay_store.lock().await.store_agent_step_history(&task_id, &task_text, persisted);
    }

    async fn run_loop(&self, task_id: agentcore_core_types::TaskId) -> ExecutorOutcome {
        let max_steps = self.ctx.lock().await.options.max_steps;
        let mut done = false;
        let mut validator_failed_pending = false;

        for _ in 0..max_steps {
            loop {
                let ctx = self.ctx.lock().await;
                if ctx.is_stopped() {
                    return ExecutorOutcome {
                        status: ExecutorStatus::Cancelled,
                        message: "cancelled".to_string(),
                        steps_taken: ctx.n_steps,
                    };
                }
                if !ctx.paused {
                    break;
                }
                drop(ctx);
                tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
            }

            let (consecutive_failures, max_failures) = {
                let ctx = self.ctx.lock().await;
                (ctx.consecutive_failures, ctx.options.max_failures)
            };
            if consecutive_failures >= max_failures {
                let steps_taken = self.ctx.lock().await.n_steps;
                return ExecutorOutcome {
                    status: ExecutorStatus::Failed,
                    message: format!("max failures reached ({max_failures})"),
                    steps_taken,
                };
            }

            let plan_due = {
                let ctx = self.ctx.lock().await;
                ctx.options.plan_due(ctx.n_steps)
            };
            if plan_due {
                match self.run_planner(false).await {
                    Ok(output) => {
                        let mut ctx = self.ctx.lock().await;
                        if output.done && ctx.web_task == Some(false) {
                            return ExecutorOutcome {
                                status: ExecutorStatus::Done,
                                message: output.observation,
                                steps_taken: ctx.n_steps,
                            };
                        }
                        let _ = &mut ctx;
                    }
                    Err(e) if e.is_fatal() => {
                        let steps_taken = self.ctx.lock().await.n_steps;
                        return ExecutorOutcome { status: ExecutorStatus::Failed, message: e.to_string(), steps_taken };
                    }
                    Err(_) => {}
                }
            }

            if !done {
                match self.run_navigator().await {
                    Ok(step_done) => {
                        done = step_done;
                    }
                    Err(e) if e.is_fatal() => {
                        let steps_taken = self.ctx.lock().await.n_steps;
                        return ExecutorOutcome { status: ExecutorStatus::Failed, message: e.to_string(), steps_taken };
                    }
                    Err(_) => {
                        let mut ctx = self.ctx.lock().await;
                        ctx.consecutive_failures += 1;
                    }
                }
            }

            if done {
                let validate = self.ctx.lock().await.options.validate_output;
                if validate {
                    match self.run_validator().await {
                        Ok(valid) if valid => {
                            let steps_taken = self.ctx.lock().await.n_steps;
                            let _ = self.events.publish(ExecutionEvent::system(task_id.clone(), EventState::Ok, "validated")).await;
                            return ExecutorOutcome {
                                status: ExecutorStatus::Done,
                                message: "task completed and validated".to_string(),
                                steps_taken,
                            };
                        }
                        Ok(_) => {
                            let mut ctx = self.ctx.lock().await;
                            ctx.consecutive_validator_failures += 1;
                            if ctx.consecutive_validator_failures >= ctx.options.max_validator_failures {
                                let steps_taken = ctx.n_steps;
                                drop(ctx);
                                return ExecutorOutcome {
                                    status: ExecutorStatus::Failed,
                                    message: "too many validator failures".to_string(),
                                    steps_taken,
                                };
                            }
                            done = false;
                        }
                        Err(e) => {
                            let steps_taken = self.ctx.lock().await.n_steps;
                            return ExecutorOutcome { status: ExecutorStatus::Failed, message: e.to_string(), steps_taken };
                        }
                    }
                } else {
                    let steps_taken = self.ctx.lock().await.n_steps;
                    return ExecutorOutcome { status: ExecutorStatus::Done, message: "task completed".to_string(), steps_taken };
                }
            }
        }

        let steps_taken = self.ctx.lock().await.n_steps;
        ExecutorOutcome { status: ExecutorStatus::Failed, message: "max steps reached".to_string(), steps_taken }
    }

    async fn run_planner(&self, validator_failed: bool) -> Result<crate::planner::PlannerOutput, AgentError> {
        let state = self.browser.get_state(false).await.map_err(|e| AgentError::Other(e.to_string()))?;
        let mut ctx = self.ctx.lock().await;
        let mut history_store = self.history_store.lock().await;
        self.planner.step(&mut ctx, &state, self.llm.as_ref(), history_store.as_mut(), validator_failed).await
    }

    async fn run_navigator(&self) -> Result<bool, AgentError> {
        let max_elements = {
            let ctx = self.ctx.lock().await;
            ctx.options.max_actions_per_step.max(1) as usize * 50
        };
        let outcome = {
            let ctx = self.ctx.lock().await;
            let mut history_store = self.history_store.lock().await;
            self.navigator
                .step(&ctx, &self.browser, &self.events, self.llm.as_ref(), history_store.as_mut(), max_elements)
                .await?
        };

        let mut ctx = self.ctx.lock().await;
        ctx.n_steps += 1;
        let succeeded = outcome.succeeded();
        for entry in outcome.entries {
            ctx.record_step(entry);
        }
        if succeeded {
            ctx.consecutive_failures = 0;
        } else {
            ctx.consecutive_failures += 1;
        }
        ctx.compact_action_results();
        Ok(outcome.is_done)
    }

    async fn run_validator(&self) -> Result<bool, AgentError> {
        let state = self.browser.get_state(false).await.map_err(|e| AgentError::Other(e.to_string()))?;
        let ctx = self.ctx.lock().await;
        let task = ctx.current_task().text.clone();
        let history_store = self.history_store.lock().await;
        let output = self.validator.step(&task, &state, self.llm.as_ref(), history_store.as_ref()).await?;
        Ok(output.is_valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatLlm;
    use agentcore_action_registry::default_registry;
    use agentcore_browser_context::fake::FakeBrowserContext;
    use agentcore_browser_context::snapshot::BrowserState;

    fn executor_with(states: Vec<BrowserState>, options: AgentOptions) -> Executor {
        Executor::new(
            "go to https://example.com",
            options,
            FakeBrowserContext::new(states),
            Arc::new(default_registry()),
            Arc::new(MockChatLlm),
        )
    }

    #[tokio::test]
    async fn completes_within_a_handful_of_steps_without_validation() {
        let executor = executor_with(
            vec![BrowserState::empty("https://a", "A", "t1")],
            AgentOptions::minimal().validate_output(false),
        );
        let outcome = executor.execute().await;
        assert_eq!(outcome.status, ExecutorStatus::Done);
        assert!(outcome.steps_taken <= 10);
    }

    #[tokio::test]
    async fn cancel_before_execute_reports_cancelled() {
        let executor = executor_with(vec![BrowserState::empty("https://a", "A", "t1")], AgentOptions::minimal());
        executor.cancel().await;
        let outcome = executor.execute().await;
        assert_eq!(outcome.status, ExecutorStatus::Cancelled);
    }

    #[tokio::test]
    async fn follow_up_task_does_not_reset_step_count() {
        let executor = executor_with(
            vec![BrowserState::empty("https://a", "A", "t1")],
            AgentOptions::minimal().validate_output(false),
        );
        let first = executor.execute().await;
        assert_eq!(first.status, ExecutorStatus::Done);
        let steps_after_first = executor.ctx.lock().await.n_steps;

        executor.add_follow_up_task("summarize the page").await;
        assert_eq!(executor.ctx.lock().await.n_steps, steps_after_first);
    }

    #[tokio::test]
    async fn replay_returns_none_when_nothing_was_persisted() {
        let executor = executor_with(vec![BrowserState::empty("https://a", "A", "t1")], AgentOptions::minimal());
        let task_id = executor.get_current_task_id().await;
        assert!(executor.replay(&task_id.to_string(), ReplayOptions::default()).await.is_none());
    }

    #[tokio::test]
    async fn replay_re_runs_persisted_history_after_a_task_with_replay_enabled() {
        let executor = executor_with(
            vec![BrowserState::empty("https://a", "A", "t1")],
            AgentOptions::minimal().validate_output(false).replay_historical_tasks(true),
        );
        let task_id = executor.get_current_task_id().await;
        let first = executor.execute().await;
        assert_eq!(first.status, ExecutorStatus::Done);

        let outcomes = executor.replay(&task_id.to_string(), ReplayOptions::default()).await;
        assert!(outcomes.is_some());
    }
}
