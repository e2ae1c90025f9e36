//! Chat LLM adapter (§6): given a system prompt (folded into the message
//! history by the caller), a message history, and a response schema,
//! return either a structured object or a typed error in
//! `{auth, forbidden, cancelled, other}`. The core depends only on this
//! capability — no provider specifics live here.

use async_trait::async_trait;

use crate::context::StepInfo;
use crate::errors::AgentError;
use crate::message_history::Message;
use crate::navigator::{NavigatorAction, NavigatorDecision};
use crate::planner::PlannerOutput;
use crate::validator::ValidatorOutput;

#[async_trait]
pub trait ChatLlm: Send + Sync {
    /// Navigator's per-step decision: an ordered action list capped by the
    /// caller at `maxActionsPerStep`.
    async fn decide(
        &self,
        history: &[Message],
        url: &str,
        element_tree: &str,
        step_info: StepInfo,
    ) -> Result<NavigatorDecision, AgentError>;

    /// Planner's periodic (or validator-failure-triggered) plan revision.
    async fn plan(
        &self,
        history: &[Message],
        state_summary: &str,
        task: &str,
        validator_failed: bool,
    ) -> Result<PlannerOutput, AgentError>;

    /// Validator's goal-satisfaction check, run after a `done=true` path
    /// when `options.validate_output` is enabled.
    async fn validate(&self, history: &[Message], task: &str, state_summary: &str) -> Result<ValidatorOutput, AgentError>;
}

/// Deterministic provider used for tests and offline development. Declares
/// the task done after three navigator steps, clicks the first indexed
/// element while elements are present, and otherwise waits — matching the
/// shape of a minimal but plausible agent loop without any real model
/// behind it.
#[derive(Debug, Default, Clone)]
pub struct MockChatLlm;

#[async_trait]
impl ChatLlm for MockChatLlm {
    async fn decide(
        &self,
        history: &[Message],
        url: &str,
        element_tree: &str,
        step_info: StepInfo,
    ) -> Result<NavigatorDecision, AgentError> {
        let _ = history;
        if step_info.step_number >= 3 {
            return Ok(NavigatorDecision {
                thinking: Some(format!("after {} steps on {url}, task should be complete", step_info.step_number)),
                evaluation_previous_goal: Some("previous step completed".to_string()),
                memory: Some(format!("completed {} steps", step_info.step_number)),
                next_goal: Some("signal task completion".to_string()),
                actions: vec![NavigatorAction {
                    name: "done".to_string(),
                    input: serde_json::json!({"success": true, "text": "mock task completed"}),
                }],
            });
        }

        let action = if element_tree.trim().is_empty() {
            NavigatorAction { name: "wait".to_string(), input: serde_json::json!({"seconds": 1}) }
        } else {
            NavigatorAction { name: "click_element".to_string(), input: serde_json::json!({"index": 0}) }
        };

        Ok(NavigatorDecision {
            thinking: Some(format!("analyzing page at {url}")),
            evaluation_previous_goal: if step_info.step_number == 0 { None } else { Some("previous action completed".to_string()) },
            memory: None,
            next_goal: Some(format!("continue task execution (step {})", step_info.step_number + 1)),
            actions: vec![action],
        })
    }

    async fn plan(
        &self,
        history: &[Message],
        state_summary: &str,
        task: &str,
        validator_failed: bool,
    ) -> Result<PlannerOutput, AgentError> {
        let _ = (history, validator_failed);
        Ok(PlannerOutput {
            observation: format!("current state: {state_summary}"),
            next_steps: vec![format!("proceed toward: {task}")],
            web_task: true,
            done: false,
        })
    }

    async fn validate(&self, history: &[Message], task: &str, state_summary: &str) -> Result<ValidatorOutput, AgentError> {
        let _ = (history, task, state_summary);
        Ok(ValidatorOutput { is_valid: true, reason: Some("mock validator always approves".to_string()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StepInfo;

    #[tokio::test]
    async fn mock_decides_click_when_elements_present() {
        let llm = MockChatLlm;
        let decision = llm
            .decide(&[], "https://a", "[0]<button>Go</button>", StepInfo { step_number: 0, max_steps: 10 })
            .await
            .unwrap();
        assert_eq!(decision.actions[0].name, "click_element");
    }

    #[tokio::test]
    async fn mock_waits_when_no_elements() {
        let llm = MockChatLlm;
        let decision = llm
            .decide(&[], "https://a", "", StepInfo { step_number: 0, max_steps: 10 })
            .await
            .unwrap();
        assert_eq!(decision.actions[0].name, "wait");
    }

    #[tokio::test]
    async fn mock_declares_done_after_three_steps() {
        let llm = MockChatLlm;
        let decision = llm
            .decide(&[], "https://a", "[0]<button>Go</button>", StepInfo { step_number: 3, max_steps: 10 })
            .await
            .unwrap();
        assert_eq!(decision.actions[0].name, "done");
    }
}
