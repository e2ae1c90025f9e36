//! ValidatorAgent (§4.8): checks whether the task goal appears satisfied on
//! the current page, consulted after any `done=true` path when
//! `options.validate_output` is enabled.

use agentcore_browser_context::BrowserState;
use serde::{Deserialize, Serialize};

use crate::errors::AgentError;
use crate::llm::ChatLlm;
use crate::message_history::MessageHistoryStore;
use crate::prompt::format_state_summary;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorOutput {
    pub is_valid: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

pub struct ValidatorAgent;

impl ValidatorAgent {
    pub fn new() -> Self {
        Self
    }

    pub async fn step(
        &self,
        task: &str,
        state: &BrowserState,
        llm: &dyn ChatLlm,
        history_store: &dyn MessageHistoryStore,
    ) -> Result<ValidatorOutput, AgentError> {
        let summary = format_state_summary(state);
        llm.validate(history_store.messages(), task, &summary).await
    }
}

impl Default for ValidatorAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_valid_output() {
        let output: ValidatorOutput = serde_json::from_value(serde_json::json!({"is_valid": true})).unwrap();
        assert!(output.is_valid);
        assert!(output.reason.is_none());
    }
}
