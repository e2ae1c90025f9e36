//! Message history store (§6). Append-only ordered log of chat messages
//! plus a compaction hook. The core never persists messages itself — it
//! only depends on this contract.

use serde::{Deserialize, Serialize};

use crate::context::Task;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Where a plan gets inserted into the running history.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlanPosition {
    /// Replace the last assistant message (e.g. after a replan).
    ReplaceLast,
    /// Append as a new message.
    Append,
}

/// `initTaskMessages` / `addPlan` / `addNewTask` (§6).
pub trait MessageHistoryStore: Send + Sync {
    fn init_task_messages(&mut self, system_prompt: &str, task: &Task);
    fn add_plan(&mut self, plan_json: &str, position: PlanPosition);
    fn add_new_task(&mut self, task: &Task);
    fn messages(&self) -> &[Message];
    fn compact(&mut self, max_input_tokens: u32);
}

/// In-process history store. Token budget is approximated the way the
/// teacher's prompt layer approximates context length elsewhere in this
/// codebase: by character count, ~4 characters per token.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMessageHistory {
    messages: Vec<Message>,
}

impl InMemoryMessageHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageHistoryStore for InMemoryMessageHistory {
    fn init_task_messages(&mut self, system_prompt: &str, task: &Task) {
        self.messages.clear();
        self.messages.push(Message::system(system_prompt));
        self.messages.push(Message::user(task.text.clone()));
    }

    fn add_plan(&mut self, plan_json: &str, position: PlanPosition) {
        match position {
            PlanPosition::ReplaceLast if matches!(self.messages.last(), Some(m) if m.role == Role::Assistant) => {
                self.messages.pop();
                self.messages.push(Message::assistant(plan_json));
            }
            _ => self.messages.push(Message::assistant(plan_json)),
        }
    }

    fn add_new_task(&mut self, task: &Task) {
        self.messages.push(Message::user(format!("Follow-up task: {}", task.text)));
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn compact(&mut self, max_input_tokens: u32) {
        let budget_chars = (max_input_tokens as usize) * 4;
        let mut total: usize = self.messages.iter().map(|m| m.content.len()).sum();
        // Always keep the leading system message and the most recent
        // message; drop the oldest non-system entries first.
        let mut i = 1;
        while total > budget_chars && self.messages.len() > 2 && i < self.messages.len() - 1 {
            let removed = self.messages.remove(i);
            total -= removed.content.len();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_seeds_system_and_task_messages() {
        let mut store = InMemoryMessageHistory::new();
        store.init_task_messages("be helpful", &Task::new("book a flight"));
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[0].role, Role::System);
    }

    #[test]
    fn add_new_task_appends_without_clearing_history() {
        let mut store = InMemoryMessageHistory::new();
        store.init_task_messages("be helpful", &Task::new("book a flight"));
        store.add_new_task(&Task::new("summarize the page"));
        assert_eq!(store.messages().len(), 3);
    }

    #[test]
    fn compact_keeps_system_and_latest_message() {
        let mut store = InMemoryMessageHistory::new();
        store.init_task_messages("s", &Task::new("t"));
        for i in 0..20 {
            store.add_plan(&"x".repeat(200), PlanPosition::Append);
            let _ = i;
        }
        store.compact(10);
        assert_eq!(store.messages().first().unwrap().role, Role::System);
        assert!(store.messages().len() >= 2);
    }
}
