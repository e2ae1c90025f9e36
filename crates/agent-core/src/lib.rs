//! Planner / Navigator / Validator agents and the top-level Executor
//! (§4.7-4.9). This crate wires the lower-level crates (action registry,
//! element finder, error recovery, waiting, DOM-change classification)
//! into the state machine described in §4.9: `Idle -> Running ->
//! (Paused <-> Running) -> Done | Failed | Cancelled`.

pub mod context;
pub mod errors;
pub mod executor;
pub mod llm;
pub mod message_history;
pub mod navigator;
pub mod options;
pub mod planner;
pub mod prompt;
pub mod replay;
pub mod validator;

pub use context::{AgentContext, ExecutionContext, ExecutionMode, HistoryEntry, StepInfo, Task};
pub use errors::AgentError;
pub use executor::{Executor, ExecutorOutcome, ExecutorStatus};
pub use llm::{ChatLlm, MockChatLlm};
pub use message_history::{InMemoryMessageHistory, Message, MessageHistoryStore, PlanPosition, Role};
pub use navigator::{NavigatorAction, NavigatorAgent, NavigatorDecision, NavigatorStepOutcome};
pub use options::AgentOptions;
pub use planner::{PlannerAgent, PlannerOutput};
pub use prompt::{format_element_tree, format_state_summary};
pub use replay::{
    replay_history, InMemoryReplayStore, PersistedHistory, PersistedModelOutput, PersistedState,
    PersistedStep, ReplayOptions, ReplayStepOutcome, ReplayStore,
};
pub use validator::{ValidatorAgent, ValidatorOutput};
