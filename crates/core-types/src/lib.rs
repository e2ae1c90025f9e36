#![allow(dead_code)]

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for crates that have no subsystem-specific error enum
/// of their own (logging glue, small helper modules).
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

macro_rules! newtype_id {
    ($name:ident) => {
        #[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
        #[derive(Clone, Debug, Eq, PartialEq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

/// Identifies one user task across its whole lifetime, including any
/// follow-up tasks appended to it.
newtype_id!(TaskId);
/// Identifies the browser session (tab group) a task runs against.
newtype_id!(SessionId);
/// Identifies a single browser tab within a session.
newtype_id!(TabId);
/// Identifies one executed action, used to correlate intent events.
newtype_id!(ActionId);
/// Identifies one executor step, used to correlate history entries.
newtype_id!(StepId);

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoutePrefer {
    Focused,
    RecentNav,
    MainFrame,
}

/// Routes an action to a specific session/tab, with a preference used when
/// neither is given explicitly (mirrors the bridge's own routing hints).
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RoutingHint {
    pub session: Option<SessionId>,
    pub tab: Option<TabId>,
    pub prefer: Option<RoutePrefer>,
}

/// A follow-up task appended mid-execution via `addFollowUpTask`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct FollowUpTask {
    pub task_id: TaskId,
    pub text: String,
}

impl FollowUpTask {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            task_id: TaskId::new(),
            text: text.into(),
        }
    }
}

/// Outcome of one executed action (§3). At most one of `extracted_content`
/// / `error` is set; `include_in_memory` survives step-boundary compaction
/// of `AgentContext::action_results`.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct ActionResult {
    pub is_done: Option<bool>,
    pub extracted_content: Option<String>,
    pub error: Option<String>,
    pub include_in_memory: bool,
}

impl ActionResult {
    pub fn ok(extracted_content: impl Into<String>) -> Self {
        Self {
            is_done: None,
            extracted_content: Some(extracted_content.into()),
            error: None,
            include_in_memory: false,
        }
    }

    pub fn done(extracted_content: impl Into<String>) -> Self {
        Self {
            is_done: Some(true),
            extracted_content: Some(extracted_content.into()),
            error: None,
            include_in_memory: false,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_done: None,
            extracted_content: None,
            error: Some(error.into()),
            include_in_memory: false,
        }
    }

    /// The soft success an enclosing action returns when the last-resort
    /// recovery strategy asks for graceful continuation instead of raising.
    pub fn graceful_continuation(action_name: &str) -> Self {
        Self {
            is_done: None,
            extracted_content: Some(format!("{action_name} skipped but continuing task execution")),
            error: None,
            include_in_memory: true,
        }
    }

    /// Returned when `ActionRegistry::invoke` observes cancellation while
    /// the action was in flight; the caller already knows why, so the
    /// terminal ACT_OK/ACT_FAIL event is suppressed for this result.
    pub fn cancelled() -> Self {
        Self {
            is_done: None,
            extracted_content: None,
            error: Some("cancelled".to_string()),
            include_in_memory: false,
        }
    }

    pub fn with_memory(mut self, include: bool) -> Self {
        self.include_in_memory = include;
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

const UNTRUSTED_OPEN: &str = "<untrusted_content>";
const UNTRUSTED_CLOSE: &str = "</untrusted_content>";

/// Wraps externally-derived text (page content, planner observations) so
/// downstream prompts never mistake it for an instruction.
///
/// Idempotent: wrapping an already-wrapped string is a no-op.
pub fn wrap_untrusted(content: &str) -> String {
    if content.starts_with(UNTRUSTED_OPEN) && content.ends_with(UNTRUSTED_CLOSE) {
        return content.to_string();
    }
    format!("{UNTRUSTED_OPEN}\n{content}\n{UNTRUSTED_CLOSE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }

    #[test]
    fn wrap_untrusted_is_idempotent() {
        let once = wrap_untrusted("click submit");
        let twice = wrap_untrusted(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn wrap_untrusted_changes_content() {
        assert_ne!(wrap_untrusted("hello"), "hello");
    }
}
