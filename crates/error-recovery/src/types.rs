//! Data model for error recovery (§3, §4.4).

use action_locator::TargetingStrategy;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActionKind {
    Click,
    Input,
    Scroll,
    Navigation,
    Wait,
    Other,
}

/// Context threaded through one `execute_with_recovery` call. Strategies
/// read `original_error`/`attempt_count` and may rewrite `targeting_strategy`
/// for the next retry.
#[derive(Clone, Debug)]
pub struct RecoveryContext {
    pub original_error: String,
    pub action_type: ActionKind,
    pub targeting_strategy: Option<TargetingStrategy>,
    pub attempt_count: u32,
    pub max_attempts: u32,
    /// Checked between retry attempts and passed down into every strategy's
    /// own waits, so cancelling the enclosing task aborts a recovery chain
    /// instead of running it to exhaustion.
    pub cancel_token: CancellationToken,
}

impl RecoveryContext {
    pub fn new(action_type: ActionKind, targeting_strategy: Option<TargetingStrategy>) -> Self {
        Self {
            original_error: String::new(),
            action_type,
            targeting_strategy,
            attempt_count: 0,
            max_attempts: 3,
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }
}

/// What a single recovery strategy decided to do.
#[derive(Clone, Debug)]
pub struct RecoveryOutcome {
    pub success: bool,
    pub should_retry: bool,
    pub should_continue: bool,
    pub modified_strategy: Option<TargetingStrategy>,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl RecoveryOutcome {
    pub fn retry(message: impl Into<String>) -> Self {
        Self {
            success: true,
            should_retry: true,
            should_continue: false,
            modified_strategy: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn retry_with(message: impl Into<String>, strategy: TargetingStrategy) -> Self {
        Self {
            success: true,
            should_retry: true,
            should_continue: false,
            modified_strategy: Some(strategy),
            message: message.into(),
            details: None,
        }
    }

    pub fn inapplicable(message: impl Into<String>) -> Self {
        Self {
            success: false,
            should_retry: false,
            should_continue: false,
            modified_strategy: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn graceful_continue(message: impl Into<String>) -> Self {
        Self {
            success: true,
            should_retry: false,
            should_continue: true,
            modified_strategy: None,
            message: message.into(),
            details: None,
        }
    }

    pub fn timed_out(strategy_name: &str) -> Self {
        Self::inapplicable(format!("{strategy_name} timed out after 5s"))
    }
}

/// One strategy attempt, recorded for the final result's `details`.
#[derive(Clone, Debug, serde::Serialize)]
pub struct AttemptLog {
    pub strategy: String,
    pub message: String,
    pub duration_ms: u64,
}

/// Final result of `execute_with_recovery`.
pub enum RecoveryRunResult<T> {
    /// The wrapped action (first try or a retry) succeeded.
    Success(T),
    /// The last-resort strategy asked the caller to convert this into a
    /// soft ActionResult instead of raising.
    GracefulContinue {
        message: String,
        attempts: Vec<AttemptLog>,
    },
    /// Every applicable strategy was exhausted, or none applied.
    Failed {
        error: String,
        attempts: Vec<AttemptLog>,
    },
}
