use thiserror::Error;

/// Errors the core distinguishes (§7). Fatal variants propagate through the
/// Executor unchanged and fail the task immediately; everything else is
/// either routed through error-recovery upstream of this crate or handled
/// as a normal `Err(AgentError)` return from a single step.
#[derive(Debug, Error, Clone)]
pub enum AgentError {
    #[error("invalid agent request: {0}")]
    InvalidRequest(String),

    #[error("unsupported plan element: {0}")]
    UnsupportedPlan(String),

    #[error("the browser extension reported a conflicting session: {0}")]
    ExtensionConflict(String),

    #[error("url not allowed by policy: {0}")]
    UrlNotAllowed(String),

    #[error("chat model rejected the request: invalid credentials ({0})")]
    ChatModelAuth(String),

    #[error("chat model rejected the request: forbidden ({0})")]
    ChatModelForbidden(String),

    #[error("request cancelled")]
    RequestCancelled,

    #[error("too many consecutive failures: {0}")]
    TooManyFailures(u32),

    #[error("too many consecutive validator failures: {0}")]
    TooManyValidatorFailures(u32),

    #[error("{0}")]
    Other(String),
}

impl AgentError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedPlan(message.into())
    }

    /// Whether this error must propagate unchanged through the Executor
    /// rather than being retried or counted against `consecutiveFailures`.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::ExtensionConflict(_)
                | AgentError::UrlNotAllowed(_)
                | AgentError::ChatModelAuth(_)
                | AgentError::ChatModelForbidden(_)
                | AgentError::RequestCancelled
        )
    }
}
