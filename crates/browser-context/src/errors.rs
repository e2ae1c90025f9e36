use thiserror::Error;

/// Errors a [`crate::BrowserContext`] or [`crate::Page`] implementation may
/// raise. `URLNotAllowed` is always fatal to the enclosing task; the rest
/// are candidates for error-recovery strategies.
#[derive(Debug, Error, Clone)]
pub enum BrowserContextError {
    #[error("navigation timed out: {0}")]
    NavTimeout(String),
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("element is no longer available: {0}")]
    ElementStale(String),
    #[error("element is not clickable: {0}")]
    NotClickable(String),
    #[error("url not allowed by policy: {0}")]
    URLNotAllowed(String),
    #[error("tab not found: {0}")]
    TabNotFound(String),
    #[error("dropdown option not found: {0}")]
    OptionNotFound(String),
    #[error("scroll target invalid: {0}")]
    ScrollTargetInvalid(String),
    #[error("evaluation failed: {0}")]
    EvalFailed(String),
    #[error("internal browser context error: {0}")]
    Internal(String),
}

impl BrowserContextError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrowserContextError::URLNotAllowed(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrowserContextError::NavTimeout(_)
                | BrowserContextError::ElementNotFound(_)
                | BrowserContextError::ElementStale(_)
                | BrowserContextError::NotClickable(_)
        )
    }
}
