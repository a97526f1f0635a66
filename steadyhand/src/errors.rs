use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element is not visible: {0}")]
    ElementNotVisible(String),

    #[error("Element is not enabled: {0}")]
    ElementNotEnabled(String),

    #[error("Element is detached from DOM: {0}")]
    ElementDetached(String),

    #[error("Frame not available: {0}")]
    NoSuchFrame(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutomationError {
    /// Whether the error only means "the awaited state does not hold yet".
    ///
    /// Waits treat these as another reason to poll again; everything else
    /// aborts the wait.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AutomationError::ElementNotFound(_)
                | AutomationError::ElementNotVisible(_)
                | AutomationError::ElementNotEnabled(_)
                | AutomationError::ElementDetached(_)
                | AutomationError::NoSuchFrame(_)
        )
    }
}
