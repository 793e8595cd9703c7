//! Error types for actuator operations

use thiserror::Error;

/// Failures surfaced by an actuator implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The direct natural-language action failed; the cause is opaque
    #[error("Direct action failed: {0}")]
    ActFailed(String),

    /// Locating candidates failed (distinct from "zero candidates")
    #[error("Locate failed: {0}")]
    LocateFailed(String),

    /// Invoking a previously located descriptor failed
    #[error("Invoke failed: {0}")]
    InvokeFailed(String),

    /// A bounded wait elapsed before its condition held
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Communication with the driver process failed
    #[error("Driver transport error: {0}")]
    Transport(String),

    /// The actuator does not implement the requested capability
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ActionError::Unsupported(_) | ActionError::Internal(_))
    }

    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::ActFailed(_) => "act",
            ActionError::LocateFailed(_) => "locate",
            ActionError::InvokeFailed(_) => "invoke",
            ActionError::WaitTimeout(_) => "wait_timeout",
            ActionError::Transport(_) => "transport",
            ActionError::Unsupported(_) => "unsupported",
            ActionError::Internal(_) => "internal",
        }
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::Transport(_) | ActionError::Unsupported(_) => 2,
            ActionError::WaitTimeout(_) | ActionError::LocateFailed(_) => 1,
            _ => 0,
        }
    }
}
