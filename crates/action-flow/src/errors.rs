//! Flow execution error types

use action_primitives::ActionError;
use pilot_core_types::Instruction;
use thiserror::Error;

/// Errors surfaced by the resilient executor
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Fallback observation returned zero candidates
    #[error("No candidates found for '{0}'")]
    TargetNotFound(Instruction),

    /// A single actuator call failed
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Every attempt of a retried action failed
    #[error("Action '{instruction}' failed after {attempts} attempts: {source}")]
    Exhausted {
        instruction: Instruction,
        attempts: u32,
        #[source]
        source: ActionError,
    },
}

impl FlowError {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::TargetNotFound(_) => "target_not_found",
            FlowError::Action(err) => err.kind(),
            FlowError::Exhausted { .. } => "exhausted",
        }
    }
}

/// Whether another attempt of the same operation could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for ActionError {
    fn is_retryable(&self) -> bool {
        ActionError::is_retryable(self)
    }
}

impl Retryable for FlowError {
    fn is_retryable(&self) -> bool {
        match self {
            FlowError::TargetNotFound(_) | FlowError::Exhausted { .. } => false,
            FlowError::Action(err) => err.is_retryable(),
        }
    }
}
