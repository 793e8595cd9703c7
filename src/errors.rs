//! Workflow-level errors

use thiserror::Error;

use crate::config::ConfigError;
use crate::workflow::WorkflowState;

/// Failures that end a session
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A step the rest of the session depends on did not succeed
    #[error("{step} failed: {reason}")]
    Structural { step: WorkflowState, reason: String },

    #[error(
        "aborted after {consecutive} consecutive question failures (last failed question: {last_question})"
    )]
    TooManyFailures { consecutive: u32, last_question: u32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WorkflowError {
    pub fn structural(step: WorkflowState, reason: impl Into<String>) -> Self {
        Self::Structural {
            step,
            reason: reason.into(),
        }
    }

    /// State the session was in when it failed, if it got that far
    pub fn step(&self) -> Option<WorkflowState> {
        match self {
            WorkflowError::Structural { step, .. } => Some(*step),
            WorkflowError::TooManyFailures { .. } => Some(WorkflowState::AssessmentRunning),
            WorkflowError::Config(_) => None,
        }
    }
}
