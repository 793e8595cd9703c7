use std::fmt;

use pilot_core_types::Location;
use serde::Serialize;

/// Position of a session in the assessment workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    LoggedOut,
    Authenticating,
    Navigating,
    AssessmentAvailable,
    KeyVerification,
    AssessmentRunning,
    AssessmentEnding,
    Done,
    Failed,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::LoggedOut => "logged_out",
            WorkflowState::Authenticating => "authenticating",
            WorkflowState::Navigating => "navigating",
            WorkflowState::AssessmentAvailable => "assessment_available",
            WorkflowState::KeyVerification => "key_verification",
            WorkflowState::AssessmentRunning => "assessment_running",
            WorkflowState::AssessmentEnding => "assessment_ending",
            WorkflowState::Done => "done",
            WorkflowState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Done | WorkflowState::Failed)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable session bookkeeping, reset at the start of every run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub state: WorkflowState,
    pub current_location: Option<Location>,
    pub questions_answered: u32,
    pub questions_failed: u32,
    pub consecutive_failures: u32,
    pub unmapped_answers: u32,
    pub assessments_completed: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            state: WorkflowState::LoggedOut,
            current_location: None,
            questions_answered: 0,
            questions_failed: 0,
            consecutive_failures: 0,
            unmapped_answers: 0,
            assessments_completed: 0,
        }
    }
}

impl SessionState {
    pub fn report(&self) -> SessionReport {
        SessionReport {
            assessments_completed: self.assessments_completed,
            questions_answered: self.questions_answered,
            questions_failed: self.questions_failed,
            unmapped_answers: self.unmapped_answers,
            final_state: self.state,
        }
    }
}

/// Summary returned by a session run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    pub assessments_completed: u32,
    pub questions_answered: u32,
    pub questions_failed: u32,
    pub unmapped_answers: u32,
    pub final_state: WorkflowState,
}
