//! Assessment workflow state machine
//!
//! ```text
//! LoggedOut -> Authenticating -> Navigating -> AssessmentAvailable
//!   AssessmentAvailable -> KeyVerification -> AssessmentRunning
//!     -> AssessmentEnding -> AssessmentAvailable
//!   AssessmentAvailable -> Done            (no Start button left)
//!   any structural step -> Failed
//! ```
//!
//! The session decides what a failure means; every interaction goes through
//! the resilient executor.

mod assessment;
pub mod instructions;
mod login;
mod navigation;
mod questions;
mod session;
mod state;

pub use session::{AssessmentSession, SessionSettings};
pub use state::{SessionReport, SessionState, WorkflowState};
