//! Actuator capability interface

use async_trait::async_trait;
use pilot_core_types::{Descriptor, Instruction, Location};
use std::time::Duration;

use crate::{errors::ActionError, types::WaitCondition};

/// One capability interface with two action modalities
///
/// Implementations drive a single-viewport interface and are never called
/// concurrently by the orchestrator. Every method is a suspension point and
/// is expected to enforce its own timeout.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Interpret and execute the instruction immediately
    async fn act(&self, instruction: &Instruction) -> Result<(), ActionError>;

    /// Locate candidates matching the description, best first
    ///
    /// An empty list is a valid answer and not an error.
    async fn locate(&self, instruction: &Instruction) -> Result<Vec<Descriptor>, ActionError>;

    /// Invoke a descriptor produced by an earlier `locate`
    async fn invoke(&self, descriptor: &Descriptor) -> Result<(), ActionError>;

    /// Read the current location
    async fn read_location(&self) -> Result<Location, ActionError>;

    /// Wait until the condition holds or the timeout elapses
    async fn wait_for(
        &self,
        condition: &WaitCondition,
        timeout: Duration,
    ) -> Result<(), ActionError>;

    /// Replace the value of a located input with `text`
    async fn fill(&self, descriptor: &Descriptor, text: &str) -> Result<(), ActionError> {
        let _ = (descriptor, text);
        Err(ActionError::Unsupported("fill".to_string()))
    }

    /// Read the visible text of a located element
    async fn read_text(&self, descriptor: &Descriptor) -> Result<String, ActionError> {
        let _ = descriptor;
        Err(ActionError::Unsupported("read_text".to_string()))
    }

    /// Visually mark candidates (diagnostic only)
    async fn mark(&self, candidates: &[Descriptor]) -> Result<(), ActionError> {
        let _ = candidates;
        Ok(())
    }

    /// Remove every mark placed by `mark`
    async fn clear_marks(&self) -> Result<(), ActionError> {
        Ok(())
    }

    /// Record diagnostic evidence (a screenshot, say) under `label`
    ///
    /// Returns any error message the interface currently shows.
    async fn capture(&self, label: &str) -> Result<Option<String>, ActionError> {
        let _ = label;
        Ok(None)
    }
}
