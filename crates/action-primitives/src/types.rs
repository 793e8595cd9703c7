//! Core data types for actuator calls

use pilot_core_types::{Instruction, Location};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Conditions an actuator can wait for
///
/// The actuator evaluates these against the live interface; the
/// orchestrator only chooses the condition and the timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WaitCondition {
    /// Document finished loading
    DomReady,

    /// Something matching the description is rendered and visible
    Visible { instruction: Instruction },

    /// Location differs from the given one
    LocationChanged { from: Location },

    /// Location contains the given marker
    LocationContains { marker: String },
}

/// Polling parameters for repeated observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Total time budget for the poll
    pub timeout: Duration,

    /// Pause between two locate attempts
    pub interval: Duration,
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Single observation with no waiting
    pub fn once() -> Self {
        Self {
            timeout: Duration::ZERO,
            interval: Duration::ZERO,
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_condition_wire_format() {
        let condition = WaitCondition::LocationChanged {
            from: Location::new("https://portal/login.htm"),
        };
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["kind"], "location_changed");
        assert_eq!(json["from"], "https://portal/login.htm");
    }

    #[test]
    fn default_poll_options() {
        let options = PollOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.interval, Duration::from_millis(500));
        assert_eq!(PollOptions::once().timeout, Duration::ZERO);
    }
}
