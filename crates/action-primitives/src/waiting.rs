//! Observation polling and bounded waits

use pilot_core_types::{Descriptor, Instruction};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::{
    actuator::Actuator,
    errors::ActionError,
    types::{PollOptions, WaitCondition},
};

/// Poll `locate` until it returns candidates or the time budget runs out
///
/// Observation has no failure mode of its own: a timeout yields an empty
/// list, and transient locate errors are logged and polled through. Only
/// errors that can never succeed on retry are returned.
pub async fn poll_candidates(
    actuator: &dyn Actuator,
    instruction: &Instruction,
    options: PollOptions,
) -> Result<Vec<Descriptor>, ActionError> {
    let deadline = Instant::now() + options.timeout;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match actuator.locate(instruction).await {
            Ok(candidates) if !candidates.is_empty() => {
                debug!(
                    instruction = %instruction,
                    attempt,
                    found = candidates.len(),
                    "observation found candidates"
                );
                return Ok(candidates);
            }
            Ok(_) => {
                debug!(instruction = %instruction, attempt, "observation returned no candidates");
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                warn!(instruction = %instruction, attempt, %err, "observation attempt failed");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(Vec::new());
        }
        let remaining = deadline - now;
        sleep(options.interval.min(remaining)).await;
    }
}

/// Wait for a condition, reporting a timeout as `false` rather than an error
pub async fn wait_until(
    actuator: &dyn Actuator,
    condition: &WaitCondition,
    timeout: Duration,
) -> Result<bool, ActionError> {
    match actuator.wait_for(condition, timeout).await {
        Ok(()) => Ok(true),
        Err(ActionError::WaitTimeout(reason)) => {
            debug!(?condition, %reason, "wait condition not met before timeout");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pilot_core_types::Location;
    use serde_json::json;

    struct CountdownActuator {
        empty_polls: Mutex<u32>,
        calls: Mutex<u32>,
        error: Option<ActionError>,
    }

    impl CountdownActuator {
        fn new(empty_polls: u32) -> Self {
            Self {
                empty_polls: Mutex::new(empty_polls),
                calls: Mutex::new(0),
                error: None,
            }
        }
    }

    #[async_trait]
    impl Actuator for CountdownActuator {
        async fn act(&self, _instruction: &Instruction) -> Result<(), ActionError> {
            Ok(())
        }

        async fn locate(&self, _instruction: &Instruction) -> Result<Vec<Descriptor>, ActionError> {
            *self.calls.lock() += 1;
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            let mut remaining = self.empty_polls.lock();
            if *remaining == 0 {
                Ok(vec![Descriptor::new(json!({ "selector": "#start" }))])
            } else {
                *remaining -= 1;
                Ok(Vec::new())
            }
        }

        async fn invoke(&self, _descriptor: &Descriptor) -> Result<(), ActionError> {
            Ok(())
        }

        async fn read_location(&self) -> Result<Location, ActionError> {
            Ok(Location::new("https://portal/list"))
        }

        async fn wait_for(
            &self,
            condition: &WaitCondition,
            _timeout: Duration,
        ) -> Result<(), ActionError> {
            match condition {
                WaitCondition::DomReady => Ok(()),
                _ => Err(ActionError::WaitTimeout("never".into())),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_returns_once_candidates_appear() {
        let actuator = CountdownActuator::new(2);
        let found = poll_candidates(
            &actuator,
            &Instruction::new("the Start button"),
            PollOptions::new(Duration::from_secs(5), Duration::from_millis(500)),
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(*actuator.calls.lock(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_times_out_with_empty_list() {
        let actuator = CountdownActuator::new(u32::MAX);
        let found = poll_candidates(
            &actuator,
            &Instruction::new("the Start button"),
            PollOptions::new(Duration::from_secs(2), Duration::from_millis(500)),
        )
        .await
        .unwrap();
        assert!(found.is_empty());
        assert_eq!(*actuator.calls.lock(), 5);
    }

    #[tokio::test]
    async fn single_observation_does_not_sleep() {
        let actuator = CountdownActuator::new(1);
        let found = poll_candidates(&actuator, &Instruction::new("x"), PollOptions::once())
            .await
            .unwrap();
        assert!(found.is_empty());
        assert_eq!(*actuator.calls.lock(), 1);
    }

    #[tokio::test]
    async fn unsupported_locate_is_returned() {
        let mut actuator = CountdownActuator::new(0);
        actuator.error = Some(ActionError::Unsupported("locate".into()));
        let err = poll_candidates(&actuator, &Instruction::new("x"), PollOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::Unsupported("locate".into()));
    }

    #[tokio::test]
    async fn wait_timeout_maps_to_false() {
        let actuator = CountdownActuator::new(0);
        let met = wait_until(
            &actuator,
            &WaitCondition::LocationContains {
                marker: "home".into(),
            },
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert!(!met);
        assert!(
            wait_until(&actuator, &WaitCondition::DomReady, Duration::from_millis(10))
                .await
                .unwrap()
        );
    }
}
