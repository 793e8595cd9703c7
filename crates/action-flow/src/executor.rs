//! Cache-first, direct-then-fallback action executor

use std::sync::Arc;
use std::time::Duration;

use action_cache::ActionCache;
use action_primitives::{poll_candidates, ActionError, Actuator, PollOptions};
use pilot_core_types::{Descriptor, Fingerprint, Instruction};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::errors::FlowError;
use crate::marking::with_marks;
use crate::observer::{ExecutorObserver, NoopObserver};
use crate::retry::{with_retry, RetryPolicy};
use crate::types::{ActionOutcome, ActionPath, ActionRequest, ExecutorConfig};

/// Sole issuer of interaction calls against the actuator
///
/// The executor knows nothing about the workflow it serves: callers supply
/// the fingerprint (current location plus instruction) and decide what a
/// failure means.
pub struct ResilientExecutor {
    actuator: Arc<dyn Actuator>,
    cache: Arc<ActionCache>,
    config: ExecutorConfig,
    observer: Arc<dyn ExecutorObserver>,
}

impl ResilientExecutor {
    pub fn new(actuator: Arc<dyn Actuator>, cache: Arc<ActionCache>, config: ExecutorConfig) -> Self {
        Self {
            actuator,
            cache,
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ExecutorObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn actuator(&self) -> &Arc<dyn Actuator> {
        &self.actuator
    }

    pub fn cache(&self) -> &Arc<ActionCache> {
        &self.cache
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Perform one action: cached descriptor, then direct command, then
    /// locate-and-invoke.
    #[instrument(skip_all, fields(instruction = %request.display_instruction()))]
    pub async fn perform(
        &self,
        request: &ActionRequest,
        fingerprint: &Fingerprint,
    ) -> Result<ActionOutcome, FlowError> {
        let cache_request = request.cache_request(fingerprint);
        let mut calls = 0u32;

        if let Some(descriptor) = self.cache.resolve(&cache_request) {
            calls += 1;
            match self.apply(request, &descriptor).await {
                Ok(()) => return Ok(self.finish(ActionPath::Cached, calls).await),
                Err(err) => {
                    warn!(%fingerprint, %descriptor, %err, "cached descriptor failed; invalidating");
                    self.cache.invalidate(fingerprint);
                    self.observer.record_failure("stale_cache");
                }
            }
        }

        calls += 1;
        match self.actuator.act(&request.instruction).await {
            Ok(()) => return Ok(self.finish(ActionPath::Direct, calls).await),
            Err(err) => {
                debug!(%err, "direct action failed; falling back to locate");
                self.observer.record_failure(err.kind());
            }
        }

        let target = request.locate_target();
        calls += 1;
        let candidates = match self.actuator.locate(target).await {
            Ok(candidates) => candidates,
            Err(err) => {
                self.observer.record_failure(err.kind());
                return Err(FlowError::Action(err));
            }
        };
        let Some(descriptor) = candidates.into_iter().next() else {
            warn!(locate_target = %target, "fallback located no candidates");
            self.observer.record_failure("target_not_found");
            return Err(FlowError::TargetNotFound(target.clone()));
        };

        // Marks are cleared before the element is touched.
        with_marks(
            self.actuator.as_ref(),
            std::slice::from_ref(&descriptor),
            pause(self.config.mark_settle),
        )
        .await;

        calls += 1;
        if let Err(err) = self.apply(request, &descriptor).await {
            self.observer.record_failure(err.kind());
            return Err(FlowError::Action(err));
        }

        if self.cache.store_for(&cache_request, descriptor) {
            debug!(%fingerprint, "fallback resolution cached");
        }
        Ok(self.finish(ActionPath::Fallback, calls).await)
    }

    /// `perform` under a retry policy; target-not-found is never retried
    pub async fn perform_with_retry(
        &self,
        request: &ActionRequest,
        fingerprint: &Fingerprint,
        policy: &RetryPolicy,
    ) -> Result<ActionOutcome, FlowError> {
        let label = request.display_instruction().as_str();
        match with_retry(label, policy, || self.perform(request, fingerprint)).await {
            Err(FlowError::Action(source)) if source.is_retryable() && policy.max_attempts > 1 => {
                Err(FlowError::Exhausted {
                    instruction: request.display_instruction().clone(),
                    attempts: policy.max_attempts,
                    source,
                })
            }
            other => other,
        }
    }

    /// Single read-only observation; never marks and never caches
    pub async fn probe(&self, instruction: &Instruction) -> Result<Vec<Descriptor>, FlowError> {
        Ok(self.actuator.locate(instruction).await?)
    }

    /// Observe repeatedly until candidates appear or `timeout` elapses
    pub async fn probe_until(
        &self,
        instruction: &Instruction,
        timeout: Duration,
    ) -> Result<Vec<Descriptor>, FlowError> {
        let options = PollOptions::new(timeout, self.config.poll_interval);
        Ok(poll_candidates(self.actuator.as_ref(), instruction, options).await?)
    }

    /// Fill the element when the request carries a value, otherwise invoke it
    async fn apply(&self, request: &ActionRequest, descriptor: &Descriptor) -> Result<(), ActionError> {
        match request.input.as_deref() {
            Some(value) => self.actuator.fill(descriptor, value).await,
            None => self.actuator.invoke(descriptor).await,
        }
    }

    async fn finish(&self, path: ActionPath, actuator_calls: u32) -> ActionOutcome {
        info!(path = %path, actuator_calls, "action completed");
        self.observer.record_path(path);
        pause(self.config.settle).await;
        ActionOutcome {
            path,
            actuator_calls,
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}
