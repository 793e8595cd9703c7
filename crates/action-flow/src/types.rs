//! Request and outcome types for the resilient executor

use action_cache::CacheRequest;
use pilot_core_types::{Fingerprint, Instruction};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// One intended interaction
#[derive(Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Direct semantic command, also the cache key component
    pub instruction: Instruction,

    /// Description used for the fallback `locate` instead of `instruction`
    pub locate_hint: Option<Instruction>,

    /// Never read from or written to the cache
    pub volatile: bool,

    /// Skip the cache lookup but store the fresh resolution
    pub force_refresh: bool,

    /// Per-call TTL for the cache lookup
    pub ttl: Option<Duration>,

    /// Instruction carries a secret; logs and errors show the locate target
    /// instead. Implies volatile.
    pub sensitive: bool,

    /// Value typed into the resolved element instead of invoking it
    pub input: Option<String>,
}

impl fmt::Debug for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = match (&self.input, self.sensitive) {
            (Some(_), true) => Some("<redacted>"),
            (Some(value), false) => Some(value.as_str()),
            (None, _) => None,
        };
        f.debug_struct("ActionRequest")
            .field("instruction", self.display_instruction())
            .field("locate_hint", &self.locate_hint)
            .field("volatile", &self.volatile)
            .field("force_refresh", &self.force_refresh)
            .field("ttl", &self.ttl)
            .field("sensitive", &self.sensitive)
            .field("input", &input)
            .finish()
    }
}

impl ActionRequest {
    pub fn new(instruction: impl Into<Instruction>) -> Self {
        Self {
            instruction: instruction.into(),
            locate_hint: None,
            volatile: false,
            force_refresh: false,
            ttl: None,
            sensitive: false,
            input: None,
        }
    }

    /// Typing a secret: never cached and never logged verbatim
    pub fn sensitive(instruction: impl Into<Instruction>, locate_hint: impl Into<Instruction>) -> Self {
        let mut request = Self::volatile(instruction).with_locate_hint(locate_hint);
        request.sensitive = true;
        request
    }

    /// Shorthand for a request whose target changes on every iteration
    pub fn volatile(instruction: impl Into<Instruction>) -> Self {
        Self::new(instruction).with_volatile(true)
    }

    pub fn with_locate_hint(mut self, hint: impl Into<Instruction>) -> Self {
        self.locate_hint = Some(hint.into());
        self
    }

    pub fn with_volatile(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }

    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Type `value` into whatever element the fallback resolves
    pub fn with_input(mut self, value: impl Into<String>) -> Self {
        self.input = Some(value.into());
        self
    }

    /// Description handed to `locate` on the fallback path
    pub fn locate_target(&self) -> &Instruction {
        self.locate_hint.as_ref().unwrap_or(&self.instruction)
    }

    /// What logs and errors may show for this request
    pub fn display_instruction(&self) -> &Instruction {
        if self.sensitive {
            self.locate_target()
        } else {
            &self.instruction
        }
    }

    pub(crate) fn cache_request(&self, fingerprint: &Fingerprint) -> CacheRequest {
        let request = CacheRequest::new(fingerprint.clone())
            .volatile(self.volatile || self.sensitive)
            .force_refresh(self.force_refresh);
        match self.ttl {
            Some(ttl) => request.with_ttl(ttl),
            None => request,
        }
    }
}

/// Which strategy completed the action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPath {
    Cached,
    Direct,
    Fallback,
}

impl ActionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPath::Cached => "cached",
            ActionPath::Direct => "direct",
            ActionPath::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ActionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionOutcome {
    pub path: ActionPath,
    /// Interaction calls (`act`, `locate`, `invoke`) issued for this action
    pub actuator_calls: u32,
}

/// Executor timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Pause after every successful action so the interface can settle
    pub settle: Duration,

    /// Pause while a candidate stays marked; marks are cleared before it is
    /// invoked
    pub mark_settle: Duration,

    /// Interval for `probe_until` polling
    pub poll_interval: Duration,
}

impl ExecutorConfig {
    /// No pauses at all; used against in-process actuators
    pub fn immediate() -> Self {
        Self {
            settle: Duration::ZERO,
            mark_settle: Duration::ZERO,
            poll_interval: Duration::ZERO,
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(1000),
            mark_settle: Duration::from_millis(500),
            poll_interval: Duration::from_millis(500),
        }
    }
}
