use chrono::{DateTime, Utc};
use pilot_core_types::{Descriptor, Fingerprint};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One cached resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub descriptor: Descriptor,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, descriptor: Descriptor) -> Self {
        Self::created_at(fingerprint, descriptor, Utc::now())
    }

    pub fn created_at(
        fingerprint: Fingerprint,
        descriptor: Descriptor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            fingerprint,
            descriptor,
            created_at,
        }
    }

    /// `now - created_at < ttl`; entries stamped in the future are stale
    /// since their age cannot be trusted.
    pub fn is_live(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.created_at).to_std() {
            Ok(age) => age < ttl,
            Err(_) => false,
        }
    }
}

/// Per-request cache flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRequest {
    pub fingerprint: Fingerprint,
    /// Skip lookup and store: the target changes every iteration
    pub volatile: bool,
    /// Skip lookup but store the fresh resolution
    pub force_refresh: bool,
    /// Overrides the cache's default TTL for this lookup
    pub ttl: Option<Duration>,
}

impl CacheRequest {
    pub fn new(fingerprint: Fingerprint) -> Self {
        Self {
            fingerprint,
            volatile: false,
            force_refresh: false,
            ttl: None,
        }
    }

    pub fn volatile(mut self, volatile: bool) -> Self {
        self.volatile = volatile;
        self
    }

    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}
