use chrono::{DateTime, Utc};
use dashmap::DashMap;
use pilot_core_types::{Descriptor, Fingerprint};
use std::time::Duration;
use tracing::{debug, warn};

use crate::entry::{CacheEntry, CacheRequest};
use crate::stats::{CacheStats, StatsCounters};

/// Default time-to-live for cached resolutions.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// In-memory action cache keyed by fingerprint.
///
/// Passed explicitly (usually behind an `Arc`) to the executor, which is its
/// only writer. Expiry is lazy: stale entries are removed when read.
#[derive(Debug)]
pub struct ActionCache {
    pub(crate) entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
    pub(crate) stats: StatsCounters,
}

impl Default for ActionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            stats: StatsCounters::default(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<Descriptor> {
        self.lookup_with_ttl(fingerprint, self.default_ttl)
    }

    pub fn lookup_with_ttl(&self, fingerprint: &Fingerprint, ttl: Duration) -> Option<Descriptor> {
        self.lookup_at(fingerprint, ttl, Utc::now())
    }

    /// Lookup honouring the request's `volatile` and `force_refresh` flags.
    pub fn resolve(&self, request: &CacheRequest) -> Option<Descriptor> {
        if request.volatile || request.force_refresh {
            debug!(
                fingerprint = %request.fingerprint,
                volatile = request.volatile,
                force_refresh = request.force_refresh,
                "cache lookup bypassed"
            );
            return None;
        }
        let ttl = request.ttl.unwrap_or(self.default_ttl);
        self.lookup_with_ttl(&request.fingerprint, ttl)
    }

    pub(crate) fn lookup_at(
        &self,
        fingerprint: &Fingerprint,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<Descriptor> {
        let key = fingerprint.cache_key();
        // The shard guard must be released before `remove_if` touches the same shard.
        let live = match self.entries.get(&key) {
            None => None,
            Some(entry) if entry.fingerprint != *fingerprint => {
                warn!(%fingerprint, "cache key collision; ignoring entry");
                None
            }
            Some(entry) => Some(entry.is_live(ttl, now).then(|| entry.descriptor.clone())),
        };

        match live {
            Some(Some(descriptor)) => {
                debug!(%fingerprint, "action cache hit");
                self.stats.hit();
                Some(descriptor)
            }
            Some(None) => {
                if self
                    .entries
                    .remove_if(&key, |_, entry| !entry.is_live(ttl, now))
                    .is_some()
                {
                    self.stats.expired(1);
                }
                debug!(%fingerprint, "action cache entry expired");
                self.stats.miss();
                None
            }
            None => {
                self.stats.miss();
                None
            }
        }
    }

    pub fn store(&self, fingerprint: Fingerprint, descriptor: Descriptor) {
        self.insert(CacheEntry::new(fingerprint, descriptor));
    }

    /// Store unless the request is volatile. Returns whether an entry was written.
    pub fn store_for(&self, request: &CacheRequest, descriptor: Descriptor) -> bool {
        if request.volatile {
            return false;
        }
        self.store(request.fingerprint.clone(), descriptor);
        true
    }

    pub(crate) fn insert(&self, entry: CacheEntry) {
        debug!(fingerprint = %entry.fingerprint, descriptor = %entry.descriptor, "action cache store");
        self.entries.insert(entry.fingerprint.cache_key(), entry);
        self.stats.store();
    }

    /// Remove the entry for `fingerprint`. Returns whether one existed.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let removed = self.entries.remove(&fingerprint.cache_key()).is_some();
        if removed {
            debug!(%fingerprint, "action cache entry invalidated");
            self.stats.invalidation();
        }
        removed
    }

    pub fn clear_all(&self) {
        self.entries.clear();
    }

    /// Drop every entry older than `ttl`. Returns the number removed.
    pub fn prune_expired(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(ttl, now));
        let removed = before.saturating_sub(self.entries.len());
        self.stats.expired(removed as u64);
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by creation time, oldest first.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.created_at);
        entries
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}
