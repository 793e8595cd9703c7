use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::cache::ActionCache;
use crate::entry::CacheEntry;

impl ActionCache {
    /// Write every entry to `path` as a JSON object keyed by cache key.
    ///
    /// Failures are logged and swallowed. Returns the number of entries written.
    pub async fn persist(&self, path: &Path) -> usize {
        let snapshot: BTreeMap<String, CacheEntry> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(err) = fs::create_dir_all(parent).await {
                warn!(%err, path = %parent.display(), "failed to create cache directory");
                return 0;
            }
        }

        let payload = match serde_json::to_vec_pretty(&snapshot) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, path = %path.display(), "failed to serialize action cache");
                return 0;
            }
        };

        match write_atomic(path, &payload).await {
            Ok(()) => {
                info!(path = %path.display(), entries = snapshot.len(), "action cache persisted");
                snapshot.len()
            }
            Err(err) => {
                warn!(%err, path = %path.display(), "failed to write action cache");
                0
            }
        }
    }

    /// Load entries from `path`, replacing any with the same key.
    ///
    /// A missing file is an empty cache. Unreadable or corrupt files are
    /// logged and ignored. Returns the number of entries loaded.
    pub async fn restore(&self, path: &Path) -> usize {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no action cache file; starting empty");
                return 0;
            }
            Err(err) => {
                warn!(%err, path = %path.display(), "failed to read action cache");
                return 0;
            }
        };

        let stored: BTreeMap<String, CacheEntry> = match serde_json::from_slice(&bytes) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(%err, path = %path.display(), "failed to parse action cache");
                return 0;
            }
        };

        let mut loaded = 0;
        for (key, entry) in stored {
            if entry.fingerprint.cache_key() != key {
                warn!(%key, fingerprint = %entry.fingerprint, "skipping cache entry with mismatched key");
                continue;
            }
            self.entries.insert(key, entry);
            loaded += 1;
        }
        info!(path = %path.display(), entries = loaded, "action cache restored");
        loaded
    }
}

async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp).await?;
    file.write_all(data).await?;
    file.flush().await?;
    fs::rename(tmp, path).await
}
