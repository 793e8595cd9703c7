//! Action cache
//!
//! Maps a (location, instruction) fingerprint to a previously resolved,
//! replayable action descriptor. Entries expire lazily on read after a TTL,
//! are dropped on any failed replay, and can be snapshotted to a JSON file
//! between runs. Persistence is best effort: I/O problems are logged and
//! never reach the caller.

mod cache;
mod entry;
mod persist;
mod stats;

pub use cache::{ActionCache, DEFAULT_TTL};
pub use entry::{CacheEntry, CacheRequest};
pub use stats::CacheStats;

pub use pilot_core_types::{Descriptor, Fingerprint};
