//! # Seen-Set
//!
//! Bounded record of processed fingerprints, both capacity-bounded (LRU) and
//! time-windowed. Relay depth is capped by `die`, so fingerprints older than
//! the window will not come round again in practice.

use lru::LruCache;
use parking_lot::Mutex;
use shared_types::{Fingerprint, Timestamp};
use std::num::NonZeroUsize;
use std::time::Duration;

pub struct SeenSet {
    entries: Mutex<LruCache<Fingerprint, Timestamp>>,
    ttl_secs: u64,
}

impl SeenSet {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Record `fingerprint`, returning `false` if it was already present.
    ///
    /// The check and the insert happen under one lock, so two concurrent
    /// receipts of the same message cannot both win.
    pub fn insert_if_absent(&self, fingerprint: Fingerprint, now: Timestamp) -> bool {
        let mut entries = self.entries.lock();
        if let Some(seen_at) = entries.peek(&fingerprint) {
            if now.secs_since(*seen_at) < self.ttl_secs {
                return false;
            }
        }
        entries.put(fingerprint, now);
        true
    }

    pub fn contains(&self, fingerprint: &Fingerprint, now: Timestamp) -> bool {
        self.entries
            .lock()
            .peek(fingerprint)
            .is_some_and(|seen_at| now.secs_since(*seen_at) < self.ttl_secs)
    }

    /// Drop fingerprints older than the window. Returns how many were dropped.
    pub fn prune(&self, now: Timestamp) -> usize {
        let mut entries = self.entries.lock();
        let mut pruned = 0;
        // Entries are never promoted, so LRU order is insertion order.
        while let Some((_, seen_at)) = entries.peek_lru() {
            if now.secs_since(*seen_at) < self.ttl_secs {
                break;
            }
            entries.pop_lru();
            pruned += 1;
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
