//! Outbound ports (SPI) for gossip dissemination.

use crate::domain::entities::GossipMessage;
use crate::domain::errors::GossipError;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::{Fingerprint, PeerId};
use std::num::NonZeroUsize;

/// Peer network interface, implemented by the swarm.
pub trait PeerNetwork: Send + Sync {
    /// Queue `message` for delivery to `peer` without waiting for the write.
    ///
    /// An error means the message could not even be queued (peer gone or its
    /// outbound queue full).
    fn send(&self, peer: &PeerId, message: &GossipMessage) -> Result<(), GossipError>;
}

/// Optional durable record of processed fingerprints, consulted alongside the
/// in-memory seen-set so dedupe can survive restarts.
pub trait KnownMessageStore: Send + Sync {
    fn is_known(&self, fingerprint: &Fingerprint) -> bool;
    fn mark_known(&self, fingerprint: &Fingerprint);
}

/// Process-lifetime [`KnownMessageStore`], bounded like the seen-set: once
/// full, the least recently marked fingerprint is forgotten.
#[derive(Debug)]
pub struct MemoryKnownStore {
    known: Mutex<LruCache<Fingerprint, ()>>,
}

impl MemoryKnownStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            known: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.known.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.lock().is_empty()
    }
}

impl KnownMessageStore for MemoryKnownStore {
    fn is_known(&self, fingerprint: &Fingerprint) -> bool {
        self.known.lock().contains(fingerprint)
    }

    fn mark_known(&self, fingerprint: &Fingerprint) {
        self.known.lock().put(*fingerprint, ());
    }
}

/// Application handler for one message kind.
///
/// Runs on the receiving task: it must hand real work off (channel, spawn)
/// rather than block.
pub trait GossipHandler: Send + Sync {
    fn handle(&self, origin: &PeerId, data: &Value);
}

impl<F> GossipHandler for F
where
    F: Fn(&PeerId, &Value) + Send + Sync,
{
    fn handle(&self, origin: &PeerId, data: &Value) {
        self(origin, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(n: u8) -> Fingerprint {
        Fingerprint([n; 32])
    }

    #[test]
    fn test_memory_store_stays_within_capacity() {
        let store = MemoryKnownStore::new(2);
        store.mark_known(&fp(1));
        store.mark_known(&fp(2));
        store.mark_known(&fp(3));

        assert_eq!(store.len(), 2);
        assert!(!store.is_known(&fp(1)));
        assert!(store.is_known(&fp(2)));
        assert!(store.is_known(&fp(3)));
    }

    #[test]
    fn test_zero_capacity_still_remembers_one() {
        let store = MemoryKnownStore::new(0);
        assert!(store.is_empty());
        store.mark_known(&fp(7));
        assert!(store.is_known(&fp(7)));
    }
}
