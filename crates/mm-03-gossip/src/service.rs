//! # Gossip Service
//!
//! Implements [`GossipApi`] over four collaborators:
//! - [`PeerRegistry`]: eligibility, strikes and the clock
//! - [`PeerNetwork`]: fire-and-forget delivery
//! - [`SignatureApi`]: attest and verify
//! - [`KnownMessageStore`]: optional durable dedupe
//!
//! Verification runs without any registry lock held; the registry is only
//! consulted before (jail check) and after (strike, fan-out).

use crate::domain::config::PropagationConfig;
use crate::domain::entities::{validate_kind, GossipMessage, GossipPayload};
use crate::domain::errors::GossipError;
use crate::domain::fanout::select_targets;
use crate::domain::seen_set::SeenSet;
use crate::ports::inbound::{Disposition, GossipApi, PublishReport, RejectReason};
use crate::ports::outbound::{GossipHandler, KnownMessageStore, PeerNetwork};
use mm_01_signatures::SignatureApi;
use mm_02_peer_registry::{PeerRegistry, StrikeOutcome, StrikeReason};
use parking_lot::RwLock;
use serde_json::Value;
use shared_types::{Fingerprint, PeerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GossipStats {
    pub received: u64,
    pub accepted: u64,
    pub dispatched: u64,
    pub duplicates: u64,
    pub rejected: u64,
    pub refused: u64,
    pub published: u64,
    pub forwarded: u64,
}

#[derive(Default)]
struct Counters {
    received: AtomicU64,
    accepted: AtomicU64,
    dispatched: AtomicU64,
    duplicates: AtomicU64,
    rejected: AtomicU64,
    refused: AtomicU64,
    published: AtomicU64,
    forwarded: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

/// Gossip Service.
///
/// Thread-safe; share it across connection tasks via `Arc`.
pub struct GossipService<N, S>
where
    N: PeerNetwork,
    S: SignatureApi + ?Sized,
{
    config: PropagationConfig,
    seen: SeenSet,
    registry: Arc<PeerRegistry>,
    network: Arc<N>,
    signatures: Arc<S>,
    handlers: RwLock<HashMap<String, Arc<dyn GossipHandler>>>,
    known: Option<Arc<dyn KnownMessageStore>>,
    counters: Counters,
}

impl<N, S> GossipService<N, S>
where
    N: PeerNetwork,
    S: SignatureApi + ?Sized,
{
    pub fn new(
        config: PropagationConfig,
        registry: Arc<PeerRegistry>,
        network: Arc<N>,
        signatures: Arc<S>,
    ) -> Self {
        Self {
            seen: SeenSet::new(config.seen_capacity, config.seen_ttl),
            config,
            registry,
            network,
            signatures,
            handlers: RwLock::new(HashMap::new()),
            known: None,
            counters: Counters::default(),
        }
    }

    /// Also consult `store` when deduplicating.
    pub fn with_known_store(mut self, store: Arc<dyn KnownMessageStore>) -> Self {
        self.known = Some(store);
        self
    }

    /// Route payloads of `kind` to `handler`. Replaces any earlier handler.
    pub fn register_handler<H>(&self, kind: &str, handler: H) -> Result<(), GossipError>
    where
        H: GossipHandler + 'static,
    {
        validate_kind(kind)?;
        self.handlers
            .write()
            .insert(kind.to_string(), Arc::new(handler));
        Ok(())
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    pub fn stats(&self) -> GossipStats {
        let c = &self.counters;
        GossipStats {
            received: c.received.load(Ordering::Relaxed),
            accepted: c.accepted.load(Ordering::Relaxed),
            dispatched: c.dispatched.load(Ordering::Relaxed),
            duplicates: c.duplicates.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
            refused: c.refused.load(Ordering::Relaxed),
            published: c.published.load(Ordering::Relaxed),
            forwarded: c.forwarded.load(Ordering::Relaxed),
        }
    }

    /// Insert into the seen-set (and the known store). `false` on duplicates.
    fn remember(&self, fingerprint: Fingerprint) -> bool {
        if !self.seen.insert_if_absent(fingerprint, self.registry.now()) {
            return false;
        }
        if let Some(store) = &self.known {
            if store.is_known(&fingerprint) {
                return false;
            }
            store.mark_known(&fingerprint);
        }
        true
    }

    fn dispatch(&self, message: &GossipMessage) -> bool {
        let kind = &message.payload.kind;
        let Some(handler) = self.handlers.read().get(kind).cloned() else {
            debug!("[gossip] no handler for kind {:?}, relaying only", kind);
            return false;
        };

        let origin = match self.signatures.address_of_signer(&message.signer) {
            Ok(origin) => origin,
            Err(e) => {
                warn!("[gossip] cannot derive origin of verified message: {}", e);
                return false;
            }
        };

        handler.handle(&origin, &message.payload.data);
        bump(&self.counters.dispatched, 1);
        true
    }

    /// Hand the next-hop copy to a random subset of eligible peers.
    fn forward(&self, message: &GossipMessage, sender: Option<&PeerId>) -> Vec<PeerId> {
        if message.hop_count >= self.config.die {
            return Vec::new();
        }
        let fanout = self.config.fanout();
        if fanout == 0 {
            return Vec::new();
        }

        let eligible = self.registry.eligible_peers();
        let targets = select_targets(&eligible, sender, fanout, &mut rand::thread_rng());
        let relayed = message.relayed();

        let mut reached = Vec::with_capacity(targets.len());
        for peer in targets {
            match self.network.send(&peer, &relayed) {
                Ok(()) => reached.push(peer),
                Err(e) => debug!("[gossip] forward to {} failed: {}", peer, e),
            }
        }
        bump(&self.counters.forwarded, reached.len() as u64);
        reached
    }

    fn reject(&self, from: &PeerId, reason: RejectReason) -> StrikeOutcome {
        bump(&self.counters.rejected, 1);
        let strike_reason = match reason {
            RejectReason::InvalidSignature => StrikeReason::InvalidSignature,
            RejectReason::Malformed => StrikeReason::MalformedFrame,
            RejectReason::Oversized => StrikeReason::Oversized,
            RejectReason::RateLimited => StrikeReason::RateLimited,
        };
        let outcome = self.registry.record_strike(from, strike_reason);
        debug!("[gossip] rejected message from {} ({:?}): {:?}", from, reason, outcome);
        outcome
    }
}

impl<N, S> GossipApi for GossipService<N, S>
where
    N: PeerNetwork,
    S: SignatureApi + ?Sized,
{
    fn publish(&self, kind: &str, data: Value) -> Result<PublishReport, GossipError> {
        validate_kind(kind)?;
        let payload = GossipPayload::new(kind, data);
        let size = payload.encoded_len();
        if size > self.config.max_payload_bytes {
            return Err(GossipError::Oversized {
                size,
                max: self.config.max_payload_bytes,
            });
        }

        let attestation = self.signatures.attest(&payload.to_value())?;
        let message = GossipMessage::new(payload, attestation);
        let fingerprint = message.fingerprint();
        self.remember(fingerprint);

        let forwarded_to = self.forward(&message, None);
        bump(&self.counters.published, 1);
        info!(
            "[gossip] published {} {} to {} peers",
            kind,
            fingerprint,
            forwarded_to.len()
        );

        Ok(PublishReport {
            fingerprint,
            forwarded_to,
        })
    }

    fn handle_inbound(&self, from: &PeerId, message: GossipMessage) -> Disposition {
        bump(&self.counters.received, 1);

        if self.registry.is_jailed(from) {
            bump(&self.counters.refused, 1);
            debug!("[gossip] ignoring message from jailed peer {}", from);
            return Disposition::Refused;
        }
        self.registry.touch(from);

        if let Err(e) = message.validate(self.config.max_payload_bytes) {
            let reason = match e {
                GossipError::Oversized { .. } => RejectReason::Oversized,
                _ => RejectReason::Malformed,
            };
            let strike = self.reject(from, reason);
            return Disposition::Rejected { reason, strike };
        }

        if !self
            .signatures
            .verify(&message.attestation(), &message.payload.to_value())
        {
            let reason = RejectReason::InvalidSignature;
            let strike = self.reject(from, reason);
            return Disposition::Rejected { reason, strike };
        }

        if !self.remember(message.fingerprint()) {
            bump(&self.counters.duplicates, 1);
            return Disposition::Duplicate;
        }
        bump(&self.counters.accepted, 1);

        let dispatched = self.dispatch(&message);
        let forwarded_to = self.forward(&message, Some(from));
        debug!(
            "[gossip] {} from {} hop {}: dispatched={} forwarded={}",
            message.payload.kind,
            from,
            message.hop_count,
            dispatched,
            forwarded_to.len()
        );

        Disposition::Accepted {
            dispatched,
            forwarded_to,
        }
    }

    fn report_malformed(&self, peer: &PeerId, reason: RejectReason) -> StrikeOutcome {
        self.reject(peer, reason)
    }

    fn prune_seen(&self) -> usize {
        self.seen.prune(self.registry.now())
    }
}
