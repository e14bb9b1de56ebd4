//! Inbound ports (API) for gossip dissemination.

use crate::domain::entities::GossipMessage;
use crate::domain::errors::GossipError;
use mm_02_peer_registry::StrikeOutcome;
use serde_json::Value;
use shared_types::{Fingerprint, PeerId};

/// Entry points used by the swarm (inbound frames) and by the application
/// (local publishing).
pub trait GossipApi: Send + Sync {
    /// Sign and disseminate a locally originated payload.
    fn publish(&self, kind: &str, data: Value) -> Result<PublishReport, GossipError>;

    /// Process a message received from `from`.
    ///
    /// Never fails: every outcome, including misbehavior, is reported as a
    /// [`Disposition`].
    fn handle_inbound(&self, from: &PeerId, message: GossipMessage) -> Disposition;

    /// Note that `peer` violated the wire protocol before a message could be
    /// decoded at all.
    fn report_malformed(&self, peer: &PeerId, reason: RejectReason) -> StrikeOutcome;

    /// Drop expired seen-set entries. Returns how many were removed.
    fn prune_seen(&self) -> usize;
}

/// Result of publishing a local message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub fingerprint: Fingerprint,
    pub forwarded_to: Vec<PeerId>,
}

/// What happened to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// New and authentic
    Accepted {
        /// A handler was registered for the kind and was invoked
        dispatched: bool,
        /// Peers the relayed copy was handed to
        forwarded_to: Vec<PeerId>,
    },
    /// Already in the seen-set
    Duplicate,
    /// Failed validation; the sender was struck
    Rejected {
        reason: RejectReason,
        strike: StrikeOutcome,
    },
    /// Sender is jailed; nothing was examined
    Refused,
}

/// Why an inbound message earned a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidSignature,
    Malformed,
    Oversized,
    RateLimited,
}
