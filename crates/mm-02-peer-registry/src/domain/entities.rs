//! Peer registry entities.

use shared_types::{ConnectionId, PeerId, Timestamp};
use std::fmt;

/// Everything the node remembers about one peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    pub id: PeerId,
    /// Dialable listen address announced in the handshake
    pub address: Option<String>,
    /// Live connection, owned by the swarm. `None` while disconnected.
    pub connection: Option<ConnectionId>,
    pub strikes: u32,
    pub jailed_until: Option<Timestamp>,
    pub last_seen: Timestamp,
    /// Set when the connection closed; drives grace-period eviction
    pub disconnected_at: Option<Timestamp>,
    /// Consecutive send failures since the last success
    pub transport_failures: u32,
    /// Times this peer has been jailed
    pub jail_count: u32,
}

impl PeerRecord {
    pub fn new(id: PeerId, now: Timestamp) -> Self {
        Self {
            id,
            address: None,
            connection: None,
            strikes: 0,
            jailed_until: None,
            last_seen: now,
            disconnected_at: Some(now),
            transport_failures: 0,
            jail_count: 0,
        }
    }

    pub fn with_connection(mut self, connection: ConnectionId, address: Option<String>) -> Self {
        self.connection = Some(connection);
        self.address = address;
        self.disconnected_at = None;
        self
    }

    pub fn state(&self, now: Timestamp) -> PeerState {
        match self.jailed_until {
            Some(until) if now <= until => PeerState::Jailed { until },
            _ => PeerState::Active,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

/// Reputation state of a peer at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Active,
    Jailed { until: Timestamp },
}

/// Protocol violations that earn a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeReason {
    /// Signature or signer failed verification
    InvalidSignature,
    /// Frame could not be decoded or lacked required fields
    MalformedFrame,
    /// Frame exceeded the payload size limit
    Oversized,
    /// Peer exceeded the inbound message rate
    RateLimited,
    /// Repeated send failures beyond tolerance
    Unresponsive,
}

impl fmt::Display for StrikeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSignature => write!(f, "invalid signature"),
            Self::MalformedFrame => write!(f, "malformed frame"),
            Self::Oversized => write!(f, "oversized frame"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Unresponsive => write!(f, "unresponsive"),
        }
    }
}

/// Result of recording a strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Strike counted, still below the threshold
    Counted { strikes: u32 },
    /// Threshold reached; the peer is now jailed
    Jailed { until: Timestamp },
    /// Already jailed; nothing changes
    AlreadyJailed { until: Timestamp },
    /// No record for this peer
    UnknownPeer,
}

impl StrikeOutcome {
    pub fn is_jailed(&self) -> bool {
        matches!(self, Self::Jailed { .. } | Self::AlreadyJailed { .. })
    }
}

/// What a maintenance sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Jail terms that had expired
    pub released: usize,
    /// Disconnected records past their grace period
    pub evicted: usize,
}
