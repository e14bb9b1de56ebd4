//! # Peer Registry
//!
//! A single `RwLock` over the peer map. Peer counts sit in the low hundreds,
//! so one exclusive lock per mutation is cheap and keeps every record
//! transition atomic. Readers get cloned snapshots, never live references.

use crate::domain::config::RegistryConfig;
use crate::domain::entities::{PeerRecord, PeerState, StrikeOutcome, StrikeReason, SweepReport};
use crate::domain::errors::RegistryError;
use crate::domain::jail;
use parking_lot::RwLock;
use shared_types::{ConnectionId, PeerId, TimeSource, Timestamp};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct PeerRegistry {
    peers: RwLock<HashMap<PeerId, PeerRecord>>,
    config: RegistryConfig,
    time: Arc<dyn TimeSource>,
}

impl PeerRegistry {
    pub fn new(config: RegistryConfig, time: Arc<dyn TimeSource>) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            config,
            time,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.time.now()
    }

    // =========================================================================
    // Table access
    // =========================================================================

    /// Insert or replace a record wholesale.
    pub fn upsert(&self, record: PeerRecord) {
        self.peers.write().insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &PeerId) -> Option<PeerRecord> {
        self.peers.read().get(id).cloned()
    }

    pub fn remove(&self, id: &PeerId) -> Option<PeerRecord> {
        self.peers.write().remove(id)
    }

    /// Snapshot of every record.
    pub fn all(&self) -> Vec<PeerRecord> {
        self.peers.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    pub fn connected_count(&self) -> usize {
        self.peers.read().values().filter(|p| p.is_connected()).count()
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Attach a freshly handshaken connection to a peer.
    ///
    /// Atomically checks the jail, duplicate connections and the peer limit.
    /// Refusals leave the table untouched. A returning peer keeps its strike
    /// and transport-failure history from the grace period.
    pub fn admit(
        &self,
        id: &PeerId,
        address: Option<String>,
        connection: ConnectionId,
        limit: usize,
    ) -> Result<(), RegistryError> {
        let now = self.now();
        let mut peers = self.peers.write();

        if let Some(existing) = peers.get(id) {
            if let PeerState::Jailed { until } = existing.state(now) {
                return Err(RegistryError::Jailed {
                    peer: id.clone(),
                    until,
                });
            }
            if existing.is_connected() {
                return Err(RegistryError::AlreadyConnected(id.clone()));
            }
        }

        let connected = peers.values().filter(|p| p.is_connected()).count();
        if connected >= limit {
            return Err(RegistryError::Full { limit });
        }

        let record = peers
            .entry(id.clone())
            .or_insert_with(|| PeerRecord::new(id.clone(), now));
        jail::release_if_expired(record, now);
        record.connection = Some(connection);
        if address.is_some() {
            record.address = address;
        }
        record.disconnected_at = None;
        record.last_seen = now;

        debug!("[registry] {} connected on {}", id, connection);
        Ok(())
    }

    /// Detach a closed connection, keeping the record for the grace period.
    ///
    /// Ignored if the peer has since moved to a different connection.
    pub fn disconnect(&self, id: &PeerId, connection: ConnectionId) -> bool {
        let now = self.now();
        let mut peers = self.peers.write();
        let Some(record) = peers.get_mut(id) else {
            return false;
        };
        if record.connection != Some(connection) {
            return false;
        }
        record.connection = None;
        record.disconnected_at = Some(now);
        debug!("[registry] {} disconnected from {}", id, connection);
        true
    }

    /// Note traffic from a peer.
    pub fn touch(&self, id: &PeerId) {
        let now = self.now();
        if let Some(record) = self.peers.write().get_mut(id) {
            record.last_seen = now;
        }
    }

    // =========================================================================
    // Reputation
    // =========================================================================

    pub fn record_strike(&self, id: &PeerId, reason: StrikeReason) -> StrikeOutcome {
        let now = self.now();
        let mut peers = self.peers.write();
        let Some(record) = peers.get_mut(id) else {
            return StrikeOutcome::UnknownPeer;
        };

        let outcome = jail::record_strike(record, now, &self.config);
        match outcome {
            StrikeOutcome::Counted { strikes } => {
                debug!(
                    "[registry] strike {}/{} for {} ({})",
                    strikes, self.config.jail_strikes, id, reason
                );
            }
            StrikeOutcome::Jailed { until } => {
                warn!(
                    "[registry] jailed {} until {} ({}, jail #{})",
                    id,
                    until.as_secs(),
                    reason,
                    record.jail_count
                );
            }
            StrikeOutcome::AlreadyJailed { .. } | StrikeOutcome::UnknownPeer => {}
        }
        outcome
    }

    /// Count a failed send. Past the tolerance this becomes a strike.
    pub fn record_transport_failure(&self, id: &PeerId) -> Option<StrikeOutcome> {
        let exceeded = {
            let mut peers = self.peers.write();
            let record = peers.get_mut(id)?;
            jail::record_transport_failure(record, &self.config)
        };

        if exceeded {
            warn!("[registry] {} exceeded transport tolerance", id);
            return Some(self.record_strike(id, StrikeReason::Unresponsive));
        }
        None
    }

    pub fn record_transport_success(&self, id: &PeerId) {
        if let Some(record) = self.peers.write().get_mut(id) {
            record.transport_failures = 0;
        }
    }

    /// Jail expiry for `id` if it is currently jailed. Releases lazily.
    pub fn jailed_until(&self, id: &PeerId) -> Option<Timestamp> {
        let now = self.now();
        let mut peers = self.peers.write();
        let record = peers.get_mut(id)?;
        if jail::release_if_expired(record, now) {
            info!("[registry] released {} from jail", id);
        }
        record.jailed_until
    }

    pub fn is_jailed(&self, id: &PeerId) -> bool {
        self.jailed_until(id).is_some()
    }

    /// Not jailed and holding an open connection.
    pub fn is_eligible_for_gossip(&self, id: &PeerId) -> bool {
        !self.is_jailed(id) && self.get(id).is_some_and(|p| p.is_connected())
    }

    /// Ids of every peer currently eligible for gossip fan-out.
    pub fn eligible_peers(&self) -> Vec<PeerId> {
        self.all()
            .into_iter()
            .map(|p| p.id)
            .filter(|id| self.is_eligible_for_gossip(id))
            .collect()
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Release expired jails and evict records past their grace period.
    ///
    /// Idempotent; skipping it only delays reclaiming memory.
    pub fn sweep(&self) -> SweepReport {
        let now = self.now();
        let mut report = SweepReport::default();
        let mut peers = self.peers.write();

        for record in peers.values_mut() {
            if jail::release_if_expired(record, now) {
                report.released += 1;
            }
        }

        let before = peers.len();
        peers.retain(|_, record| !jail::is_evictable(record, now, &self.config));
        report.evicted = before - peers.len();

        report
    }

    /// Known, disconnected, unjailed peers with a dialable address.
    pub fn dial_candidates(&self) -> Vec<(PeerId, String)> {
        let now = self.now();
        self.peers
            .read()
            .values()
            .filter(|p| !p.is_connected() && p.state(now) == PeerState::Active)
            .filter_map(|p| p.address.clone().map(|a| (p.id.clone(), a)))
            .collect()
    }

    /// Connected peers not heard from for at least `silence_secs`.
    pub fn silent_peers(&self, silence_secs: u64) -> Vec<(PeerId, ConnectionId)> {
        let now = self.now();
        self.peers
            .read()
            .values()
            .filter(|p| now.secs_since(p.last_seen) >= silence_secs)
            .filter_map(|p| p.connection.map(|c| (p.id.clone(), c)))
            .collect()
    }
}
