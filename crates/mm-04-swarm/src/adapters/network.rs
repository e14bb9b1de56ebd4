//! # Swarm Network Adapter
//!
//! Implements the gossip [`PeerNetwork`] port on top of the connection table.
//! Sends never block: a full or closed queue counts as a transport failure
//! against the peer.

use crate::connections::{ConnectionTable, QueueError};
use crate::domain::frames::WireFrame;
use mm_02_peer_registry::PeerRegistry;
use mm_03_gossip::{GossipError, GossipMessage, PeerNetwork};
use shared_types::PeerId;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct SwarmNetwork {
    connections: Arc<ConnectionTable>,
    registry: Arc<PeerRegistry>,
}

impl SwarmNetwork {
    pub fn new(connections: Arc<ConnectionTable>, registry: Arc<PeerRegistry>) -> Self {
        Self {
            connections,
            registry,
        }
    }

    pub fn connections(&self) -> &Arc<ConnectionTable> {
        &self.connections
    }
}

impl PeerNetwork for SwarmNetwork {
    fn send(&self, peer: &PeerId, message: &GossipMessage) -> Result<(), GossipError> {
        match self.connections.try_send(peer, WireFrame::Gossip(message.clone())) {
            Ok(()) => Ok(()),
            Err(QueueError::NotConnected) => {
                debug!("[swarm] {} not connected, dropping gossip", peer);
                Err(GossipError::Network(format!("{peer} not connected")))
            }
            Err(e) => {
                warn!("[swarm] outbound queue to {} unusable: {:?}", peer, e);
                if let Some(outcome) = self.registry.record_transport_failure(peer) {
                    if outcome.is_jailed() {
                        self.connections.close(peer);
                    }
                }
                Err(GossipError::Network(format!("{peer} queue {e:?}")))
            }
        }
    }
}
