//! Shared fixtures: an in-process network that records every send, and a
//! gossip node assembled from the real signature service and registry.

use mm_01_signatures::{KeyPair, SignatureService};
use mm_02_peer_registry::{PeerRegistry, RegistryConfig};
use mm_03_gossip::{GossipError, GossipMessage, GossipService, PeerNetwork, PropagationConfig};
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::test_utils::FixedTimeSource;
use shared_types::{ConnectionId, GossipConfig, PeerId};
use std::sync::Arc;

/// Records sends instead of delivering them.
#[derive(Default)]
pub struct RecordingNetwork {
    sent: Mutex<Vec<(PeerId, GossipMessage)>>,
}

impl RecordingNetwork {
    pub fn sent(&self) -> Vec<(PeerId, GossipMessage)> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl PeerNetwork for RecordingNetwork {
    fn send(&self, peer: &PeerId, message: &GossipMessage) -> Result<(), GossipError> {
        self.sent.lock().push((peer.clone(), message.clone()));
        Ok(())
    }
}

/// Collects dispatched payloads.
#[derive(Default, Clone)]
pub struct Inbox {
    received: Arc<Mutex<Vec<(PeerId, Value)>>>,
}

impl Inbox {
    pub fn handler(&self) -> impl Fn(&PeerId, &Value) + Send + Sync + 'static {
        let received = Arc::clone(&self.received);
        move |origin: &PeerId, data: &Value| received.lock().push((origin.clone(), data.clone()))
    }

    pub fn received(&self) -> Vec<(PeerId, Value)> {
        self.received.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().is_empty()
    }
}

pub fn signer() -> SignatureService {
    SignatureService::new(KeyPair::generate().expect("key generation"), 64)
}

pub type TestGossip = GossipService<RecordingNetwork, SignatureService>;

/// One gossip node with its collaborators exposed.
pub struct GossipNode {
    pub gossip: TestGossip,
    pub registry: Arc<PeerRegistry>,
    pub network: Arc<RecordingNetwork>,
    pub clock: FixedTimeSource,
    pub config: GossipConfig,
    next_connection: Mutex<u64>,
}

impl GossipNode {
    pub fn new(config: GossipConfig) -> Self {
        let clock = FixedTimeSource::new(1_000_000);
        let registry = Arc::new(PeerRegistry::new(
            RegistryConfig::from_gossip(&config),
            Arc::new(clock.clone()),
        ));
        let network = Arc::new(RecordingNetwork::default());
        let gossip = GossipService::new(
            PropagationConfig::from_gossip(&config),
            Arc::clone(&registry),
            Arc::clone(&network),
            Arc::new(signer()),
        );
        Self {
            gossip,
            registry,
            network,
            clock,
            config,
            next_connection: Mutex::new(0),
        }
    }

    /// Admit `count` freshly named, connected peers.
    pub fn connect_peers(&self, count: usize) -> Vec<PeerId> {
        (0..count)
            .map(|i| {
                let peer = PeerId::new(format!("peer-{i}"));
                self.connect(&peer);
                peer
            })
            .collect()
    }

    pub fn connect(&self, peer: &PeerId) {
        let mut next = self.next_connection.lock();
        *next += 1;
        self.registry
            .admit(peer, None, ConnectionId(*next), self.config.max_peers)
            .expect("admit");
    }
}
