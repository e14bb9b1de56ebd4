//! # Node Runtime
//!
//! Owns every subsystem and wires them together once, at construction:
//!
//! ```text
//! SignatureService ──┐
//! PeerRegistry ──────┼──> GossipService<SwarmNetwork> ──> Swarm ──> Daemon
//! ConnectionTable ───┘          (PeerNetwork adapter over the table)
//! ```
//!
//! Nothing here is global; tests build as many nodes per process as they like.

use crate::config::{ConfigError, NodeConfig};
use crate::daemon::Daemon;
use mm_01_signatures::{
    KeyPair, SignatureApi, SignatureError, SignatureService, DEFAULT_DECODE_CACHE_CAPACITY,
};
use mm_02_peer_registry::PeerRegistry;
use mm_03_gossip::{GossipApi, GossipError, GossipHandler, GossipService, PublishReport};
use mm_04_swarm::{ConnectionTable, Swarm, SwarmError, SwarmNetwork};
use parking_lot::Mutex;
use serde_json::Value;
use shared_types::{PeerId, SystemTimeSource, TimeSource};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// The gossip engine as wired in a running node.
pub type NodeGossip = GossipService<SwarmNetwork, SignatureService>;

/// How long shutdown waits for maintenance tasks to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid secret key: {0}")]
    Key(#[from] SignatureError),

    #[error("swarm error: {0}")]
    Swarm(#[from] SwarmError),
}

pub struct NodeRuntime {
    name: String,
    config: NodeConfig,
    signatures: Arc<SignatureService>,
    registry: Arc<PeerRegistry>,
    gossip: Arc<NodeGossip>,
    swarm: Arc<Swarm>,
    daemon: Arc<Daemon>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    /// Validate `config`, load the node key and build every subsystem.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        Self::with_time_source(config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        config: NodeConfig,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let secret = config
            .secret_key
            .as_deref()
            .ok_or(ConfigError::MissingSecretKey)?;
        let keys = KeyPair::from_encoded_secret(secret.trim())?;
        let public_key = keys.encoded_public_key();
        let name = config.resolve_name(&public_key);
        if config.name.is_none() {
            warn!("Node name not configured, using the first characters of the public key");
        }

        // every gossip origin and every connected peer needs a decoded key
        let cache_capacity = DEFAULT_DECODE_CACHE_CAPACITY.max(config.peers.max * 8);
        let signatures = Arc::new(SignatureService::new(keys, cache_capacity));

        let registry = Arc::new(PeerRegistry::new(config.registry_config(), time));
        let connections = Arc::new(ConnectionTable::new());
        let network = Arc::new(SwarmNetwork::new(Arc::clone(&connections), Arc::clone(&registry)));
        let gossip = Arc::new(GossipService::new(
            config.propagation_config(),
            Arc::clone(&registry),
            network,
            Arc::clone(&signatures),
        ));
        let swarm = Swarm::new(
            config.swarm_config(),
            Arc::clone(&registry),
            connections,
            Arc::clone(&gossip) as Arc<dyn GossipApi>,
            Arc::clone(&signatures) as Arc<dyn SignatureApi>,
        );
        let daemon = Arc::new(Daemon::new(
            config.daemon.clone(),
            Arc::clone(&registry),
            Arc::clone(&gossip) as Arc<dyn GossipApi>,
            Arc::clone(&swarm),
        ));

        info!("Public key is {}", public_key);
        if let Some(address) = signatures.local_address() {
            info!("Murmur address is {}", address);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Ok(Self {
            name,
            config,
            signatures,
            registry,
            gossip,
            swarm,
            daemon,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Bind the listener and start the daemon ticks.
    pub async fn start(&self) -> Result<SocketAddr, NodeError> {
        let addr = self.swarm.listen().await?;
        let handles = self.daemon.spawn(self.shutdown_rx.clone());
        self.tasks.lock().extend(handles);

        info!("===========================================");
        info!("  Murmur node {} v{}", self.name, env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!("Listening on {}", addr);
        info!(
            "Peers: max {}, low watermark {}; gossip: infect {}, die {}{}",
            self.config.peers.max,
            self.config.peers.low_watermark,
            self.config.infect(),
            self.config.gossip.die,
            if self.config.lite { " (lite)" } else { "" }
        );
        Ok(addr)
    }

    /// Sign and disseminate a local payload.
    pub fn publish(&self, kind: &str, data: Value) -> Result<PublishReport, GossipError> {
        self.gossip.publish(kind, data)
    }

    pub fn register_handler<H>(&self, kind: &str, handler: H) -> Result<(), GossipError>
    where
        H: GossipHandler + 'static,
    {
        self.gossip.register_handler(kind, handler)
    }

    /// Dial a peer directly, outside the rebalance schedule.
    pub async fn connect(&self, addr: &str) -> Result<PeerId, NodeError> {
        Ok(self.swarm.dial(addr).await?)
    }

    /// Signal every task to stop and close all connections.
    ///
    /// In-flight forwards are abandoned.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if self.shutdown_tx.send(true).is_err() {
            warn!("Shutdown signal had no receivers");
        }
        self.swarm.shutdown();

        let handles = std::mem::take(&mut *self.tasks.lock());
        for handle in handles {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                warn!("A maintenance task did not stop in time");
            }
        }
        info!("Shutdown complete");
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn public_key(&self) -> Option<&str> {
        self.signatures.local_signer()
    }

    pub fn peer_id(&self) -> Option<PeerId> {
        self.signatures.local_address()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.swarm.local_addr()
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub fn gossip(&self) -> &Arc<NodeGossip> {
        &self.gossip
    }

    pub fn swarm(&self) -> &Arc<Swarm> {
        &self.swarm
    }

    pub fn daemon(&self) -> &Arc<Daemon> {
        &self.daemon
    }
}
