//! # Daemon Scheduler
//!
//! Periodic maintenance, one task per tick kind:
//!
//! | Tick | Work |
//! |------|------|
//! | sweep | release expired jails, evict stale records, prune the seen-set |
//! | rebalance | dial out while below the low watermark |
//! | health | ping every connection, drop peers silent for 3 ping intervals |
//!
//! Every tick is idempotent. A late or skipped tick only delays convergence;
//! jail expiry is also evaluated lazily on every registry lookup.

use crate::config::DaemonConfig;
use mm_02_peer_registry::{PeerRegistry, SweepReport};
use mm_03_gossip::GossipApi;
use mm_04_swarm::Swarm;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Outcome of one health tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub pinged: usize,
    pub disconnected: usize,
}

pub struct Daemon {
    config: DaemonConfig,
    registry: Arc<PeerRegistry>,
    gossip: Arc<dyn GossipApi>,
    swarm: Arc<Swarm>,
}

impl Daemon {
    pub fn new(
        config: DaemonConfig,
        registry: Arc<PeerRegistry>,
        gossip: Arc<dyn GossipApi>,
        swarm: Arc<Swarm>,
    ) -> Self {
        Self {
            config,
            registry,
            gossip,
            swarm,
        }
    }

    pub fn sweep(&self) -> (SweepReport, usize) {
        let report = self.registry.sweep();
        let pruned = self.gossip.prune_seen();
        if report.released > 0 || report.evicted > 0 {
            info!(
                "[daemon] sweep released {} and evicted {} peers",
                report.released, report.evicted
            );
        }
        debug!("[daemon] pruned {} seen-set entries", pruned);
        (report, pruned)
    }

    pub async fn rebalance(&self) -> usize {
        let dialed = self.swarm.rebalance().await;
        if dialed > 0 {
            info!(
                "[daemon] rebalance opened {} connections, {} peers now",
                dialed,
                self.swarm.peer_count()
            );
        }
        dialed
    }

    pub fn health(&self) -> HealthReport {
        let pinged = self.swarm.ping_all();
        let disconnected = self.swarm.disconnect_silent(self.config.silence_limit()).len();
        debug!("[daemon] pinged {} peers, dropped {} silent", pinged, disconnected);
        HealthReport {
            pinged,
            disconnected,
        }
    }

    /// Start every tick. Each task ends once `shutdown` turns `true`.
    pub fn spawn(self: &Arc<Self>, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let sweep = {
            let daemon = Arc::clone(self);
            tokio::spawn(run_ticks(
                "sweep",
                self.config.sweep_interval(),
                shutdown.clone(),
                move || {
                    daemon.sweep();
                    async {}
                },
            ))
        };
        let rebalance = {
            let daemon = Arc::clone(self);
            tokio::spawn(run_ticks(
                "rebalance",
                self.config.rebalance_interval(),
                shutdown.clone(),
                move || {
                    let daemon = Arc::clone(&daemon);
                    async move {
                        daemon.rebalance().await;
                    }
                },
            ))
        };
        let health = {
            let daemon = Arc::clone(self);
            tokio::spawn(run_ticks("health", self.config.ping_interval(), shutdown, move || {
                daemon.health();
                async {}
            }))
        };
        vec![sweep, rebalance, health]
    }
}

async fn run_ticks<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => tick().await,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    debug!("[daemon] {} ticks stopped", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mm_01_signatures::{KeyPair, SignatureService};
    use mm_02_peer_registry::{PeerRecord, RegistryConfig, StrikeReason};
    use mm_03_gossip::{GossipService, PropagationConfig};
    use mm_04_swarm::{ConnectionTable, SwarmConfig, SwarmNetwork};
    use shared_types::test_utils::FixedTimeSource;
    use shared_types::PeerId;

    struct Fixture {
        daemon: Arc<Daemon>,
        registry: Arc<PeerRegistry>,
        gossip: Arc<GossipService<SwarmNetwork, SignatureService>>,
        swarm: Arc<Swarm>,
        clock: FixedTimeSource,
    }

    fn fixture(swarm_config: SwarmConfig) -> Fixture {
        let clock = FixedTimeSource::new(10_000);
        let registry_config = RegistryConfig {
            jail_strikes: 1,
            jail_duration: Duration::from_secs(60),
            grace_period: Duration::from_secs(120),
            transport_tolerance: 3,
        };
        let registry = Arc::new(PeerRegistry::new(registry_config, Arc::new(clock.clone())));
        let signatures = Arc::new(SignatureService::new(KeyPair::generate().unwrap(), 16));
        let connections = Arc::new(ConnectionTable::new());
        let network = Arc::new(SwarmNetwork::new(connections.clone(), registry.clone()));
        let gossip = Arc::new(GossipService::new(
            PropagationConfig {
                seen_ttl: Duration::from_secs(30),
                ..PropagationConfig::default()
            },
            registry.clone(),
            network,
            signatures.clone(),
        ));
        let swarm = Swarm::new(
            swarm_config,
            registry.clone(),
            connections,
            gossip.clone(),
            signatures,
        );
        let config = DaemonConfig {
            sweep_interval_secs: 1,
            rebalance_interval_secs: 1,
            ping_interval_secs: 1,
        };
        let daemon = Arc::new(Daemon::new(config, registry.clone(), gossip.clone(), swarm.clone()));
        Fixture {
            daemon,
            registry,
            gossip,
            swarm,
            clock,
        }
    }

    fn local_swarm() -> SwarmConfig {
        SwarmConfig {
            listen: "127.0.0.1:0".into(),
            low_watermark: 1,
            ..SwarmConfig::default()
        }
    }

    #[tokio::test]
    async fn test_sweep_releases_jail_and_prunes_seen() {
        let f = fixture(local_swarm());
        let peer = PeerId::from("offender");
        f.registry.upsert(PeerRecord::new(peer.clone(), f.registry.now()));
        f.registry.record_strike(&peer, StrikeReason::InvalidSignature);
        f.gossip.publish("note", serde_json::json!({"n": 1})).unwrap();
        assert_eq!(f.gossip.seen_len(), 1);

        let (report, pruned) = f.daemon.sweep();
        assert_eq!(report.released, 0);
        assert_eq!(pruned, 0);

        f.clock.advance(61);
        let (report, pruned) = f.daemon.sweep();
        assert_eq!(report.released, 1);
        assert_eq!(pruned, 1);
        assert!(!f.registry.is_jailed(&peer));
    }

    #[tokio::test]
    async fn test_sweep_twice_is_harmless() {
        let f = fixture(local_swarm());
        f.clock.advance(1_000);
        assert_eq!(f.daemon.sweep(), f.daemon.sweep());
    }

    #[tokio::test]
    async fn test_health_with_no_peers() {
        let f = fixture(local_swarm());
        assert_eq!(f.daemon.health(), HealthReport::default());
    }

    #[tokio::test]
    async fn test_rebalance_without_targets_is_noop() {
        let f = fixture(local_swarm());
        assert_eq!(f.daemon.rebalance().await, 0);
    }

    #[tokio::test]
    async fn test_spawned_ticks_dial_bootstrap_and_stop_on_shutdown() {
        let seed = fixture(local_swarm());
        let seed_addr = seed.swarm.listen().await.unwrap();

        let f = fixture(SwarmConfig {
            bootstrap: vec![seed_addr.to_string()],
            ..local_swarm()
        });
        f.swarm.listen().await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = f.daemon.spawn(shutdown_rx);

        let mut connected = false;
        for _ in 0..300 {
            if f.swarm.peer_count() == 1 {
                connected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(connected);

        shutdown_tx.send(true).unwrap();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }
}
