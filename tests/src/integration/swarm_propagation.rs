//! # Loopback Swarms
//!
//! Full nodes on 127.0.0.1 talking over real TCP: handshake, framing, relay
//! and termination end to end.

use mm_01_signatures::KeyPair;
use node_runtime::{NodeConfig, NodeRuntime};
use serde_json::{json, Value};
use shared_types::PeerId;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct LiveNode {
    runtime: NodeRuntime,
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl LiveNode {
    async fn start(adjust: impl FnOnce(&mut NodeConfig)) -> Self {
        let mut config = NodeConfig {
            secret_key: Some(KeyPair::generate().unwrap().encode().secret_key),
            listen: "127.0.0.1:0".to_string(),
            ..NodeConfig::default()
        };
        adjust(&mut config);

        let runtime = NodeRuntime::new(config).unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        runtime
            .register_handler("rumor", move |_: &PeerId, _: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        let addr = runtime.start().await.unwrap();
        Self { runtime, addr, hits }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn id(&self) -> PeerId {
        self.runtime.peer_id().unwrap()
    }

    async fn link(&self, other: &LiveNode) {
        let peer = self.runtime.connect(&other.addr.to_string()).await.unwrap();
        assert_eq!(peer, other.id());
        let me = self.id();
        assert!(eventually(|| other.runtime.swarm().is_connected(&me)).await);
    }
}

async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..300 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

async fn shutdown_all(nodes: &[LiveNode]) {
    for node in nodes {
        node.runtime.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_mesh_delivers_exactly_once() {
    let mut nodes = Vec::new();
    for _ in 0..4 {
        nodes.push(LiveNode::start(|_| {}).await);
    }
    for i in 0..nodes.len() {
        for j in i + 1..nodes.len() {
            nodes[i].link(&nodes[j]).await;
        }
    }

    let report = nodes[0].runtime.publish("rumor", json!({"n": 1})).unwrap();
    assert_eq!(report.forwarded_to.len(), 3);

    assert!(eventually(|| nodes[1..].iter().all(|n| n.hits() == 1)).await);
    settle().await;

    assert_eq!(nodes[0].hits(), 0);
    for node in &nodes[1..] {
        assert_eq!(node.hits(), 1);
    }
    // later copies of the same rumor are absorbed by the seen-set
    let duplicates: u64 = nodes
        .iter()
        .map(|n| n.runtime.gossip().stats().duplicates)
        .sum();
    assert!(duplicates > 0);

    shutdown_all(&nodes).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn chain_stops_at_die() {
    let mut nodes = Vec::new();
    for _ in 0..4 {
        nodes.push(LiveNode::start(|config| config.gossip.die = 2).await);
    }
    for pair in nodes.windows(2) {
        pair[0].link(&pair[1]).await;
    }

    nodes[0].runtime.publish("rumor", json!("bounded")).unwrap();

    // the first relay arrives at hop 1, the second at hop 2 and stops there
    assert!(eventually(|| nodes[2].hits() == 1).await);
    settle().await;
    assert_eq!(nodes[1].hits(), 1);
    assert_eq!(nodes[3].hits(), 0);

    shutdown_all(&nodes).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lite_node_listens_but_does_not_relay() {
    let origin = LiveNode::start(|_| {}).await;
    let lite = LiveNode::start(|config| config.lite = true).await;
    let beyond = LiveNode::start(|_| {}).await;
    origin.link(&lite).await;
    lite.link(&beyond).await;

    origin.runtime.publish("rumor", json!("observe")).unwrap();

    assert!(eventually(|| lite.hits() == 1).await);
    settle().await;
    assert_eq!(beyond.hits(), 0);

    let nodes = [origin, lite, beyond];
    shutdown_all(&nodes).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disconnected_peer_is_redialed() {
    let a = LiveNode::start(|config| config.daemon.rebalance_interval_secs = 1).await;
    let b = LiveNode::start(|_| {}).await;
    a.link(&b).await;

    let b_id = b.id();
    a.runtime.swarm().disconnect(&b_id);
    assert!(eventually(|| !a.runtime.swarm().is_connected(&b_id)).await);

    // the rebalance tick dials the remembered address again
    let redialed = async {
        for _ in 0..50 {
            if a.runtime.swarm().is_connected(&b_id) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        false
    };
    assert!(redialed.await);

    let nodes = [a, b];
    shutdown_all(&nodes).await;
}
