//! Propagation configuration.

use shared_types::GossipConfig;
use std::time::Duration;

/// Largest canonical payload accepted or published.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 256 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationConfig {
    /// Peers each message is forwarded to per round
    pub infect: usize,
    /// Fan-out ceiling per processing step
    pub parallel_peers: usize,
    /// Relay depth at which forwarding stops
    pub die: u32,
    /// Seen-set capacity (fingerprints)
    pub seen_capacity: usize,
    /// Seen-set window
    pub seen_ttl: Duration,
    pub max_payload_bytes: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self::from_gossip(&GossipConfig::default())
    }
}

impl PropagationConfig {
    pub fn from_gossip(gossip: &GossipConfig) -> Self {
        Self {
            infect: gossip.infect,
            parallel_peers: gossip.parallel_peers,
            die: gossip.die,
            seen_capacity: 65_536,
            seen_ttl: Duration::from_secs(10 * 60),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    /// Fan-out before clamping to the eligible set.
    pub fn fanout(&self) -> usize {
        self.infect.min(self.parallel_peers)
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            infect: 3,
            parallel_peers: 8,
            die: 2,
            seen_capacity: 128,
            seen_ttl: Duration::from_secs(60),
            max_payload_bytes: 1024,
        }
    }
}
