//! # Gossip Configuration
//!
//! The six knobs the dissemination core reads. Built once by the node runtime
//! and shared read-only afterwards.

use crate::errors::ConfigError;
use std::time::Duration;

pub const DEFAULT_MAX_PEERS: usize = 128;
pub const DEFAULT_PARALLEL_PEERS: usize = 16;
pub const DEFAULT_INFECT: usize = 24;
pub const DEFAULT_DIE: u32 = 8;
pub const DEFAULT_JAIL_DURATION: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_JAIL_STRIKES: u32 = 5;

/// Process-wide gossip parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipConfig {
    /// Upper bound on simultaneous peer connections.
    pub max_peers: usize,
    /// Fan-out ceiling per processing step.
    pub parallel_peers: usize,
    /// Peers a message is forwarded to per round.
    pub infect: usize,
    /// Relay depth at which propagation stops.
    pub die: u32,
    pub jail_duration: Duration,
    /// Strikes that send a peer to jail.
    pub jail_strikes: u32,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            max_peers: DEFAULT_MAX_PEERS,
            parallel_peers: DEFAULT_PARALLEL_PEERS,
            infect: DEFAULT_INFECT,
            die: DEFAULT_DIE,
            jail_duration: DEFAULT_JAIL_DURATION,
            jail_strikes: DEFAULT_JAIL_STRIKES,
        }
    }
}

impl GossipConfig {
    /// Forward fan-out before clamping to the eligible set.
    pub fn fanout(&self) -> usize {
        self.infect.min(self.parallel_peers)
    }

    /// Observer nodes consume gossip but never relay it.
    pub fn is_observer(&self) -> bool {
        self.fanout() == 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_peers == 0 {
            return Err(ConfigError::ZeroMaxPeers);
        }
        if self.die == 0 {
            return Err(ConfigError::ZeroDie(self.die));
        }
        if self.jail_strikes == 0 {
            return Err(ConfigError::ZeroJailStrikes);
        }
        if self.jail_duration.is_zero() {
            return Err(ConfigError::ZeroJailDuration);
        }
        Ok(())
    }

    /// Small, fast settings for unit tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_testing() -> Self {
        Self {
            max_peers: 16,
            parallel_peers: 8,
            infect: 3,
            die: 2,
            jail_duration: Duration::from_secs(60),
            jail_strikes: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GossipConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fanout(), 16);
        assert_eq!(config.jail_duration, Duration::from_secs(300));
    }

    #[test]
    fn test_fanout_is_min_of_infect_and_parallel() {
        let config = GossipConfig {
            infect: 3,
            parallel_peers: 10,
            ..Default::default()
        };
        assert_eq!(config.fanout(), 3);
    }

    #[test]
    fn test_zero_infect_is_observer() {
        let config = GossipConfig {
            infect: 0,
            ..Default::default()
        };
        assert!(config.is_observer());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_bounds() {
        let mut config = GossipConfig::default();
        config.die = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDie(0)));

        let mut config = GossipConfig::default();
        config.max_peers = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxPeers));

        let mut config = GossipConfig::default();
        config.jail_strikes = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroJailStrikes));

        let mut config = GossipConfig::default();
        config.jail_duration = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroJailDuration));
    }
}
