//! Registry policy.

use shared_types::GossipConfig;
use std::time::Duration;

/// Consecutive send failures tolerated before one counts as a strike.
pub const DEFAULT_TRANSPORT_TOLERANCE: u32 = 3;

/// How long a disconnected peer's record outlives its connection.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Strikes that send a peer to jail
    pub jail_strikes: u32,
    pub jail_duration: Duration,
    /// Retention of history for disconnected peers, so reconnecting does not
    /// wipe strikes
    pub grace_period: Duration,
    /// Consecutive transport failures tolerated before a strike
    pub transport_tolerance: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::from_gossip(&GossipConfig::default())
    }
}

impl RegistryConfig {
    /// Jail settings from the process gossip config, other knobs at defaults.
    pub fn from_gossip(gossip: &GossipConfig) -> Self {
        Self {
            jail_strikes: gossip.jail_strikes,
            jail_duration: gossip.jail_duration,
            grace_period: DEFAULT_GRACE_PERIOD,
            transport_tolerance: DEFAULT_TRANSPORT_TOLERANCE,
        }
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            jail_strikes: 3,
            jail_duration: Duration::from_secs(60),
            grace_period: Duration::from_secs(120),
            transport_tolerance: 2,
        }
    }
}
