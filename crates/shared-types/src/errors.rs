//! # Error Types

use thiserror::Error;

/// Rejected gossip configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("max_peers must be at least 1")]
    ZeroMaxPeers,

    #[error("die must be at least 1 (got {0})")]
    ZeroDie(u32),

    #[error("jail strikes must be at least 1")]
    ZeroJailStrikes,

    #[error("jail duration must be positive")]
    ZeroJailDuration,
}
