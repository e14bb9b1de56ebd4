//! Registry errors.

use shared_types::{PeerId, Timestamp};
use thiserror::Error;

/// Reasons a registry mutation was refused.
///
/// Refusals leave the registry untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("peer {0} is not known")]
    UnknownPeer(PeerId),

    #[error("peer {peer} is jailed until {}", .until.as_secs())]
    Jailed { peer: PeerId, until: Timestamp },

    #[error("peer limit of {limit} reached")]
    Full { limit: usize },

    #[error("peer {0} already has an open connection")]
    AlreadyConnected(PeerId),
}
