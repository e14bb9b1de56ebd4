//! Gossip errors.

use mm_01_signatures::SignatureError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GossipError {
    #[error("payload too large: {size} bytes (max: {max})")]
    Oversized { size: usize, max: usize },

    #[error("invalid message kind: {0:?}")]
    InvalidKind(String),

    #[error("message is missing its {0}")]
    MissingField(&'static str),

    #[error("signing failed: {0}")]
    Signing(#[from] SignatureError),

    #[error("network error: {0}")]
    Network(String),
}
