//! Swarm errors.

use mm_01_signatures::SignatureError;
use mm_02_peer_registry::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handshake timed out")]
    HandshakeTimeout,

    #[error("connection closed during handshake")]
    ClosedDuringHandshake,

    #[error("unexpected frame during handshake: {0}")]
    UnexpectedFrame(&'static str),

    #[error("peer is on network {theirs}, expected {ours}")]
    TopicMismatch { ours: String, theirs: String },

    #[error("handshake proof did not verify")]
    InvalidProof,

    #[error("refusing to connect to ourselves")]
    SelfConnection,

    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("admission refused: {0}")]
    Admission(#[from] RegistryError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("peer limit of {0} reached")]
    AtCapacity(usize),

    #[error("no local key configured")]
    NoLocalKey,
}
