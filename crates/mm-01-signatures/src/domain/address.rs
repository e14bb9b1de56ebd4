//! # Murmur Address
//!
//! `address_of(pk) = base58(sha256(pk)[..20])`

use sha2::{Digest, Sha256};
use shared_types::PeerId;

const ADDRESS_BYTES: usize = 20;

/// Derive the stable swarm identifier of a public key.
pub fn address_of(public_key_bytes: &[u8]) -> PeerId {
    let digest = Sha256::digest(public_key_bytes);
    PeerId::new(bs58::encode(&digest[..ADDRESS_BYTES]).into_string())
}
