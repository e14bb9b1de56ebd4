//! # Signature Service (MM-01)
//!
//! Authentication boundary for everything that rides the gossip layer.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): canonical encoding, BLS primitives,
//!   base58 tokens, key pairs, attestations. No I/O.
//! - **Ports Layer** (`ports/`): the [`SignatureApi`] consumed by gossip and
//!   the swarm handshake.
//! - **Service Layer** (`service.rs`): [`SignatureService`] owns the local key
//!   pair and the bounded public-key decode cache.
//!
//! ## Wire Conventions
//!
//! - Keys and signatures travel as base58 strings ("tokens").
//! - BLS12-381 in the minimal-public-key variant: 48-byte public keys on G1,
//!   96-byte signatures on G2.
//! - Signed bytes are the canonical JSON encoding of the data: object keys
//!   sorted, no insignificant whitespace.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::address::address_of;
pub use domain::attestation::{AggregateAttestation, Attestation};
pub use domain::canonical::{canonical_bytes, to_canonical};
pub use domain::errors::SignatureError;
pub use domain::keys::{EncodedKeyPair, KeyPair};
pub use ports::inbound::SignatureApi;
pub use service::{SignatureService, DEFAULT_DECODE_CACHE_CAPACITY};
