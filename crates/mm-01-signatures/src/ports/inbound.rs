//! # Inbound Ports (Driving Ports / API)
//!
//! The authentication contract consumed by the gossip engine and the swarm
//! handshake. Data is passed as JSON values and canonicalized before any
//! signing or verification.

use crate::domain::attestation::Attestation;
use crate::domain::errors::SignatureError;
use serde_json::Value;
use shared_types::PeerId;

/// Primary Signature API.
///
/// Implementations must be thread-safe (`Send + Sync`); verification is
/// called concurrently from connection tasks.
pub trait SignatureApi: Send + Sync {
    /// Sign the canonical encoding of `data`, returning a base58 signature.
    ///
    /// # Errors
    /// * `MissingSecretKey` if the service was built without a key pair
    fn sign(&self, data: &Value) -> Result<String, SignatureError>;

    /// Sign `payload` and pair the signature with the local public key.
    fn attest(&self, payload: &Value) -> Result<Attestation, SignatureError>;

    /// Check an attestation over `data`.
    ///
    /// Never errors: undecodable signer or signature yields `false`.
    fn verify(&self, attestation: &Attestation, data: &Value) -> bool;

    /// Check that `aggregate_signature` is every signer's signature over the
    /// same `data`. Fails closed on any decode error or an empty signer list.
    fn verify_aggregate(&self, signers: &[String], aggregate_signature: &str, data: &Value) -> bool;

    /// Combine independent signatures into one. Order-independent.
    fn aggregate(&self, signatures: &[String]) -> Result<String, SignatureError>;

    /// Verify many attestations in parallel. Output order matches input.
    fn verify_batch(&self, items: &[(Attestation, Value)]) -> Vec<bool>;

    /// Murmur address of a base58 public key.
    fn address_of_signer(&self, signer: &str) -> Result<PeerId, SignatureError>;

    /// Base58 public key of the local node, if one is configured.
    fn local_signer(&self) -> Option<&str>;
}
