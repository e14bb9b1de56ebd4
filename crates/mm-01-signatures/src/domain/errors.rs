//! # Signature Errors

use thiserror::Error;

/// Errors raised by signing, decoding and aggregation.
///
/// Verification itself never errors: malformed input verifies as `false`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// No secret key configured, so nothing can be signed
    #[error("No secret key configured")]
    MissingSecretKey,

    /// No public key configured, so nothing can be attested
    #[error("No public key configured")]
    MissingPublicKey,

    /// Token is not valid base58
    #[error("Invalid base58 token: {0}")]
    InvalidEncoding(String),

    /// Bytes do not form a valid, subgroup-checked public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Bytes do not form a valid signature point
    #[error("Invalid signature format")]
    InvalidSignature,

    #[error("Invalid secret key")]
    InvalidSecretKey,

    /// Cannot aggregate an empty list of signatures
    #[error("Cannot aggregate empty signature list")]
    EmptyAggregation,

    /// Point aggregation rejected one of the inputs
    #[error("BLS aggregation failed")]
    AggregationFailed,

    /// None of the attestations offered for aggregation verified
    #[error("No valid attestations to aggregate")]
    NoValidAttestations,

    #[error("Canonical encoding failed: {0}")]
    Serialization(String),
}
