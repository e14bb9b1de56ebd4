//! # BLS Primitives (BLS12-381)
//!
//! Pure signing and verification over raw bytes.
//!
//! Uses blst's `min_pk` variant:
//! - Public keys are on G1 (48 bytes compressed)
//! - Signatures are on G2 (96 bytes compressed)
//!
//! Aggregates are only ever formed over a single shared message, so
//! aggregate verification is the fast same-message check.

use super::errors::SignatureError;
use blst::min_pk::{AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;

/// Domain Separation Tag (proof-of-possession ciphersuite)
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

pub fn sign_bls(secret_key: &SecretKey, message: &[u8]) -> Signature {
    secret_key.sign(message, DST, &[])
}

/// Verify a single BLS signature.
///
/// Public keys are validated when decoded, so only the signature is
/// group-checked here.
pub fn verify_bls(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    signature.verify(true, message, DST, &[], public_key, false) == BLST_ERROR::BLST_SUCCESS
}

/// Verify an aggregate signature where every signer signed `message`.
///
/// Sound only for keys whose holders are known to control them; this check
/// alone cannot tell a rogue key from an honest one.
pub fn verify_bls_aggregate(
    message: &[u8],
    aggregate_signature: &Signature,
    public_keys: &[PublicKey],
) -> bool {
    if public_keys.is_empty() {
        return false;
    }

    let pk_refs: Vec<&PublicKey> = public_keys.iter().collect();
    aggregate_signature.fast_aggregate_verify(true, message, DST, &pk_refs)
        == BLST_ERROR::BLST_SUCCESS
}

/// Aggregate multiple BLS signatures into one.
///
/// Point addition is commutative, so the result does not depend on input
/// order.
///
/// # Errors
/// * `EmptyAggregation` if the input list is empty
pub fn aggregate_bls_signatures(signatures: &[Signature]) -> Result<Signature, SignatureError> {
    if signatures.is_empty() {
        return Err(SignatureError::EmptyAggregation);
    }

    let sig_refs: Vec<&Signature> = signatures.iter().collect();
    AggregateSignature::aggregate(&sig_refs, true)
        .map(|aggregate| aggregate.to_signature())
        .map_err(|_| SignatureError::AggregationFailed)
}
