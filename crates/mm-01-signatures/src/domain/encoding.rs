//! # Token Encoding
//!
//! Keys and signatures cross process boundaries as base58 strings.

use super::errors::SignatureError;
use blst::min_pk::{PublicKey, Signature};

pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

pub fn decode(token: &str) -> Result<Vec<u8>, SignatureError> {
    bs58::decode(token)
        .into_vec()
        .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))
}

/// Decode and subgroup-check a public key token.
pub fn decode_public_key(token: &str) -> Result<PublicKey, SignatureError> {
    let bytes = decode(token)?;
    PublicKey::key_validate(&bytes).map_err(|_| SignatureError::InvalidPublicKey)
}

pub fn decode_signature(token: &str) -> Result<Signature, SignatureError> {
    let bytes = decode(token)?;
    Signature::from_bytes(&bytes).map_err(|_| SignatureError::InvalidSignature)
}

pub fn encode_signature(signature: &Signature) -> String {
    encode(&signature.to_bytes())
}

pub fn encode_public_key(public_key: &PublicKey) -> String {
    encode(&public_key.to_bytes())
}
