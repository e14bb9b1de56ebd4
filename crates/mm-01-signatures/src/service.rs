//! # Signature Service
//!
//! Application service implementing [`SignatureApi`].
//!
//! Owns the local key pair (if any) and an LRU cache of decoded peer public
//! keys. The same signer is decoded on every message it originates, and the
//! subgroup check on decode is the expensive part, so hits skip it entirely.
//! The cache is bounded so key churn cannot grow it without limit.

use crate::domain::address::address_of;
use crate::domain::attestation::Attestation;
use crate::domain::bls;
use crate::domain::canonical::canonical_bytes;
use crate::domain::encoding;
use crate::domain::errors::SignatureError;
use crate::domain::keys::KeyPair;
use crate::ports::inbound::SignatureApi;
use blst::min_pk::{PublicKey, Signature};
use lru::LruCache;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde_json::Value;
use shared_types::PeerId;
use std::num::NonZeroUsize;
use tracing::trace;

/// Decode cache size when none is configured.
pub const DEFAULT_DECODE_CACHE_CAPACITY: usize = 1024;

/// Signature Service.
pub struct SignatureService {
    keys: Option<KeyPair>,
    local_signer: Option<String>,
    decode_cache: Mutex<LruCache<String, PublicKey>>,
}

impl SignatureService {
    /// Create a signing service around the local key pair.
    ///
    /// `cache_capacity` is normally derived from the peer limit; zero falls
    /// back to [`DEFAULT_DECODE_CACHE_CAPACITY`].
    pub fn new(keys: KeyPair, cache_capacity: usize) -> Self {
        let local_signer = Some(keys.encoded_public_key());
        Self {
            keys: Some(keys),
            local_signer,
            decode_cache: Mutex::new(LruCache::new(capacity(cache_capacity))),
        }
    }

    /// A service that can verify but not sign.
    pub fn verifier_only(cache_capacity: usize) -> Self {
        Self {
            keys: None,
            local_signer: None,
            decode_cache: Mutex::new(LruCache::new(capacity(cache_capacity))),
        }
    }

    /// Murmur address of the local key, if one is configured.
    pub fn local_address(&self) -> Option<PeerId> {
        self.keys.as_ref().map(KeyPair::address)
    }

    /// Decode a base58 public key, memoized by the token string.
    pub fn cached_decode_public_key(&self, token: &str) -> Result<PublicKey, SignatureError> {
        if let Some(public_key) = self.decode_cache.lock().get(token) {
            return Ok(*public_key);
        }

        // Decode outside the lock; a racing decode of the same token is harmless.
        let public_key = encoding::decode_public_key(token)?;
        self.decode_cache.lock().put(token.to_string(), public_key);
        trace!("[signatures] cached public key {}", token);
        Ok(public_key)
    }

    pub fn cached_keys(&self) -> usize {
        self.decode_cache.lock().len()
    }

    fn decode_pair(
        &self,
        attestation: &Attestation,
    ) -> Result<(PublicKey, Signature), SignatureError> {
        let public_key = self.cached_decode_public_key(&attestation.signer)?;
        let signature = encoding::decode_signature(&attestation.signature)?;
        Ok((public_key, signature))
    }
}

fn capacity(requested: usize) -> NonZeroUsize {
    NonZeroUsize::new(requested)
        .or_else(|| NonZeroUsize::new(DEFAULT_DECODE_CACHE_CAPACITY))
        .unwrap_or(NonZeroUsize::MIN)
}

impl SignatureApi for SignatureService {
    fn sign(&self, data: &Value) -> Result<String, SignatureError> {
        let keys = self.keys.as_ref().ok_or(SignatureError::MissingSecretKey)?;
        let message = canonical_bytes(data);
        Ok(encoding::encode_signature(&keys.sign(&message)))
    }

    fn attest(&self, payload: &Value) -> Result<Attestation, SignatureError> {
        let signer = self
            .local_signer
            .clone()
            .ok_or(SignatureError::MissingPublicKey)?;
        let signature = self.sign(payload)?;
        Ok(Attestation { signer, signature })
    }

    fn verify(&self, attestation: &Attestation, data: &Value) -> bool {
        let Ok((public_key, signature)) = self.decode_pair(attestation) else {
            return false;
        };
        bls::verify_bls(&canonical_bytes(data), &signature, &public_key)
    }

    fn verify_aggregate(
        &self,
        signers: &[String],
        aggregate_signature: &str,
        data: &Value,
    ) -> bool {
        let Ok(signature) = encoding::decode_signature(aggregate_signature) else {
            return false;
        };

        let public_keys: Result<Vec<PublicKey>, SignatureError> = signers
            .iter()
            .map(|signer| self.cached_decode_public_key(signer))
            .collect();
        let Ok(public_keys) = public_keys else {
            return false;
        };

        bls::verify_bls_aggregate(&canonical_bytes(data), &signature, &public_keys)
    }

    fn aggregate(&self, signatures: &[String]) -> Result<String, SignatureError> {
        let decoded = signatures
            .iter()
            .map(|token| encoding::decode_signature(token))
            .collect::<Result<Vec<Signature>, SignatureError>>()?;
        let aggregate = bls::aggregate_bls_signatures(&decoded)?;
        Ok(encoding::encode_signature(&aggregate))
    }

    fn verify_batch(&self, items: &[(Attestation, Value)]) -> Vec<bool> {
        items
            .par_iter()
            .map(|(attestation, data)| self.verify(attestation, data))
            .collect()
    }

    fn address_of_signer(&self, signer: &str) -> Result<PeerId, SignatureError> {
        let public_key = self.cached_decode_public_key(signer)?;
        Ok(address_of(&public_key.to_bytes()))
    }

    fn local_signer(&self) -> Option<&str> {
        self.local_signer.as_deref()
    }
}
