//! # Attestations
//!
//! A single signer's proof over a payload, and quorum evidence formed by
//! aggregating many of them.

use super::errors::SignatureError;
use crate::ports::inbound::SignatureApi;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// `{signer, signature}` as produced by `attest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attestation {
    /// Base58 public key
    pub signer: String,
    /// Base58 signature over the canonical payload
    pub signature: String,
}

/// Several signers jointly vouching for the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateAttestation {
    pub attestations: Vec<Attestation>,
    /// Aggregate of every signature in `attestations`
    pub signature: String,
}

impl AggregateAttestation {
    /// Build quorum evidence from individually signed attestations.
    ///
    /// Each attestation is verified against `payload` in parallel. Invalid
    /// ones and repeated signers are dropped; the rest are aggregated.
    ///
    /// # Errors
    /// * `NoValidAttestations` if nothing survives verification
    pub fn collect<S: SignatureApi + ?Sized>(
        api: &S,
        payload: &Value,
        candidates: Vec<Attestation>,
    ) -> Result<Self, SignatureError> {
        let validity: Vec<bool> = candidates
            .par_iter()
            .map(|attestation| api.verify(attestation, payload))
            .collect();

        let mut seen = HashSet::new();
        let attestations: Vec<Attestation> = candidates
            .into_iter()
            .zip(validity)
            .filter(|(attestation, valid)| *valid && seen.insert(attestation.signer.clone()))
            .map(|(attestation, _)| attestation)
            .collect();

        if attestations.is_empty() {
            return Err(SignatureError::NoValidAttestations);
        }

        let signatures: Vec<String> = attestations.iter().map(|a| a.signature.clone()).collect();
        let signature = api.aggregate(&signatures)?;

        Ok(Self {
            attestations,
            signature,
        })
    }

    pub fn signers(&self) -> Vec<String> {
        self.attestations.iter().map(|a| a.signer.clone()).collect()
    }

    /// Valid iff the signers are distinct, each listed attestation verifies
    /// on its own, and the aggregate verifies for all of them over `payload`.
    ///
    /// Same-message aggregate verification alone accepts a rogue key built
    /// to cancel another signer's key, so every signer must also prove its
    /// own signature.
    pub fn is_valid<S: SignatureApi + ?Sized>(&self, api: &S, payload: &Value) -> bool {
        let mut distinct = HashSet::new();
        if !self
            .attestations
            .iter()
            .all(|attestation| distinct.insert(attestation.signer.as_str()))
        {
            return false;
        }

        self.attestations
            .par_iter()
            .all(|attestation| api.verify(attestation, payload))
            && api.verify_aggregate(&self.signers(), &self.signature, payload)
    }
}
