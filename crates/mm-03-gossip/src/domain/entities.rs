//! Gossip message entities.

use super::errors::GossipError;
use mm_01_signatures::{canonical_bytes, Attestation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use shared_types::Fingerprint;

/// Longest accepted message kind tag.
pub const MAX_KIND_LEN: usize = 64;

/// What the originator signs: a type tag plus opaque data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipPayload {
    /// Handler key, e.g. `"price"` or `"ping"`
    pub kind: String,
    pub data: Value,
}

impl GossipPayload {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    /// JSON form used for signing and fingerprinting.
    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(2);
        map.insert("data".to_string(), self.data.clone());
        map.insert("kind".to_string(), Value::String(self.kind.clone()));
        Value::Object(map)
    }

    /// Size of the signed bytes.
    pub fn encoded_len(&self) -> usize {
        canonical_bytes(&self.to_value()).len()
    }
}

/// A signed payload in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GossipMessage {
    pub payload: GossipPayload,
    /// Base58 public key of the originator
    pub signer: String,
    /// Base58 signature over the canonical payload
    pub signature: String,
    /// Relays so far; zero at the originator
    pub hop_count: u32,
}

impl GossipMessage {
    pub fn new(payload: GossipPayload, attestation: Attestation) -> Self {
        Self {
            payload,
            signer: attestation.signer,
            signature: attestation.signature,
            hop_count: 0,
        }
    }

    pub fn attestation(&self) -> Attestation {
        Attestation {
            signer: self.signer.clone(),
            signature: self.signature.clone(),
        }
    }

    /// `sha256(canonical(payload) || signer)`.
    ///
    /// Independent of the signature and hop count, so relayed copies and
    /// re-encodings of the same message collide.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(canonical_bytes(&self.payload.to_value()));
        hasher.update(self.signer.as_bytes());
        Fingerprint(hasher.finalize().into())
    }

    /// The copy sent on to the next hop.
    pub fn relayed(&self) -> Self {
        let mut next = self.clone();
        next.hop_count = next.hop_count.saturating_add(1);
        next
    }

    /// Structural checks that need no cryptography.
    pub fn validate(&self, max_payload_bytes: usize) -> Result<(), GossipError> {
        validate_kind(&self.payload.kind)?;
        if self.signer.is_empty() {
            return Err(GossipError::MissingField("signer"));
        }
        if self.signature.is_empty() {
            return Err(GossipError::MissingField("signature"));
        }
        let size = self.payload.encoded_len();
        if size > max_payload_bytes {
            return Err(GossipError::Oversized {
                size,
                max: max_payload_bytes,
            });
        }
        Ok(())
    }
}

/// Kinds are short ASCII identifiers.
pub fn validate_kind(kind: &str) -> Result<(), GossipError> {
    let valid = !kind.is_empty()
        && kind.len() <= MAX_KIND_LEN
        && kind
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':'));
    if valid {
        Ok(())
    } else {
        Err(GossipError::InvalidKind(kind.to_string()))
    }
}
