//! # Handshake
//!
//! Both sides open with a [`Challenge`] and answer the other's with a
//! [`Hello`] signing `{"challenge", "hello", "network"}`. Binding the proof to
//! a fresh nonce stops a captured hello from being replayed under someone
//! else's connection.

use super::errors::SwarmError;
use super::frames::{Challenge, Hello};
use mm_01_signatures::{Attestation, SignatureApi};
use serde_json::{json, Value};
use shared_types::PeerId;

/// Fresh 128-bit nonce, hex encoded.
pub fn new_nonce() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

pub fn challenge(network: &str) -> Challenge {
    Challenge {
        network: network.to_string(),
        nonce: new_nonce(),
    }
}

/// The value a hello signs.
pub fn proof_payload(network: &str, challenge_nonce: &str, listen: Option<&str>) -> Value {
    json!({
        "challenge": challenge_nonce,
        "hello": listen,
        "network": network,
    })
}

/// Reject a challenge from another network.
pub fn check_challenge(network: &str, challenge: &Challenge) -> Result<(), SwarmError> {
    if challenge.network != network {
        return Err(SwarmError::TopicMismatch {
            ours: network.to_string(),
            theirs: challenge.network.clone(),
        });
    }
    Ok(())
}

/// Answer the peer's challenge.
pub fn build_hello<S: SignatureApi + ?Sized>(
    signatures: &S,
    network: &str,
    peer_nonce: &str,
    listen: Option<String>,
) -> Result<Hello, SwarmError> {
    if signatures.local_signer().is_none() {
        return Err(SwarmError::NoLocalKey);
    }
    let payload = proof_payload(network, peer_nonce, listen.as_deref());
    let attestation = signatures.attest(&payload)?;
    Ok(Hello {
        listen,
        signer: attestation.signer,
        signature: attestation.signature,
    })
}

/// Check the peer's answer to our challenge and derive its id.
pub fn verify_hello<S: SignatureApi + ?Sized>(
    signatures: &S,
    network: &str,
    our_nonce: &str,
    hello: &Hello,
) -> Result<PeerId, SwarmError> {
    if signatures.local_signer() == Some(hello.signer.as_str()) {
        return Err(SwarmError::SelfConnection);
    }
    let payload = proof_payload(network, our_nonce, hello.listen.as_deref());
    let attestation = Attestation {
        signer: hello.signer.clone(),
        signature: hello.signature.clone(),
    };
    if !signatures.verify(&attestation, &payload) {
        return Err(SwarmError::InvalidProof);
    }
    Ok(signatures.address_of_signer(&hello.signer)?)
}
