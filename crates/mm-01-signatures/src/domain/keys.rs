//! # Key Pairs
//!
//! Loading, generating and encoding the local BLS key pair.

use super::address::address_of;
use super::bls::sign_bls;
use super::encoding;
use super::errors::SignatureError;
use blst::min_pk::{PublicKey, SecretKey, Signature};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use shared_types::PeerId;
use std::fmt;
use zeroize::Zeroize;

/// The node's signing identity.
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: PublicKey,
}

/// Base58 form of a key pair, as stored in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedKeyPair {
    pub secret_key: String,
    pub public_key: String,
}

impl KeyPair {
    /// Generate a fresh key pair from OS randomness.
    pub fn generate() -> Result<Self, SignatureError> {
        let mut ikm = [0u8; 32];
        OsRng.fill_bytes(&mut ikm);
        let secret_key = SecretKey::key_gen(&ikm, &[]);
        ikm.zeroize();
        secret_key
            .map(Self::from_secret_key)
            .map_err(|_| SignatureError::InvalidSecretKey)
    }

    /// Load a key pair from a base58-encoded secret key.
    pub fn from_encoded_secret(encoded: &str) -> Result<Self, SignatureError> {
        let mut bytes = encoding::decode(encoded.trim())?;
        let secret_key = SecretKey::from_bytes(&bytes);
        bytes.zeroize();
        secret_key
            .map(Self::from_secret_key)
            .map_err(|_| SignatureError::InvalidSecretKey)
    }

    fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.sk_to_pk();
        Self {
            secret_key,
            public_key,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn encoded_public_key(&self) -> String {
        encoding::encode_public_key(&self.public_key)
    }

    pub fn encode(&self) -> EncodedKeyPair {
        EncodedKeyPair {
            secret_key: encoding::encode(&self.secret_key.to_bytes()),
            public_key: self.encoded_public_key(),
        }
    }

    /// Murmur address of this key pair.
    pub fn address(&self) -> PeerId {
        address_of(&self.public_key.to_bytes())
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Signature {
        sign_bls(&self.secret_key, message)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.encoded_public_key())
            .finish_non_exhaustive()
    }
}
