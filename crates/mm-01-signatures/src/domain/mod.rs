//! Domain layer for the Signature Service.

pub mod address;
pub mod attestation;
pub mod bls;
pub mod canonical;
pub mod encoding;
pub mod errors;
pub mod keys;
