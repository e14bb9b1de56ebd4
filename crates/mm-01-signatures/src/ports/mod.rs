//! Ports for the Signature Service.

pub mod inbound;
