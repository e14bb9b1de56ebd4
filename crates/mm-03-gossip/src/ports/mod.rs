//! Ports for the gossip subsystem.

pub mod inbound;
pub mod outbound;
