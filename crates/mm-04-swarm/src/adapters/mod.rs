//! Adapters connecting the swarm to the gossip engine.

pub mod network;
