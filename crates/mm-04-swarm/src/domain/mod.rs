//! Domain layer for the membership manager.

pub mod config;
pub mod errors;
pub mod frames;
pub mod handshake;
pub mod rate_limiter;
pub mod topic;
