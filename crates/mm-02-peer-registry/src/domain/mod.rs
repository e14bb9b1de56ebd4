//! Domain layer for the peer registry.

pub mod config;
pub mod entities;
pub mod errors;
pub mod jail;
