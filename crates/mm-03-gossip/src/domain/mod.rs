//! Domain layer for gossip dissemination.

pub mod config;
pub mod entities;
pub mod errors;
pub mod fanout;
pub mod seen_set;
