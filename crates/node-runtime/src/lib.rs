//! # Node Runtime Library
//!
//! Process host for a Murmur node: configuration, wiring and the daemon
//! scheduler. The binary in `main.rs` adds logging and signal handling on
//! top.

pub mod config;
pub mod daemon;
pub mod node;

pub use config::{ConfigError, NodeConfig};
pub use daemon::{Daemon, HealthReport};
pub use node::{NodeError, NodeGossip, NodeRuntime};
