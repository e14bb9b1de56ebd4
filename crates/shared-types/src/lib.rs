//! # Shared Types Crate
//!
//! Types that cross subsystem boundaries in the Murmur node.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers and configuration used by more
//!   than one crate live here and nowhere else.
//! - **Injected Time**: nothing reads the wall clock directly; components take
//!   a [`TimeSource`] so jail timing can be driven deterministically in tests.
//! - **Immutable Config**: [`GossipConfig`] is validated once at startup and
//!   only read afterwards.

pub mod config;
pub mod entities;
pub mod errors;
pub mod time;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::GossipConfig;
pub use entities::*;
pub use errors::ConfigError;
pub use time::{SystemTimeSource, TimeSource, Timestamp};
