//! # Peer Registry (MM-02)
//!
//! Concurrent table of known peers plus the reputation state machine that
//! jails misbehaving ones.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): [`PeerRecord`], the jail transitions and
//!   the registry policy. Pure functions over a record and a timestamp.
//! - **Registry** (`registry.rs`): [`PeerRegistry`], a `RwLock`-guarded map
//!   that applies the domain rules atomically per mutation.
//!
//! ## Reputation
//!
//! ```text
//! Active --(strikes >= jail_strikes)--> Jailed --(now >= jailed_until)--> Active
//! ```
//!
//! Release is lazy: any eligibility or admission check past expiry returns the
//! peer to `Active`. The periodic sweep only reclaims memory.
//!
//! Strikes reset to zero on entering `Jailed` and stay zero after release;
//! `jail_count` keeps the repeat-offender history for logs.

pub mod domain;
pub mod registry;

pub use domain::config::RegistryConfig;
pub use domain::entities::{PeerRecord, PeerState, StrikeOutcome, StrikeReason, SweepReport};
pub use domain::errors::RegistryError;
pub use registry::PeerRegistry;
