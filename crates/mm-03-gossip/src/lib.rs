//! # Gossip Disseminator (MM-03)
//!
//! Epidemic broadcast in the infect/die model.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): message shape and fingerprints, the
//!   seen-set, fan-out selection, propagation config.
//! - **Ports Layer** (`ports/`): [`GossipApi`] (driven by the swarm and the
//!   application), [`PeerNetwork`] (implemented by the swarm),
//!   [`KnownMessageStore`] (optional durability) and [`GossipHandler`]
//!   (application dispatch).
//! - **Service Layer** (`service.rs`): [`GossipService`].
//!
//! ## Inbound Pipeline
//!
//! 1. Jailed sender: refused, no strike.
//! 2. Shape and size check. Failure: strike, drop.
//! 3. Signature check. Failure: strike, drop.
//! 4. Seen-set insert-if-absent. Duplicate: silent drop.
//! 5. Dispatch to the handler registered for the payload kind.
//! 6. Relay to `min(infect, parallel_peers, eligible)` random peers with
//!    `hop_count + 1`, unless `hop_count >= die`.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::config::PropagationConfig;
pub use domain::entities::{GossipMessage, GossipPayload, MAX_KIND_LEN};
pub use domain::errors::GossipError;
pub use domain::fanout::select_targets;
pub use domain::seen_set::SeenSet;
pub use ports::inbound::{Disposition, GossipApi, PublishReport, RejectReason};
pub use ports::outbound::{GossipHandler, KnownMessageStore, MemoryKnownStore, PeerNetwork};
pub use service::{GossipService, GossipStats};
