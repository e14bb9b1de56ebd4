//! # Membership Manager (MM-04)
//!
//! Keeps the node's peer connections between the low watermark and
//! `max_peers`, authenticates peers on connect, and carries gossip frames.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): wire frames, the challenge/hello
//!   handshake, network topic, token-bucket rate limiting, swarm config.
//! - **Connection table** (`connections.rs`): live connections by peer, each
//!   with a bounded outbound queue and a cancellation token.
//! - **Adapters** (`adapters/`): [`SwarmNetwork`], the gossip
//!   [`PeerNetwork`](mm_03_gossip::PeerNetwork) implementation.
//! - **Service** (`service.rs`): [`Swarm`]: listener, dialer, per-connection
//!   tasks, rebalancing and health checks.
//!
//! ## Wire Format
//!
//! ```text
//! [4 bytes: frame length (u32-be)] [N bytes: JSON WireFrame]
//! ```
//!
//! Connection setup, symmetric on both sides:
//!
//! ```text
//! -> Challenge { network, nonce }      <- Challenge { network, nonce }
//! -> Hello { listen, signer, sig(peer nonce) }
//!                                      <- Hello { listen, signer, sig(our nonce) }
//! ```
//!
//! After that, `Gossip`, `Ping` and `Pong` frames flow both ways.

pub mod adapters;
pub mod connections;
pub mod domain;
pub mod service;

pub use adapters::network::SwarmNetwork;
pub use connections::{ConnectionDirection, ConnectionTable};
pub use domain::config::SwarmConfig;
pub use domain::errors::SwarmError;
pub use domain::frames::{Challenge, Hello, WireFrame};
pub use domain::topic::{network_topic, PROTOCOL_VERSION};
pub use service::Swarm;
