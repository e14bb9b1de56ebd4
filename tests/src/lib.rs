//! # Murmur Test Suite
//!
//! Cross-crate tests that need more than one subsystem.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # in-process network, key material, clocks
//!     ├── scenarios.rs         # gossip scenarios A, B and C end to end
//!     ├── quorum.rs            # aggregate attestations riding on gossip
//!     └── swarm_propagation.rs # multi-node loopback TCP swarms
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mm-tests
//! cargo test -p mm-tests integration::scenarios::
//! cargo bench -p mm-tests
//! ```

pub mod integration;
