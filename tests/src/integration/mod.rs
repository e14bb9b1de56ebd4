//! Cross-subsystem integration tests.

pub mod fixtures;

#[cfg(test)]
mod quorum;
#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod swarm_propagation;
