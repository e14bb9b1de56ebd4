//! Network topic.
//!
//! Nodes only talk to peers on the same topic, which changes whenever the
//! wire protocol does.

use sha2::{Digest, Sha256};

pub const PROTOCOL_VERSION: &str = "0.1.0";

const TOPIC_PREFIX: &str = "Murmur.Swarm.Topic.V";

/// `hex(sha256("Murmur.Swarm.Topic.V<version>"))`
pub fn network_topic(version: &str) -> String {
    hex::encode(Sha256::digest(format!("{TOPIC_PREFIX}{version}")))
}
