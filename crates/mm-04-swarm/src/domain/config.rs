//! Swarm configuration.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmConfig {
    /// Local bind address, e.g. `0.0.0.0:7777`
    pub listen: String,
    /// Addresses dialed whenever the peer count is below the low watermark
    pub bootstrap: Vec<String>,
    pub max_peers: usize,
    /// Below this many connections, rebalancing dials out
    pub low_watermark: usize,
    /// A write not finished within this is a transport failure
    pub write_timeout: Duration,
    pub handshake_timeout: Duration,
    /// Inbound connections allowed to be mid-handshake at once
    pub max_pending_handshakes: usize,
    pub dial_timeout: Duration,
    /// Outbound frames queued per connection before sends are refused
    pub queue_capacity: usize,
    /// Largest frame accepted on the wire
    pub max_frame_bytes: usize,
    /// Inbound frames a peer may burst
    pub rate_limit_burst: u64,
    /// Sustained inbound frames per second
    pub rate_limit_per_sec: u64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:7777".to_string(),
            bootstrap: Vec::new(),
            max_peers: 128,
            low_watermark: 8,
            write_timeout: Duration::from_millis(5_000),
            handshake_timeout: Duration::from_secs(10),
            max_pending_handshakes: 64,
            dial_timeout: Duration::from_secs(5),
            queue_capacity: 256,
            max_frame_bytes: 512 * 1024,
            rate_limit_burst: 512,
            rate_limit_per_sec: 256,
        }
    }
}
