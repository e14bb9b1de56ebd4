//! # Node Configuration
//!
//! Typed configuration loaded from TOML, then overridden from `MURMUR_*`
//! environment variables, then validated once before anything starts.
//!
//! ## Example
//!
//! ```toml
//! name = "relay-1"
//! log = "info"
//! secret_key = "<base58 BLS secret key>"
//! listen = "0.0.0.0:7777"
//! bootstrap = ["10.0.0.1:7777"]
//!
//! [peers]
//! max = 128
//! parallel = 16
//!
//! [jail]
//! duration_minutes = 5
//! strikes = 5
//!
//! [gossip]
//! infect = 24
//! die = 8
//! ```

use mm_02_peer_registry::RegistryConfig;
use mm_03_gossip::PropagationConfig;
use mm_04_swarm::SwarmConfig;
use serde::Deserialize;
use shared_types::GossipConfig;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Longest accepted node name.
pub const MAX_NAME_LEN: usize = 24;

/// Characters taken from the public key when no name is configured.
const DEFAULT_NAME_LEN: usize = 8;

/// Upper bound for any configured period, in seconds (one year).
pub const MAX_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Display name. Defaults to a public key prefix.
    pub name: Option<String>,
    /// Log filter directive, e.g. `info` or `mm_03_gossip=debug`
    pub log: String,
    /// Observer node: consume gossip, never relay
    pub lite: bool,
    /// Base58 BLS secret key
    pub secret_key: Option<String>,
    pub listen: String,
    pub bootstrap: Vec<String>,
    pub peers: PeersConfig,
    pub jail: JailConfig,
    pub gossip: GossipSection,
    pub daemon: DaemonConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: None,
            log: "info".to_string(),
            lite: false,
            secret_key: None,
            listen: "0.0.0.0:7777".to_string(),
            bootstrap: Vec::new(),
            peers: PeersConfig::default(),
            jail: JailConfig::default(),
            gossip: GossipSection::default(),
            daemon: DaemonConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeersConfig {
    pub max: usize,
    pub parallel: usize,
    pub low_watermark: usize,
    pub grace_period_secs: u64,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            max: 128,
            parallel: 16,
            low_watermark: 8,
            grace_period_secs: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JailConfig {
    pub duration_minutes: u64,
    pub strikes: u32,
    /// Consecutive send failures tolerated before one counts as a strike
    pub transport_tolerance: u32,
}

impl Default for JailConfig {
    fn default() -> Self {
        Self {
            duration_minutes: 5,
            strikes: 5,
            transport_tolerance: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GossipSection {
    pub infect: usize,
    pub die: u32,
    pub seen_capacity: usize,
    pub seen_ttl_secs: u64,
    pub write_timeout_ms: u64,
    pub max_payload_bytes: usize,
}

impl Default for GossipSection {
    fn default() -> Self {
        Self {
            infect: 24,
            die: 8,
            seen_capacity: 65_536,
            seen_ttl_secs: 600,
            write_timeout_ms: 5_000,
            max_payload_bytes: 256 * 1024,
        }
    }
}

/// Maintenance tick periods.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub sweep_interval_secs: u64,
    pub rebalance_interval_secs: u64,
    pub ping_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 30,
            rebalance_interval_secs: 15,
            ping_interval_secs: 20,
        }
    }
}

impl DaemonConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn rebalance_interval(&self) -> Duration {
        Duration::from_secs(self.rebalance_interval_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Silence after which a connected peer is dropped.
    pub fn silence_limit(&self) -> Duration {
        self.ping_interval().saturating_mul(3)
    }
}

/// Configuration errors, reported before any component starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("no secret key configured (set secret_key or MURMUR_SECRET_KEY)")]
    MissingSecretKey,

    #[error("name {0:?} may only contain letters, digits, spaces and @ . _ ' -")]
    InvalidName(String),

    #[error("name is {0} characters, at most {} allowed", MAX_NAME_LEN)]
    NameTooLong(usize),

    #[error("low watermark {low} exceeds max peers {max}")]
    LowWatermarkAboveMax { low: usize, max: usize },

    #[error("{0} must be positive")]
    ZeroSetting(&'static str),

    #[error("{0} exceeds one year")]
    PeriodTooLong(&'static str),

    #[error(transparent)]
    Gossip(#[from] shared_types::ConfigError),
}

impl NodeConfig {
    /// Read and parse a TOML config file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `MURMUR_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(log) = lookup("MURMUR_LOG") {
            self.log = log;
        }
        if let Some(listen) = lookup("MURMUR_LISTEN") {
            self.listen = listen;
        }
        if let Some(key) = lookup("MURMUR_SECRET_KEY") {
            self.secret_key = Some(key);
        }
        if let Some(value) = lookup("MURMUR_MAX_PEERS") {
            self.peers.max = parse_env("MURMUR_MAX_PEERS", value)?;
        }
        if let Some(value) = lookup("MURMUR_PARALLEL_PEERS") {
            self.peers.parallel = parse_env("MURMUR_PARALLEL_PEERS", value)?;
        }
        if let Some(value) = lookup("MURMUR_INFECT") {
            self.gossip.infect = parse_env("MURMUR_INFECT", value)?;
        }
        if let Some(value) = lookup("MURMUR_DIE") {
            self.gossip.die = parse_env("MURMUR_DIE", value)?;
        }
        Ok(())
    }

    /// Check every bound. Nothing should start until this passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingSecretKey);
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        self.gossip_config().validate()?;
        if self.peers.low_watermark > self.peers.max {
            return Err(ConfigError::LowWatermarkAboveMax {
                low: self.peers.low_watermark,
                max: self.peers.max,
            });
        }

        let positive = [
            ("gossip.seen_capacity", self.gossip.seen_capacity as u64),
            ("gossip.seen_ttl_secs", self.gossip.seen_ttl_secs),
            ("gossip.write_timeout_ms", self.gossip.write_timeout_ms),
            ("gossip.max_payload_bytes", self.gossip.max_payload_bytes as u64),
            ("daemon.sweep_interval_secs", self.daemon.sweep_interval_secs),
            ("daemon.rebalance_interval_secs", self.daemon.rebalance_interval_secs),
            ("daemon.ping_interval_secs", self.daemon.ping_interval_secs),
        ];
        if let Some((setting, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroSetting(*setting));
        }

        let periods = [
            ("jail.duration_minutes", self.jail.duration_minutes.saturating_mul(60)),
            ("peers.grace_period_secs", self.peers.grace_period_secs),
            ("gossip.seen_ttl_secs", self.gossip.seen_ttl_secs),
            ("daemon.sweep_interval_secs", self.daemon.sweep_interval_secs),
            ("daemon.rebalance_interval_secs", self.daemon.rebalance_interval_secs),
            ("daemon.ping_interval_secs", self.daemon.ping_interval_secs.saturating_mul(3)),
        ];
        if let Some((setting, _)) = periods.iter().find(|(_, secs)| *secs > MAX_PERIOD_SECS) {
            return Err(ConfigError::PeriodTooLong(*setting));
        }
        Ok(())
    }

    /// Configured name, or the first characters of `public_key`.
    pub fn resolve_name(&self, public_key: &str) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => public_key.chars().take(DEFAULT_NAME_LEN).collect(),
        }
    }

    /// Effective infect degree: zero for lite nodes.
    pub fn infect(&self) -> usize {
        if self.lite {
            0
        } else {
            self.gossip.infect
        }
    }

    pub fn gossip_config(&self) -> GossipConfig {
        GossipConfig {
            max_peers: self.peers.max,
            parallel_peers: self.peers.parallel,
            infect: self.infect(),
            die: self.gossip.die,
            jail_duration: Duration::from_secs(self.jail.duration_minutes.saturating_mul(60)),
            jail_strikes: self.jail.strikes,
        }
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            grace_period: Duration::from_secs(self.peers.grace_period_secs),
            transport_tolerance: self.jail.transport_tolerance,
            ..RegistryConfig::from_gossip(&self.gossip_config())
        }
    }

    pub fn propagation_config(&self) -> PropagationConfig {
        PropagationConfig {
            seen_capacity: self.gossip.seen_capacity,
            seen_ttl: Duration::from_secs(self.gossip.seen_ttl_secs),
            max_payload_bytes: self.gossip.max_payload_bytes,
            ..PropagationConfig::from_gossip(&self.gossip_config())
        }
    }

    pub fn swarm_config(&self) -> SwarmConfig {
        let defaults = SwarmConfig::default();
        SwarmConfig {
            listen: self.listen.clone(),
            bootstrap: self.bootstrap.clone(),
            max_peers: self.peers.max,
            low_watermark: self.peers.low_watermark,
            write_timeout: Duration::from_millis(self.gossip.write_timeout_ms),
            // a frame carries the payload plus signer, signature and framing
            max_frame_bytes: self
                .gossip
                .max_payload_bytes
                .saturating_add(4 * 1024)
                .max(defaults.max_frame_bytes),
            ..defaults
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}

/// Names are 1 to 24 characters from `[a-z0-9 @._'-]`, any case.
pub fn validate_name(name: &str) -> Result<(), ConfigError> {
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ConfigError::NameTooLong(len));
    }
    let allowed =
        |c: char| c.is_ascii_alphanumeric() || matches!(c, ' ' | '@' | '.' | '_' | '\'' | '-');
    if name.is_empty() || !name.chars().all(allowed) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}
