//! # Time
//!
//! Millisecond-resolution timestamps and the [`TimeSource`] port.
//!
//! Clocks floor to the millisecond, so a stored instant may trail the real
//! one by up to a millisecond. Deadlines built with [`Timestamp::add_duration`]
//! round the duration up and are meant to be compared inclusively (still
//! pending while `now <= deadline`), which keeps a deadline from passing
//! before the full duration has really elapsed.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const MILLIS_PER_SEC: u64 = 1_000;

/// Unix timestamp in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MILLIS_PER_SEC))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Whole seconds, rounded down.
    pub fn as_secs(&self) -> u64 {
        self.0 / MILLIS_PER_SEC
    }

    /// Add a duration rounded up to the next millisecond, saturating on
    /// overflow. A non-zero duration always moves the timestamp forward.
    pub fn add_duration(&self, duration: Duration) -> Self {
        let millis = duration.as_nanos().div_ceil(1_000_000);
        let millis = u64::try_from(millis).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs.saturating_mul(MILLIS_PER_SEC)))
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// Whole seconds elapsed since `earlier`, rounded down.
    pub fn secs_since(&self, earlier: Timestamp) -> u64 {
        self.since(earlier).as_secs()
    }
}

/// Source of the current time.
///
/// Injected into the registry and the gossip engine so tests can step time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Timestamp::from_millis(millis)
    }
}
