//! Test utilities shared across crates.
//!
//! Enable with the `test-utils` feature flag.
//!
//! # Example
//!
//! ```rust
//! use shared_types::test_utils::FixedTimeSource;
//! use shared_types::TimeSource;
//!
//! let time = FixedTimeSource::new(1000);
//! time.advance(60);
//! assert_eq!(time.now().as_secs(), 1060);
//! ```

use crate::time::{TimeSource, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A time source that only moves when told to.
///
/// Clones share the same clock, so a test can hand one copy to the component
/// under test and keep another to step time forward. Whole-second helpers
/// cover most tests; the `_millis` variants step inside a second.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    millis: Arc<AtomicU64>,
}

impl FixedTimeSource {
    /// Create a new fixed time source at the given timestamp (in seconds).
    pub fn new(secs: u64) -> Self {
        Self::at(Timestamp::from_secs(secs))
    }

    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(timestamp.as_millis())),
        }
    }

    pub fn set(&self, secs: u64) {
        self.millis
            .store(Timestamp::from_secs(secs).as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.advance_millis(secs.saturating_mul(1_000));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_time_source_returns_configured_value() {
        let source = FixedTimeSource::new(1000);
        assert_eq!(source.now().as_secs(), 1000);
    }

    #[test]
    fn test_clones_share_the_clock() {
        let source = FixedTimeSource::new(500);
        let handle = source.clone();
        handle.advance(30);
        assert_eq!(source.now().as_secs(), 530);
        handle.set(10);
        assert_eq!(source.now().as_secs(), 10);
    }

    #[test]
    fn test_millisecond_steps() {
        let source = FixedTimeSource::at(Timestamp::from_millis(100_900));
        source.advance_millis(150);
        assert_eq!(source.now().as_millis(), 101_050);
        assert_eq!(source.now().as_secs(), 101);
    }
}
