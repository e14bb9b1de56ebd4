//! # Jail State Machine
//!
//! Transitions on a single [`PeerRecord`]. Callers hold whatever lock guards
//! the record; these functions never block and never look at the clock.

use super::config::RegistryConfig;
use super::entities::{PeerRecord, PeerState, StrikeOutcome};
use shared_types::Timestamp;

/// Lift an expired jail term. Returns `true` if the peer was released.
///
/// `jailed_until` is inclusive: release happens strictly after it.
pub fn release_if_expired(record: &mut PeerRecord, now: Timestamp) -> bool {
    match record.jailed_until {
        Some(until) if now > until => {
            record.jailed_until = None;
            true
        }
        _ => false,
    }
}

/// Count one violation, jailing the peer when the threshold is reached.
pub fn record_strike(
    record: &mut PeerRecord,
    now: Timestamp,
    config: &RegistryConfig,
) -> StrikeOutcome {
    release_if_expired(record, now);

    if let PeerState::Jailed { until } = record.state(now) {
        return StrikeOutcome::AlreadyJailed { until };
    }

    record.strikes = record.strikes.saturating_add(1);
    if record.strikes < config.jail_strikes {
        return StrikeOutcome::Counted {
            strikes: record.strikes,
        };
    }

    let until = now.add_duration(config.jail_duration);
    record.strikes = 0;
    record.jailed_until = Some(until);
    record.jail_count = record.jail_count.saturating_add(1);
    StrikeOutcome::Jailed { until }
}

/// Count a failed send. Returns `true` once failures exceed the tolerance,
/// resetting the counter so the next strike needs a fresh run of failures.
pub fn record_transport_failure(record: &mut PeerRecord, config: &RegistryConfig) -> bool {
    record.transport_failures = record.transport_failures.saturating_add(1);
    if record.transport_failures > config.transport_tolerance {
        record.transport_failures = 0;
        return true;
    }
    false
}

/// Whether a record has outlived its grace period and may be dropped.
pub fn is_evictable(record: &PeerRecord, now: Timestamp, config: &RegistryConfig) -> bool {
    if record.is_connected() || matches!(record.state(now), PeerState::Jailed { .. }) {
        return false;
    }
    record
        .disconnected_at
        .is_some_and(|at| now.since(at) >= config.grace_period)
}
