//! Forward target selection.

use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::PeerId;

/// Pick up to `fanout` peers uniformly at random from `eligible`.
///
/// The immediate sender is left out whenever anyone else is eligible. The
/// exclusion applies to this message only.
pub fn select_targets<R: Rng + ?Sized>(
    eligible: &[PeerId],
    sender: Option<&PeerId>,
    fanout: usize,
    rng: &mut R,
) -> Vec<PeerId> {
    if fanout == 0 || eligible.is_empty() {
        return Vec::new();
    }

    let others: Vec<&PeerId> = eligible.iter().filter(|p| Some(*p) != sender).collect();
    let pool: Vec<&PeerId> = if others.is_empty() {
        eligible.iter().collect()
    } else {
        others
    };

    pool.choose_multiple(rng, fanout)
        .map(|peer| (*peer).clone())
        .collect()
}
