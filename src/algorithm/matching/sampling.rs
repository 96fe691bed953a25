//! Random sampling of eligible controls
//!
//! Sampling is only used when a case has more eligible controls than requested.
//! The random source is passed in by the caller so that runs can be reproduced
//! from a seed.

use crate::algorithm::matching::control_pool::EligibleControls;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Create the RNG for a run, seeded when a seed is given
#[must_use]
pub fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Draw `amount` controls uniformly at random without replacement
///
/// The sample is returned in pool order. If `amount` is not smaller than the
/// number of eligible controls, every control is returned.
pub fn sample_without_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    mut eligible: EligibleControls,
    amount: usize,
) -> EligibleControls {
    if amount >= eligible.len() {
        return eligible;
    }

    let (selected, _) = eligible.partial_shuffle(rng, amount);
    let mut sample: EligibleControls = selected.iter().copied().collect();
    sample.sort_unstable();
    sample
}
