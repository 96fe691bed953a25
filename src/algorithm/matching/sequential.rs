//! Sequential matching implementation
//!
//! Cases are processed strictly one after another in input order. Each case draws
//! from whatever the earlier cases left in the pool, so the result depends on case
//! order and the loop cannot be parallelized.

use crate::algorithm::matching::assembler::{CONTROL_FLAG, CaseControlAssembler};
use crate::algorithm::matching::control_pool::ControlPool;
use crate::algorithm::matching::sampling::sample_without_replacement;
use crate::algorithm::matching::types::{CaseOutcome, ExtractedAttributes};
use crate::config::MatchingConfig;
use crate::error::{MatchingError, Result};
use crate::utils::logging::{create_case_progress_bar, finish_progress_bar, log_case_heading};
use log::log;
use rand::Rng;

/// How many eligible controls a case takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// No usable controls; the case is left out
    Drop,
    /// Take every eligible control
    TakeAll,
    /// Draw a random sample of the requested size
    Sample,
}

/// Decide the policy for a case with `eligible` matching controls when `requested`
/// controls per case are wanted
///
/// With `requested == 0` a case could only be emitted without controls, which is
/// never allowed, so it is dropped.
pub fn select_policy(eligible: usize, requested: usize) -> Result<SelectionPolicy> {
    match (eligible, requested) {
        (0, _) => Ok(SelectionPolicy::Drop),
        (n, k) if n <= k => Ok(SelectionPolicy::TakeAll),
        (_, 0) => Ok(SelectionPolicy::Drop),
        (n, k) if n > k => Ok(SelectionPolicy::Sample),
        (n, k) => Err(MatchingError::invariant(format!(
            "no selection policy for {n} eligible controls and {k} requested"
        ))),
    }
}

/// Perform sequential matching over every case
///
/// Accepted cases and their controls are written to `assembler`; consumed controls
/// are removed from `pool`. Returns the outcome of each case in case order.
pub fn perform_sequential_matching<R: Rng + ?Sized>(
    case_attributes: &ExtractedAttributes,
    pool: &mut ControlPool,
    assembler: &mut CaseControlAssembler,
    config: &MatchingConfig,
    rng: &mut R,
) -> Result<Vec<CaseOutcome>> {
    let level = config.trace_level();
    let requested = config.controls_per_case;
    let mut outcomes = Vec::with_capacity(case_attributes.len());
    let mut cursor = assembler.len();

    let pb = create_case_progress_bar(case_attributes.len() as u64, config.verbose);

    for (case_row, (case_id, case_key)) in case_attributes
        .ids
        .iter()
        .zip(&case_attributes.keys)
        .enumerate()
    {

        log_case_heading(config, case_row, pool.len());
        log!(level, "Case {case_id} matching key {case_key}");

        let eligible = pool.eligible(case_key);
        let num_eligible = eligible.len();
        log!(level, "Number of available controls = {num_eligible}");

        let outcome = match select_policy(num_eligible, requested)? {
            SelectionPolicy::Drop => {
                log!(
                    level,
                    "Available controls = {num_eligible}. Case not included in final dataset."
                );
                CaseOutcome::Dropped
            }
            policy => {
                let selected = if policy == SelectionPolicy::Sample {
                    sample_without_replacement(rng, eligible, requested)
                } else {
                    eligible
                };

                let expected = num_eligible.min(requested);
                if selected.is_empty() || selected.len() != expected {
                    return Err(MatchingError::invariant(format!(
                        "case {case_id} selected {} controls, expected {expected}",
                        selected.len()
                    )));
                }

                log!(
                    level,
                    "Available controls = {num_eligible}. Requested number of controls = {requested}. Selected = {}",
                    selected.len()
                );

                let groups = vec![case_row; selected.len()];
                let flags = vec![CONTROL_FLAG; selected.len()];

                cursor = assembler.write_case(cursor, case_row)?;
                cursor = assembler.write_controls(cursor, &selected, &groups, &flags)?;

                for &position in &selected {
                    log!(level, "  control {}", pool.id(position));
                }
                pool.remove(&selected)?;

                if policy == SelectionPolicy::Sample {
                    CaseOutcome::Sampled {
                        eligible: num_eligible,
                        controls: selected.len(),
                    }
                } else {
                    CaseOutcome::AllEligible {
                        controls: selected.len(),
                    }
                }
            }
        };

        outcomes.push(outcome);

        pb.inc(1);
        if case_row % 100 == 0 {
            pb.set_message(format!(
                "Found {} matches",
                outcomes.iter().filter(|outcome| outcome.is_matched()).count()
            ));
        }
    }

    finish_progress_bar(&pb, Some("Matching complete"));

    Ok(outcomes)
}
