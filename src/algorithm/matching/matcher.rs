//! Core matching algorithm implementation
//!
//! This module implements the Matcher struct which orchestrates the matching process.

use crate::algorithm::matching::assembler::CaseControlAssembler;
use crate::algorithm::matching::control_pool::ControlPool;
use crate::algorithm::matching::extraction::extract_attributes;
use crate::algorithm::matching::sampling::create_rng;
use crate::algorithm::matching::sequential::perform_sequential_matching;
use crate::algorithm::matching::types::{CaseOutcome, MatchingResult, MatchingSummary};
use crate::algorithm::matching::validation::validate_config;
use crate::config::MatchingConfig;
use crate::error::{MatchingError, Result};
use crate::utils::logging::{log_matching_complete, log_matching_start};
use arrow::record_batch::RecordBatch;
use rand::Rng;
use std::time::Instant;

/// Matcher for pairing cases with controls
#[derive(Debug)]
pub struct Matcher {
    /// Matching configuration
    config: MatchingConfig,
}

impl Matcher {
    /// Create a new matcher with the given configuration
    #[must_use]
    pub const fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// The configuration this matcher runs with
    #[must_use]
    pub const fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Perform matching between cases and controls
    ///
    /// Sampling uses the configured seed, or OS entropy when none is set.
    ///
    /// # Arguments
    ///
    /// * `cases` - `RecordBatch` containing case records, in processing order
    /// * `controls` - `RecordBatch` containing potential control records
    ///
    /// # Returns
    ///
    /// Result containing the matched case-control dataset
    pub fn perform_matching(
        &self,
        cases: &RecordBatch,
        controls: &RecordBatch,
    ) -> Result<MatchingResult> {
        let mut rng = create_rng(self.config.random_seed);
        self.perform_matching_with_rng(cases, controls, &mut rng)
    }

    /// Perform matching with a caller-supplied random source
    pub fn perform_matching_with_rng<R: Rng + ?Sized>(
        &self,
        cases: &RecordBatch,
        controls: &RecordBatch,
        rng: &mut R,
    ) -> Result<MatchingResult> {
        let report = validate_config(cases, controls, &self.config)?;
        if !report.is_valid() {
            return Err(MatchingError::Validation(report));
        }

        self.match_validated(cases, controls, rng)
    }

    /// Run the matching loop on inputs that already passed validation
    pub(crate) fn match_validated<R: Rng + ?Sized>(
        &self,
        cases: &RecordBatch,
        controls: &RecordBatch,
        rng: &mut R,
    ) -> Result<MatchingResult> {
        let start_time = Instant::now();
        let config = &self.config;

        let case_attributes =
            extract_attributes(cases, &config.unique_identifier, &config.matching_variables)?;
        let control_attributes =
            extract_attributes(controls, &config.unique_identifier, &config.matching_variables)?;

        log_matching_start(config, case_attributes.len(), control_attributes.len());

        let mut pool = ControlPool::new(control_attributes, config.match_nulls);
        let mut assembler = CaseControlAssembler::for_cases(case_attributes.len(), config);
        let available_controls = pool.total();
        let allocated_rows = assembler.capacity();

        let outcomes =
            perform_sequential_matching(&case_attributes, &mut pool, &mut assembler, config, rng)?;

        let dataset = assembler.finish(cases, controls, config)?;
        let summary = summarize(
            &outcomes,
            config,
            available_controls,
            pool.len(),
            dataset.num_rows(),
            allocated_rows,
        );

        let elapsed = start_time.elapsed();
        log_matching_complete(&summary, elapsed);

        Ok(MatchingResult {
            dataset,
            outcomes,
            summary,
            matching_time: elapsed,
        })
    }
}

fn summarize(
    outcomes: &[CaseOutcome],
    config: &MatchingConfig,
    available_controls: usize,
    remaining_controls: usize,
    output_rows: usize,
    allocated_rows: usize,
) -> MatchingSummary {
    let matched_cases = outcomes.iter().filter(|outcome| outcome.is_matched()).count();
    let underfilled_cases = outcomes
        .iter()
        .filter(|outcome| outcome.is_matched() && outcome.controls() < config.controls_per_case)
        .count();

    MatchingSummary {
        total_cases: outcomes.len(),
        matched_cases,
        dropped_cases: outcomes.len() - matched_cases,
        underfilled_cases,
        available_controls,
        used_controls: outcomes.iter().map(CaseOutcome::controls).sum(),
        remaining_controls,
        output_rows,
        allocated_rows,
    }
}
