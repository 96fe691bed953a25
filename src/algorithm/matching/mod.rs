//! Case-Control Matching algorithms
//!
//! This module implements exact matching of cases to controls. It includes:
//!
//! 1. Validation of parameters and input batches, reporting every problem at once
//! 2. A shrinking control pool indexed by matching key
//! 3. The sequential matching loop with random sampling of surplus controls
//! 4. Assembly of the matched dataset as an Arrow `RecordBatch`
//!
//! A control matches a case only when it equals the case on every matching
//! variable, and each control is assigned to at most one case.

pub mod assembler;
pub mod control_pool;
pub mod extraction;
pub mod matcher;
pub mod sampling;
pub mod sequential;
pub mod types;
pub mod validation;

// Re-export key types
pub use matcher::Matcher;
pub use types::{CaseOutcome, MatchKey, MatchValue, MatchingResult, MatchingSummary};
pub use validation::{InputTable, ValidationIssue, ValidationReport};

use crate::config::{MatchingConfig, MatchingRequest};
use crate::error::{MatchingError, Result};
use arrow::record_batch::RecordBatch;

/// Build a matched case-control dataset
///
/// Cases are processed in row order. Fails without computing anything if
/// validation finds a problem.
pub fn select_case_control_dataset(
    cases: &RecordBatch,
    controls: &RecordBatch,
    config: &MatchingConfig,
) -> Result<MatchingResult> {
    Matcher::new(config.clone()).perform_matching(cases, controls)
}

/// Build a matched case-control dataset from a decoded request
///
/// Malformed parameters are reported together with any problem in the batches.
pub fn select_case_control_dataset_from_request(
    cases: &RecordBatch,
    controls: &RecordBatch,
    request: &MatchingRequest,
) -> Result<MatchingResult> {
    let report = validation::validate(cases, controls, request)?;
    if !report.is_valid() {
        return Err(MatchingError::Validation(report));
    }

    let config = request.to_config()?;
    let mut rng = sampling::create_rng(config.random_seed);
    Matcher::new(config).match_validated(cases, controls, &mut rng)
}
