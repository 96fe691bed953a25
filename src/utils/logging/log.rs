//! Logging utilities
//!
//! This module provides standardized logging functions for a matching run.
//! Diagnostics that only matter in verbose mode are emitted at the level given by
//! [`MatchingConfig::trace_level`], so they never change what the matcher returns.

use crate::algorithm::matching::types::MatchingSummary;
use crate::config::MatchingConfig;
use std::time::Duration;

/// Log the parameters of a run before matching starts
///
/// # Arguments
/// * `config` - The matching configuration
/// * `num_cases` - Number of cases in the input
/// * `num_controls` - Number of potential controls in the input
pub fn log_matching_start(config: &MatchingConfig, num_cases: usize, num_controls: usize) {
    log::info!(
        "Matching {} cases with control pool of {} candidates ({} controls per case)",
        num_cases,
        num_controls,
        config.controls_per_case
    );
    log::log!(config.trace_level(), "{}", config.to_string_representation());
    log::log!(
        config.trace_level(),
        "Output columns: [{}]",
        config.output_columns().join(", ")
    );
}

/// Log a heading for the case at `position`
pub fn log_case_heading(config: &MatchingConfig, position: usize, pool_size: usize) {
    let heading = format!("* case {position} *");
    let rule = "*".repeat(heading.len());
    log::log!(
        config.trace_level(),
        "\n{rule}\n{heading}\n{rule}\nAvailable controls in pool: {pool_size}"
    );
}

/// Log the end of a run with its summary counts
pub fn log_matching_complete(summary: &MatchingSummary, elapsed: Duration) {
    log::info!(
        "Matching complete: {} of {} cases matched with {} controls in {:.2?} ({} dropped, {} under-filled)",
        summary.matched_cases,
        summary.total_cases,
        summary.used_controls,
        elapsed,
        summary.dropped_cases,
        summary.underfilled_cases
    );
    if summary.dropped_cases > 0 {
        log::warn!(
            "{} cases had no eligible controls left and were excluded",
            summary.dropped_cases
        );
    }
}
