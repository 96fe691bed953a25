//! A Rust library for building exactly matched case-control datasets
//! from Arrow record batches.
//!
//! Each case is paired with up to a fixed number of controls that equal it on
//! every matching variable. Controls are consumed at most once, and cases are
//! served in input order.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{GroupLabel, MatchingConfig, MatchingConfigBuilder, MatchingRequest};
pub use error::{MatchingError, Result};

// Matching
pub use algorithm::matching::{
    CaseOutcome, Matcher, MatchingResult, MatchingSummary, ValidationIssue, ValidationReport,
    select_case_control_dataset, select_case_control_dataset_from_request,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;
