//! Type definitions for the matching algorithm
//!
//! This module contains common types used throughout the matching algorithm.

use arrow::record_batch::RecordBatch;
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

/// A single cell normalized for exact equality across record batches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MatchValue {
    /// Missing value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Any integer, or a float with an integral value
    Integer(i64),
    /// Bit pattern of a non-integral float
    Float(u64),
    /// String value
    Text(String),
    /// Days since the Unix epoch
    Date(i32),
    /// Display representation of any other Arrow type
    Other(String),
}

impl MatchValue {
    /// Check if the value is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for MatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(value) | Self::Other(value) => write!(f, "{value}"),
            Self::Date(days) => write!(f, "{days}d"),
        }
    }
}

/// The values of one row on the matching variables, in matching-variable order
///
/// Two keys are equal only if every position is equal, which is exactly the
/// conjunctive matching condition between a case and a control.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey(pub SmallVec<[MatchValue; 4]>);

impl MatchKey {
    /// Check if any matching variable is null
    #[must_use]
    pub fn has_null(&self) -> bool {
        self.0.iter().any(MatchValue::is_null)
    }

    /// Check whether a control with `other` as key is eligible for a case with this key
    #[must_use]
    pub fn matches(&self, other: &Self, match_nulls: bool) -> bool {
        if !match_nulls && self.has_null() {
            return false;
        }
        self == other
    }

    /// Number of matching variables in the key
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key has no matching variables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<MatchValue> for MatchKey {
    fn from_iter<I: IntoIterator<Item = MatchValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// Identifiers and matching keys of every row of a batch
///
/// Entry `i` belongs to batch row `i`.
#[derive(Debug, Clone, Default)]
pub struct ExtractedAttributes {
    /// Identifier of each row
    pub ids: Vec<MatchValue>,
    /// Matching key of each row
    pub keys: Vec<MatchKey>,
}

impl ExtractedAttributes {
    /// Number of extracted rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the attributes are empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What happened to a single case during matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CaseOutcome {
    /// No eligible control was left in the pool
    Dropped,
    /// Every eligible control was taken (`0 < N <= k`)
    AllEligible {
        /// Number of controls assigned
        controls: usize,
    },
    /// A random sample of exactly `k` controls was drawn (`N > k`)
    Sampled {
        /// Number of eligible controls before sampling
        eligible: usize,
        /// Number of controls assigned
        controls: usize,
    },
}

impl CaseOutcome {
    /// Number of controls assigned to the case
    #[must_use]
    pub const fn controls(&self) -> usize {
        match self {
            Self::Dropped => 0,
            Self::AllEligible { controls } | Self::Sampled { controls, .. } => *controls,
        }
    }

    /// Check if the case contributes rows to the output
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        !matches!(self, Self::Dropped)
    }
}

/// Counts describing a completed matching run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchingSummary {
    /// Number of cases in the input
    pub total_cases: usize,
    /// Number of cases retained with at least one control
    pub matched_cases: usize,
    /// Number of cases dropped for lack of controls
    pub dropped_cases: usize,
    /// Number of retained cases that received fewer than the requested controls
    pub underfilled_cases: usize,
    /// Number of controls in the pool before matching
    pub available_controls: usize,
    /// Number of controls assigned to a case
    pub used_controls: usize,
    /// Number of controls left in the pool afterwards
    pub remaining_controls: usize,
    /// Number of rows in the output dataset
    pub output_rows: usize,
    /// Number of rows pre-allocated for the output
    pub allocated_rows: usize,
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchingResult {
    /// Matched case-control dataset
    pub dataset: RecordBatch,
    /// Outcome of each case, in case order
    pub outcomes: Vec<CaseOutcome>,
    /// Summary counts for the run
    pub summary: MatchingSummary,
    /// Time taken for matching
    pub matching_time: Duration,
}
