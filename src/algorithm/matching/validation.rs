//! Validation functions for the matching algorithm
//!
//! This module contains functions for validating parameters and input data before
//! matching. Every check runs; problems are collected into a [`ValidationReport`]
//! rather than returned at the first failure, so a caller sees all of them at once.

use crate::algorithm::matching::types::MatchValue;
use crate::config::{CASE_COLUMN, GROUP_COLUMN, MatchingConfig, MatchingRequest};
use crate::error::Result;
use crate::utils::arrow_utils::arrow_array_to_match_value;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use log::warn;
use rustc_hash::FxHashSet;
use std::fmt;

/// Maximum number of duplicated identifiers listed in a report
const MAX_REPORTED_DUPLICATES: usize = 10;

/// Which input table a problem was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTable {
    /// The cases batch
    Cases,
    /// The potential controls batch
    Controls,
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cases => write!(f, "cases"),
            Self::Controls => write!(f, "potential controls"),
        }
    }
}

/// A single failed precondition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    /// A parameter has the wrong shape or type
    #[error("Malformed parameter {parameter}: {reason}")]
    MalformedParameter {
        /// Parameter name
        parameter: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// An input already has a column reserved for the output
    #[error("The {table} table already has a column named '{column}'; rename it before matching")]
    ReservedColumnCollision {
        /// Table containing the column
        table: InputTable,
        /// Reserved column name
        column: &'static str,
    },

    /// The identifier column is missing from an input
    #[error("The identifier column '{column}' is not in the {table} table")]
    MissingIdentifierColumn {
        /// Table missing the column
        table: InputTable,
        /// Identifier column name
        column: String,
    },

    /// Identifier values repeat across cases and controls
    #[error("The identifier column '{column}' does not contain unique values (duplicated: {})", .duplicates.join(", "))]
    DuplicateIdentifier {
        /// Identifier column name
        column: String,
        /// Some of the duplicated values
        duplicates: Vec<String>,
    },

    /// Cases and controls store identifiers with different Arrow types
    #[error(
        "The identifier column '{column}' is {cases} in the cases table but {controls} in the potential controls table"
    )]
    IdentifierTypeMismatch {
        /// Identifier column name
        column: String,
        /// Type in the cases batch
        cases: DataType,
        /// Type in the potential controls batch
        controls: DataType,
    },

    /// A matching variable is missing from an input
    #[error("The matching variable '{column}' is not in the {table} table")]
    MissingMatchingColumn {
        /// Table missing the column
        table: InputTable,
        /// Matching variable name
        column: String,
    },

    /// A column would appear twice in the output
    #[error("The column '{column}' is listed more than once in the output columns")]
    DuplicateOutputColumn {
        /// Repeated column name
        column: String,
    },
}

/// Every issue found by one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Issues in the order the checks ran
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create a report from a list of issues
    #[must_use]
    pub const fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// The aggregate verdict: `true` when no check failed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Merge the issues of another report into this one
    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

/// Check the loosely typed parameters of a request
#[must_use]
pub fn validate_request(request: &MatchingRequest) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if request.matching_variable_list().is_none() {
        issues.push(ValidationIssue::MalformedParameter {
            parameter: "matching_variables",
            reason: "expected a list of column names".to_string(),
        });
    }

    if request.controls_per_case().is_none() {
        issues.push(ValidationIssue::MalformedParameter {
            parameter: "controls_per_case",
            reason: format!(
                "expected a non-negative integer, got {}",
                request.controls_per_case
            ),
        });
    }

    issues
}

fn has_column(batch: &RecordBatch, column: &str) -> bool {
    batch.schema().field_with_name(column).is_ok()
}

fn identifier_values(batch: &RecordBatch, column: &str) -> Result<Vec<MatchValue>> {
    let index = batch.schema().index_of(column)?;
    let array = batch.column(index);
    (0..batch.num_rows())
        .map(|row| arrow_array_to_match_value(array, row))
        .collect()
}

/// Check the input batches against the identifier and matching variables
///
/// Arrow errors while reading identifier values are propagated; all other
/// problems are returned as issues.
pub fn validate_batches<S: AsRef<str>>(
    cases: &RecordBatch,
    controls: &RecordBatch,
    unique_identifier: &str,
    matching_variables: &[S],
) -> Result<Vec<ValidationIssue>> {
    let tables = [(InputTable::Cases, cases), (InputTable::Controls, controls)];
    let mut issues = Vec::new();

    // Reserved output columns
    for (table, batch) in tables {
        for column in [GROUP_COLUMN, CASE_COLUMN] {
            if has_column(batch, column) {
                issues.push(ValidationIssue::ReservedColumnCollision { table, column });
            }
        }
    }

    // Identifier column presence
    let mut identifier_present = true;
    for (table, batch) in tables {
        if !has_column(batch, unique_identifier) {
            identifier_present = false;
            issues.push(ValidationIssue::MissingIdentifierColumn {
                table,
                column: unique_identifier.to_string(),
            });
        }
    }

    // Identifier type, so ids from both tables share one output column
    if identifier_present {
        let case_type = cases.schema_ref().field_with_name(unique_identifier)?.data_type();
        let control_type = controls.schema_ref().field_with_name(unique_identifier)?.data_type();
        if case_type != control_type {
            issues.push(ValidationIssue::IdentifierTypeMismatch {
                column: unique_identifier.to_string(),
                cases: case_type.clone(),
                controls: control_type.clone(),
            });
        }
    }

    // Identifier uniqueness across both tables
    if identifier_present {
        let mut seen = FxHashSet::default();
        let mut duplicates = Vec::new();
        let mut duplicate_count = 0_usize;
        for value in identifier_values(cases, unique_identifier)?
            .into_iter()
            .chain(identifier_values(controls, unique_identifier)?)
        {
            if seen.contains(&value) {
                duplicate_count += 1;
                if duplicates.len() < MAX_REPORTED_DUPLICATES {
                    duplicates.push(value.to_string());
                }
            } else {
                seen.insert(value);
            }
        }

        if duplicate_count > 0 {
            if duplicate_count > duplicates.len() {
                duplicates.push(format!("... {} more", duplicate_count - duplicates.len()));
            }
            issues.push(ValidationIssue::DuplicateIdentifier {
                column: unique_identifier.to_string(),
                duplicates,
            });
        }
    }

    // Matching variable presence
    for variable in matching_variables {
        for (table, batch) in tables {
            if !has_column(batch, variable.as_ref()) {
                issues.push(ValidationIssue::MissingMatchingColumn {
                    table,
                    column: variable.as_ref().to_string(),
                });
            }
        }
    }

    // Output column names
    let mut output_columns = FxHashSet::default();
    output_columns.insert(unique_identifier);
    let mut repeated = FxHashSet::default();
    for variable in matching_variables {
        let name = variable.as_ref();
        if !output_columns.insert(name) && repeated.insert(name) {
            issues.push(ValidationIssue::DuplicateOutputColumn {
                column: name.to_string(),
            });
        }
    }

    Ok(issues)
}

fn report(issues: Vec<ValidationIssue>) -> ValidationReport {
    for issue in &issues {
        warn!("{issue}");
    }
    ValidationReport::new(issues)
}

/// Validate a typed configuration against the input batches
pub fn validate_config(
    cases: &RecordBatch,
    controls: &RecordBatch,
    config: &MatchingConfig,
) -> Result<ValidationReport> {
    let issues = validate_batches(
        cases,
        controls,
        &config.unique_identifier,
        &config.matching_variables,
    )?;
    Ok(report(issues))
}

/// Validate a request and the input batches in one pass
pub fn validate(
    cases: &RecordBatch,
    controls: &RecordBatch,
    request: &MatchingRequest,
) -> Result<ValidationReport> {
    let mut issues = validate_request(request);
    let variables = request.matching_variable_names();
    issues.extend(validate_batches(cases, controls, &request.unique_identifier, &variables)?);
    Ok(report(issues))
}
