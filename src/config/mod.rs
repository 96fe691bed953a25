//! Configuration for case-control matching.
//!
//! [`MatchingConfig`] is the typed configuration consumed by the matcher. It is
//! either built in code through [`MatchingConfigBuilder`] or decoded from a JSON
//! [`MatchingRequest`], whose loosely typed fields are checked by the validator
//! before they are turned into a configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MatchingError, Result};

/// Name of the output column holding the group of each row
pub const GROUP_COLUMN: &str = "group";

/// Name of the output column flagging case rows (1) and control rows (0)
pub const CASE_COLUMN: &str = "case";

/// Default number of controls selected per case
pub const DEFAULT_CONTROLS_PER_CASE: usize = 1;

/// How the `group` column identifies the originating case
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupLabel {
    /// Row position of the case in the cases batch
    #[default]
    RowPosition,
    /// Unique identifier value of the case
    CaseIdentifier,
}

/// Configuration for the matching process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingConfig {
    /// Column holding the unique identifier in both batches
    pub unique_identifier: String,

    /// Columns on which a control must equal its case, in output order
    pub matching_variables: Vec<String>,

    /// Maximum number of controls selected for each case
    pub controls_per_case: usize,

    /// Optional random seed for reproducible sampling
    pub random_seed: Option<u64>,

    /// How the `group` column is populated
    pub group_label: GroupLabel,

    /// Whether a null on a matching variable matches a null
    pub match_nulls: bool,

    /// Emit per-case diagnostics at info level and show a progress bar
    pub verbose: bool,
}

impl MatchingConfig {
    /// Create a new builder for the given identifier column
    #[must_use]
    pub fn builder(unique_identifier: impl Into<String>) -> MatchingConfigBuilder {
        MatchingConfigBuilder::new(unique_identifier)
    }

    /// Maximum number of output rows: every case retained with a full set of controls
    #[must_use]
    pub const fn max_output_rows(&self, num_cases: usize) -> usize {
        num_cases.saturating_mul(self.controls_per_case.saturating_add(1))
    }

    /// Names of the output columns, in order
    #[must_use]
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.matching_variables.len() + 3);
        columns.push(self.unique_identifier.clone());
        columns.push(GROUP_COLUMN.to_string());
        columns.push(CASE_COLUMN.to_string());
        columns.extend(self.matching_variables.iter().cloned());
        columns
    }

    /// Log level for diagnostics that only matter in verbose mode
    #[must_use]
    pub const fn trace_level(&self) -> log::Level {
        if self.verbose {
            log::Level::Info
        } else {
            log::Level::Trace
        }
    }

    /// Convert to a human-readable string representation
    #[must_use]
    pub fn to_string_representation(&self) -> String {
        format!(
            "Matching Configuration:\n\
             - Unique identifier: {}\n\
             - Matching variables: [{}]\n\
             - Controls per case: {}\n\
             - Random seed: {}\n\
             - Group label: {:?}\n\
             - Match nulls: {}",
            self.unique_identifier,
            self.matching_variables.join(", "),
            self.controls_per_case,
            self.random_seed
                .map_or_else(|| "none".to_string(), |seed| seed.to_string()),
            self.group_label,
            self.match_nulls,
        )
    }
}

/// Builder for constructing matching configuration
#[derive(Debug, Clone)]
pub struct MatchingConfigBuilder {
    config: MatchingConfig,
}

impl MatchingConfigBuilder {
    /// Create a new builder with default settings
    #[must_use]
    pub fn new(unique_identifier: impl Into<String>) -> Self {
        Self {
            config: MatchingConfig {
                unique_identifier: unique_identifier.into(),
                matching_variables: Vec::new(),
                controls_per_case: DEFAULT_CONTROLS_PER_CASE,
                random_seed: None,
                group_label: GroupLabel::default(),
                match_nulls: true,
                verbose: false,
            },
        }
    }

    /// Set the matching variables
    #[must_use]
    pub fn matching_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.matching_variables = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of controls per case
    #[must_use]
    pub const fn controls_per_case(mut self, controls: usize) -> Self {
        self.config.controls_per_case = controls;
        self
    }

    /// Set the random seed
    #[must_use]
    pub const fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Set how the group column is populated
    #[must_use]
    pub const fn group_label(mut self, label: GroupLabel) -> Self {
        self.config.group_label = label;
        self
    }

    /// Set whether nulls match nulls
    #[must_use]
    pub const fn match_nulls(mut self, match_nulls: bool) -> Self {
        self.config.match_nulls = match_nulls;
        self
    }

    /// Set verbose diagnostics
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Build the matching configuration
    #[must_use]
    pub fn build(self) -> MatchingConfig {
        self.config
    }
}

/// Matching variables as supplied by a caller: a list, or a single bare name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum VariableSelection {
    /// An explicit ordered list of column names
    List(Vec<String>),
    /// A single column name given where a list was expected
    Single(String),
}

impl VariableSelection {
    /// The column names named by the selection
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::List(names) => names.iter().map(String::as_str).collect(),
            Self::Single(name) => vec![name.as_str()],
        }
    }
}

fn default_controls_per_case() -> Value {
    Value::from(DEFAULT_CONTROLS_PER_CASE)
}

const fn default_true() -> bool {
    true
}

/// A matching request as decoded from JSON
///
/// Fields are kept loosely typed so that malformed parameters reach the
/// validator and are reported alongside every other problem.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchingRequest {
    /// Column holding the unique identifier
    pub unique_identifier: String,

    /// Matching variables; absent or scalar values are reported as malformed
    #[serde(default)]
    pub matching_variables: Option<VariableSelection>,

    /// Requested controls per case; must be a non-negative integer
    #[serde(default = "default_controls_per_case")]
    pub controls_per_case: Value,

    /// Optional random seed
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// How the group column is populated
    #[serde(default)]
    pub group_label: GroupLabel,

    /// Whether nulls match nulls
    #[serde(default = "default_true")]
    pub match_nulls: bool,

    /// Verbose diagnostics
    #[serde(default)]
    pub verbose: bool,
}

impl MatchingRequest {
    /// Decode a request from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Matching variables, if they were supplied as a list
    #[must_use]
    pub fn matching_variable_list(&self) -> Option<&[String]> {
        match &self.matching_variables {
            Some(VariableSelection::List(names)) => Some(names),
            _ => None,
        }
    }

    /// Column names named by the request, whatever shape they were given in
    #[must_use]
    pub fn matching_variable_names(&self) -> Vec<&str> {
        self.matching_variables
            .as_ref()
            .map(VariableSelection::names)
            .unwrap_or_default()
    }

    /// Controls per case, if it is a non-negative whole number
    #[must_use]
    pub fn controls_per_case(&self) -> Option<usize> {
        self.controls_per_case
            .as_u64()
            .and_then(|controls| usize::try_from(controls).ok())
    }

    /// Convert to a typed configuration
    ///
    /// Fails with an invariant violation when called on a request that has
    /// malformed parameters; run the validator first.
    pub fn to_config(&self) -> Result<MatchingConfig> {
        let matching_variables = self.matching_variable_list().ok_or_else(|| {
            MatchingError::invariant("matching variables were not supplied as a list")
        })?;
        let controls_per_case = self.controls_per_case().ok_or_else(|| {
            MatchingError::invariant("controls per case is not a non-negative integer")
        })?;

        let mut builder = MatchingConfig::builder(self.unique_identifier.clone())
            .matching_variables(matching_variables.iter().cloned())
            .controls_per_case(controls_per_case)
            .group_label(self.group_label)
            .match_nulls(self.match_nulls)
            .verbose(self.verbose);
        if let Some(seed) = self.random_seed {
            builder = builder.random_seed(seed);
        }

        Ok(builder.build())
    }
}
