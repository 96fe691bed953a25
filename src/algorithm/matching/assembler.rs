//! Output assembly for the matched case-control dataset
//!
//! The assembler is sized up front for the largest possible output (every case
//! retained with a full set of controls). Rows are appended at a cursor, one case
//! row or one batch of control rows at a time, and the dataset is trimmed to the
//! rows actually written when it is materialized as a `RecordBatch`.

use crate::config::{CASE_COLUMN, GROUP_COLUMN, GroupLabel, MatchingConfig};
use crate::error::{MatchingError, Result};
use arrow::array::{Array, ArrayRef, Int32Array, UInt64Array};
use arrow::compute::{CastOptions, cast_with_options, interleave, take};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::izip;
use std::sync::Arc;

/// Value of the `case` column for a case row
pub const CASE_FLAG: i32 = 1;

/// Value of the `case` column for a control row
pub const CONTROL_FLAG: i32 = 0;

/// Where an output row's identifier comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    /// Row index in the cases batch
    Case(usize),
    /// Row index in the potential controls batch
    Control(usize),
}

/// One logical output row
///
/// `group` is the row index of the originating case; the matching-variable values
/// of every row in a group are taken from that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputRow {
    /// Source of the identifier
    pub source: RowSource,
    /// Row index of the originating case
    pub group: usize,
    /// 1 for the case, 0 for a control
    pub case_flag: i32,
}

/// Builder for the case-control output table
#[derive(Debug)]
pub struct CaseControlAssembler {
    rows: Vec<OutputRow>,
    capacity: usize,
}

impl CaseControlAssembler {
    /// Create an assembler able to hold `capacity` rows
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Create an assembler sized for `num_cases` cases under `config`
    #[must_use]
    pub fn for_cases(num_cases: usize, config: &MatchingConfig) -> Self {
        Self::with_capacity(config.max_output_rows(num_cases))
    }

    /// Number of rows written so far; also the next cursor
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows have been written
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows pre-allocated
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rows written so far
    #[must_use]
    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    fn check_cursor(&self, cursor: usize, count: usize) -> Result<()> {
        if cursor != self.rows.len() {
            return Err(MatchingError::invariant(format!(
                "write at row {cursor} but {} rows have been written",
                self.rows.len()
            )));
        }
        if cursor + count > self.capacity {
            return Err(MatchingError::invariant(format!(
                "writing {count} rows at row {cursor} exceeds the {} pre-allocated rows",
                self.capacity
            )));
        }
        Ok(())
    }

    /// Write the row of a case at `cursor`, returning the next cursor
    pub fn write_case(&mut self, cursor: usize, case_row: usize) -> Result<usize> {
        self.check_cursor(cursor, 1)?;
        self.rows.push(OutputRow {
            source: RowSource::Case(case_row),
            group: case_row,
            case_flag: CASE_FLAG,
        });
        Ok(cursor + 1)
    }

    /// Write a batch of control rows at `cursor`, returning the next cursor
    ///
    /// `control_rows`, `groups` and `flags` are parallel arrays and must have the
    /// same length. Rows are written contiguously in the order given.
    pub fn write_controls(
        &mut self,
        cursor: usize,
        control_rows: &[usize],
        groups: &[usize],
        flags: &[i32],
    ) -> Result<usize> {
        if control_rows.len() != groups.len() || control_rows.len() != flags.len() {
            return Err(MatchingError::invariant(format!(
                "parallel control arrays differ in length: {} rows, {} groups, {} flags",
                control_rows.len(),
                groups.len(),
                flags.len()
            )));
        }
        self.check_cursor(cursor, control_rows.len())?;

        for (&row, &group, &case_flag) in izip!(control_rows, groups, flags) {
            self.rows.push(OutputRow {
                source: RowSource::Control(row),
                group,
                case_flag,
            });
        }
        Ok(cursor + control_rows.len())
    }

    /// Materialize the written rows as a `RecordBatch`
    ///
    /// Columns are `[identifier, group, case, matching variables...]`. Identifier
    /// values come from the case or control batch; matching-variable values always
    /// come from the originating case.
    pub fn finish(
        mut self,
        cases: &RecordBatch,
        controls: &RecordBatch,
        config: &MatchingConfig,
    ) -> Result<RecordBatch> {
        self.rows.shrink_to_fit();
        log::debug!(
            "Trimming output from {} pre-allocated rows to {} written rows",
            self.capacity,
            self.rows.len()
        );

        let cases_schema = cases.schema();
        let case_ids = cases.column(cases_schema.index_of(&config.unique_identifier)?);
        let mut control_ids = controls
            .column(controls.schema().index_of(&config.unique_identifier)?)
            .clone();
        // A value that does not convert is an error, never a null identifier
        if control_ids.data_type() != case_ids.data_type() {
            let options = CastOptions {
                safe: false,
                ..CastOptions::default()
            };
            control_ids = cast_with_options(&control_ids, case_ids.data_type(), &options)?;
        }

        let id_indices: Vec<(usize, usize)> = self
            .rows
            .iter()
            .map(|row| match row.source {
                RowSource::Case(index) => (0, index),
                RowSource::Control(index) => (1, index),
            })
            .collect();
        let ids = interleave(&[case_ids.as_ref(), control_ids.as_ref()], &id_indices)?;

        let group_rows =
            UInt64Array::from_iter_values(self.rows.iter().map(|row| row.group as u64));
        let (groups, group_type): (ArrayRef, DataType) = match config.group_label {
            GroupLabel::RowPosition => (Arc::new(group_rows.clone()), DataType::UInt64),
            GroupLabel::CaseIdentifier => (
                take(case_ids.as_ref(), &group_rows, None)?,
                case_ids.data_type().clone(),
            ),
        };

        let flags: ArrayRef = Arc::new(Int32Array::from_iter_values(
            self.rows.iter().map(|row| row.case_flag),
        ));

        let mut fields = vec![
            Field::new(&config.unique_identifier, case_ids.data_type().clone(), true),
            Field::new(GROUP_COLUMN, group_type, true),
            Field::new(CASE_COLUMN, DataType::Int32, false),
        ];
        let mut columns = vec![ids, groups, flags];

        for variable in &config.matching_variables {
            let index = cases_schema.index_of(variable)?;
            let field = cases_schema.field(index);
            fields.push(Field::new(variable, field.data_type().clone(), true));
            columns.push(take(cases.column(index).as_ref(), &group_rows, None)?);
        }

        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}
