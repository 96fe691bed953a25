//! Data extraction utilities for the matching algorithm
//!
//! This module provides functions for extracting identifiers and matching keys
//! from record batches and preparing data for matching.

use crate::algorithm::matching::types::{ExtractedAttributes, MatchKey};
use crate::error::Result;
use crate::utils::arrow_utils::arrow_array_to_match_value;
use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;

/// Look up columns by name, in the order given
pub fn columns_by_name<S: AsRef<str>>(batch: &RecordBatch, names: &[S]) -> Result<Vec<ArrayRef>> {
    names
        .iter()
        .map(|name| -> Result<ArrayRef> {
            let index = batch.schema().index_of(name.as_ref())?;
            Ok(batch.column(index).clone())
        })
        .collect()
}

/// Build the matching key of a single row
pub fn extract_key(columns: &[ArrayRef], row: usize) -> Result<MatchKey> {
    columns
        .iter()
        .map(|column| arrow_array_to_match_value(column, row))
        .collect()
}

/// Extract identifiers and matching keys from a `RecordBatch`
///
/// Every row is extracted in batch order and none is skipped, so an entry's
/// position is its row index in `batch`.
pub fn extract_attributes<S: AsRef<str>>(
    batch: &RecordBatch,
    unique_identifier: &str,
    matching_variables: &[S],
) -> Result<ExtractedAttributes> {
    let id_idx = batch.schema().index_of(unique_identifier)?;
    let id_col = batch.column(id_idx);
    let key_cols = columns_by_name(batch, matching_variables)?;

    let num_rows = batch.num_rows();
    let mut ids = Vec::with_capacity(num_rows);
    let mut keys = Vec::with_capacity(num_rows);

    for i in 0..num_rows {
        ids.push(arrow_array_to_match_value(id_col, i)?);
        keys.push(extract_key(&key_cols, i)?);
    }

    Ok(ExtractedAttributes { ids, keys })
}
