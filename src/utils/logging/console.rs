//! Console output utilities
//!
//! This module provides utilities for formatted console output.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;

/// Print summary information about a record batch
pub fn print_batch_summary(title: &str, batch: &RecordBatch) {
    println!("\n{title}\n{}", "=".repeat(title.len()));
    println!(
        "{} rows x {} columns",
        batch.num_rows(),
        batch.num_columns()
    );
}

/// Format one row of a batch as `name: value` pairs
#[must_use]
pub fn format_row(batch: &RecordBatch, row_idx: usize) -> String {
    let schema = batch.schema();
    let cells: Vec<String> = batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(column, field)| {
            let value = array_value_to_string(column, row_idx)
                .unwrap_or_else(|_| "<unprintable>".to_string());
            let value = if column.is_null(row_idx) { "NULL".to_string() } else { value };
            format!("{}: {}", field.name(), value)
        })
        .collect();
    format!("[{}]", cells.join(", "))
}

/// Print the first and last rows of a batch, eliding the middle
pub fn print_sample_rows(batch: &RecordBatch, max_rows: usize) {
    let num_rows = batch.num_rows();
    let head = max_rows.div_ceil(2);
    for row_idx in 0..num_rows {
        let in_head = row_idx < head;
        let in_tail = row_idx + (max_rows - head) >= num_rows;
        if in_head || in_tail || num_rows <= max_rows {
            println!("Row {row_idx}: {}", format_row(batch, row_idx));
        } else if row_idx == head {
            println!("...");
        }
    }
}
