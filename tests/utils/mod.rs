use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int32Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A person as used by the fixtures: identifier, sex and age
pub type Person = (i64, &'static str, i32);

/// Build a batch with `id`, `sex` and `age` columns
#[must_use]
pub fn people_batch(people: &[Person]) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("sex", DataType::Utf8, true),
        Field::new("age", DataType::Int32, true),
    ]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(people.iter().map(|p| p.0))),
        Arc::new(StringArray::from_iter_values(people.iter().map(|p| p.1))),
        Arc::new(Int32Array::from_iter_values(people.iter().map(|p| p.2))),
    ];
    RecordBatch::try_new(Arc::new(schema), columns).expect("valid fixture batch")
}

/// Generate a random population with identifiers starting at `first_id`
#[must_use]
pub fn random_people(seed: u64, size: usize, first_id: i64) -> Vec<Person> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..size)
        .map(|i| {
            let sex = if rng.random_bool(0.5) { "M" } else { "F" };
            (first_id + i as i64, sex, rng.random_range(30..34))
        })
        .collect()
}

/// Column of a batch as a vector of i64 values
#[must_use]
pub fn i64_column(batch: &RecordBatch, name: &str) -> Vec<i64> {
    let column = batch.column_by_name(name).expect("column exists");
    column
        .as_any()
        .downcast_ref::<Int64Array>()
        .expect("Int64 column")
        .values()
        .to_vec()
}

/// The `group` column when groups are row positions
#[must_use]
pub fn group_column(batch: &RecordBatch) -> Vec<u64> {
    let column = batch.column_by_name("group").expect("group column exists");
    column
        .as_any()
        .downcast_ref::<UInt64Array>()
        .expect("UInt64 group column")
        .values()
        .to_vec()
}

/// The `case` column
#[must_use]
pub fn case_column(batch: &RecordBatch) -> Vec<i32> {
    let column = batch.column_by_name("case").expect("case column exists");
    column
        .as_any()
        .downcast_ref::<Int32Array>()
        .expect("Int32 case column")
        .values()
        .to_vec()
}

/// One output row: identifier, group, case flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub group: u64,
    pub case: i32,
}

/// Rows of an output batch that uses row-position groups
#[must_use]
pub fn output_rows(batch: &RecordBatch) -> Vec<Row> {
    let ids = i64_column(batch, "id");
    let groups = group_column(batch);
    let cases = case_column(batch);
    assert_eq!(batch.column(0).null_count(), 0);
    ids.into_iter()
        .zip(groups)
        .zip(cases)
        .map(|((id, group), case)| Row { id, group, case })
        .collect()
}

/// Control identifiers of each group
#[must_use]
pub fn controls_by_group(rows: &[Row]) -> HashMap<u64, Vec<i64>> {
    let mut groups: HashMap<u64, Vec<i64>> = HashMap::new();
    for row in rows.iter().filter(|row| row.case == 0) {
        groups.entry(row.group).or_default().push(row.id);
    }
    groups
}
