use anyhow::Context;
use arrow::array::{ArrayRef, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use cc_match::utils::logging::console::{print_batch_summary, print_sample_rows};
use cc_match::{MatchingRequest, RecordBatch, select_case_control_dataset_from_request};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

const DEFAULT_REQUEST: &str = r#"{
    "unique_identifier": "pnr",
    "matching_variables": ["sex", "birth_year", "region"],
    "controls_per_case": 4,
    "random_seed": 2024,
    "verbose": false
}"#;

const SEXES: [&str; 2] = ["M", "F"];
const REGIONS: [&str; 5] = ["north", "central", "south", "capital", "zealand"];

/// Build a synthetic population batch with identifiers starting at `first_pnr`
fn synthetic_population(
    rng: &mut StdRng,
    size: usize,
    first_pnr: usize,
) -> anyhow::Result<RecordBatch> {
    let pnrs: Vec<String> = (0..size).map(|i| format!("{:010}", first_pnr + i)).collect();
    let sexes: Vec<&str> = (0..size).map(|_| SEXES[rng.random_range(0..SEXES.len())]).collect();
    let birth_years: Vec<i32> = (0..size).map(|_| rng.random_range(2000..2006)).collect();
    let regions: Vec<&str> = (0..size)
        .map(|_| REGIONS[rng.random_range(0..REGIONS.len())])
        .collect();

    let schema = Schema::new(vec![
        Field::new("pnr", DataType::Utf8, false),
        Field::new("sex", DataType::Utf8, false),
        Field::new("birth_year", DataType::Int32, false),
        Field::new("region", DataType::Utf8, false),
    ]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(pnrs)),
        Arc::new(StringArray::from(sexes)),
        Arc::new(Int32Array::from(birth_years)),
        Arc::new(StringArray::from(regions)),
    ];

    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let request_json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read matching request from {path}"))?,
        None => DEFAULT_REQUEST.to_string(),
    };
    let request = MatchingRequest::from_json(&request_json)?;

    let mut rng = StdRng::seed_from_u64(request.random_seed.unwrap_or_default());
    let cases = synthetic_population(&mut rng, 200, 1)?;
    let controls = synthetic_population(&mut rng, 2_000, 1_000_001)?;
    info!(
        "Generated {} cases and {} potential controls",
        cases.num_rows(),
        controls.num_rows()
    );

    if request.verbose {
        print_batch_summary("CASES", &cases);
        print_sample_rows(&cases, 6);
        print_batch_summary("POTENTIAL CONTROLS", &controls);
        print_sample_rows(&controls, 6);
    }

    let result = select_case_control_dataset_from_request(&cases, &controls, &request)?;

    print_batch_summary("CASE-CONTROL DATASET", &result.dataset);
    print_sample_rows(&result.dataset, 10);
    println!("{}", serde_json::to_string_pretty(&result.summary)?);

    Ok(())
}
