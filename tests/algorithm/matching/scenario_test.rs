//! Tests for the matching scenarios: exact fit, undersupply, oversupply and depletion

use crate::utils::{Row, controls_by_group, i64_column, output_rows, people_batch};
use arrow::array::{Array, Int32Array, StringArray};
use cc_match::{
    CaseOutcome, GroupLabel, Matcher, MatchingConfig, MatchingError, ValidationIssue,
    select_case_control_dataset,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn config(k: usize) -> MatchingConfig {
    MatchingConfig::builder("id")
        .matching_variables(["sex", "age"])
        .controls_per_case(k)
        .random_seed(42)
        .build()
}

#[test]
fn test_exact_fit() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30), (11, "F", 30), (12, "M", 31)]);

    let result = select_case_control_dataset(&cases, &controls, &config(1)).unwrap();

    assert_eq!(
        output_rows(&result.dataset),
        vec![
            Row { id: 1, group: 0, case: 1 },
            Row { id: 10, group: 0, case: 0 },
        ]
    );
    assert_eq!(result.outcomes, vec![CaseOutcome::AllEligible { controls: 1 }]);

    let sexes = result.dataset.column_by_name("sex").unwrap();
    let sexes = sexes.as_any().downcast_ref::<StringArray>().unwrap();
    assert!(sexes.iter().all(|sex| sex == Some("M")));
    let ages = result.dataset.column_by_name("age").unwrap();
    let ages = ages.as_any().downcast_ref::<Int32Array>().unwrap();
    assert!(ages.iter().all(|age| age == Some(30)));
}

#[test]
fn test_exact_fit_with_case_identifier_groups() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30)]);
    let config = MatchingConfig::builder("id")
        .matching_variables(["sex", "age"])
        .group_label(GroupLabel::CaseIdentifier)
        .build();

    let result = select_case_control_dataset(&cases, &controls, &config).unwrap();

    assert_eq!(i64_column(&result.dataset, "group"), vec![1, 1]);
    assert_eq!(i64_column(&result.dataset, "id"), vec![1, 10]);
}

#[test]
fn test_undersupply_emits_no_rows() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[(10, "F", 30), (11, "M", 31)]);

    for k in [0, 1, 5] {
        let result = select_case_control_dataset(&cases, &controls, &config(k)).unwrap();

        assert_eq!(result.dataset.num_rows(), 0);
        assert_eq!(result.dataset.num_columns(), 5);
        assert_eq!(result.summary.dropped_cases, 1);
        assert_eq!(result.summary.remaining_controls, 2);
    }
}

#[test]
fn test_oversupply_samples_exactly_k() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[
        (10, "M", 30),
        (11, "M", 30),
        (12, "M", 30),
        (13, "M", 30),
        (14, "M", 30),
    ]);

    let result = select_case_control_dataset(&cases, &controls, &config(2)).unwrap();
    let rows = output_rows(&result.dataset);

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], Row { id: 1, group: 0, case: 1 });
    let chosen = &controls_by_group(&rows)[&0];
    assert_eq!(chosen.len(), 2);
    assert!(chosen.iter().all(|id| (10..=14).contains(id)));
    assert_ne!(chosen[0], chosen[1]);

    assert_eq!(
        result.outcomes,
        vec![CaseOutcome::Sampled { eligible: 5, controls: 2 }]
    );
    assert_eq!(result.summary.remaining_controls, 3);
}

#[test]
fn test_oversupply_leftovers_serve_later_cases() {
    let cases = people_batch(&[(1, "M", 30), (2, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30), (11, "M", 30), (12, "M", 30)]);

    let result = select_case_control_dataset(&cases, &controls, &config(2)).unwrap();
    let groups = controls_by_group(&output_rows(&result.dataset));

    assert_eq!(groups[&0].len(), 2);
    assert_eq!(groups[&1].len(), 1);
    assert!(!groups[&0].contains(&groups[&1][0]));
    assert_eq!(result.summary.underfilled_cases, 1);
    assert_eq!(result.summary.remaining_controls, 0);
}

#[test]
fn test_sequential_depletion() {
    let cases = people_batch(&[(1, "M", 30), (2, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30)]);

    let result = select_case_control_dataset(&cases, &controls, &config(1)).unwrap();

    assert_eq!(
        output_rows(&result.dataset),
        vec![
            Row { id: 1, group: 0, case: 1 },
            Row { id: 10, group: 0, case: 0 },
        ]
    );
    assert_eq!(
        result.outcomes,
        vec![CaseOutcome::AllEligible { controls: 1 }, CaseOutcome::Dropped]
    );
}

#[test]
fn test_undersupply_branch_consumes_all_filtered_controls() {
    let cases = people_batch(&[(1, "M", 30), (2, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30), (11, "F", 30), (12, "M", 30)]);

    let result = select_case_control_dataset(&cases, &controls, &config(3)).unwrap();
    let rows = output_rows(&result.dataset);

    assert_eq!(controls_by_group(&rows)[&0], vec![10, 12]);
    // the second case finds nothing: both matching controls went to the first
    assert_eq!(rows.len(), 3);
    assert_eq!(result.summary.remaining_controls, 1);
}

#[test]
fn test_default_requests_one_control() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30), (11, "M", 30)]);
    let config = MatchingConfig::builder("id").matching_variables(["sex"]).build();

    let result = select_case_control_dataset(&cases, &controls, &config).unwrap();
    assert_eq!(result.dataset.num_rows(), 2);
}

#[test]
fn test_same_seed_reproduces_output() {
    let cases = people_batch(&[(1, "M", 30), (2, "F", 31)]);
    let controls = people_batch(&[
        (10, "M", 30),
        (11, "M", 30),
        (12, "M", 30),
        (13, "F", 31),
        (14, "F", 31),
        (15, "F", 31),
    ]);

    let first = select_case_control_dataset(&cases, &controls, &config(1)).unwrap();
    let second = select_case_control_dataset(&cases, &controls, &config(1)).unwrap();
    assert_eq!(first.dataset, second.dataset);

    let matcher = Matcher::new(config(1));
    let third = matcher
        .perform_matching_with_rng(&cases, &controls, &mut StdRng::seed_from_u64(42))
        .unwrap();
    assert_eq!(first.dataset, third.dataset);
}

#[test]
fn test_null_keys_follow_match_nulls() {
    use arrow::array::{ArrayRef, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    let batch = |ids: Vec<i64>, sexes: Vec<Option<&str>>| {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("sex", DataType::Utf8, true),
        ]);
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(ids)),
            Arc::new(StringArray::from(sexes)),
        ];
        RecordBatch::try_new(Arc::new(schema), columns).unwrap()
    };
    let cases = batch(vec![1], vec![None]);
    let controls = batch(vec![10], vec![None]);

    let lenient = MatchingConfig::builder("id").matching_variables(["sex"]).build();
    let result = select_case_control_dataset(&cases, &controls, &lenient).unwrap();
    assert_eq!(result.dataset.num_rows(), 2);
    assert_eq!(result.dataset.column_by_name("sex").unwrap().null_count(), 2);

    let strict = MatchingConfig::builder("id")
        .matching_variables(["sex"])
        .match_nulls(false)
        .build();
    let result = select_case_control_dataset(&cases, &controls, &strict).unwrap();
    assert_eq!(result.dataset.num_rows(), 0);
}

#[test]
fn test_validation_failure_computes_nothing() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[(1, "M", 30)]);
    let config = MatchingConfig::builder("id")
        .matching_variables(["sex", "height"])
        .build();

    let error = select_case_control_dataset(&cases, &controls, &config).unwrap_err();
    let report = error.validation_report().expect("validation error");

    assert!(matches!(error, MatchingError::Validation(_)));
    assert_eq!(report.issues.len(), 3);
    assert!(matches!(
        report.issues[0],
        ValidationIssue::DuplicateIdentifier { .. }
    ));
}

/// Controls with a text identifier column and a `sex` column
fn text_id_controls(ids: Vec<&str>, sexes: Vec<&str>) -> arrow::record_batch::RecordBatch {
    use arrow::array::ArrayRef;
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    let schema = Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("sex", DataType::Utf8, true),
    ]);
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(StringArray::from(sexes)),
    ];
    arrow::record_batch::RecordBatch::try_new(Arc::new(schema), columns).unwrap()
}

#[test]
fn test_mixed_identifier_types_are_rejected() {
    let cases = people_batch(&[(1, "M", 30)]);
    let config = MatchingConfig::builder("id").matching_variables(["sex"]).build();

    // One id that cannot convert to an integer, one that would collide with the case id
    for control_ids in [vec!["C-10"], vec!["1"]] {
        let controls = text_id_controls(control_ids, vec!["M"]);

        let error = select_case_control_dataset(&cases, &controls, &config).unwrap_err();
        let report = error.validation_report().expect("validation error");

        assert_eq!(report.issues.len(), 1);
        assert!(matches!(
            report.issues[0],
            ValidationIssue::IdentifierTypeMismatch { .. }
        ));
    }
}

#[test]
fn test_repeated_output_column_is_rejected() {
    let cases = people_batch(&[(1, "M", 30)]);
    let controls = people_batch(&[(10, "M", 30)]);
    let config = MatchingConfig::builder("id")
        .matching_variables(["sex", "sex"])
        .build();

    let error = select_case_control_dataset(&cases, &controls, &config).unwrap_err();
    let report = error.validation_report().expect("validation error");

    assert_eq!(
        report.issues,
        vec![ValidationIssue::DuplicateOutputColumn {
            column: "sex".to_string()
        }]
    );
}
