use super::*;
use crate::analyser::logic::profiling::{count_outliers, iqr_bounds};

#[test]
fn test_type_inference() {
    let t = table(
        &["ints", "floats", "bools", "dates", "mixed"],
        &[
            &["1", "1", "true", "2024-01-01", "1"],
            &["2", "2.5", "false", "2024-02-01", "abc"],
            &["3", "3", "TRUE", "2024-03-01", "2"],
        ],
    );
    let p = profile(&t, &ProfileOptions::default()).unwrap();

    let kind = |name: &str| p.column(name).unwrap().inferred_type;
    assert_eq!(kind("ints"), InferredType::Integer);
    assert_eq!(kind("floats"), InferredType::Float);
    assert_eq!(kind("bools"), InferredType::Boolean);
    assert_eq!(kind("dates"), InferredType::Date);
    assert_eq!(kind("mixed"), InferredType::String);
}

#[test]
fn test_zero_one_column_infers_integer() {
    let t = table(&["flag"], &[&["0"], &["1"], &["1"]]);
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(p.columns[0].inferred_type, InferredType::Integer);
}

#[test]
fn test_locale_dates_and_non_finite_floats() {
    let t = table(
        &["when", "ratio"],
        &[&["31/12/2023", "inf"], &["01/01/2024", "0.5"]],
    );
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(p.column("when").unwrap().inferred_type, InferredType::Date);
    assert_eq!(p.column("ratio").unwrap().inferred_type, InferredType::String);
}

#[test]
fn test_missing_count_counts_null_and_empty() {
    let t = table_with_nulls(&["c"], &[&[Some("")], &[Some("x")], &[None], &[Some("y")]]);
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(p.columns[0].missing_count, 2);
    assert_eq!(p.total_missing(), 2);
    assert_eq!(rows_with_missing(&t).unwrap(), 2);
}

#[test]
fn test_duplicate_count_counts_later_occurrences() {
    let t = table(&["v"], &[&["A"], &["B"], &["A"], &["C"], &["A"]]);
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(p.duplicate_row_count, 2);
}

#[test]
fn test_iqr_outliers() {
    let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 100.0];
    let (lower, upper) = iqr_bounds(&values, 1.5).unwrap().unwrap();
    assert!((lower - -1.0).abs() < 1e-9);
    assert!((upper - 7.0).abs() < 1e-9);
    assert_eq!(count_outliers(&values, 1.5).unwrap(), 1);

    let rows: Vec<[&str; 1]> = ["1", "2", "2", "3", "3", "3", "4", "4", "100"]
        .iter()
        .map(|v| [*v])
        .collect();
    let rows: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    let t = table(&["n"], &rows);
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(p.outlier_counts.get("n"), Some(&1));
}

#[test]
fn test_outlier_multiplier_is_configurable() {
    let values = [1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 4.0, 4.0, 9.0];
    assert_eq!(count_outliers(&values, 1.5).unwrap(), 1);
    assert_eq!(count_outliers(&values, 3.0).unwrap(), 0);
}

#[test]
fn test_empty_table_profiles_to_zeros() {
    let t = Table::from_columns(vec![
        ("a".to_owned(), Vec::new()),
        ("b".to_owned(), Vec::new()),
    ])
    .unwrap();
    let p = profile(&t, &ProfileOptions::default()).unwrap();

    assert_eq!(p.row_count, 0);
    assert_eq!(p.duplicate_row_count, 0);
    assert!(p.outlier_counts.is_empty());
    for col in &p.columns {
        assert_eq!(col.inferred_type, InferredType::String);
        assert_eq!(col.missing_count, 0);
        assert!(col.distinct_pattern_set.is_empty());
        assert!(col.normalization_suggestion.is_none());
    }
}

#[test]
fn test_suggested_type_tracks_prior_profile() {
    let options = ProfileOptions::default();
    let before = table(&["code", "name"], &[&["1", "Ann"], &["x", "Bo"]]);
    let after = table(&["code", "name"], &[&["1", "Ann"], &["2", "Bo"]]);

    let prior = profile(&before, &options).unwrap();
    assert_eq!(prior.column("code").unwrap().suggested_type, None);

    let p = profile_with_prior(&after, Some(&prior), &options).unwrap();
    assert_eq!(
        p.column("code").unwrap().suggested_type,
        Some(InferredType::Integer)
    );
    assert_eq!(p.column("name").unwrap().suggested_type, None);
}

#[test]
fn test_normalization_suggestions() {
    let t = table(
        &["city", "amount", "active", "joined", "clean"],
        &[
            &[" Paris", "1.50", "TRUE", "31/12/2023", "a"],
            &["paris", "2", "false", "2024-01-01", "b"],
        ],
    );
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    let suggestion = |name: &str| p.column(name).unwrap().normalization_suggestion;

    assert_eq!(suggestion("city"), Some(Normalization::TrimLowercase));
    assert_eq!(suggestion("amount"), Some(Normalization::CastNumeric));
    assert_eq!(suggestion("active"), Some(Normalization::StandardizeBoolean));
    assert_eq!(suggestion("joined"), Some(Normalization::StandardizeDate));
    assert_eq!(suggestion("clean"), None);
}

#[test]
fn test_patterns_only_for_string_columns() {
    let t = table(
        &["contact", "zip"],
        &[&["a@x.io", "12345"], &["b@x.io", "54321"]],
    );
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(
        p.column("contact").unwrap().distinct_pattern_set,
        vec!["email".to_owned()]
    );
    // All-digit postal codes infer integer and skip pattern matching.
    assert!(p.column("zip").unwrap().distinct_pattern_set.is_empty());
    assert_eq!(p.column("zip").unwrap().semantic_cluster_label, "location");
}

#[test]
fn test_profile_is_repeatable() {
    let t = table(&["a", "b"], &[&["1", "x "], &["1", "x "], &["3", "Y"]]);
    let options = ProfileOptions::default();
    let first = profile(&t, &options).unwrap();
    let second = profile(&t, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_wide_integers_stay_integers() {
    let t = table(
        &["account"],
        &[&["9999999999999999999"], &["12345678901234567891"], &["-42"]],
    );
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    let col = p.column("account").unwrap();
    assert_eq!(col.inferred_type, InferredType::Integer);
    assert_ne!(col.normalization_suggestion, Some(Normalization::CastNumeric));
}

#[test]
fn test_lossy_float_text_gets_no_cast() {
    // More digits than f64 holds; casting would round them away.
    let t = table(&["reading_id"], &[&["0.12345678901234567891"], &["2.5"]]);
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    let col = p.column("reading_id").unwrap();
    assert_eq!(col.inferred_type, InferredType::Float);
    assert_eq!(col.normalization_suggestion, None);
}

#[test]
fn test_z_score_suggestion() {
    let t = table(
        &["price", "customer_id", "flat", "ratio"],
        &[&["10", "1", "5", "1.5"], &["20", "2", "5", "2.5"], &["30", "3", "5", "3.5"]],
    );
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    let suggestion = |name: &str| p.column(name).unwrap().normalization_suggestion;

    assert_eq!(suggestion("price"), Some(Normalization::ZScore));
    assert_eq!(suggestion("ratio"), Some(Normalization::ZScore));
    assert_eq!(suggestion("customer_id"), None);
    assert_eq!(suggestion("flat"), None);
}

#[test]
fn test_non_canonical_numbers_cast_before_scaling() {
    let t = table(&["price"], &[&["10.0"], &["20"]]);
    let p = profile(&t, &ProfileOptions::default()).unwrap();
    assert_eq!(
        p.column("price").unwrap().normalization_suggestion,
        Some(Normalization::CastNumeric)
    );
}
