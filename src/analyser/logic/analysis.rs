use super::naming;
use super::patterns;
use super::profiling;
use super::types::{ColumnProfile, InferredType, ProfileOptions, Table, TableProfile, is_missing};
use crate::error::{Result, ResultExt as _};
use std::collections::BTreeMap;

/// Profile a table from scratch.
pub fn profile(table: &Table, options: &ProfileOptions) -> Result<TableProfile> {
    profile_with_prior(table, None, options)
}

/// Profile a table, comparing inferred types against a previous profile of the
/// same lineage so type changes surface as suggestions.
pub fn profile_with_prior(
    table: &Table,
    prior: Option<&TableProfile>,
    options: &ProfileOptions,
) -> Result<TableProfile> {
    let mut columns = Vec::with_capacity(table.column_count());
    let mut outlier_counts = BTreeMap::new();

    for name in table.column_names() {
        let ca = table
            .str_column(&name)
            .with_context(|| format!("Profiling failed for column '{name}'"))?;

        let missing_count = profiling::count_missing(ca);
        let values: Vec<&str> = ca.into_iter().flatten().filter(|v| !v.is_empty()).collect();

        let inferred_type = profiling::infer_type(&values);
        let prior_type = prior
            .and_then(|p| p.column(&name))
            .map(|c| c.inferred_type);
        let suggested_type = profiling::suggest_type(inferred_type, prior_type);

        if inferred_type.is_numeric() {
            let numbers: Vec<f64> = values
                .iter()
                .filter_map(|v| profiling::parse_float(v))
                .collect();
            let outliers = profiling::count_outliers(&numbers, options.iqr_multiplier)
                .with_context(|| format!("Outlier detection failed for column '{name}'"))?;
            outlier_counts.insert(name.clone(), outliers);
        }

        let distinct_pattern_set = if inferred_type == InferredType::String {
            patterns::detect_patterns(&values, options.pattern_threshold)
        } else {
            Vec::new()
        };

        let semantic_cluster_label =
            naming::cluster_label(&name, inferred_type, &distinct_pattern_set);
        let normalization_suggestion =
            profiling::suggest_normalization(&name, inferred_type, &values);

        columns.push(ColumnProfile {
            name,
            inferred_type,
            suggested_type,
            missing_count,
            distinct_pattern_set,
            semantic_cluster_label,
            normalization_suggestion,
        });
    }

    let duplicate_row_count =
        profiling::count_duplicate_rows(table).context("Duplicate detection failed")?;

    tracing::debug!(
        "Profiled {} columns, {} rows, {} duplicates",
        columns.len(),
        table.row_count(),
        duplicate_row_count
    );

    Ok(TableProfile {
        columns,
        duplicate_row_count,
        outlier_counts,
        row_count: table.row_count(),
    })
}

/// Count of rows with at least one missing cell.
pub fn rows_with_missing(table: &Table) -> Result<usize> {
    let columns = table.string_columns()?;
    Ok((0..table.row_count())
        .filter(|&i| columns.iter().any(|ca| is_missing(ca.get(i))))
        .count())
}
