//! Cleaner transforms. Each takes a table by reference and returns a new one;
//! applying any of them twice gives the same table as applying it once.

use super::profiling::{
    first_occurrence_mask, infer_type, mean_and_std, normalize_value, parse_float,
    suggest_normalization, z_score,
};
use super::types::{Normalization, Table, is_missing};
use crate::error::{Result, StewardError};
use polars::prelude::*;

/// Keep the first occurrence of each distinct row, in original order.
pub fn remove_duplicates(table: &Table) -> Result<Table> {
    let mask: BooleanChunked = first_occurrence_mask(table)?.into_iter().collect();
    filter_rows(table, &mask)
}

/// Drop every row that has a null or empty cell in any column.
pub fn remove_missing(table: &Table) -> Result<Table> {
    let columns = table.string_columns()?;
    let mask: BooleanChunked = (0..table.row_count())
        .map(|i| !columns.iter().any(|ca| is_missing(ca.get(i))))
        .collect();
    filter_rows(table, &mask)
}

fn filter_rows(table: &Table, mask: &BooleanChunked) -> Result<Table> {
    let df = table.frame().filter(mask)?;
    Table::from_frame(df)
}

/// The normalization `normalize_column` would apply to `column` right now.
pub fn normalization_for(table: &Table, column: &str) -> Result<Option<Normalization>> {
    if !table.has_column(column) {
        return Err(StewardError::ColumnNotFound(column.to_owned()));
    }

    let ca = table.str_column(column)?;
    let values: Vec<&str> = ca.into_iter().flatten().filter(|v| !v.is_empty()).collect();
    Ok(suggest_normalization(column, infer_type(&values), &values))
}

/// Apply the column's suggested normalization to every non-null cell of
/// `column`. Other columns are left untouched.
pub fn normalize_column(table: &Table, column: &str) -> Result<Table> {
    let action = normalization_for(table, column)?.ok_or_else(|| {
        StewardError::Validation(format!("column '{column}' has no suggested normalization"))
    })?;
    apply_normalization(table, column, action)
}

/// Rewrite the non-null cells of `column` under `action`. Cells that do not
/// convert are kept as they are.
pub fn apply_normalization(table: &Table, column: &str, action: Normalization) -> Result<Table> {
    let ca = table.str_column(column)?;
    let scale = match action {
        Normalization::ZScore => {
            let numbers: Vec<f64> = ca.into_iter().flatten().filter_map(parse_float).collect();
            match mean_and_std(&numbers) {
                Some((mean, std)) if std > 0.0 => Some((mean, std)),
                _ => {
                    return Err(StewardError::Validation(format!(
                        "column '{column}' has no spread to scale"
                    )));
                }
            }
        }
        _ => None,
    };
    let convert = |s: &str| match scale {
        Some((mean, std)) => z_score(s, mean, std),
        None => normalize_value(s, action),
    };

    let normalized: StringChunked = ca
        .into_iter()
        .map(|v| v.map(|s| convert(s).unwrap_or_else(|| s.to_owned())))
        .collect();
    let series = normalized.with_name(column.into()).into_series();

    let mut df = table.frame().clone();
    df.with_column(series)?;
    Table::from_frame(df)
}
