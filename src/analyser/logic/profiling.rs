//! Statistical profiling for string-typed columns.
//!
//! Every cell in a [`Table`] is text, so profiling works by testing how the
//! non-null values of a column parse:
//! - Type inference (integer → float → boolean → date, falling back to string)
//! - Missing value counts (null or empty string)
//! - Exact duplicate row detection
//! - Outlier detection using the IQR method on numeric columns
//! - Normalization suggestions: canonical text for columns that are not in
//!   canonical form, z-score scaling for numeric measures that already are
//!
//! Quantiles go through polars' linear interpolation so the fences match what
//! the rest of the toolchain reports for the same data.

use super::types::{InferredType, Normalization, Table, is_missing};
use crate::error::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// TYPE TESTS

/// Canonical spelling of an integer of any width: no sign for zero or
/// positives, no leading zeros.
pub fn canonical_integer(value: &str) -> Option<String> {
    let (negative, digits) = split_sign(value.trim());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let digits = digits.trim_start_matches('0');
    Some(if digits.is_empty() {
        "0".to_owned()
    } else if negative {
        format!("-{digits}")
    } else {
        digits.to_owned()
    })
}

pub fn parse_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsedDate {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl ParsedDate {
    /// ISO-8601 rendering used when standardizing a date column.
    pub fn to_iso(&self) -> String {
        match self {
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Self::Zoned(dt) => dt.to_rfc3339(),
        }
    }
}

pub fn parse_date(value: &str) -> Option<ParsedDate> {
    let value = value.trim();

    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return Some(ParsedDate::Date(d));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(ParsedDate::Zoned(dt));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(ParsedDate::DateTime)
}

/// Most specific type that every value satisfies. Callers pass non-missing
/// values only; an empty slice infers `String`.
pub fn infer_type(values: &[&str]) -> InferredType {
    if values.is_empty() {
        return InferredType::String;
    }

    if values.iter().all(|v| canonical_integer(v).is_some()) {
        InferredType::Integer
    } else if values.iter().all(|v| parse_float(v).is_some()) {
        InferredType::Float
    } else if values.iter().all(|v| parse_boolean(v).is_some()) {
        InferredType::Boolean
    } else if values.iter().all(|v| parse_date(v).is_some()) {
        InferredType::Date
    } else {
        InferredType::String
    }
}

/// Stored cells are always text, so any stricter inferred type is worth
/// suggesting. A change from the previous profile's type is suggested too.
pub fn suggest_type(inferred: InferredType, prior: Option<InferredType>) -> Option<InferredType> {
    let changed = prior.is_some_and(|p| p != inferred);
    (changed || inferred != InferredType::String).then_some(inferred)
}

// COUNTS

pub fn count_missing(ca: &StringChunked) -> usize {
    ca.into_iter().filter(|v| is_missing(*v)).count()
}

/// `true` for the first occurrence of each distinct row tuple, `false` for
/// every later repeat.
pub fn first_occurrence_mask(table: &Table) -> Result<Vec<bool>> {
    let columns = table.string_columns()?;
    let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(table.row_count());

    Ok((0..table.row_count())
        .map(|i| {
            let row: Vec<Option<&str>> = columns.iter().map(|ca| ca.get(i)).collect();
            seen.insert(row)
        })
        .collect())
}

pub fn count_duplicate_rows(table: &Table) -> Result<usize> {
    Ok(first_occurrence_mask(table)?
        .into_iter()
        .filter(|first| !first)
        .count())
}

/// Sample mean and standard deviation (n - 1), or `None` below two values.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}

// OUTLIERS

/// Inclusive fences `[Q1 - k·IQR, Q3 + k·IQR]`, or `None` for an empty column.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Result<Option<(f64, f64)>> {
    if values.is_empty() {
        return Ok(None);
    }

    let ca = Float64Chunked::from_vec("values".into(), values.to_vec());
    let q1 = ca.quantile(0.25, QuantileMethod::Linear)?;
    let q3 = ca.quantile(0.75, QuantileMethod::Linear)?;

    Ok(match (q1, q3) {
        (Some(q1), Some(q3)) => {
            let iqr = q3 - q1;
            Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
        }
        _ => None,
    })
}

pub fn count_outliers(values: &[f64], multiplier: f64) -> Result<usize> {
    let Some((lower, upper)) = iqr_bounds(values, multiplier)? else {
        return Ok(0);
    };
    Ok(values.iter().filter(|&&v| v < lower || v > upper).count())
}

// NORMALIZATION

const STANDARDIZED_TOLERANCE: f64 = 1e-6;

/// Canonical text for a value under the given normalization, or `None` when
/// the value cannot be converted (it is then left untouched). Z-score scaling
/// needs column statistics and goes through [`z_score`] instead.
pub fn normalize_value(value: &str, action: Normalization) -> Option<String> {
    match action {
        Normalization::TrimLowercase => Some(
            value
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase(),
        ),
        Normalization::CastNumeric => exact_numeric_text(value),
        Normalization::StandardizeBoolean => parse_boolean(value).map(|b| b.to_string()),
        Normalization::StandardizeDate => parse_date(value).map(|d| d.to_iso()),
        Normalization::ZScore => None,
    }
}

pub fn z_score(value: &str, mean: f64, std: f64) -> Option<String> {
    parse_float(value).map(|v| ((v - mean) / std).to_string())
}

/// Canonical numeric text, but only when it names exactly the same number.
/// Integers keep every digit; a float is refused if `f64` would round it.
fn exact_numeric_text(value: &str) -> Option<String> {
    if let Some(integer) = canonical_integer(value) {
        return Some(integer);
    }

    let canonical = parse_float(value)?.to_string();
    (decimal_key(value)? == decimal_key(&canonical)?).then_some(canonical)
}

/// Sign, significant digits and power-of-ten exponent of a decimal literal.
/// Two spellings of the same number give the same key.
fn decimal_key(text: &str) -> Option<(bool, String, i64)> {
    let (negative, unsigned) = split_sign(text.trim());
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exp)) => (mantissa, exp.parse::<i64>().ok()?),
        None => (unsigned, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if (whole.is_empty() && fraction.is_empty())
        || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let digits = format!("{whole}{fraction}");
    let significant = digits.trim_start_matches('0');
    let trimmed = significant.trim_end_matches('0');
    if trimmed.is_empty() {
        return Some((false, String::new(), 0));
    }

    let exponent = exponent - i64::try_from(fraction.len()).ok()?
        + i64::try_from(significant.len() - trimmed.len()).ok()?;
    Some((negative, trimmed.to_owned(), exponent))
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    }
}

/// Pick the normalization for a column, if one applies.
///
/// Text that is not in canonical form is fixed first. A numeric column that
/// is already canonical gets z-score scaling when it varies, is not already
/// standardized, and is not an identifier (name ending in `id`).
pub fn suggest_normalization(
    column: &str,
    inferred: InferredType,
    values: &[&str],
) -> Option<Normalization> {
    let action = match inferred {
        InferredType::Integer | InferredType::Float => Normalization::CastNumeric,
        InferredType::Boolean => Normalization::StandardizeBoolean,
        InferredType::Date => Normalization::StandardizeDate,
        InferredType::String => {
            return has_inconsistent_text(values).then_some(Normalization::TrimLowercase);
        }
    };

    let needs_canonical = values
        .iter()
        .any(|v| normalize_value(v, action).is_some_and(|canonical| canonical != *v));
    if needs_canonical {
        return Some(action);
    }

    if action == Normalization::CastNumeric && wants_z_score(column, values) {
        return Some(Normalization::ZScore);
    }
    None
}

fn wants_z_score(column: &str, values: &[&str]) -> bool {
    if column.to_lowercase().ends_with("id") {
        return false;
    }

    let numbers: Vec<f64> = values.iter().filter_map(|v| parse_float(v)).collect();
    let Some((mean, std)) = mean_and_std(&numbers) else {
        return false;
    };
    let standardized =
        mean.abs() < STANDARDIZED_TOLERANCE && (std - 1.0).abs() < STANDARDIZED_TOLERANCE;
    std > 0.0 && !standardized
}

/// Padding, repeated inner whitespace, or the same word spelled with
/// different casing.
fn has_inconsistent_text(values: &[&str]) -> bool {
    let mut spellings: HashMap<String, &str> = HashMap::new();

    for &v in values {
        if v.trim() != v || v.contains("  ") || v.contains(|c: char| matches!(c, '\t' | '\n' | '\r')) {
            return true;
        }
        let folded = v.to_lowercase();
        match spellings.get(&folded) {
            Some(&first) if first != v => return true,
            Some(_) => {}
            None => {
                spellings.insert(folded, v);
            }
        }
    }

    false
}
