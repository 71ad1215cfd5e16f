use crate::error::{Result, StewardError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// DATA STRUCTURES

/// An immutable, rectangular table of nullable string cells.
///
/// Backed by a polars `DataFrame` whose columns are all `String`. Every
/// cleaning operation produces a new `Table`; nothing mutates one in place.
#[derive(Clone, Debug)]
pub struct Table {
    df: DataFrame,
}

impl Table {
    /// Build a table from named columns. All columns must have equal length
    /// and distinct names.
    pub fn from_columns(columns: Vec<(String, Vec<Option<String>>)>) -> Result<Self> {
        if let Some((_, first)) = columns.first() {
            let height = first.len();
            if let Some((name, _)) = columns.iter().find(|(_, values)| values.len() != height) {
                return Err(StewardError::Validation(format!(
                    "column '{name}' does not have {height} rows"
                )));
            }
        }

        let cols = columns
            .into_iter()
            .map(|(name, values)| Column::new(name.into(), values))
            .collect::<Vec<_>>();
        let df = DataFrame::new(cols)?;
        Ok(Self { df })
    }

    /// Wrap a frame that already has only string columns.
    pub(crate) fn from_frame(df: DataFrame) -> Result<Self> {
        if let Some(col) = df.get_columns().iter().find(|c| c.dtype() != &DataType::String) {
            return Err(StewardError::Internal(format!(
                "column '{}' is {} instead of a string column",
                col.name(),
                col.dtype()
            )));
        }
        Ok(Self { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }

    /// Borrow a column as a string chunked array.
    pub fn str_column(&self, name: &str) -> Result<&StringChunked> {
        let col = self
            .df
            .column(name)
            .map_err(|_err| StewardError::ColumnNotFound(name.to_owned()))?;
        Ok(col.as_materialized_series().str()?)
    }

    /// Owned copy of one column's cells, in row order.
    pub fn column_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let ca = self.str_column(name)?;
        Ok(ca.into_iter().map(|v| v.map(str::to_owned)).collect())
    }

    /// Row-major copy of the whole table.
    pub fn rows(&self) -> Result<Vec<Vec<Option<String>>>> {
        let columns = self.string_columns()?;
        Ok((0..self.row_count())
            .map(|i| {
                columns
                    .iter()
                    .map(|ca| ca.get(i).map(str::to_owned))
                    .collect()
            })
            .collect())
    }

    pub(crate) fn string_columns(&self) -> Result<Vec<&StringChunked>> {
        self.df
            .get_columns()
            .iter()
            .map(|c| Ok(c.as_materialized_series().str()?))
            .collect()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.column_names() == other.column_names()
            && matches!((self.rows(), other.rows()), (Ok(a), Ok(b)) if a == b)
    }
}

/// A cell is missing when it is null or an empty string.
pub fn is_missing(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Integer,
    Float,
    Boolean,
    Date,
    String,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::String => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }
}

/// Column-level transform offered by the profiler and applied by `normalize_column`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Normalization {
    #[serde(rename = "trim+lowercase suggested")]
    TrimLowercase,
    #[serde(rename = "cast to numeric suggested")]
    CastNumeric,
    #[serde(rename = "standardize boolean suggested")]
    StandardizeBoolean,
    #[serde(rename = "standardize ISO date suggested")]
    StandardizeDate,
    #[serde(rename = "z-score normalization suggested")]
    ZScore,
}

impl Normalization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrimLowercase => "trim+lowercase suggested",
            Self::CastNumeric => "cast to numeric suggested",
            Self::StandardizeBoolean => "standardize boolean suggested",
            Self::StandardizeDate => "standardize ISO date suggested",
            Self::ZScore => "z-score normalization suggested",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub inferred_type: InferredType,
    /// `None` means "no change".
    pub suggested_type: Option<InferredType>,
    pub missing_count: usize,
    pub distinct_pattern_set: Vec<String>,
    pub semantic_cluster_label: String,
    /// `None` means no normalization needed.
    pub normalization_suggestion: Option<Normalization>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableProfile {
    pub columns: Vec<ColumnProfile>,
    pub duplicate_row_count: usize,
    /// Numeric columns only.
    pub outlier_counts: BTreeMap<String, usize>,
    pub row_count: usize,
}

impl TableProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }
}

/// Tunables for a profiling pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// Fraction of non-null values that must match a pattern for it to be detected.
    pub pattern_threshold: f64,
    /// Fence multiplier for IQR outlier detection.
    pub iqr_multiplier: f64,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            pattern_threshold: 0.8,
            iqr_multiplier: 1.5,
        }
    }
}

const NO_NORMALIZATION: &str = "no normalization needed";
const NO_PATTERN: &str = "none";

/// Flat per-column maps in the shape the steward upload page reads
/// (`metadata.data_types[col]`, `metadata.outliers[col]`, ...). Columns
/// without a suggestion read `"no normalization needed"`, and columns
/// without a detected pattern read `["none"]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetadataView {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub duplicates: usize,
    pub data_types: BTreeMap<String, String>,
    pub suggested_data_types: BTreeMap<String, String>,
    pub missing_values: BTreeMap<String, usize>,
    pub normalization_suggestions: BTreeMap<String, String>,
    pub pattern_detection: BTreeMap<String, Vec<String>>,
    pub semantic_column_clusters: BTreeMap<String, String>,
    pub outliers: BTreeMap<String, usize>,
}

impl From<&TableProfile> for MetadataView {
    fn from(profile: &TableProfile) -> Self {
        let mut view = Self {
            columns: Vec::with_capacity(profile.columns.len()),
            row_count: profile.row_count,
            duplicates: profile.duplicate_row_count,
            data_types: BTreeMap::new(),
            suggested_data_types: BTreeMap::new(),
            missing_values: BTreeMap::new(),
            normalization_suggestions: BTreeMap::new(),
            pattern_detection: BTreeMap::new(),
            semantic_column_clusters: BTreeMap::new(),
            outliers: profile.outlier_counts.clone(),
        };

        for col in &profile.columns {
            let name = col.name.clone();
            view.columns.push(name.clone());
            view.data_types
                .insert(name.clone(), col.inferred_type.as_str().to_owned());
            view.suggested_data_types.insert(
                name.clone(),
                col.suggested_type
                    .map_or("no change", |t| t.as_str())
                    .to_owned(),
            );
            view.missing_values.insert(name.clone(), col.missing_count);
            view.normalization_suggestions.insert(
                name.clone(),
                col.normalization_suggestion
                    .map_or(NO_NORMALIZATION, |n| n.as_str())
                    .to_owned(),
            );
            let patterns = if col.distinct_pattern_set.is_empty() {
                vec![NO_PATTERN.to_owned()]
            } else {
                col.distinct_pattern_set.clone()
            };
            view.pattern_detection.insert(name.clone(), patterns);
            view.semantic_column_clusters
                .insert(name, col.semantic_cluster_label.clone());
        }

        view
    }
}
