//! File versions and their lineage

use crate::analyser::logic::TableProfile;
use crate::error::{Result, ResultExt as _, StewardError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The step that produced a version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    Upload { original_name: String },
    RemoveDuplicates,
    RemoveMissing,
    Normalize { column: String },
}

impl Operation {
    /// Prefix used for generated file names.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Upload { .. } => "upload",
            Self::RemoveDuplicates => "duplicates",
            Self::RemoveMissing => "missingvalues",
            Self::Normalize { .. } => "normalized",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Upload { original_name } => format!("upload of {original_name}"),
            Self::RemoveDuplicates => "remove duplicate rows".to_owned(),
            Self::RemoveMissing => "remove rows with missing values".to_owned(),
            Self::Normalize { column } => format!("normalize column '{column}'"),
        }
    }
}

/// One immutable, persisted table in a lineage chain.
///
/// `derived_from` is a lookup key into the version store, never an owning
/// link; walking it is how downloads find earlier lineage points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileVersion {
    pub file_name: String,
    pub derived_from: Option<String>,
    pub operation: Operation,
    pub created_at: DateTime<Utc>,
    /// Profile computed when the version was created.
    pub profile: TableProfile,
}

impl FileVersion {
    pub fn new_upload(original_name: &str, profile: TableProfile) -> Self {
        let operation = Operation::Upload {
            original_name: original_name.to_owned(),
        };
        Self {
            file_name: generate_file_name(&operation),
            derived_from: None,
            operation,
            created_at: Utc::now(),
            profile,
        }
    }

    pub fn new_derived(parent: &Self, operation: Operation, profile: TableProfile) -> Self {
        Self {
            file_name: generate_file_name(&operation),
            derived_from: Some(parent.file_name.clone()),
            operation,
            created_at: Utc::now(),
            profile,
        }
    }

    pub fn is_original(&self) -> bool {
        self.derived_from.is_none()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize version")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize version")
    }
}

fn generate_file_name(operation: &Operation) -> String {
    format!("{}_{}.csv", operation.file_prefix(), Uuid::new_v4().simple())
}

/// Which lineage point a download serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadVariant {
    /// The uploaded file at the root of the chain.
    Original,
    Duplicates,
    MissingValues,
    Normalized,
}

impl DownloadVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Duplicates => "duplicates",
            Self::MissingValues => "missingvalues",
            Self::Normalized => "normalized",
        }
    }

    /// Whether a version created by `operation` satisfies this variant.
    pub fn matches(&self, operation: &Operation) -> bool {
        matches!(
            (self, operation),
            (Self::Original, Operation::Upload { .. })
                | (Self::Duplicates, Operation::RemoveDuplicates)
                | (Self::MissingValues, Operation::RemoveMissing)
                | (Self::Normalized, Operation::Normalize { .. })
        )
    }
}

impl fmt::Display for DownloadVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadVariant {
    type Err = StewardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "duplicates" => Ok(Self::Duplicates),
            "missingvalues" | "missing" => Ok(Self::MissingValues),
            "normalized" => Ok(Self::Normalized),
            other => Err(StewardError::Validation(format!(
                "unknown download variant '{other}'"
            ))),
        }
    }
}
