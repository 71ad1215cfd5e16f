//! Ingestor: parse delimited bytes into a [`Table`] and serialise it back.
//!
//! Parsing is strict: every data row must have exactly as many fields as the
//! header, so downstream row counts never depend on padding heuristics.
//!
//! Stored versions use Parquet, which keeps nulls and empty strings apart.
//! CSV is only produced for downloads and the CLI.

use super::types::Table;
use crate::error::{Result, StewardError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_NULL_TOKENS: &[&str] = &["", "NA", "N/A", "null", "NULL", "NaN", "nan"];

/// Declared format of an uploaded file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestFormat {
    pub delimiter: u8,
    /// Cell values (compared after trimming) that are read as null.
    pub null_tokens: Vec<String>,
}

impl IngestFormat {
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::csv()
        }
    }

    /// Pick a delimiter from the file extension, defaulting to comma.
    pub fn from_file_name(name: &str) -> Self {
        let ext = std::path::Path::new(name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "tsv" | "tab" => Self::tsv(),
            _ => Self::csv(),
        }
    }

    pub fn with_null_tokens(mut self, tokens: Vec<String>) -> Self {
        self.null_tokens = tokens;
        self
    }

    fn is_null_token(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.null_tokens.iter().any(|t| t == trimmed)
    }
}

impl Default for IngestFormat {
    fn default() -> Self {
        Self::csv()
    }
}

pub fn ingest(raw: &[u8], format: &IngestFormat) -> Result<Table> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| StewardError::Format(format!("file is not valid UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<Option<String>>> = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(idx as u64 + 1, |p| p.line());

        // The reader drops empty lines itself. A quoted `""` is a real cell.
        if record.len() == 1
            && record.get(0).is_some_and(|f| !f.is_empty() && f.trim().is_empty())
        {
            continue;
        }

        let Some(names) = header.as_ref() else {
            let names = parse_header(&record)?;
            columns = vec![Vec::new(); names.len()];
            header = Some(names);
            continue;
        };

        if record.len() != names.len() {
            return Err(StewardError::Format(format!(
                "line {line} has {} fields, expected {}",
                record.len(),
                names.len()
            )));
        }

        for (column, field) in columns.iter_mut().zip(record.iter()) {
            if format.is_null_token(field) {
                column.push(None);
            } else {
                column.push(Some(field.to_owned()));
            }
        }
    }

    let names = header.ok_or_else(|| StewardError::Format("missing header row".to_owned()))?;
    tracing::debug!(
        "Ingested {} columns x {} rows",
        names.len(),
        columns.first().map_or(0, Vec::len)
    );

    Table::from_columns(names.into_iter().zip(columns).collect())
}

fn parse_header(record: &csv::StringRecord) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(record.len());

    for (i, raw) in record.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(StewardError::Format(format!(
                "header column {} has an empty name",
                i + 1
            )));
        }
        if !seen.insert(name.to_owned()) {
            return Err(StewardError::Format(format!(
                "header column '{name}' appears more than once"
            )));
        }
        names.push(name.to_owned());
    }

    Ok(names)
}

/// Serialise a table as comma-separated text with a header row. Nulls are
/// written as empty cells; a row whose only cell is empty comes out as `""`
/// so it survives a read back.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(table.column_names())?;
    for row in table.rows()? {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer
        .into_inner()
        .map_err(|e| StewardError::Io(e.into_error()))
}

pub fn to_parquet_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut df = table.frame().clone();
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf).finish(&mut df)?;
    Ok(buf)
}

pub fn read_parquet(file: std::fs::File) -> Result<Table> {
    let df = ParquetReader::new(file).finish()?;
    Table::from_frame(df)
}
