//! Core profiling and cleaning algorithms.
//!
//! - [`io`]: the Ingestor (delimited bytes → [`Table`], and back)
//! - [`analysis`]: the Profiler entry points
//! - [`profiling`], [`patterns`], [`naming`]: per-column statistics used by the Profiler
//! - [`cleaning`]: the Cleaner transforms

pub mod analysis;
pub mod cleaning;
pub mod io;
pub mod naming;
pub mod patterns;
pub mod profiling;
pub mod types;

pub use analysis::{profile, profile_with_prior, rows_with_missing};
pub use cleaning::{normalize_column, remove_duplicates, remove_missing};
pub use io::{IngestFormat, ingest, read_parquet, to_csv_bytes, to_parquet_bytes};
pub use types::{
    ColumnProfile, InferredType, MetadataView, Normalization, ProfileOptions, Table, TableProfile,
};
