//! # csvsteward - CSV profiling and progressive cleaning
//!
//! csvsteward ingests delimited files, profiles them (types, missing values,
//! duplicates, outliers, patterns, column roles, normalization hints) and
//! applies cleaning steps that each produce a new, persisted file version.
//!
//! ## Quick Start
//!
//! ```no_run
//! use csvsteward::analyser::logic::{self, IngestFormat, ProfileOptions};
//!
//! # fn example() -> csvsteward::error::Result<()> {
//! let table = logic::ingest(b"name,age\nAlice,30\nBob,\nAlice,30\n", &IngestFormat::csv())?;
//! let profile = logic::profile(&table, &ProfileOptions::default())?;
//! assert_eq!(profile.duplicate_row_count, 1);
//!
//! let cleaned = logic::remove_duplicates(&table)?;
//! assert_eq!(cleaned.row_count(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: profiling, cleaning and file lifecycle
//!   - [`analyser::logic`]: ingest, profiling and cleaning algorithms
//!   - [`analyser::lifecycle`]: file versions, sessions and the [`analyser::lifecycle::Workspace`]
//! - [`server`]: HTTP API (axum)
//! - [`config`]: service settings
//! - [`logging`]: tracing setup
//! - [`error`]: error types and handling utilities

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
