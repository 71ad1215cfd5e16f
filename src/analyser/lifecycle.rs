//! File lifecycle: uploads, cleaning steps, and session pointers
//!
//! Every upload and every cleaning step produces a new, immutable
//! [`FileVersion`] persisted by the [`VersionStore`]. A session always points
//! at exactly one current version, and cleaning is only allowed against that
//! version:
//!
//! ```text
//! UPLOADED ─┬─ remove_duplicates ──► duplicates_*.csv ─┬─ ...
//!           ├─ remove_missing ─────► missingvalues_*.csv
//!           └─ normalize(col) ─────► normalized_*.csv
//! ```
//!
//! ## Key Principles
//!
//! - **Immutability**: stored versions are never rewritten; each step derives a new one
//! - **Serialization**: a session's cleaning calls hold the session slot from
//!   resolve to pointer update, so concurrent calls cannot both advance from
//!   the same version. The loser gets [`StewardError::StaleVersion`].
//! - **Lineage**: `derived_from` is a name lookup, walked for downloads
//!
//! ## Example Usage
//!
//! ```no_run
//! use csvsteward::analyser::lifecycle::{DownloadVariant, Workspace};
//! use std::path::PathBuf;
//!
//! # fn example() -> csvsteward::error::Result<()> {
//! let workspace = Workspace::open(PathBuf::from("data/files"))?;
//!
//! let uploaded = workspace.upload("session-1", "people.csv", b"name,age\nAlice,30\nAlice,30\n")?;
//! let deduped = workspace.remove_duplicates("session-1", &uploaded.file_name)?;
//! assert_eq!(deduped.profile.duplicate_row_count, 0);
//!
//! let _original = workspace.download(&deduped.file_name, DownloadVariant::Original)?;
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod storage;
pub mod version;

pub use session::{InMemorySessionStore, SessionSlot, SessionStore, lock_slot};
pub use storage::VersionStore;
pub use version::{DownloadVariant, FileVersion, Operation};

use crate::analyser::logic::{
    self, IngestFormat, MetadataView, ProfileOptions, Table, TableProfile, cleaning,
};
use crate::error::{Result, StewardError};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of an upload, analysis or cleaning step.
#[derive(Clone, Debug, Serialize)]
pub struct CleaningOutcome {
    pub file_name: String,
    pub derived_from: Option<String>,
    pub profile: TableProfile,
}

impl CleaningOutcome {
    fn from_version(version: FileVersion) -> Self {
        Self {
            file_name: version.file_name,
            derived_from: version.derived_from,
            profile: version.profile,
        }
    }

    pub fn metadata(&self) -> MetadataView {
        MetadataView::from(&self.profile)
    }
}

/// Bytes of a downloaded lineage point.
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Chains ingest, cleaning, profiling and session updates over a shared
/// version store.
#[derive(Clone)]
pub struct Workspace {
    store: Arc<VersionStore>,
    sessions: Arc<dyn SessionStore>,
    options: ProfileOptions,
    null_tokens: Vec<String>,
}

impl Workspace {
    pub fn new(store: Arc<VersionStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            sessions,
            options: ProfileOptions::default(),
            null_tokens: IngestFormat::default().null_tokens,
        }
    }

    /// Workspace over a store at `storage_dir` with in-memory sessions.
    pub fn open(storage_dir: PathBuf) -> Result<Self> {
        let store = Arc::new(VersionStore::new(storage_dir)?);
        Ok(Self::new(store, Arc::new(InMemorySessionStore::new())))
    }

    pub fn with_profile_options(mut self, options: ProfileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_null_tokens(mut self, tokens: Vec<String>) -> Self {
        self.null_tokens = tokens;
        self
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn profile_options(&self) -> &ProfileOptions {
        &self.options
    }

    /// Ingest an uploaded file, store it as a new root version and point the
    /// session at it.
    pub fn upload(
        &self,
        session: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<CleaningOutcome> {
        let format = IngestFormat::from_file_name(original_name)
            .with_null_tokens(self.null_tokens.clone());
        let table = logic::ingest(bytes, &format)?;
        let profile = logic::profile(&table, &self.options)?;
        let version = FileVersion::new_upload(original_name, profile);

        let slot = self.sessions.slot(session)?;
        let mut current = lock_slot(&slot)?;
        self.store.store(&version, &table)?;
        *current = Some(version.file_name.clone());

        tracing::info!(
            "Uploaded {} as {} for session {} ({} rows)",
            original_name,
            version.file_name,
            session,
            table.row_count()
        );
        Ok(CleaningOutcome::from_version(version))
    }

    /// Re-profile a stored version without changing anything.
    pub fn analyze(&self, file_name: &str) -> Result<CleaningOutcome> {
        let version = self.store.version(file_name)?;
        let table = self.store.resolve(file_name)?;
        let prior = match &version.derived_from {
            Some(parent) => Some(self.store.version(parent)?.profile),
            None => None,
        };
        let profile = logic::profile_with_prior(&table, prior.as_ref(), &self.options)?;

        tracing::info!("Analyzed {} ({} rows)", file_name, profile.row_count);
        Ok(CleaningOutcome {
            file_name: version.file_name,
            derived_from: version.derived_from,
            profile,
        })
    }

    pub fn remove_duplicates(&self, session: &str, file_name: &str) -> Result<CleaningOutcome> {
        self.apply(
            session,
            file_name,
            Operation::RemoveDuplicates,
            cleaning::remove_duplicates,
        )
    }

    pub fn remove_missing_values(
        &self,
        session: &str,
        file_name: &str,
    ) -> Result<CleaningOutcome> {
        self.apply(
            session,
            file_name,
            Operation::RemoveMissing,
            cleaning::remove_missing,
        )
    }

    pub fn normalize(
        &self,
        session: &str,
        file_name: &str,
        column: &str,
    ) -> Result<CleaningOutcome> {
        let operation = Operation::Normalize {
            column: column.to_owned(),
        };
        self.apply(session, file_name, operation, |table| {
            cleaning::normalize_column(table, column)
        })
    }

    /// Run one cleaning step against the session's current version. The
    /// session slot stays locked from the staleness check until the pointer
    /// moves to the new version.
    fn apply<F>(
        &self,
        session: &str,
        file_name: &str,
        operation: Operation,
        transform: F,
    ) -> Result<CleaningOutcome>
    where
        F: FnOnce(&Table) -> Result<Table>,
    {
        let slot = self.sessions.existing_slot(session)?;
        let mut current = lock_slot(&slot)?;

        let parent = self.store.version(file_name)?;
        match current.as_deref() {
            None => {
                return Err(StewardError::NotFound(format!(
                    "session '{session}' has no uploaded file"
                )));
            }
            Some(cur) if cur != file_name => {
                return Err(StewardError::StaleVersion {
                    requested: file_name.to_owned(),
                    current: cur.to_owned(),
                });
            }
            Some(_) => {}
        }

        let table = self.store.resolve(file_name)?;
        let cleaned = transform(&table)?;
        let profile =
            logic::profile_with_prior(&cleaned, Some(&parent.profile), &self.options)?;
        let version = FileVersion::new_derived(&parent, operation, profile);

        self.store.store(&version, &cleaned)?;
        *current = Some(version.file_name.clone());

        tracing::info!(
            "{} on {} -> {} for session {} ({} -> {} rows)",
            version.operation.describe(),
            file_name,
            version.file_name,
            session,
            table.row_count(),
            cleaned.row_count()
        );
        Ok(CleaningOutcome::from_version(version))
    }

    /// Serve a lineage point of `file_name`: the root upload for
    /// [`DownloadVariant::Original`], otherwise the nearest version (itself
    /// included) produced by the matching operation.
    pub fn download(&self, file_name: &str, variant: DownloadVariant) -> Result<DownloadedFile> {
        let lineage = self.store.lineage(file_name)?;
        let target = match variant {
            DownloadVariant::Original => lineage.last(),
            _ => lineage.iter().find(|v| variant.matches(&v.operation)),
        }
        .ok_or_else(|| {
            StewardError::NotFound(format!(
                "no '{variant}' version in the lineage of '{file_name}'"
            ))
        })?;

        let bytes = logic::to_csv_bytes(&self.store.resolve(&target.file_name)?)?;
        tracing::info!(
            "Download {} of {} served from {}",
            variant,
            file_name,
            target.file_name
        );
        Ok(DownloadedFile {
            file_name: target.file_name.clone(),
            bytes,
        })
    }

    pub fn current(&self, session: &str) -> Result<String> {
        self.sessions.get_current(session)
    }

    pub fn end_session(&self, session: &str) -> Result<Option<String>> {
        let last = self.sessions.end(session)?;
        tracing::info!("Ended session {}", session);
        Ok(last)
    }

    pub fn lineage(&self, file_name: &str) -> Result<Vec<FileVersion>> {
        self.store.lineage(file_name)
    }
}
