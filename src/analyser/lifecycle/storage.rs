//! Storage backend for file versions

use super::version::FileVersion;
use crate::analyser::logic::{Table, read_parquet, to_parquet_bytes};
use crate::error::{Result, ResultExt as _, StewardError};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tempfile::NamedTempFile;

const DATA_SUFFIX: &str = ".parquet";
const META_SUFFIX: &str = ".meta.json";

/// Persists every version as `<base>/<file_name>.parquet` plus
/// `<base>/<file_name>.meta.json`, and keeps an in-memory index of them.
///
/// Callers only ever name versions by `file_name`; names are resolved through
/// the index and never joined onto the base path unchecked.
#[derive(Debug)]
pub struct VersionStore {
    base_path: PathBuf,
    index: RwLock<HashMap<String, FileVersion>>,
}

impl VersionStore {
    /// Open (or create) a store and reload the versions already on disk.
    pub fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).context("Failed to create version store directory")?;
        let index = load_index(&base_path)?;
        tracing::info!(
            "Version store opened at {} with {} versions",
            base_path.display(),
            index.len()
        );
        Ok(Self {
            base_path,
            index: RwLock::new(index),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn data_path(&self, file_name: &str) -> PathBuf {
        self.base_path.join(format!("{file_name}{DATA_SUFFIX}"))
    }

    fn metadata_path(&self, file_name: &str) -> PathBuf {
        self.base_path.join(format!("{file_name}{META_SUFFIX}"))
    }

    /// Persist a table under `version.file_name`. Data is written before
    /// metadata, so a version is only visible once both are on disk.
    pub fn store(&self, version: &FileVersion, table: &Table) -> Result<()> {
        if !is_plain_file_name(&version.file_name) {
            return Err(StewardError::Internal(format!(
                "refusing to store version with unsafe name '{}'",
                version.file_name
            )));
        }

        let bytes = to_parquet_bytes(table)?;
        self.write_atomic(&self.data_path(&version.file_name), &bytes)
            .context("Failed to write version data")?;
        self.write_atomic(
            &self.metadata_path(&version.file_name),
            version.to_json()?.as_bytes(),
        )
        .context("Failed to write version metadata")?;

        self.index
            .write()
            .map_err(|e| StewardError::Internal(format!("Lock poisoned: {e}")))?
            .insert(version.file_name.clone(), version.clone());

        tracing::debug!(
            "Stored version {} ({} bytes)",
            version.file_name,
            bytes.len()
        );
        Ok(())
    }

    /// Write through a temp file in the store directory. The temp file is
    /// removed on drop if anything fails before `persist`.
    fn write_atomic(&self, dest: &Path, bytes: &[u8]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.base_path)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest)?;
        Ok(())
    }

    /// Metadata for a known version.
    pub fn version(&self, file_name: &str) -> Result<FileVersion> {
        self.index
            .read()
            .map_err(|e| StewardError::Internal(format!("Lock poisoned: {e}")))?
            .get(file_name)
            .cloned()
            .ok_or_else(|| StewardError::NotFound(format!("file '{file_name}'")))
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.index
            .read()
            .is_ok_and(|index| index.contains_key(file_name))
    }

    pub fn len(&self) -> usize {
        self.index.read().map_or(0, |index| index.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a stored version back into a table, cell for cell.
    pub fn resolve(&self, file_name: &str) -> Result<Table> {
        let version = self.version(file_name)?;
        let file = fs::File::open(self.data_path(&version.file_name)).map_err(|e| {
            match e.kind() {
                std::io::ErrorKind::NotFound => {
                    StewardError::NotFound(format!("data for file '{file_name}'"))
                }
                _ => StewardError::Io(e),
            }
        })?;
        read_parquet(file).with_context(|| format!("Failed to reload '{file_name}'"))
    }

    /// The version itself followed by each ancestor, ending at the upload.
    pub fn lineage(&self, file_name: &str) -> Result<Vec<FileVersion>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(file_name.to_owned());

        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                return Err(StewardError::Internal(format!(
                    "lineage of '{file_name}' loops at '{name}'"
                )));
            }
            let version = self.version(&name)?;
            next = version.derived_from.clone();
            chain.push(version);
        }

        Ok(chain)
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

fn load_index(base_path: &Path) -> Result<HashMap<String, FileVersion>> {
    let mut index = HashMap::new();

    for entry in fs::read_dir(base_path).context("Failed to read version store directory")? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(META_SUFFIX) {
            continue;
        }

        let version = match fs::read_to_string(&path)
            .map_err(StewardError::from)
            .and_then(|json| FileVersion::from_json(&json))
        {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Skipping unreadable metadata {}: {}", path.display(), e);
                continue;
            }
        };

        if !is_plain_file_name(&version.file_name)
            || !base_path
                .join(format!("{}{DATA_SUFFIX}", version.file_name))
                .is_file()
        {
            tracing::warn!(
                "Skipping metadata {} without a matching data file",
                path.display()
            );
            continue;
        }

        index.insert(version.file_name.clone(), version);
    }

    Ok(index)
}
