use crate::analyser::logic::ProfileOptions;
use crate::analyser::logic::io::DEFAULT_NULL_TOKENS;
use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const BIND_ENV: &str = "CSVSTEWARD_BIND";
pub const STORAGE_DIR_ENV: &str = "CSVSTEWARD_STORAGE_DIR";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    /// Address the HTTP service listens on
    pub bind: String,
    /// Where file versions and their metadata are kept
    pub storage_dir: PathBuf,
    /// Overrides the platform log directory
    pub log_dir: Option<PathBuf>,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
    pub profile: ProfileOptions,
    /// Cell values read as null on upload (compared after trimming)
    pub null_tokens: Vec<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_owned(),
            storage_dir: base_dir().join("files"),
            log_dir: None,
            max_upload_bytes: 50 * 1024 * 1024,
            profile: ProfileOptions::default(),
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

impl ServiceSettings {
    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.bind = bind;
        }
        if let Some(dir) = lookup(STORAGE_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            self.storage_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.profile.pattern_threshold) {
            anyhow::bail!(
                "profile.pattern_threshold must be between 0 and 1, got {}",
                self.profile.pattern_threshold
            );
        }
        let k = self.profile.iqr_multiplier;
        if k.is_sign_negative() || !k.is_finite() {
            anyhow::bail!(
                "profile.iqr_multiplier must be a non-negative number, got {k}"
            );
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than zero");
        }
        Ok(())
    }
}

/// Application data directory (`<data dir>/csvsteward`), falling back to the
/// working directory when the platform has none.
pub fn base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("csvsteward")
}

pub fn get_config_path() -> PathBuf {
    base_dir().join("config.json")
}

/// Load settings from `path`, or from the default config path if it exists,
/// or fall back to defaults. Environment overrides are applied last.
pub fn load_settings(path: Option<&Path>) -> Result<ServiceSettings> {
    let mut settings = match path {
        Some(path) => read_settings(path)?,
        None => {
            let default_path = get_config_path();
            if default_path.exists() {
                read_settings(&default_path)?
            } else {
                ServiceSettings::default()
            }
        }
    };

    settings.apply_overrides(|key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

fn read_settings(path: &Path) -> Result<ServiceSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn save_settings(settings: &ServiceSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
