//! Preference Store
//!
//! Reads and writes the two tiers of every environment: the exported tier
//! (`Project.<ext>`, shared) and the local tier (`LocalPreferences.<ext>`,
//! private). Missing files read as empty documents. Writes go through a
//! temporary file and a rename so a crash never leaves a half-written tier.

pub mod environment;
pub mod format;
pub mod path;

pub use environment::Environment;
pub use format::{PreferenceFormat, TomlFormat};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::types::{PreferenceMap, Tier};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to do with a tier file that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the load with `StoreError::Format`.
    #[default]
    Error,
    /// Log a warning and treat the tier as empty.
    Empty,
}

/// File-backed store for environment tiers.
pub struct Store {
    format: Box<dyn PreferenceFormat>,
    project_stems: Vec<String>,
    local_stems: Vec<String>,
    on_malformed: MalformedPolicy,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl Store {
    /// Create a TOML-backed store.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_format(Box::new(TomlFormat), config)
    }

    pub fn with_format(format: Box<dyn PreferenceFormat>, config: &StoreConfig) -> Self {
        Self {
            format,
            project_stems: config.project_files.clone(),
            local_stems: config.local_files.clone(),
            on_malformed: config.on_malformed,
        }
    }

    pub fn format(&self) -> &dyn PreferenceFormat {
        self.format.as_ref()
    }

    /// Load both tiers of the environment at `location`.
    pub fn load_environment(
        &self,
        location: &Path,
        writable: bool,
    ) -> Result<Environment, StoreError> {
        let location = path::normalize_location(location);
        let project_path = self.tier_file(&location, &self.project_stems);
        let local_path = self.tier_file(&location, &self.local_stems);

        let project = self.read_document(&project_path)?;
        let local = self.read_document(&local_path)?;

        debug!(
            location = %location.display(),
            writable,
            project_file = %project_path.display(),
            local_file = %local_path.display(),
            "Loaded environment"
        );

        Ok(Environment::from_parts(
            location,
            writable,
            project_path,
            local_path,
            project,
            local,
        ))
    }

    /// Re-read both tiers from disk, replacing the in-memory documents.
    pub fn reload(&self, environment: &mut Environment) -> Result<(), StoreError> {
        let project = self.read_document(environment.tier_path(Tier::Exported))?;
        let local = self.read_document(environment.tier_path(Tier::Local))?;
        environment.replace_documents(project, local);
        Ok(())
    }

    /// Write one tier of the environment back to disk.
    pub fn persist(&self, environment: &Environment, tier: Tier) -> Result<(), StoreError> {
        if !environment.is_writable() || location_is_read_only(environment.location()) {
            return Err(StoreError::ReadOnly(environment.location().to_path_buf()));
        }

        let path = environment.tier_path(tier);
        let document = environment.document(tier);
        if document.is_empty() && !path.exists() {
            debug!(path = %path.display(), %tier, "Skipping persist of empty tier with no file");
            return Ok(());
        }

        self.write_document(path, document)?;
        debug!(path = %path.display(), %tier, "Persisted tier");
        Ok(())
    }

    /// Parse a document. A missing file is an empty document.
    pub fn read_document(&self, path: &Path) -> Result<PreferenceMap, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PreferenceMap::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        match self.format.parse(&bytes) {
            Ok(document) => Ok(document),
            Err(message) => match self.on_malformed {
                MalformedPolicy::Error => Err(StoreError::Format {
                    path: path.to_path_buf(),
                    message,
                }),
                MalformedPolicy::Empty => {
                    warn!(
                        path = %path.display(),
                        reason = %message,
                        "Malformed preference file treated as empty"
                    );
                    Ok(PreferenceMap::new())
                }
            },
        }
    }

    /// Serialize and write a document atomically (temporary file + rename).
    pub fn write_document(&self, path: &Path, document: &PreferenceMap) -> Result<(), StoreError> {
        let bytes = self.format.serialize(document).map_err(|message| StoreError::Format {
            path: path.to_path_buf(),
            message,
        })?;
        write_atomic(path, &bytes)
    }

    /// On-disk bytes of a tier file; `None` when the file does not exist.
    pub(crate) fn file_state(
        &self,
        environment: &Environment,
        tier: Tier,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let path = environment.tier_path(tier);
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Put a tier file back to an earlier [`Store::file_state`]. `None` removes the file.
    pub(crate) fn restore_file_state(
        &self,
        environment: &Environment,
        tier: Tier,
        state: Option<Vec<u8>>,
    ) -> Result<(), StoreError> {
        let path = environment.tier_path(tier);
        match state {
            Some(bytes) => write_atomic(path, &bytes),
            None => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StoreError::Persist {
                    path: path.to_path_buf(),
                    source,
                }),
            },
        }
    }

    /// First existing `<stem>.<ext>` in the location, else the first candidate.
    fn tier_file(&self, location: &Path, stems: &[String]) -> PathBuf {
        let ext = self.format.extension();
        let candidates: Vec<PathBuf> = stems
            .iter()
            .map(|stem| location.join(format!("{}.{}", stem, ext)))
            .collect();
        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| location.join(format!("Preferences.{}", ext)))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let persist_err = |path: &Path, source: std::io::Error| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| persist_err(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, bytes).map_err(|e| persist_err(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        persist_err(path, e)
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn location_is_read_only(location: &Path) -> bool {
    fs::metadata(location)
        .map(|meta| meta.permissions().readonly())
        .unwrap_or(false)
}
