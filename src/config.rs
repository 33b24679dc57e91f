//! Configuration System
//!
//! Layered configuration for the CLI and embedders: built-in defaults, the
//! global file, the workspace file, then `PREFSTACK__*` environment variables.
//! The library core never reads configuration itself; callers load it and
//! build the store and stack from it.

use crate::logging::LoggingConfig;
use crate::store::MalformedPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;
pub use paths::{config_home, default_snapshot_dir, global_config_path, workspace_config_path};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PrefstackConfig {
    /// Environments in search order: the first entry is the active
    /// environment, the last the outermost.
    #[serde(default)]
    pub load_path: Vec<LoadPathEntry>,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One environment directory on the load path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadPathEntry {
    pub path: PathBuf,

    /// Writes targeting this environment fail with a read-only error.
    #[serde(default)]
    pub read_only: bool,
}

impl LoadPathEntry {
    pub fn writable(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }
}

/// File naming and parse-failure policy for environment tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Candidate stems for the exported tier; the format adds the extension.
    #[serde(default = "default_project_files")]
    pub project_files: Vec<String>,

    /// Candidate stems for the local tier.
    #[serde(default = "default_local_files")]
    pub local_files: Vec<String>,

    #[serde(default)]
    pub on_malformed: MalformedPolicy,
}

fn default_project_files() -> Vec<String> {
    vec!["Project".to_string()]
}

fn default_local_files() -> Vec<String> {
    vec!["LocalPreferences".to_string()]
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_files: default_project_files(),
            local_files: default_local_files(),
            on_malformed: MalformedPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Load path entry {0}: {1}")]
    LoadPath(usize, String),

    #[error("Store: {0}")]
    Store(String),

    #[error("Tracking: {0}")]
    Tracking(String),
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.project_files.is_empty() {
            return Err("project_files cannot be empty".to_string());
        }
        if self.local_files.is_empty() {
            return Err("local_files cannot be empty".to_string());
        }
        if self
            .project_files
            .iter()
            .chain(&self.local_files)
            .any(|stem| stem.trim().is_empty())
        {
            return Err("file names cannot be blank".to_string());
        }
        if self
            .project_files
            .iter()
            .any(|stem| self.local_files.contains(stem))
        {
            return Err("project and local tiers cannot share a file name".to_string());
        }
        Ok(())
    }
}

impl PrefstackConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (idx, entry) in self.load_path.iter().enumerate() {
            if entry.path.as_os_str().is_empty() {
                errors.push(ValidationError::LoadPath(idx, "path cannot be empty".to_string()));
            }
        }

        if let Err(e) = self.store.validate() {
            errors.push(ValidationError::Store(e));
        }

        if self.tracking.snapshot_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Tracking(
                "snapshot_dir cannot be empty".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
