//! Configuration loading entry points.

use super::merge::merge_policy::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::{LoadPathEntry, PrefstackConfig};
use crate::error::PreferenceError;
use config::{Environment, File};
use std::path::Path;
use tracing::debug;

/// Replaces the configured load path when set. Uses the platform path-list
/// syntax (`:` on Unix, `;` on Windows).
pub const LOAD_PATH_ENV: &str = "PREFSTACK_LOAD_PATH";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Layers, lowest precedence first: defaults, global file, workspace
    /// file, `PREFSTACK__*` variables (`__` separates nested keys). Relative
    /// load-path entries resolve against the workspace root. With no load
    /// path configured the workspace itself is the only environment.
    pub fn load(workspace_root: &Path) -> Result<PrefstackConfig, PreferenceError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(env_source());

        let mut config: PrefstackConfig = builder.build()?.try_deserialize()?;
        if let Some(entries) = Self::load_path_from_env() {
            config.load_path = entries;
        }
        if config.load_path.is_empty() {
            config.load_path.push(LoadPathEntry::writable(workspace_root));
        }
        Self::finish(config, workspace_root)
    }

    /// Load one explicit file over the defaults. Relative load-path entries
    /// resolve against the file's directory.
    pub fn load_from_file(path: &Path) -> Result<PrefstackConfig, PreferenceError> {
        let builder = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(env_source());

        let mut config: PrefstackConfig = builder.build()?.try_deserialize()?;
        if let Some(entries) = Self::load_path_from_env() {
            config.load_path = entries;
        }
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::finish(config, base)
    }

    /// Entries from `PREFSTACK_LOAD_PATH`, all writable. Empty segments are
    /// skipped; `None` when the variable is unset or empty.
    pub fn load_path_from_env() -> Option<Vec<LoadPathEntry>> {
        let value = std::env::var_os(LOAD_PATH_ENV)?;
        let entries: Vec<LoadPathEntry> = std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .map(LoadPathEntry::writable)
            .collect();
        (!entries.is_empty()).then_some(entries)
    }

    fn finish(mut config: PrefstackConfig, base: &Path) -> Result<PrefstackConfig, PreferenceError> {
        for entry in &mut config.load_path {
            if entry.path.is_relative() && !entry.path.as_os_str().is_empty() {
                entry.path = base.join(&entry.path);
            }
        }

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PreferenceError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        debug!(
            load_path = config.load_path.len(),
            snapshot_dir = %config.tracking.snapshot_dir.display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("PREFSTACK")
        .prefix_separator("__")
        .separator("__")
}
