//! Well-known locations: config home, global and workspace config files,
//! snapshot directory.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "prefstack";
const CONFIG_FILE: &str = "config.toml";
const WORKSPACE_DIR: &str = ".prefstack";

/// `$XDG_CONFIG_HOME`, else `~/.config`.
pub fn config_home() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// `<config home>/prefstack/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}

/// `<workspace>/.prefstack/config.toml`
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(WORKSPACE_DIR).join(CONFIG_FILE)
}

/// Platform data directory for snapshots, falling back to a workspace-relative
/// directory when no home directory can be determined.
pub fn default_snapshot_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("snapshots"))
        .unwrap_or_else(|| PathBuf::from(WORKSPACE_DIR).join("snapshots"))
}
