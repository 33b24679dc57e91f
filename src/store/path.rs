//! Environment location normalization, used to deduplicate the stack.

use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Normalize an environment location so two spellings of the same directory compare equal.
///
/// Existing directories are canonicalized (symlinks, `..`, `.` resolved). Locations
/// that do not exist yet are made absolute and cleaned lexically, since an
/// environment may be created by its first write.
pub fn normalize_location(path: &Path) -> PathBuf {
    let resolved = match dunce::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(_) => lexical_absolute(path),
    };
    PathBuf::from(normalize_path_string(&resolved.to_string_lossy()))
}

/// Normalize a path string: Unicode NFC, no trailing separators (except root).
pub fn normalize_path_string(path: &str) -> String {
    let mut result: String = path.nfc().collect();
    while result.len() > 1 && (result.ends_with('/') || result.ends_with('\\')) {
        result.pop();
    }
    result
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };
    let mut out = base;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
