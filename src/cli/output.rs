//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{PreferenceError, StoreError};

/// Map domain errors to a string for CLI output, with a hint where the fix
/// is a flag away.
pub fn map_error(e: &PreferenceError) -> String {
    match e {
        PreferenceError::NotFound(_) => format!("{}\nhint: pass --force to create it", e),
        PreferenceError::Store(StoreError::ReadOnly(_)) => {
            format!("{}\nhint: target a writable environment with --env", e)
        }
        PreferenceError::UnknownComponent(_) => {
            format!("{}\nhint: use Name=UUID for components no environment lists", e)
        }
        PreferenceError::NameConflict { .. } => {
            format!("{}\nhint: the name belongs to another component; pick another name", e)
        }
        _ => e.to_string(),
    }
}
