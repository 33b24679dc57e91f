//! Error types for the prefstack preference system.

use crate::types::ComponentId;
use std::path::PathBuf;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Malformed preference file {path:?}: {message}")]
    Format { path: PathBuf, message: String },

    #[error("Environment at {0:?} is read-only")]
    ReadOnly(PathBuf),

    #[error("Failed to persist {path:?}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the preference read/write surface
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Component {0} is not known to any environment in the stack (use force to create it)")]
    NotFound(ComponentId),

    #[error("Environment stack is empty; no environment can receive writes")]
    EmptyStack,

    #[error("Invalid preference key: {0:?}")]
    InvalidKey(String),

    #[error("Environment at {location:?} binds name {name:?} to {bound}, not to {component}")]
    NameConflict {
        location: PathBuf,
        name: String,
        bound: uuid::Uuid,
        component: ComponentId,
    },

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for PreferenceError {
    fn from(err: config::ConfigError) -> Self {
        PreferenceError::Config(err.to_string())
    }
}
