//! Snapshot persistence
//!
//! One file per component: `<snapshot_dir>/<uuid>.toml`, written atomically.

use crate::error::StoreError;
use crate::store::Store;
use crate::types::{ComponentId, PreferenceMap, PreferenceValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Preferences as they were when a component's artifacts were last built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub component: Uuid,
    pub name: String,
    pub recorded_at: DateTime<Utc>,
    /// blake3 over the tracked keys and their values (hex).
    pub digest: String,
    /// Every key read during the tracked evaluation, present or not.
    pub keys: Vec<String>,
    /// Values of the tracked keys that resolved; absent keys are omitted.
    pub values: PreferenceMap,
}

impl Snapshot {
    pub fn new(component: &ComponentId, keys: Vec<String>, values: PreferenceMap) -> Self {
        let digest = compute_digest(&keys, &values);
        Self {
            version: SNAPSHOT_VERSION,
            component: component.uuid(),
            name: component.name().to_string(),
            recorded_at: Utc::now(),
            digest,
            keys,
            values,
        }
    }
}

/// Stable digest of tracked keys and their values. Keys are sorted; absent
/// keys contribute a marker so "absent" and "present" hash differently.
pub fn compute_digest(keys: &[String], values: &PreferenceMap) -> String {
    let mut sorted: Vec<&String> = keys.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = blake3::Hasher::new();
    for key in sorted {
        hasher.update(key.as_bytes());
        hasher.update(&[0]);
        match values.get(key.as_str()) {
            Some(value) => {
                hasher.update(&[1]);
                hasher.update(value.to_string().as_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize().as_bytes())
}

/// Value equality through the TOML rendering the digest uses, so `nan`
/// matches itself.
pub fn same_value(a: Option<&PreferenceValue>, b: Option<&PreferenceValue>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.to_string() == b.to_string(),
        (None, None) => true,
        _ => false,
    }
}

/// Directory of per-component snapshot files.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, component: &ComponentId) -> PathBuf {
        self.dir.join(format!("{}.toml", component.uuid()))
    }

    /// Load the component's snapshot; `None` when it was never recorded.
    pub fn load(
        &self,
        store: &Store,
        component: &ComponentId,
    ) -> Result<Option<Snapshot>, StoreError> {
        let path = self.path_for(component);
        if !path.exists() {
            return Ok(None);
        }
        let document = store.read_document(&path)?;
        if document.is_empty() {
            return Ok(None);
        }
        PreferenceValue::Table(document)
            .try_into()
            .map(Some)
            .map_err(|e: toml::de::Error| StoreError::Format {
                path,
                message: e.to_string(),
            })
    }

    /// Write the snapshot, replacing any earlier one.
    pub fn save(&self, store: &Store, snapshot: &Snapshot) -> Result<(), StoreError> {
        let path = self.dir.join(format!("{}.toml", snapshot.component));
        let format_err = |message: String| StoreError::Format {
            path: path.clone(),
            message,
        };
        let document = match PreferenceValue::try_from(snapshot) {
            Ok(PreferenceValue::Table(table)) => table,
            Ok(_) => return Err(format_err("snapshot is not a table".to_string())),
            Err(e) => return Err(format_err(e.to_string())),
        };
        store.write_document(&path, &document)
    }
}
