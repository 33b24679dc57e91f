//! Compile-Time Tracker
//!
//! Records which keys a component reads while its build-time artifacts are
//! produced, persists those keys' resolved values as a snapshot, and later
//! reports whether any of them resolve differently. Deciding what to rebuild
//! is left to the caller.

pub mod snapshot;

pub use snapshot::{compute_digest, same_value, Snapshot, SnapshotStore};

use crate::error::PreferenceError;
use crate::merge::{self, EffectivePreferences};
use crate::stack::EnvironmentStack;
use crate::store::Store;
use crate::types::{ComponentId, PreferenceMap, PreferenceValue};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct CompileTimeTracker {
    snapshots: SnapshotStore,
    reads: HashMap<Uuid, BTreeSet<String>>,
}

impl CompileTimeTracker {
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshots: SnapshotStore::new(snapshot_dir),
            reads: HashMap::new(),
        }
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Open a scope whose reads are attributed to `component`. When the scope
    /// ends, the keys it read replace the component's previous tracked set.
    pub fn begin_tracked_read<'a>(
        &'a mut self,
        stack: &'a EnvironmentStack,
        component: &ComponentId,
    ) -> TrackingScope<'a> {
        debug!(component = %component, "Tracked read started");
        TrackingScope {
            tracker: self,
            stack,
            component: component.clone(),
            touched: Some(BTreeSet::new()),
        }
    }

    /// Keys read during the component's most recent tracked read.
    pub fn tracked_keys(&self, component: &ComponentId) -> BTreeSet<String> {
        self.reads
            .get(&component.uuid())
            .cloned()
            .unwrap_or_default()
    }

    /// Persist the current values of the tracked keys as the component's
    /// snapshot, overwriting any earlier one.
    pub fn record_snapshot(
        &self,
        store: &Store,
        stack: &EnvironmentStack,
        component: &ComponentId,
    ) -> Result<Snapshot, PreferenceError> {
        let keys = self.tracked_keys(component);
        if keys.is_empty() {
            warn!(component = %component, "Recording snapshot with no tracked keys");
        }
        let keys: Vec<String> = keys.into_iter().collect();
        let values = tracked_values(&merge::resolve(stack, component), &keys);
        let snapshot = Snapshot::new(component, keys, values);
        self.snapshots.save(store, &snapshot)?;

        info!(
            component = %component,
            keys = snapshot.keys.len(),
            digest = %snapshot.digest,
            "Recorded preference snapshot"
        );
        Ok(snapshot)
    }

    /// The stored snapshot, if the component was ever recorded.
    pub fn snapshot(
        &self,
        store: &Store,
        component: &ComponentId,
    ) -> Result<Option<Snapshot>, PreferenceError> {
        Ok(self.snapshots.load(store, component)?)
    }

    /// Tracked keys whose resolved value differs from the snapshot. `None`
    /// when no snapshot exists.
    pub fn changed_keys(
        &self,
        store: &Store,
        stack: &EnvironmentStack,
        component: &ComponentId,
    ) -> Result<Option<Vec<String>>, PreferenceError> {
        let Some(snapshot) = self.snapshots.load(store, component)? else {
            return Ok(None);
        };
        if snapshot.component != component.uuid() {
            return Err(PreferenceError::Snapshot(format!(
                "snapshot for {} records component {}",
                component, snapshot.component
            )));
        }

        let current = merge::resolve(stack, component);
        let changed = snapshot
            .keys
            .iter()
            .filter(|key| !same_value(current.get(key), snapshot.values.get(key.as_str())))
            .cloned()
            .collect();
        Ok(Some(changed))
    }

    /// True when a tracked key's value changed, appeared, or disappeared since
    /// the snapshot, or when no snapshot was ever recorded.
    pub fn is_stale(
        &self,
        store: &Store,
        stack: &EnvironmentStack,
        component: &ComponentId,
    ) -> Result<bool, PreferenceError> {
        let stale = match self.changed_keys(store, stack, component)? {
            None => true,
            Some(changed) => !changed.is_empty(),
        };
        debug!(component = %component, stale, "Checked snapshot staleness");
        Ok(stale)
    }
}

/// Digest of the current values of `keys`, comparable with `Snapshot::digest`.
pub fn preferences_digest(
    stack: &EnvironmentStack,
    component: &ComponentId,
    keys: &[String],
) -> String {
    let values = tracked_values(&merge::resolve(stack, component), keys);
    compute_digest(keys, &values)
}

fn tracked_values(effective: &EffectivePreferences, keys: &[String]) -> PreferenceMap {
    keys.iter()
        .filter_map(|key| effective.get(key).map(|v| (key.clone(), v.clone())))
        .collect()
}

/// Reads made while a component's build-time evaluation runs.
pub struct TrackingScope<'a> {
    tracker: &'a mut CompileTimeTracker,
    stack: &'a EnvironmentStack,
    component: ComponentId,
    touched: Option<BTreeSet<String>>,
}

impl TrackingScope<'_> {
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    /// Resolve all preferences; every key present is recorded as read.
    pub fn resolve(&mut self) -> EffectivePreferences {
        let effective = merge::resolve(self.stack, &self.component);
        if let Some(touched) = self.touched.as_mut() {
            touched.extend(effective.iter().map(|(key, _)| key.clone()));
        }
        effective
    }

    /// Load one key, recording it as read whether or not it resolves.
    pub fn load(&mut self, key: &str, default: Option<PreferenceValue>) -> Option<PreferenceValue> {
        self.note(key);
        merge::load_preference(self.stack, &self.component, key, default)
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.note(key);
        merge::has_preference(self.stack, &self.component, key)
    }

    pub fn touched(&self) -> BTreeSet<String> {
        self.touched.clone().unwrap_or_default()
    }

    /// End the scope, returning the keys it read.
    pub fn finish(mut self) -> BTreeSet<String> {
        self.commit()
    }

    fn note(&mut self, key: &str) {
        if let Some(touched) = self.touched.as_mut() {
            touched.insert(key.to_string());
        }
    }

    fn commit(&mut self) -> BTreeSet<String> {
        let Some(touched) = self.touched.take() else {
            return BTreeSet::new();
        };
        debug!(
            component = %self.component,
            keys = touched.len(),
            "Tracked read finished"
        );
        self.tracker
            .reads
            .insert(self.component.uuid(), touched.clone());
        touched
    }
}

impl Drop for TrackingScope<'_> {
    fn drop(&mut self) {
        self.commit();
    }
}
