//! Preferences API
//!
//! One owner for the store, the environment stack, and the compile-time
//! tracker. Reads go to the merge engine, writes to the write resolver; the
//! stack is always passed explicitly, never taken from global state.

use crate::config::PrefstackConfig;
use crate::error::PreferenceError;
use crate::identity::{ComponentResolver, StackResolver};
use crate::merge::{self, EffectivePreferences};
use crate::stack::EnvironmentStack;
use crate::store::Store;
use crate::tracking::{CompileTimeTracker, Snapshot, TrackingScope};
use crate::types::{ComponentId, PreferenceValue, Write};
use crate::write::{DeleteOptions, WriteOptions, WriteOutcome, WriteResolver};
use tracing::debug;

pub struct PreferencesApi {
    store: Store,
    stack: EnvironmentStack,
    tracker: CompileTimeTracker,
}

impl PreferencesApi {
    pub fn new(store: Store, stack: EnvironmentStack, tracker: CompileTimeTracker) -> Self {
        Self {
            store,
            stack,
            tracker,
        }
    }

    /// Build the store, load every environment on the configured load path,
    /// and point the tracker at the configured snapshot directory.
    pub fn from_config(config: &PrefstackConfig) -> Result<Self, PreferenceError> {
        let store = Store::new(&config.store);
        let stack = EnvironmentStack::from_load_path(&store, &config.load_path)?;
        let tracker = CompileTimeTracker::new(config.tracking.snapshot_dir.clone());
        debug!(
            environments = stack.len(),
            snapshot_dir = %config.tracking.snapshot_dir.display(),
            "Preferences API initialized"
        );
        Ok(Self::new(store, stack, tracker))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn stack(&self) -> &EnvironmentStack {
        &self.stack
    }

    pub fn tracker(&self) -> &CompileTimeTracker {
        &self.tracker
    }

    /// Turn a UUID, dependency name, or `Name=uuid` into a component identity.
    pub fn component_id(&self, reference: &str) -> Result<ComponentId, PreferenceError> {
        StackResolver::new(&self.stack).resolve(reference)
    }

    /// Effective preferences of one component across the stack.
    pub fn resolve(&self, component: &ComponentId) -> EffectivePreferences {
        merge::resolve(&self.stack, component)
    }

    pub fn load(
        &self,
        component: &ComponentId,
        key: &str,
        default: Option<PreferenceValue>,
    ) -> Option<PreferenceValue> {
        merge::load_preference(&self.stack, component, key, default)
    }

    pub fn has(&self, component: &ComponentId, key: &str) -> bool {
        merge::has_preference(&self.stack, component, key)
    }

    /// Write one key: a value, `Clear`, or `Block`.
    ///
    /// # Arguments
    /// * `component` - Owner of the preference
    /// * `key` - Top-level preference key
    /// * `write` - Value or sentinel to apply
    /// * `options` - Tier and placement policy
    ///
    /// # Returns
    /// Where the write landed. The target tier file is persisted before this
    /// returns; on a persist failure the in-memory stack is left unchanged.
    pub fn write(
        &mut self,
        component: &ComponentId,
        key: &str,
        write: Write,
        options: WriteOptions,
    ) -> Result<WriteOutcome, PreferenceError> {
        WriteResolver::new(&self.store).write(&mut self.stack, component, key, write, options)
    }

    /// Write several keys in order, each persisted independently.
    pub fn set<I, K>(
        &mut self,
        component: &ComponentId,
        pairs: I,
        options: WriteOptions,
    ) -> Result<Vec<WriteOutcome>, PreferenceError>
    where
        I: IntoIterator<Item = (K, Write)>,
        K: AsRef<str>,
    {
        WriteResolver::new(&self.store).set(&mut self.stack, component, pairs, options)
    }

    pub fn delete<I, K>(
        &mut self,
        component: &ComponentId,
        keys: I,
        options: DeleteOptions,
    ) -> Result<Vec<WriteOutcome>, PreferenceError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        WriteResolver::new(&self.store).delete(&mut self.stack, component, keys, options)
    }

    /// Start a tracked read for `component`. Keys read through the returned
    /// scope become the component's tracked set when it ends.
    pub fn begin_tracked_read(&mut self, component: &ComponentId) -> TrackingScope<'_> {
        self.tracker.begin_tracked_read(&self.stack, component)
    }

    pub fn record_snapshot(&self, component: &ComponentId) -> Result<Snapshot, PreferenceError> {
        self.tracker
            .record_snapshot(&self.store, &self.stack, component)
    }

    pub fn is_stale(&self, component: &ComponentId) -> Result<bool, PreferenceError> {
        self.tracker.is_stale(&self.store, &self.stack, component)
    }

    pub fn changed_keys(
        &self,
        component: &ComponentId,
    ) -> Result<Option<Vec<String>>, PreferenceError> {
        self.tracker
            .changed_keys(&self.store, &self.stack, component)
    }

    pub fn snapshot(&self, component: &ComponentId) -> Result<Option<Snapshot>, PreferenceError> {
        self.tracker.snapshot(&self.store, component)
    }

    /// Re-read every environment from disk.
    pub fn reload(&mut self) -> Result<(), PreferenceError> {
        self.stack.reload(&self.store)?;
        Ok(())
    }

    /// Handle for a component reading and writing its own preferences.
    pub fn component(&mut self, component: ComponentId) -> ComponentPreferences<'_> {
        ComponentPreferences {
            api: self,
            component,
        }
    }
}

/// A component's view of its own preferences. Writes use
/// `WriteOptions::for_self`, so the component may always create its entry.
pub struct ComponentPreferences<'a> {
    api: &'a mut PreferencesApi,
    component: ComponentId,
}

impl ComponentPreferences<'_> {
    pub fn id(&self) -> &ComponentId {
        &self.component
    }

    pub fn all(&self) -> EffectivePreferences {
        self.api.resolve(&self.component)
    }

    pub fn load(&self, key: &str, default: Option<PreferenceValue>) -> Option<PreferenceValue> {
        self.api.load(&self.component, key, default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.api.has(&self.component, key)
    }

    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<PreferenceValue>,
    ) -> Result<WriteOutcome, PreferenceError> {
        self.api.write(
            &self.component,
            key,
            Write::Set(value.into()),
            WriteOptions::for_self(),
        )
    }

    pub fn clear(&mut self, key: &str) -> Result<WriteOutcome, PreferenceError> {
        self.api
            .write(&self.component, key, Write::Clear, WriteOptions::for_self())
    }

    pub fn block(&mut self, key: &str) -> Result<WriteOutcome, PreferenceError> {
        self.api
            .write(&self.component, key, Write::Block, WriteOptions::for_self())
    }

    pub fn delete(&mut self, key: &str) -> Result<Vec<WriteOutcome>, PreferenceError> {
        self.api
            .delete(&self.component, [key], DeleteOptions::for_self())
    }
}
