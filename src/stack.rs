//! Environment Stack
//!
//! Ordered environments, lowest precedence first and the active environment
//! last. Built explicitly and passed in; nothing here reads process-wide state.

use crate::config::LoadPathEntry;
use crate::error::StoreError;
use crate::store::{path::normalize_location, Environment, Store};
use crate::types::ComponentId;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct EnvironmentStack {
    environments: Vec<Environment>,
}

impl EnvironmentStack {
    /// Build a stack from environments ordered lowest to highest precedence.
    ///
    /// When a location appears more than once, only its highest-precedence
    /// occurrence is kept.
    pub fn new(environments: Vec<Environment>) -> Self {
        let mut seen = HashSet::new();
        let mut deduped: Vec<Environment> = environments
            .into_iter()
            .rev()
            .filter(|env| seen.insert(normalize_location(env.location())))
            .collect();
        deduped.reverse();
        Self {
            environments: deduped,
        }
    }

    /// Load a stack from load-path entries in search order (active first,
    /// outermost last).
    pub fn from_load_path(store: &Store, entries: &[LoadPathEntry]) -> Result<Self, StoreError> {
        let mut environments = Vec::with_capacity(entries.len());
        for entry in entries.iter().rev() {
            environments.push(store.load_environment(&entry.path, !entry.read_only)?);
        }
        let stack = Self::new(environments);
        debug!(environments = stack.len(), "Environment stack loaded");
        Ok(stack)
    }

    /// Environments from lowest to highest precedence.
    pub fn resolve(&self) -> &[Environment] {
        &self.environments
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// The highest-precedence environment: the default write target.
    pub fn active(&self) -> Option<&Environment> {
        self.environments.last()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.environments.len().checked_sub(1)
    }

    /// Highest-precedence environment that references the component.
    pub fn containing(&self, id: &ComponentId) -> Option<&Environment> {
        self.containing_index(id).map(|idx| &self.environments[idx])
    }

    pub fn containing_index(&self, id: &ComponentId) -> Option<usize> {
        self.environments.iter().rposition(|env| env.knows(id))
    }

    /// True when any environment references the component.
    pub fn knows(&self, id: &ComponentId) -> bool {
        self.containing_index(id).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&Environment> {
        self.environments.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Environment> {
        self.environments.get_mut(index)
    }

    /// Re-read every environment from disk.
    pub fn reload(&mut self, store: &Store) -> Result<(), StoreError> {
        for env in &mut self.environments {
            store.reload(env)?;
        }
        Ok(())
    }
}
