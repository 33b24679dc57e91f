//! Merge Engine
//!
//! Computes a component's effective preferences by walking the stack from the
//! lowest to the highest precedence environment. At each environment that
//! references the component:
//!
//! 1. keys in the environment's block list are removed from the accumulator,
//!    so nothing from lower-precedence environments survives for them;
//! 2. the environment's combined mapping (local over exported) is merged over
//!    the accumulator, shallowly: a top-level key's value replaces the
//!    accumulated one wholesale, nested tables included.
//!
//! The result depends only on the stack contents.

use crate::stack::EnvironmentStack;
use crate::types::{ComponentId, PreferenceMap, PreferenceValue};
use serde::Serialize;
use tracing::trace;

/// Materialized preferences for one component. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectivePreferences {
    component: ComponentId,
    values: PreferenceMap,
}

impl EffectivePreferences {
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    pub fn get(&self, key: &str) -> Option<&PreferenceValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PreferenceValue)> {
        self.values.iter()
    }

    pub fn as_map(&self) -> &PreferenceMap {
        &self.values
    }

    pub fn into_map(self) -> PreferenceMap {
        self.values
    }
}

/// Resolve the effective preferences of `component` across the stack.
pub fn resolve(stack: &EnvironmentStack, component: &ComponentId) -> EffectivePreferences {
    let mut values = PreferenceMap::new();

    for env in stack.resolve() {
        if !env.knows(component) {
            continue;
        }

        for key in env.block_list(component) {
            if values.remove(&key).is_some() {
                trace!(
                    location = %env.location().display(),
                    key = %key,
                    "Blocked inherited preference"
                );
            }
        }

        let combined = env.combined(component);
        trace!(
            location = %env.location().display(),
            keys = combined.len(),
            "Merging environment preferences"
        );
        for (key, value) in combined {
            values.insert(key, value);
        }
    }

    EffectivePreferences {
        component: component.clone(),
        values,
    }
}

/// Load one preference, falling back to `default` when it is absent.
pub fn load_preference(
    stack: &EnvironmentStack,
    component: &ComponentId,
    key: &str,
    default: Option<PreferenceValue>,
) -> Option<PreferenceValue> {
    resolve(stack, component).get(key).cloned().or(default)
}

/// True when the preference resolves to a value.
pub fn has_preference(stack: &EnvironmentStack, component: &ComponentId, key: &str) -> bool {
    resolve(stack, component).contains(key)
}
