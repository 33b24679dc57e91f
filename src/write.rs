//! Write Resolver
//!
//! Picks the single environment that receives a write, applies the value or
//! sentinel to the chosen tier, and persists before returning. A failed
//! persist rolls the environment back to its pre-write state, restoring any
//! tier file already written.

use crate::error::PreferenceError;
use crate::stack::EnvironmentStack;
use crate::store::Store;
use crate::types::{validate_key, ComponentId, Tier, Write};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Options for `set`/`write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Write to the exported tier instead of the local tier.
    pub export: bool,
    /// Always target the active environment. When false, the nearest
    /// environment that references the component is used.
    pub active_only: bool,
    /// Allow creating an entry for a component no environment references.
    pub force: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            export: false,
            active_only: true,
            force: false,
        }
    }
}

impl WriteOptions {
    /// Defaults for a component writing its own preferences: it may always
    /// create its own entry.
    pub fn for_self() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }

    pub fn exported(mut self) -> Self {
        self.export = true;
        self
    }

    pub fn search_stack(mut self) -> Self {
        self.active_only = false;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Options for `delete`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Write `Block` instead of `Clear`.
    pub block_inheritance: bool,
    /// Look for the exported-tier holder instead of the local-tier holder.
    pub export: bool,
    /// Fall back to the active environment when no environment holds the key.
    pub force: bool,
}

impl DeleteOptions {
    pub fn for_self() -> Self {
        Self {
            force: true,
            ..Self::default()
        }
    }
}

/// What a single key write did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub key: String,
    pub location: PathBuf,
    pub tier: Tier,
    /// The component was added to the target project's `[extras]`.
    pub registered: bool,
    /// False when the write found nothing to change.
    pub changed: bool,
}

pub struct WriteResolver<'a> {
    store: &'a Store,
}

impl<'a> WriteResolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Index of the environment a write with `options` lands in.
    pub fn target(
        &self,
        stack: &EnvironmentStack,
        component: &ComponentId,
        options: &WriteOptions,
    ) -> Result<usize, PreferenceError> {
        let active = stack.active_index().ok_or(PreferenceError::EmptyStack)?;
        if !options.force && !stack.knows(component) {
            return Err(PreferenceError::NotFound(component.clone()));
        }
        if options.active_only {
            return Ok(active);
        }
        Ok(stack.containing_index(component).unwrap_or(active))
    }

    /// Write one key.
    pub fn write(
        &self,
        stack: &mut EnvironmentStack,
        component: &ComponentId,
        key: &str,
        write: Write,
        options: WriteOptions,
    ) -> Result<WriteOutcome, PreferenceError> {
        validate_key(key)?;
        let index = self.target(stack, component, &options)?;
        self.apply(stack, index, component, key, write, Tier::for_export(options.export))
    }

    /// Write several keys, one at a time. Each key is persisted before the
    /// next is applied; an error stops the batch and earlier keys stay written.
    pub fn set<I, K>(
        &self,
        stack: &mut EnvironmentStack,
        component: &ComponentId,
        pairs: I,
        options: WriteOptions,
    ) -> Result<Vec<WriteOutcome>, PreferenceError>
    where
        I: IntoIterator<Item = (K, Write)>,
        K: AsRef<str>,
    {
        pairs
            .into_iter()
            .map(|(key, write)| self.write(stack, component, key.as_ref(), write, options))
            .collect()
    }

    /// Erase keys at whichever environment currently holds them in the
    /// selected tier, searching from the active environment outward.
    pub fn delete<I, K>(
        &self,
        stack: &mut EnvironmentStack,
        component: &ComponentId,
        keys: I,
        options: DeleteOptions,
    ) -> Result<Vec<WriteOutcome>, PreferenceError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let tier = Tier::for_export(options.export);
        let write = if options.block_inheritance {
            Write::Block
        } else {
            Write::Clear
        };

        let mut outcomes = Vec::new();
        for key in keys {
            let key = key.as_ref();
            validate_key(key)?;

            let holder = stack
                .resolve()
                .iter()
                .rposition(|env| env.has_value(component, tier, key));
            let index = match holder {
                Some(index) => index,
                None if options.force => stack.active_index().ok_or(PreferenceError::EmptyStack)?,
                None => {
                    debug!(component = %component, key, %tier, "No environment holds key; nothing to delete");
                    continue;
                }
            };
            outcomes.push(self.apply(stack, index, component, key, write.clone(), tier)?);
        }
        Ok(outcomes)
    }

    fn apply(
        &self,
        stack: &mut EnvironmentStack,
        index: usize,
        component: &ComponentId,
        key: &str,
        write: Write,
        tier: Tier,
    ) -> Result<WriteOutcome, PreferenceError> {
        let env = stack.get_mut(index).ok_or(PreferenceError::EmptyStack)?;
        env.check_name(component)?;
        let checkpoint = env.checkpoint();
        let mut touched = BTreeSet::new();

        let mut registered = false;
        if write.creates_entry() && !env.lists_component(component) {
            env.register_extra(component)?;
            registered = true;
            touched.insert(Tier::Exported);
            info!(
                component = %component,
                location = %env.location().display(),
                "Registered component as an extra"
            );
        }

        let name = env
            .component_name(component)
            .unwrap_or_else(|| component.name().to_string());

        match write {
            Write::Set(value) => {
                env.set_value(tier, &name, key, value);
                touched.insert(tier);
                for t in [Tier::Exported, Tier::Local] {
                    if env.remove_block(t, &name, key) {
                        touched.insert(t);
                    }
                }
            }
            Write::Clear => {
                if env.remove_value(tier, &name, key) {
                    touched.insert(tier);
                }
                for t in [Tier::Exported, Tier::Local] {
                    if env.remove_block(t, &name, key) {
                        touched.insert(t);
                    }
                }
            }
            Write::Block => {
                let removed = env.remove_value(tier, &name, key);
                let added = env.add_block(tier, &name, key);
                if removed || added {
                    touched.insert(tier);
                }
            }
        }

        let mut persisted = Vec::new();
        for t in &touched {
            let result = self.store.file_state(env, *t).and_then(|prior| {
                self.store.persist(env, *t)?;
                Ok(prior)
            });
            match result {
                Ok(prior) => persisted.push((*t, prior)),
                Err(e) => {
                    warn!(
                        location = %env.location().display(),
                        tier = %t,
                        error = %e,
                        "Persist failed; rolling back write"
                    );
                    env.restore(checkpoint);
                    for (done, prior) in persisted.into_iter().rev() {
                        if let Err(undo) = self.store.restore_file_state(env, done, prior) {
                            warn!(
                                location = %env.location().display(),
                                tier = %done,
                                error = %undo,
                                "Could not restore tier file"
                            );
                        }
                    }
                    return Err(e.into());
                }
            }
        }

        debug!(
            component = %component,
            key,
            %tier,
            location = %env.location().display(),
            changed = !touched.is_empty(),
            "Applied preference write"
        );

        Ok(WriteOutcome {
            key: key.to_string(),
            location: env.location().to_path_buf(),
            tier,
            registered,
            changed: !touched.is_empty(),
        })
    }
}
