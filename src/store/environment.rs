//! One environment: a location holding an exported-tier and a local-tier document.
//!
//! Both documents are kept whole so that persisting a tier preserves everything
//! else in the file (`[deps]`, `[extras]`, project metadata). Preferences live
//! under `preferences.<component name>` in either document.

use crate::error::PreferenceError;
use crate::types::{ComponentId, PreferenceMap, PreferenceValue, Tier, CLEAR_LIST_KEY};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const PREFERENCES_KEY: &str = "preferences";
const DEPS_KEY: &str = "deps";
const EXTRAS_KEY: &str = "extras";
const NAME_KEY: &str = "name";
const UUID_KEY: &str = "uuid";

/// An environment in the stack.
#[derive(Debug, Clone)]
pub struct Environment {
    location: PathBuf,
    writable: bool,
    project_path: PathBuf,
    local_path: PathBuf,
    project: PreferenceMap,
    local: PreferenceMap,
}

/// Saved copy of both documents, restored when a persist fails.
#[derive(Debug, Clone)]
pub(crate) struct Checkpoint {
    project: PreferenceMap,
    local: PreferenceMap,
}

impl Environment {
    pub(crate) fn from_parts(
        location: PathBuf,
        writable: bool,
        project_path: PathBuf,
        local_path: PathBuf,
        project: PreferenceMap,
        local: PreferenceMap,
    ) -> Self {
        Self {
            location,
            writable,
            project_path,
            local_path,
            project,
            local,
        }
    }

    /// Build a writable environment from already-parsed documents, using the
    /// default `Project.toml` / `LocalPreferences.toml` file names.
    pub fn from_documents(
        location: impl Into<PathBuf>,
        project: PreferenceMap,
        local: PreferenceMap,
    ) -> Self {
        let location = location.into();
        Self {
            project_path: location.join("Project.toml"),
            local_path: location.join("LocalPreferences.toml"),
            location,
            writable: true,
            project,
            local,
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn tier_path(&self, tier: Tier) -> &Path {
        match tier {
            Tier::Exported => &self.project_path,
            Tier::Local => &self.local_path,
        }
    }

    pub fn document(&self, tier: Tier) -> &PreferenceMap {
        match tier {
            Tier::Exported => &self.project,
            Tier::Local => &self.local,
        }
    }

    fn document_mut(&mut self, tier: Tier) -> &mut PreferenceMap {
        match tier {
            Tier::Exported => &mut self.project,
            Tier::Local => &mut self.local,
        }
    }

    /// The project's own UUID, when the project file declares one.
    pub fn project_uuid(&self) -> Option<Uuid> {
        self.project
            .get(UUID_KEY)
            .and_then(PreferenceValue::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Name the project file uses for `uuid`: the project itself, a `[deps]`
    /// entry, or an `[extras]` entry.
    pub fn dependency_name(&self, uuid: Uuid) -> Option<String> {
        if self.project_uuid() == Some(uuid) {
            if let Some(name) = self.project.get(NAME_KEY).and_then(PreferenceValue::as_str) {
                return Some(name.to_string());
            }
        }
        [DEPS_KEY, EXTRAS_KEY].iter().find_map(|section| {
            self.project
                .get(*section)
                .and_then(PreferenceValue::as_table)?
                .iter()
                .find(|(_, value)| {
                    value
                        .as_str()
                        .and_then(|s| Uuid::parse_str(s).ok())
                        .map_or(false, |listed| listed == uuid)
                })
                .map(|(name, _)| name.clone())
        })
    }

    /// UUID the project file lists under `name` (itself, deps, or extras).
    pub fn dependency_uuid(&self, name: &str) -> Option<Uuid> {
        if self.project.get(NAME_KEY).and_then(PreferenceValue::as_str) == Some(name) {
            if let Some(uuid) = self.project_uuid() {
                return Some(uuid);
            }
        }
        [DEPS_KEY, EXTRAS_KEY].iter().find_map(|section| {
            self.project
                .get(*section)
                .and_then(PreferenceValue::as_table)?
                .get(name)
                .and_then(PreferenceValue::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
        })
    }

    /// True when the project file itself lists the component.
    pub fn lists_component(&self, id: &ComponentId) -> bool {
        self.project_uuid() == Some(id.uuid()) || self.dependency_name(id.uuid()).is_some()
    }

    /// Name under which this environment stores the component's preferences,
    /// if the environment references the component at all.
    pub fn component_name(&self, id: &ComponentId) -> Option<String> {
        if let Some(name) = self.dependency_name(id.uuid()) {
            return Some(name);
        }
        if self.project_uuid() == Some(id.uuid()) {
            return Some(id.name().to_string());
        }
        if self.name_conflict(id).is_some() {
            return None;
        }
        let has_table = [Tier::Exported, Tier::Local]
            .iter()
            .any(|tier| self.tier_table(*tier, id.name()).is_some());
        has_table.then(|| id.name().to_string())
    }

    /// UUID of another component this environment binds to `id`'s name, when
    /// the environment does not list `id` under a name of its own.
    pub fn name_conflict(&self, id: &ComponentId) -> Option<Uuid> {
        if self.lists_component(id) {
            return None;
        }
        self.dependency_uuid(id.name())
            .filter(|bound| *bound != id.uuid())
    }

    /// Fail when `id`'s name belongs to another component here.
    pub fn check_name(&self, id: &ComponentId) -> Result<(), PreferenceError> {
        match self.name_conflict(id) {
            Some(bound) => Err(PreferenceError::NameConflict {
                location: self.location.clone(),
                name: id.name().to_string(),
                bound,
                component: id.clone(),
            }),
            None => Ok(()),
        }
    }

    /// True when either the project file or a preference table references the component.
    pub fn knows(&self, id: &ComponentId) -> bool {
        self.component_name(id).is_some()
    }

    fn tier_table(&self, tier: Tier, name: &str) -> Option<&PreferenceMap> {
        self.document(tier)
            .get(PREFERENCES_KEY)?
            .as_table()?
            .get(name)?
            .as_table()
    }

    /// The component's values in one tier, without the reserved block-list key.
    pub fn preferences(&self, id: &ComponentId, tier: Tier) -> PreferenceMap {
        let Some(name) = self.component_name(id) else {
            return PreferenceMap::new();
        };
        self.tier_table(tier, &name)
            .map(|table| {
                table
                    .iter()
                    .filter(|(key, _)| key.as_str() != CLEAR_LIST_KEY)
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Exported values with local values laid over them, key by key.
    pub fn combined(&self, id: &ComponentId) -> PreferenceMap {
        let mut combined = self.preferences(id, Tier::Exported);
        for (key, value) in self.preferences(id, Tier::Local) {
            combined.insert(key, value);
        }
        combined
    }

    /// Keys this tier blocks from lower-precedence environments.
    pub fn tier_block_list(&self, id: &ComponentId, tier: Tier) -> BTreeSet<String> {
        let Some(name) = self.component_name(id) else {
            return BTreeSet::new();
        };
        self.tier_table(tier, &name)
            .and_then(|table| table.get(CLEAR_LIST_KEY))
            .and_then(PreferenceValue::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(PreferenceValue::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Block list of the environment: union of both tiers.
    pub fn block_list(&self, id: &ComponentId) -> BTreeSet<String> {
        let mut keys = self.tier_block_list(id, Tier::Exported);
        keys.extend(self.tier_block_list(id, Tier::Local));
        keys
    }

    pub fn has_value(&self, id: &ComponentId, tier: Tier, key: &str) -> bool {
        key != CLEAR_LIST_KEY
            && self
                .component_name(id)
                .and_then(|name| self.tier_table(tier, &name).map(|t| t.contains_key(key)))
                .unwrap_or(false)
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            project: self.project.clone(),
            local: self.local.clone(),
        }
    }

    pub(crate) fn restore(&mut self, checkpoint: Checkpoint) {
        self.project = checkpoint.project;
        self.local = checkpoint.local;
    }

    pub(crate) fn replace_documents(&mut self, project: PreferenceMap, local: PreferenceMap) {
        self.project = project;
        self.local = local;
    }

    pub(crate) fn set_value(&mut self, tier: Tier, name: &str, key: &str, value: PreferenceValue) {
        self.with_table(tier, name, |table| {
            table.insert(key.to_string(), value);
        });
    }

    pub(crate) fn remove_value(&mut self, tier: Tier, name: &str, key: &str) -> bool {
        let removed = self
            .existing_table_mut(tier, name)
            .map_or(false, |table| table.remove(key).is_some());
        self.prune(tier, name);
        removed
    }

    pub(crate) fn add_block(&mut self, tier: Tier, name: &str, key: &str) -> bool {
        self.with_table(tier, name, |table| {
            let mut keys = read_clear_list(table);
            let added = keys.insert(key.to_string());
            write_clear_list(table, keys);
            added
        })
    }

    pub(crate) fn remove_block(&mut self, tier: Tier, name: &str, key: &str) -> bool {
        let removed = match self.existing_table_mut(tier, name) {
            Some(table) => {
                let mut keys = read_clear_list(table);
                let removed = keys.remove(key);
                write_clear_list(table, keys);
                removed
            }
            None => false,
        };
        self.prune(tier, name);
        removed
    }

    /// Record the component under `[extras]` so the project file knows it.
    /// Refuses a name the project already binds to another component.
    pub(crate) fn register_extra(&mut self, id: &ComponentId) -> Result<(), PreferenceError> {
        self.check_name(id)?;
        let mut extras = take_table(&mut self.project, EXTRAS_KEY);
        extras.insert(
            id.name().to_string(),
            PreferenceValue::String(id.uuid().to_string()),
        );
        self.project
            .insert(EXTRAS_KEY.to_string(), PreferenceValue::Table(extras));
        Ok(())
    }

    /// Run `f` on the component's table in `tier`, creating the table (and the
    /// `preferences` table above it) when missing.
    fn with_table<R>(
        &mut self,
        tier: Tier,
        name: &str,
        f: impl FnOnce(&mut PreferenceMap) -> R,
    ) -> R {
        let document = self.document_mut(tier);
        let mut preferences = take_table(document, PREFERENCES_KEY);
        let mut table = take_table(&mut preferences, name);
        let result = f(&mut table);
        preferences.insert(name.to_string(), PreferenceValue::Table(table));
        document.insert(PREFERENCES_KEY.to_string(), PreferenceValue::Table(preferences));
        result
    }

    fn existing_table_mut(&mut self, tier: Tier, name: &str) -> Option<&mut PreferenceMap> {
        self.document_mut(tier)
            .get_mut(PREFERENCES_KEY)?
            .as_table_mut()?
            .get_mut(name)?
            .as_table_mut()
    }

    /// Drop empty component and `preferences` tables so files stay tidy.
    fn prune(&mut self, tier: Tier, name: &str) {
        let document = self.document_mut(tier);
        let Some(preferences) = document
            .get_mut(PREFERENCES_KEY)
            .and_then(PreferenceValue::as_table_mut)
        else {
            return;
        };
        let component_empty = preferences
            .get(name)
            .and_then(PreferenceValue::as_table)
            .map_or(false, PreferenceMap::is_empty);
        if component_empty {
            preferences.remove(name);
        }
        if preferences.is_empty() {
            document.remove(PREFERENCES_KEY);
        }
    }
}

/// Remove and return the table under `key`; anything else there is dropped.
fn take_table(map: &mut PreferenceMap, key: &str) -> PreferenceMap {
    match map.remove(key) {
        Some(PreferenceValue::Table(table)) => table,
        _ => PreferenceMap::new(),
    }
}

fn read_clear_list(table: &PreferenceMap) -> BTreeSet<String> {
    table
        .get(CLEAR_LIST_KEY)
        .and_then(PreferenceValue::as_array)
        .map(|keys| {
            keys.iter()
                .filter_map(PreferenceValue::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn write_clear_list(table: &mut PreferenceMap, keys: BTreeSet<String>) {
    if keys.is_empty() {
        table.remove(CLEAR_LIST_KEY);
    } else {
        table.insert(
            CLEAR_LIST_KEY.to_string(),
            PreferenceValue::Array(keys.into_iter().map(PreferenceValue::String).collect()),
        );
    }
}
