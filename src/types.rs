//! Core value types shared by the store, merge engine, and write resolver.

use crate::error::PreferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// A single preference value: any TOML-representable value.
pub type PreferenceValue = toml::Value;

/// A key -> value mapping, ordered by key.
pub type PreferenceMap = toml::Table;

/// Reserved key holding a component's block list inside a tier's preference table.
pub const CLEAR_LIST_KEY: &str = "__clear__";

/// Identity of a component owning preferences.
///
/// Equality and hashing use the UUID only; the name is how environments key
/// the component's table on disk when they have no name of their own for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentId {
    uuid: Uuid,
    name: String,
}

impl ComponentId {
    pub fn new(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for ComponentId {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for ComponentId {}

impl Hash for ComponentId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.uuid)
    }
}

/// A write request for one key.
///
/// `Clear` erases the key at the target and lets lower-precedence environments
/// show through again. `Block` erases it and also stops lower-precedence
/// environments from contributing it.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Set(PreferenceValue),
    Clear,
    Block,
}

impl Write {
    /// True when the write leaves something behind in the target environment.
    pub fn creates_entry(&self) -> bool {
        !matches!(self, Write::Clear)
    }
}

impl From<PreferenceValue> for Write {
    fn from(value: PreferenceValue) -> Self {
        Write::Set(value)
    }
}

/// Storage tier within one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Shared, versioned alongside the project.
    Exported,
    /// Private to the machine; overrides exported.
    Local,
}

impl Tier {
    pub fn for_export(export: bool) -> Self {
        if export {
            Tier::Exported
        } else {
            Tier::Local
        }
    }

    pub fn other(self) -> Self {
        match self {
            Tier::Exported => Tier::Local,
            Tier::Local => Tier::Exported,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Exported => write!(f, "exported"),
            Tier::Local => write!(f, "local"),
        }
    }
}

/// Reject keys that cannot be stored.
pub fn validate_key(key: &str) -> Result<(), PreferenceError> {
    if key.is_empty() || key == CLEAR_LIST_KEY {
        return Err(PreferenceError::InvalidKey(key.to_string()));
    }
    Ok(())
}
