//! Component identity resolution
//!
//! Turns a user-supplied component reference into a `ComponentId`. Accepted
//! forms: a UUID, a dependency name listed by some environment, or
//! `Name=uuid` for components no environment lists yet.

use crate::error::PreferenceError;
use crate::stack::EnvironmentStack;
use crate::types::ComponentId;
use uuid::Uuid;

pub trait ComponentResolver {
    fn resolve(&self, reference: &str) -> Result<ComponentId, PreferenceError>;
}

/// Resolves references against the project files of a stack, searching from
/// the active environment outward.
pub struct StackResolver<'a> {
    stack: &'a EnvironmentStack,
}

impl<'a> StackResolver<'a> {
    pub fn new(stack: &'a EnvironmentStack) -> Self {
        Self { stack }
    }

    fn by_uuid(&self, uuid: Uuid) -> ComponentId {
        let name = self
            .stack
            .resolve()
            .iter()
            .rev()
            .find_map(|env| env.dependency_name(uuid))
            .unwrap_or_else(|| uuid.to_string());
        ComponentId::new(uuid, name)
    }

    fn by_name(&self, name: &str) -> Option<ComponentId> {
        self.stack
            .resolve()
            .iter()
            .rev()
            .find_map(|env| env.dependency_uuid(name))
            .map(|uuid| ComponentId::new(uuid, name))
    }
}

impl ComponentResolver for StackResolver<'_> {
    fn resolve(&self, reference: &str) -> Result<ComponentId, PreferenceError> {
        let reference = reference.trim();

        if let Some((name, uuid)) = reference.split_once('=') {
            let uuid = Uuid::parse_str(uuid.trim())
                .map_err(|_| PreferenceError::UnknownComponent(reference.to_string()))?;
            return Ok(ComponentId::new(uuid, name.trim()));
        }

        if let Ok(uuid) = Uuid::parse_str(reference) {
            return Ok(self.by_uuid(uuid));
        }

        self.by_name(reference)
            .ok_or_else(|| PreferenceError::UnknownComponent(reference.to_string()))
    }
}
