//! Serialization collaborator for preference files.
//!
//! The store only needs `parse` and `serialize`; TOML is the shipped format.

use crate::types::PreferenceMap;

/// A textual key/value format the store can read and write.
pub trait PreferenceFormat: Send + Sync {
    /// File extension (without the dot) appended to tier file stems.
    fn extension(&self) -> &'static str;

    /// Parse file bytes into a mapping. The error is a human-readable reason.
    fn parse(&self, bytes: &[u8]) -> Result<PreferenceMap, String>;

    /// Serialize a mapping. Key order must be deterministic.
    fn serialize(&self, map: &PreferenceMap) -> Result<Vec<u8>, String>;
}

/// TOML, keys sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl PreferenceFormat for TomlFormat {
    fn extension(&self) -> &'static str {
        "toml"
    }

    fn parse(&self, bytes: &[u8]) -> Result<PreferenceMap, String> {
        let text = std::str::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8: {}", e))?;
        toml::from_str::<PreferenceMap>(text).map_err(|e| format!("TOML parse error: {}", e))
    }

    fn serialize(&self, map: &PreferenceMap) -> Result<Vec<u8>, String> {
        toml::to_string_pretty(map)
            .map(String::into_bytes)
            .map_err(|e| format!("TOML serialize error: {}", e))
    }
}
