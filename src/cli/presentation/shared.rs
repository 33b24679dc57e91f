//! Helpers shared by the command formatters.

use crate::types::PreferenceValue;
use owo_colors::OwoColorize;
use serde::Serialize;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Render a value for display: strings bare, everything else as TOML.
pub fn format_value(value: &PreferenceValue) -> String {
    match value {
        PreferenceValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn to_json_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
