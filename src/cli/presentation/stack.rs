//! Stack command presentation.

use super::shared::{format_section_heading, to_json_pretty};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

/// One environment row, listed active first.
#[derive(Debug, Clone, Serialize)]
pub struct StackEntry {
    pub location: PathBuf,
    pub writable: bool,
    pub active: bool,
    pub project_file: bool,
    pub local_file: bool,
}

pub fn format_stack_text(entries: &[StackEntry]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Environment stack"));
    if entries.is_empty() {
        out.push_str("No environments on the load path.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Environment", "Mode", "Files"]);
    for (idx, entry) in entries.iter().enumerate() {
        let mode = match (entry.active, entry.writable) {
            (true, true) => "active",
            (true, false) => "active, read-only",
            (false, true) => "writable",
            (false, false) => "read-only",
        };
        let files = match (entry.project_file, entry.local_file) {
            (true, true) => "project, local",
            (true, false) => "project",
            (false, true) => "local",
            (false, false) => "-",
        };
        table.add_row(vec![
            (idx + 1).to_string(),
            entry.location.display().to_string(),
            mode.to_string(),
            files.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_stack_json(entries: &[StackEntry]) -> String {
    to_json_pretty(&json!({ "environments": entries, "total": entries.len() }))
}
