//! Preference command presentation: show, set, delete.

use super::shared::{format_section_heading, format_value, to_json_pretty};
use crate::merge::EffectivePreferences;
use crate::write::WriteOutcome;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

pub fn format_preferences_text(prefs: &EffectivePreferences) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Preferences for {}", prefs.component()))
    );
    if prefs.is_empty() {
        out.push_str("No preferences set.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Value"]);
    for (key, value) in prefs.iter() {
        table.add_row(vec![key.clone(), format_value(value)]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_preferences_json(prefs: &EffectivePreferences) -> String {
    let out = json!({
        "component": prefs.component(),
        "preferences": prefs.as_map(),
    });
    to_json_pretty(&out)
}

pub fn format_write_outcomes_text(outcomes: &[WriteOutcome]) -> String {
    if outcomes.is_empty() {
        return "Nothing to write.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Environment", "Tier", "Changed"]);
    for outcome in outcomes {
        table.add_row(vec![
            outcome.key.clone(),
            outcome.location.display().to_string(),
            outcome.tier.to_string(),
            if outcome.changed { "yes" } else { "no" }.to_string(),
        ]);
    }
    let mut out = table.to_string();
    for outcome in outcomes.iter().filter(|o| o.registered) {
        out.push_str(&format!(
            "\nRegistered component in {}",
            outcome.location.display()
        ));
    }
    out
}
