//! Snapshot command presentation: record and status.

use super::shared::to_json_pretty;
use crate::tracking::Snapshot;
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotState {
    /// No snapshot was ever recorded.
    Missing,
    Fresh,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStatus {
    pub component: String,
    pub state: SnapshotState,
    pub changed: Vec<String>,
    pub digest: Option<String>,
    pub recorded_at: Option<String>,
}

impl SnapshotStatus {
    pub fn is_stale(&self) -> bool {
        self.state != SnapshotState::Fresh
    }
}

pub fn format_snapshot_recorded(snapshot: &Snapshot) -> String {
    format!(
        "Recorded snapshot for {} ({} key(s), digest {}...)",
        snapshot.name,
        snapshot.keys.len(),
        &snapshot.digest[..snapshot.digest.len().min(12)]
    )
}

pub fn format_snapshot_status_text(status: &SnapshotStatus) -> String {
    match status.state {
        SnapshotState::Missing => format!(
            "{}: {} (no snapshot recorded)",
            status.component,
            "stale".yellow()
        ),
        SnapshotState::Fresh => format!("{}: {}", status.component, "up to date".green()),
        SnapshotState::Stale => {
            let mut out = format!("{}: {}\n", status.component, "stale".red());
            for key in &status.changed {
                out.push_str(&format!("  changed: {}\n", key));
            }
            out
        }
    }
}

pub fn format_snapshot_status_json(status: &SnapshotStatus) -> String {
    to_json_pretty(status)
}
