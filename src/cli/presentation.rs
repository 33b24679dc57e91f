//! CLI presentation: text and json formatters per command family.

mod preferences;
mod shared;
mod snapshot;
mod stack;

pub use preferences::{
    format_preferences_json, format_preferences_text, format_write_outcomes_text,
};
pub use shared::{format_section_heading, format_value};
pub use snapshot::{
    format_snapshot_recorded, format_snapshot_status_json, format_snapshot_status_text,
    SnapshotState, SnapshotStatus,
};
pub use stack::{format_stack_json, format_stack_text, StackEntry};
