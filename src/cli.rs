//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the preferences API.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_component, command_name};
pub use output::map_error;
pub use parse::{Cli, Commands, SnapshotCommands};
pub use presentation::{
    format_preferences_json, format_preferences_text, format_section_heading,
    format_snapshot_recorded, format_snapshot_status_json, format_snapshot_status_text,
    format_stack_json, format_stack_text, format_value, format_write_outcomes_text,
    SnapshotState, SnapshotStatus, StackEntry,
};
pub use route::{parse_assignment, parse_value, RunContext};
