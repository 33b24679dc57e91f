//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{Commands, SnapshotCommands};

/// Command name string for log records (e.g. "set", "snapshot.record").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Load { .. } => "load".to_string(),
        Commands::Has { .. } => "has".to_string(),
        Commands::Show { .. } => "show".to_string(),
        Commands::Set { .. } => "set".to_string(),
        Commands::Delete { .. } => "delete".to_string(),
        Commands::Stack { .. } => "stack".to_string(),
        Commands::Snapshot { command } => format!("snapshot.{}", snapshot_command_name(command)),
    }
}

pub fn snapshot_command_name(command: &SnapshotCommands) -> &'static str {
    match command {
        SnapshotCommands::Record { .. } => "record",
        SnapshotCommands::Status { .. } => "status",
    }
}

/// Component reference a command operates on, if any.
pub fn command_component(command: &Commands) -> Option<&str> {
    match command {
        Commands::Load { component, .. }
        | Commands::Has { component, .. }
        | Commands::Show { component, .. }
        | Commands::Set { component, .. }
        | Commands::Delete { component, .. } => Some(component.as_str()),
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Record { component, .. }
            | SnapshotCommands::Status { component, .. } => Some(component.as_str()),
        },
        Commands::Stack { .. } => None,
    }
}
