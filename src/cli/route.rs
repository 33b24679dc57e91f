//! CLI route: single route table and run context. Dispatches to the
//! preferences API and presentation.

use crate::api::PreferencesApi;
use crate::cli::help::command_component;
use crate::cli::parse::{Commands, SnapshotCommands};
use crate::cli::presentation::{
    format_preferences_json, format_preferences_text, format_snapshot_recorded,
    format_snapshot_status_json, format_snapshot_status_text, format_stack_json,
    format_stack_text, format_value, format_write_outcomes_text,
    SnapshotState, SnapshotStatus, StackEntry,
};
use crate::cli::command_name;
use crate::config::{ConfigLoader, LoadPathEntry, PrefstackConfig};
use crate::error::PreferenceError;
use crate::types::{ComponentId, PreferenceValue, Tier, Write};
use crate::write::{DeleteOptions, WriteOptions};
use std::path::PathBuf;
use tracing::{debug, info};

/// Runtime context for CLI execution: the loaded configuration and the
/// preferences API built from it.
pub struct RunContext {
    api: PreferencesApi,
    config: PrefstackConfig,
}

impl RunContext {
    /// Create run context from workspace root, optional config path, and
    /// optional explicit environments (search order). Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        envs: Vec<PathBuf>,
    ) -> Result<Self, PreferenceError> {
        let mut config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        if !envs.is_empty() {
            config.load_path = envs
                .into_iter()
                .map(|path| {
                    if path.is_relative() {
                        workspace_root.join(path)
                    } else {
                        path
                    }
                })
                .map(LoadPathEntry::writable)
                .collect();
        }

        Self::from_config(config)
    }

    pub fn from_config(config: PrefstackConfig) -> Result<Self, PreferenceError> {
        let api = PreferencesApi::from_config(&config)?;
        Ok(Self { api, config })
    }

    /// Reference to the underlying preferences API.
    pub fn api(&self) -> &PreferencesApi {
        &self.api
    }

    pub fn config(&self) -> &PrefstackConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&mut self, command: &Commands) -> Result<String, PreferenceError> {
        info!(
            command = %command_name(command),
            component = command_component(command).unwrap_or("-"),
            "Executing command"
        );
        match command {
            Commands::Load {
                component,
                key,
                default,
            } => {
                let id = self.api.component_id(component)?;
                let default = default.as_deref().map(parse_value);
                Ok(self
                    .api
                    .load(&id, key, default)
                    .map(|value| format_value(&value))
                    .unwrap_or_default())
            }
            Commands::Has { component, key } => {
                let id = self.api.component_id(component)?;
                Ok(self.api.has(&id, key).to_string())
            }
            Commands::Show { component, format } => {
                let id = self.api.component_id(component)?;
                let prefs = self.api.resolve(&id);
                Ok(match format.as_str() {
                    "json" => format_preferences_json(&prefs),
                    _ => format_preferences_text(&prefs),
                })
            }
            Commands::Set {
                component,
                assignments,
                clear,
                block,
                export,
                search_stack,
                force,
            } => {
                let id = self.api.component_id(component)?;
                let mut pairs: Vec<(String, Write)> = Vec::new();
                pairs.extend(clear.iter().map(|key| (key.clone(), Write::Clear)));
                pairs.extend(block.iter().map(|key| (key.clone(), Write::Block)));
                for assignment in assignments {
                    let (key, value) = parse_assignment(assignment)?;
                    pairs.push((key, Write::Set(value)));
                }

                let options = WriteOptions {
                    export: *export,
                    active_only: !*search_stack,
                    force: *force,
                };
                let outcomes = self.api.set(&id, pairs, options)?;
                debug!(writes = outcomes.len(), "Set completed");
                Ok(format_write_outcomes_text(&outcomes))
            }
            Commands::Delete {
                component,
                keys,
                block,
                export,
                force,
            } => {
                let id = self.api.component_id(component)?;
                let options = DeleteOptions {
                    block_inheritance: *block,
                    export: *export,
                    force: *force,
                };
                let outcomes = self.api.delete(&id, keys, options)?;
                if outcomes.is_empty() {
                    return Ok(format!(
                        "No environment holds {} in the {} tier.",
                        keys.join(", "),
                        Tier::for_export(*export)
                    ));
                }
                Ok(format_write_outcomes_text(&outcomes))
            }
            Commands::Stack { format } => {
                let entries = self.stack_entries();
                Ok(match format.as_str() {
                    "json" => format_stack_json(&entries),
                    _ => format_stack_text(&entries),
                })
            }
            Commands::Snapshot { command } => self.execute_snapshot(command),
        }
    }

    fn execute_snapshot(&mut self, command: &SnapshotCommands) -> Result<String, PreferenceError> {
        match command {
            SnapshotCommands::Record { component, keys } => {
                let id = self.api.component_id(component)?;
                {
                    let mut scope = self.api.begin_tracked_read(&id);
                    for key in keys {
                        scope.load(key, None);
                    }
                }
                let snapshot = self.api.record_snapshot(&id)?;
                Ok(format_snapshot_recorded(&snapshot))
            }
            SnapshotCommands::Status { component, format } => {
                let id = self.api.component_id(component)?;
                let status = self.snapshot_status(&id)?;
                Ok(match format.as_str() {
                    "json" => format_snapshot_status_json(&status),
                    _ => format_snapshot_status_text(&status),
                })
            }
        }
    }

    fn snapshot_status(&self, id: &ComponentId) -> Result<SnapshotStatus, PreferenceError> {
        let snapshot = self.api.snapshot(id)?;
        let changed = self.api.changed_keys(id)?;
        let state = match &changed {
            None => SnapshotState::Missing,
            Some(keys) if keys.is_empty() => SnapshotState::Fresh,
            Some(_) => SnapshotState::Stale,
        };
        Ok(SnapshotStatus {
            component: id.name().to_string(),
            state,
            changed: changed.unwrap_or_default(),
            digest: snapshot.as_ref().map(|s| s.digest.clone()),
            recorded_at: snapshot.map(|s| s.recorded_at.to_rfc3339()),
        })
    }

    fn stack_entries(&self) -> Vec<StackEntry> {
        let stack = self.api.stack();
        let active = stack.active_index();
        stack
            .resolve()
            .iter()
            .enumerate()
            .rev()
            .map(|(idx, env)| StackEntry {
                location: env.location().to_path_buf(),
                writable: env.is_writable(),
                active: Some(idx) == active,
                project_file: env.tier_path(Tier::Exported).is_file(),
                local_file: env.tier_path(Tier::Local).is_file(),
            })
            .collect()
    }
}

/// Parse `KEY=VALUE`; the value is TOML when it parses, a string otherwise.
pub fn parse_assignment(assignment: &str) -> Result<(String, PreferenceValue), PreferenceError> {
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| PreferenceError::InvalidKey(assignment.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(PreferenceError::InvalidKey(assignment.to_string()));
    }
    Ok((key.to_string(), parse_value(value)))
}

/// Parse a TOML value, falling back to the raw text as a string.
pub fn parse_value(text: &str) -> PreferenceValue {
    toml::from_str::<toml::Table>(&format!("value = {}", text))
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| PreferenceValue::String(text.to_string()))
}
