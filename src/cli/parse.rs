//! CLI parse: clap types for prefstack. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// prefstack - layered component preferences with inheritance control
#[derive(Parser)]
#[command(name = "prefstack")]
#[command(about = "Read and write layered component preferences")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Environment directory, active first; repeat for each layer.
    /// Replaces the configured load path.
    #[arg(long = "env", value_name = "DIR")]
    pub envs: Vec<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective value of one preference
    Load {
        /// Component name, UUID, or Name=UUID
        component: String,
        key: String,
        /// Value printed when the preference is absent (TOML syntax)
        #[arg(long)]
        default: Option<String>,
    },
    /// Print whether a preference resolves to a value
    Has { component: String, key: String },
    /// Show all effective preferences of a component
    Show {
        component: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write preferences. Clears apply first, then blocks, then values.
    Set {
        component: String,
        /// Assignments; VALUE is TOML, or a plain string if it does not parse
        #[arg(value_name = "KEY=VALUE")]
        assignments: Vec<String>,
        /// Erase KEY at the target, letting lower environments show through
        #[arg(long = "clear", value_name = "KEY")]
        clear: Vec<String>,
        /// Erase KEY at the target and stop lower environments providing it
        #[arg(long = "block", value_name = "KEY")]
        block: Vec<String>,
        /// Write to the exported (shared) tier instead of the local tier
        #[arg(long)]
        export: bool,
        /// Write to the nearest environment that references the component
        #[arg(long)]
        search_stack: bool,
        /// Create the component's entry even if no environment references it
        #[arg(long)]
        force: bool,
    },
    /// Erase preferences wherever they are currently held
    Delete {
        component: String,
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,
        /// Also block inheritance from lower environments
        #[arg(long)]
        block: bool,
        /// Look in the exported tier instead of the local tier
        #[arg(long)]
        export: bool,
        /// Write to the active environment when no environment holds a key
        #[arg(long)]
        force: bool,
    },
    /// List the environment stack, active first
    Stack {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Compile-time snapshots
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Read KEYs as a tracked evaluation and record their values
    Record {
        component: String,
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,
    },
    /// Report whether recorded preferences changed since the snapshot
    Status {
        component: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
