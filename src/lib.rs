//! prefstack: Layered Component Preferences
//!
//! Components store small named values that persist across runs and are
//! layered over a stack of environments, from a global default up to the
//! active project. Higher environments override lower ones key by key; a
//! `Clear` write lets lower values show through again, a `Block` write stops
//! them. Build-time reads can be tracked and snapshotted so a caller can tell
//! when cached artifacts depend on preferences that have since changed.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod merge;
pub mod stack;
pub mod store;
pub mod tracking;
pub mod types;
pub mod write;

pub use api::{ComponentPreferences, PreferencesApi};
pub use error::{PreferenceError, StoreError};
pub use merge::EffectivePreferences;
pub use stack::EnvironmentStack;
pub use types::{ComponentId, PreferenceMap, PreferenceValue, Tier, Write};
pub use write::{DeleteOptions, WriteOptions, WriteOutcome};
