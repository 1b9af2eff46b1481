//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Placeholder substituted with the owning collection's base URL
pub const BASE_URL_PLACEHOLDER: &str = "{{BASE_URL}}";

/// Method assigned to newly created calls
pub const DEFAULT_METHOD: &str = "GET";

/// Label shown for calls with neither a usable name nor URL
pub const UNTITLED: &str = "untitled";

/// Directory name under the user's config dir
pub const APP_DIR: &str = "restman";

/// Persisted working set
pub const COLLECTIONS_FILE: &str = "collections.json";

/// User settings file
pub const CONFIG_FILE: &str = "config.json";

/// Log file written by the binary
pub const LOG_FILE: &str = "restman.log";

/// Overrides the settings file location
pub const CONFIG_ENV_VAR: &str = "RESTMAN_CONFIG";

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Nesting limit for example synthesis
pub const MAX_SCHEMA_DEPTH: usize = 32;

/// Schema nodes visited per synthesized example
pub const MAX_EXAMPLE_NODES: usize = 10_000;

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
