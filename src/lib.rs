//! # Restman
//!
//! Collections of REST calls kept on disk, with OpenAPI import and
//! execution over HTTP.
//!
//! ## Features
//! - Calls grouped into collections sharing a base URL and default auth
//! - `{{BASE_URL}}` substitution and auth inheritance
//! - Change tracking through content hashes
//! - OpenAPI 3.x and Swagger 2.0 import with example body synthesis
//! - cURL import/export
//!
//! ## Architecture
//! - Models and tracking - plain data with hash-based dirty detection
//! - Storage - a `Repository` trait with a JSON file implementation
//! - App layer - the owned working set and its persisting mutations
//! - Network layer - async HTTP execution with cancellation

pub mod app;
pub mod config;
pub mod constants;
pub mod curl;
pub mod error;
pub mod hashing;
pub mod importer;
pub mod models;
pub mod network;
pub mod storage;
pub mod tracker;

// Re-export commonly used types
pub use app::AppState;
pub use config::Settings;
pub use curl::{parse_curl, to_curl, CurlOptions};
pub use error::{ConfigError, CurlError, ImportError, StorageError, TransportError};
pub use models::{Auth, AuthField, AuthKind, Call, Collection, CollectionField};
pub use network::{ExecutionResult, HttpExecutor, PreparedRequest};
pub use storage::{JsonStorage, Repository};
pub use tracker::Tracked;
