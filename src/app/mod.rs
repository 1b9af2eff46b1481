//! App layer - the working set of collections
//!
//! [`AppState`] owns every loaded collection, an index from call id to its
//! owning collection, and the current selection. Queries live in `state`,
//! persisting mutations in `commands`.

pub mod state;
pub mod commands;

pub use state::{AppState, Selection};
