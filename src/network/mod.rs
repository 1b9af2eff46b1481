//! Network layer - HTTP request execution
//!
//! Calls are resolved into a [`PreparedRequest`] by the app layer and handed
//! to the [`HttpExecutor`], which reports a result or a transport error.

pub mod client;
pub mod request;

pub use client::{format_body, ExecutionResult, HttpExecutor};
pub use request::{parse_header, PreparedRequest};
