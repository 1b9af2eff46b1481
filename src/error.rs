//! Error types for the persistence, import, transport and config boundaries.
//!
//! Domain operations never fail hard: validation returns message lists and
//! unknown ids resolve to `None`. Only the boundaries below raise errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("collections file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize collections: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected status code {status} fetching {url}")]
    Status { url: String, status: u16 },
    #[error("document is neither valid JSON nor YAML: {0}")]
    Parse(String),
    #[error("not an OpenAPI document: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid HTTP method: {0}")]
    InvalidMethod(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("error reading body: {0}")]
    Body(String),
    #[error("request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            TransportError::Body(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum CurlError {
    #[error("unterminated quote in cURL command")]
    UnterminatedQuote,
    #[error("missing value for {0}")]
    MissingValue(String),
    #[error("no URL in cURL command")]
    MissingUrl,
}
