//! OpenAPI import
//!
//! A source is either a local file or an `http(s)` URL. Files ending in
//! `.json` are read as JSON; anything else is sniffed, JSON or YAML.

pub mod document;
pub mod example;
pub mod openapi;

use std::fs;
use std::path::Path;

use crate::error::ImportError;
use crate::models::Collection;

pub use document::Document;
pub use openapi::build_collection;

/// Import a collection from a file path or URL
pub async fn import_source(source: &str) -> Result<Collection, ImportError> {
    let document = if is_remote(source) {
        fetch_document(source).await?
    } else {
        read_document(Path::new(source))?
    };
    Ok(build_collection(&document))
}

/// Import a collection from a local file
pub fn import_file(path: &Path) -> Result<Collection, ImportError> {
    Ok(build_collection(&read_document(path)?))
}

pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub fn read_document(path: &Path) -> Result<Document, ImportError> {
    let content = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "Read OpenAPI document");
    if path.extension().is_some_and(|e| e == "json") {
        let root = serde_json::from_str(&content).map_err(|e| ImportError::Parse(e.to_string()))?;
        return Document::from_value(root);
    }
    Document::parse(&content)
}

/// Download a document. Anything but 200 is an error.
pub async fn fetch_document(url: &str) -> Result<Document, ImportError> {
    let fetch_err = |source| ImportError::Fetch {
        url: url.to_string(),
        source,
    };

    let response = reqwest::get(url).await.map_err(fetch_err)?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(ImportError::Status {
            url: url.to_string(),
            status,
        });
    }
    let content = response.text().await.map_err(fetch_err)?;
    tracing::debug!(url, bytes = content.len(), "Fetched OpenAPI document");
    Document::parse(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOC: &str = "openapi: 3.0.0\ninfo:\n  title: Remote\npaths:\n  /ping:\n    get:\n      operationId: ping\n";

    #[test]
    fn test_import_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let spec_path = temp_dir.path().join("openapi.txt");
        fs::write(&spec_path, DOC).unwrap();

        let collection = import_file(&spec_path).unwrap();
        assert_eq!(collection.name, "Remote");
        assert_eq!(collection.calls[0].id, "ping");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = import_file(&temp_dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(ImportError::Io { .. })));
    }

    #[tokio::test]
    async fn test_import_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/openapi.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOC))
            .mount(&server)
            .await;

        let url = format!("{}/openapi.yaml", server.uri());
        let collection = import_source(&url).await.unwrap();
        assert_eq!(collection.name, "Remote");
        assert_eq!(collection.calls.len(), 1);
    }

    #[tokio::test]
    async fn test_non_200_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = fetch_document(&format!("{}/missing.json", server.uri())).await;
        assert!(matches!(result, Err(ImportError::Status { status: 404, .. })));
    }
}
