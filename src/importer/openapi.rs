//! OpenAPI 3.x / Swagger 2.0 to collection conversion

use std::collections::HashSet;

use serde_json::Value;
use uuid::Uuid;

use crate::constants::BASE_URL_PLACEHOLDER;
use crate::importer::document::Document;
use crate::importer::example;
use crate::models::{Auth, Call, Collection};
use crate::tracker::Tracked;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Convert a document into a collection with one call per operation,
/// in document order
pub fn build_collection(doc: &Document) -> Collection {
    let mut collection = Collection::new(doc.title());
    collection.base_url = base_url(doc);

    let mut seen_ids = HashSet::new();
    if let Some(paths) = doc.root().get("paths").and_then(Value::as_object) {
        for (path, item) in paths {
            let Some(item) = doc.resolve(item).and_then(Value::as_object) else {
                continue;
            };
            let shared_params = item.get("parameters");

            for (method, operation) in item {
                if !is_http_method(method) {
                    continue;
                }
                let Some(operation) = operation.as_object() else {
                    continue;
                };
                let op = Operation {
                    path,
                    method,
                    fields: operation,
                    shared_params,
                };
                let call = op.to_call(doc, &mut seen_ids);
                collection.calls.push(Tracked::new(call));
            }
        }
    }

    tracing::info!(
        title = %collection.name,
        calls = collection.calls.len(),
        "Imported OpenAPI document"
    );
    collection
}

fn is_http_method(s: &str) -> bool {
    HTTP_METHODS.contains(&s.to_lowercase().as_str())
}

/// First server URL, or `scheme://host/basePath` for Swagger 2.0
fn base_url(doc: &Document) -> String {
    let root = doc.root();
    if doc.is_swagger2() {
        let Some(host) = root.get("host").and_then(Value::as_str) else {
            return String::new();
        };
        let scheme = root
            .get("schemes")
            .and_then(Value::as_array)
            .and_then(|s| s.first())
            .and_then(Value::as_str)
            .unwrap_or("https");
        let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or("");
        return format!("{}://{}{}", scheme, host, base_path);
    }

    root.get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
        .and_then(|s| s.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// `{{BASE_URL}}` joined with the path. Absolute paths are kept as-is.
fn partial_url(path: &str) -> String {
    if path.starts_with("http") {
        path.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", BASE_URL_PLACEHOLDER, path)
    } else {
        format!("{}/{}", BASE_URL_PLACEHOLDER, path)
    }
}

struct Operation<'a> {
    path: &'a str,
    method: &'a str,
    fields: &'a serde_json::Map<String, Value>,
    shared_params: Option<&'a Value>,
}

impl<'a> Operation<'a> {
    fn to_call(&self, doc: &'a Document, seen_ids: &mut HashSet<String>) -> Call {
        let (data, data_type) = self.body(doc);
        Call {
            id: self.call_id(seen_ids),
            name: self.str_field("summary").to_string(),
            url: partial_url(self.path),
            method: self.method.to_uppercase(),
            headers: self.header_names(doc),
            auth: self.auth(doc),
            data,
            data_type,
        }
    }

    fn str_field(&self, key: &str) -> &'a str {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// `operationId`, or a fresh id when it is missing or already taken
    fn call_id(&self, seen_ids: &mut HashSet<String>) -> String {
        let declared = self.str_field("operationId");
        if !declared.is_empty() && seen_ids.insert(declared.to_string()) {
            return declared.to_string();
        }

        let fallback = Uuid::new_v4().to_string();
        tracing::warn!(
            operation_id = declared,
            path = self.path,
            method = self.method,
            replacement = %fallback,
            "Missing or duplicate operationId"
        );
        seen_ids.insert(fallback.clone());
        fallback
    }

    /// Operation parameters followed by path-level ones not overridden by name
    fn parameters(&self, doc: &'a Document) -> Vec<&'a Value> {
        let mut params: Vec<&'a Value> = Vec::new();
        let own = self.fields.get("parameters").and_then(Value::as_array);
        let shared = self.shared_params.and_then(Value::as_array);

        for param in own.into_iter().flatten() {
            if let Some(p) = doc.resolve(param) {
                params.push(p);
            }
        }
        for param in shared.into_iter().flatten() {
            let Some(p) = doc.resolve(param) else {
                continue;
            };
            let overridden = params.iter().any(|existing| {
                existing.get("name") == p.get("name") && existing.get("in") == p.get("in")
            });
            if !overridden {
                params.push(p);
            }
        }
        params
    }

    fn header_names(&self, doc: &'a Document) -> Vec<String> {
        self.parameters(doc)
            .into_iter()
            .filter(|p| p.get("in").and_then(Value::as_str) == Some("header"))
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .map(String::from)
            .collect()
    }

    /// Operation security, falling back to the document's. An explicit
    /// empty list means no auth.
    fn auth(&self, doc: &Document) -> Option<Auth> {
        let requirements = self
            .fields
            .get("security")
            .or_else(|| doc.root().get("security"))?
            .as_array()?;
        let schemes = doc.security_schemes()?;

        for requirement in requirements {
            let Some(names) = requirement.as_object() else {
                continue;
            };
            for name in names.keys() {
                if let Some(scheme) = schemes.get(name).and_then(|s| doc.resolve(s)) {
                    return map_security_scheme(scheme);
                }
            }
        }
        None
    }

    /// Body text and its content type
    fn body(&self, doc: &'a Document) -> (String, String) {
        if let Some(body) = self.fields.get("requestBody").and_then(|b| doc.resolve(b)) {
            return request_body(doc, body);
        }

        // Swagger 2.0 carries the body as an `in: body` parameter
        let body_param = self
            .parameters(doc)
            .into_iter()
            .find(|p| p.get("in").and_then(Value::as_str) == Some("body"));
        if let Some(param) = body_param {
            let content_type = self
                .first_consumes()
                .or_else(|| first_str(doc.root().get("consumes")))
                .unwrap_or("application/json");
            let data = param
                .get("schema")
                .and_then(|s| example::synthesize(doc, s))
                .map(|v| v.to_string())
                .unwrap_or_default();
            return (data, content_type.to_string());
        }

        (String::new(), String::new())
    }

    fn first_consumes(&self) -> Option<&'a str> {
        first_str(self.fields.get("consumes"))
    }
}

fn first_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
}

/// Only the first declared media type is used
fn request_body(doc: &Document, body: &Value) -> (String, String) {
    let Some((content_type, media)) = body
        .get("content")
        .and_then(Value::as_object)
        .and_then(|c| c.iter().next())
    else {
        return (String::new(), String::new());
    };

    if let Some(example) = media.get("example").filter(|e| !e.is_null()) {
        return (example.to_string(), content_type.clone());
    }

    let named = media
        .get("examples")
        .and_then(Value::as_object)
        .and_then(|examples| {
            examples
                .values()
                .filter_map(|e| doc.resolve(e))
                .find_map(|e| e.get("value").filter(|v| !v.is_null()))
        });
    if let Some(value) = named {
        return (value.to_string(), content_type.clone());
    }

    let data = media
        .get("schema")
        .and_then(|s| example::synthesize(doc, s))
        .map(|v| v.to_string())
        .unwrap_or_default();
    (data, content_type.clone())
}

fn map_security_scheme(scheme: &Value) -> Option<Auth> {
    let scheme_type = scheme.get("type").and_then(Value::as_str).unwrap_or("");
    match scheme_type {
        "http" => {
            let http_scheme = scheme.get("scheme").and_then(Value::as_str).unwrap_or("");
            if http_scheme.eq_ignore_ascii_case("basic") {
                Some(Auth::BasicAuth {
                    username: String::new(),
                    password: String::new(),
                })
            } else if http_scheme.eq_ignore_ascii_case("bearer") {
                Some(Auth::BearerToken {
                    token: String::new(),
                })
            } else {
                None
            }
        }
        "basic" => Some(Auth::BasicAuth {
            username: String::new(),
            password: String::new(),
        }),
        "apiKey" => Some(Auth::ApiKey {
            header_name: scheme
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            header_value: String::new(),
        }),
        _ => None,
    }
}
