//! Parsed OpenAPI/Swagger document with local `$ref` resolution

use serde_json::Value;

use crate::error::ImportError;

/// Upper bound on chained `$ref` hops when resolving a single node
const MAX_REF_HOPS: usize = 16;

/// A loaded OpenAPI 3.x or Swagger 2.0 document
#[derive(Clone, Debug)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Parse JSON or YAML text. Content starting with `{` is read as JSON.
    pub fn parse(content: &str) -> Result<Document, ImportError> {
        let root: Value = if content.trim_start().starts_with('{') {
            serde_json::from_str(content).map_err(|e| ImportError::Parse(e.to_string()))?
        } else {
            serde_yaml::from_str(content).map_err(|e| ImportError::Parse(e.to_string()))?
        };
        Document::from_value(root)
    }

    /// Wrap an already-parsed value after checking it looks like OpenAPI
    pub fn from_value(root: Value) -> Result<Document, ImportError> {
        let Some(obj) = root.as_object() else {
            return Err(ImportError::Malformed(
                "top level is not an object".to_string(),
            ));
        };
        if !obj.contains_key("openapi") && !obj.contains_key("swagger") {
            return Err(ImportError::Malformed(
                "missing `openapi` or `swagger` version field".to_string(),
            ));
        }
        if let Some(info) = obj.get("info") {
            if !info.is_object() {
                return Err(ImportError::Malformed("`info` is not an object".to_string()));
            }
        }
        if let Some(paths) = obj.get("paths") {
            if !paths.is_object() && !paths.is_null() {
                return Err(ImportError::Malformed("`paths` is not an object".to_string()));
            }
        }
        Ok(Document { root })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn is_swagger2(&self) -> bool {
        self.root.get("swagger").is_some()
    }

    pub fn title(&self) -> &str {
        self.root
            .get("info")
            .and_then(|i| i.get("title"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Security scheme definitions keyed by name
    pub fn security_schemes(&self) -> Option<&serde_json::Map<String, Value>> {
        let schemes = if self.is_swagger2() {
            self.root.get("securityDefinitions")
        } else {
            self.root
                .get("components")
                .and_then(|c| c.get("securitySchemes"))
        };
        schemes.and_then(Value::as_object)
    }

    /// Look up a local reference such as `#/components/schemas/Pet`.
    /// External references are not supported.
    pub fn lookup(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        if pointer.is_empty() {
            return Some(&self.root);
        }
        self.root.pointer(pointer)
    }

    /// Follow `$ref` chains until a concrete node is reached
    pub fn resolve<'a>(&'a self, node: &'a Value) -> Option<&'a Value> {
        let mut current = node;
        for _ in 0..MAX_REF_HOPS {
            match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => current = self.lookup(reference)?,
                None => return Some(current),
            }
        }
        tracing::warn!("Reference chain too long, giving up");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_and_yaml() {
        let json_doc = Document::parse(r#"{"openapi":"3.0.0","info":{"title":"J"}}"#).unwrap();
        assert_eq!(json_doc.title(), "J");

        let yaml_doc = Document::parse("openapi: 3.0.0\ninfo:\n  title: Y\n").unwrap();
        assert_eq!(yaml_doc.title(), "Y");
        assert!(!yaml_doc.is_swagger2());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Document::parse("{ not json"),
            Err(ImportError::Parse(_))
        ));
        assert!(matches!(
            Document::parse("just a string"),
            Err(ImportError::Malformed(_))
        ));
        assert!(matches!(
            Document::parse("title: no version\n"),
            Err(ImportError::Malformed(_))
        ));
        assert!(matches!(
            Document::parse("openapi: 3.0.0\npaths: [1, 2]\n"),
            Err(ImportError::Malformed(_))
        ));
    }

    #[test]
    fn test_resolve_follows_chains() {
        let doc = Document::from_value(json!({
            "openapi": "3.0.0",
            "components": {
                "schemas": {
                    "Alias": {"$ref": "#/components/schemas/Pet"},
                    "Pet": {"type": "object"},
                    "Loop": {"$ref": "#/components/schemas/Loop"}
                }
            }
        }))
        .unwrap();

        let alias = json!({"$ref": "#/components/schemas/Alias"});
        assert_eq!(doc.resolve(&alias), Some(&json!({"type": "object"})));

        let missing = json!({"$ref": "#/components/schemas/Nope"});
        assert_eq!(doc.resolve(&missing), None);

        let looped = json!({"$ref": "#/components/schemas/Loop"});
        assert_eq!(doc.resolve(&looped), None);

        let external = json!({"$ref": "other.yaml#/Pet"});
        assert_eq!(doc.resolve(&external), None);
    }
}
