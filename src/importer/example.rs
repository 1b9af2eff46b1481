//! Example value synthesis from schemas
//!
//! Priority per schema: explicit `example`, object built from properties,
//! single-element array from the item schema, `default`, otherwise nothing.
//! Properties without an example are omitted. A `$ref` already being
//! expanded further up the current path yields nothing, as does nesting
//! deeper than [`MAX_SCHEMA_DEPTH`]. Once [`MAX_EXAMPLE_NODES`] schema
//! nodes have been visited the rest of the example is left out, which keeps
//! schemas that reuse the same `$ref` many times over from fanning out.

use serde_json::{Map, Value};

use crate::constants::{MAX_EXAMPLE_NODES, MAX_SCHEMA_DEPTH};
use crate::importer::document::Document;

/// Synthesize an example for `schema`, or `None` when nothing can be derived
pub fn synthesize(doc: &Document, schema: &Value) -> Option<Value> {
    Synthesizer {
        doc,
        active_refs: Vec::new(),
        budget: MAX_EXAMPLE_NODES,
    }
    .example(schema, 0)
}

struct Synthesizer<'a> {
    doc: &'a Document,
    /// `$ref`s expanded on the path from the root schema to the current node
    active_refs: Vec<&'a str>,
    /// Nodes left to visit
    budget: usize,
}

impl<'a> Synthesizer<'a> {
    fn example(&mut self, node: &'a Value, depth: usize) -> Option<Value> {
        if depth > MAX_SCHEMA_DEPTH {
            tracing::debug!(depth, "Schema nesting too deep, skipping");
            return None;
        }
        if self.budget == 0 {
            return None;
        }
        self.budget -= 1;
        if self.budget == 0 {
            tracing::debug!("Example node budget spent, truncating");
        }

        let base = self.active_refs.len();
        let result = match self.follow(node) {
            Some(schema) => self.example_of(schema, depth),
            None => None,
        };
        self.active_refs.truncate(base);
        result
    }

    /// Resolve `$ref`s, pushing each onto the active path
    fn follow(&mut self, node: &'a Value) -> Option<&'a Value> {
        let mut schema = node;
        while let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            if self.active_refs.contains(&reference) {
                tracing::debug!(reference, "Recursive schema, skipping");
                return None;
            }
            self.active_refs.push(reference);
            schema = self.doc.lookup(reference)?;
        }
        schema.is_object().then_some(schema)
    }

    fn example_of(&mut self, schema: &'a Value, depth: usize) -> Option<Value> {
        if let Some(example) = present(schema.get("example")) {
            return Some(example.clone());
        }

        if has_type(schema, "object") {
            let mut object = Map::new();
            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                for (name, property) in properties {
                    if let Some(value) = self.example(property, depth + 1) {
                        object.insert(name.clone(), value);
                    }
                }
            }
            return Some(Value::Object(object));
        }

        if has_type(schema, "array") {
            if let Some(items) = schema.get("items") {
                return self
                    .example(items, depth + 1)
                    .map(|item| Value::Array(vec![item]));
            }
        }

        present(schema.get("default")).cloned()
    }
}

/// JSON `null` counts as absent
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// `type` may be a single name or a list of names
fn has_type(schema: &Value, name: &str) -> bool {
    match schema.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(components: Value) -> Document {
        Document::from_value(json!({
            "openapi": "3.0.0",
            "components": {"schemas": components}
        }))
        .unwrap()
    }

    #[test]
    fn test_properties_without_example_are_omitted() {
        let doc = doc(json!({}));
        let schema = json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string", "default": "Rex"}
            }
        });
        assert_eq!(synthesize(&doc, &schema), Some(json!({"name": "Rex"})));
    }

    #[test]
    fn test_explicit_example_wins() {
        let doc = doc(json!({}));
        let schema = json!({
            "type": "object",
            "example": {"id": 7},
            "properties": {"name": {"type": "string", "default": "Rex"}}
        });
        assert_eq!(synthesize(&doc, &schema), Some(json!({"id": 7})));
    }

    #[test]
    fn test_array_wraps_single_item() {
        let doc = doc(json!({
            "Tag": {"type": "string", "example": "dog"}
        }));
        let schema = json!({"type": "array", "items": {"$ref": "#/components/schemas/Tag"}});
        assert_eq!(synthesize(&doc, &schema), Some(json!(["dog"])));

        let no_items = json!({"type": "array", "default": []});
        assert_eq!(synthesize(&doc, &no_items), Some(json!([])));

        let empty_item = json!({"type": "array", "items": {"type": "string"}});
        assert_eq!(synthesize(&doc, &empty_item), None);
    }

    #[test]
    fn test_scalars_and_null_defaults() {
        let doc = doc(json!({}));
        assert_eq!(synthesize(&doc, &json!({"type": "integer"})), None);
        assert_eq!(
            synthesize(&doc, &json!({"type": "integer", "default": 3})),
            Some(json!(3))
        );
        assert_eq!(
            synthesize(&doc, &json!({"type": "string", "example": null})),
            None
        );
        assert_eq!(
            synthesize(&doc, &json!({"type": ["object", "null"]})),
            Some(json!({}))
        );
    }

    #[test]
    fn test_recursive_schema_terminates() {
        let doc = doc(json!({
            "Node": {
                "type": "object",
                "properties": {
                    "value": {"type": "integer", "default": 1},
                    "next": {"$ref": "#/components/schemas/Node"},
                    "children": {
                        "type": "array",
                        "items": {"$ref": "#/components/schemas/Node"}
                    }
                }
            }
        }));
        let schema = json!({"$ref": "#/components/schemas/Node"});
        assert_eq!(synthesize(&doc, &schema), Some(json!({"value": 1})));
    }

    #[test]
    fn test_sibling_refs_are_not_cycles() {
        let doc = doc(json!({
            "Money": {"type": "number", "example": 9.5}
        }));
        let schema = json!({
            "type": "object",
            "properties": {
                "price": {"$ref": "#/components/schemas/Money"},
                "tax": {"$ref": "#/components/schemas/Money"}
            }
        });
        assert_eq!(
            synthesize(&doc, &schema),
            Some(json!({"price": 9.5, "tax": 9.5}))
        );
    }

    fn node_count(value: &Value) -> usize {
        match value {
            Value::Object(map) => 1 + map.values().map(node_count).sum::<usize>(),
            Value::Array(items) => 1 + items.iter().map(node_count).sum::<usize>(),
            _ => 1,
        }
    }

    #[test]
    fn test_shared_refs_fan_out_is_bounded() {
        // Each level refers to the next one twice: 2^24 leaves unbounded
        let mut schemas = Map::new();
        for level in 0..24 {
            let next = json!({"$ref": format!("#/components/schemas/L{}", level + 1)});
            schemas.insert(
                format!("L{}", level),
                json!({
                    "type": "object",
                    "properties": {"left": next.clone(), "right": next}
                }),
            );
        }
        schemas.insert("L24".to_string(), json!({"type": "string", "example": "leaf"}));
        let doc = doc(Value::Object(schemas));

        let schema = json!({"$ref": "#/components/schemas/L0"});
        let example = synthesize(&doc, &schema).unwrap();
        assert!(example.get("left").is_some());
        assert!(node_count(&example) <= MAX_EXAMPLE_NODES);
    }

    #[test]
    fn test_unresolvable_ref_yields_nothing() {
        let doc = doc(json!({}));
        let schema = json!({"$ref": "#/components/schemas/Missing"});
        assert_eq!(synthesize(&doc, &schema), None);
    }
}
