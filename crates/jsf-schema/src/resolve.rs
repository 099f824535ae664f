//! # Schema Resolution
//!
//! Resolves `$ref` pointers and `dependencies` against a definitions table
//! and the current form data, producing the schema fragment that actually
//! applies to one data value.
//!
//! ## Laziness
//!
//! [`SchemaResolver::resolve`] only resolves the node it is given. Nested
//! property and item schemas are resolved on demand through
//! [`SchemaResolver::property_schema`] and [`SchemaResolver::item_schema`]
//! as a consumer descends, so a self-referential schema (a tree node whose
//! children are `$ref`s back to the node) only expands as deep as the
//! consumer walks.
//!
//! ## Pointers
//!
//! Only `#/definitions/<name>[/<key>]*` pointers are supported. Tokens use
//! RFC 6901 escapes. Any intermediate node that is itself a `$ref` is
//! followed before descending further. Anything else fails with
//! [`SchemaResolutionError`].
//!
//! ## Dependencies
//!
//! For each `dependencies` entry whose property is present in the data:
//!
//! - a list of names is unioned into `required`;
//! - a schema is merged in (see [`merge_schemas`]);
//! - a schema with `oneOf` is merged in, then the single branch whose
//!   condition on the dependent property holds is merged too. If zero or
//!   several branches hold, no branch is merged and a warning is logged.

use std::borrow::Cow;

use jsf_core::path::unescape_token;
use jsf_core::{deep_equals, merge_schemas, SchemaResolutionError};
use serde_json::{json, Map, Value};

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Resolves schema fragments against a read-only definitions table.
///
/// Cheap to construct and `Copy`: it only borrows the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaResolver<'a> {
    definitions: Option<&'a Map<String, Value>>,
}

impl<'a> SchemaResolver<'a> {
    /// Resolver over an explicit definitions table.
    pub fn new(definitions: &'a Map<String, Value>) -> Self {
        Self {
            definitions: Some(definitions),
        }
    }

    /// Resolver over the `definitions` of a root schema (empty when absent).
    pub fn for_root(root: &'a Value) -> Self {
        Self {
            definitions: root.get("definitions").and_then(Value::as_object),
        }
    }

    /// The definitions table, if any.
    pub fn definitions(&self) -> Option<&'a Map<String, Value>> {
        self.definitions
    }

    /// Look up a `$ref` pointer in the definitions table.
    ///
    /// # Errors
    ///
    /// `UnsupportedPointer` when the pointer is not rooted at
    /// `#/definitions/` or descends into an array, `MissingDefinition` when
    /// a token names nothing, `Circular` when intermediate `$ref`s loop.
    pub fn find_definition(&self, pointer: &str) -> Result<&'a Value, SchemaResolutionError> {
        self.find_definition_guarded(pointer, &mut Vec::new())
    }

    fn find_definition_guarded(
        &self,
        pointer: &str,
        seen: &mut Vec<String>,
    ) -> Result<&'a Value, SchemaResolutionError> {
        if seen.iter().any(|p| p == pointer) {
            return Err(SchemaResolutionError::Circular {
                pointer: pointer.to_string(),
            });
        }
        seen.push(pointer.to_string());

        let unsupported = || SchemaResolutionError::UnsupportedPointer {
            pointer: pointer.to_string(),
        };
        let missing = || SchemaResolutionError::MissingDefinition {
            pointer: pointer.to_string(),
        };

        let rest = pointer
            .strip_prefix(DEFINITIONS_PREFIX)
            .filter(|rest| !rest.is_empty())
            .ok_or_else(unsupported)?;
        let definitions = self.definitions.ok_or_else(missing)?;

        let mut tokens = rest.split('/').map(unescape_token);
        let first = tokens.next().ok_or_else(unsupported)?;
        let mut current = definitions.get(&first).ok_or_else(missing)?;

        for token in tokens {
            while let Some(inner) = current.get("$ref").and_then(Value::as_str) {
                current = self.find_definition_guarded(inner, seen)?;
            }
            current = match current {
                Value::Object(map) => map.get(&token).ok_or_else(missing)?,
                Value::Array(_) => return Err(unsupported()),
                _ => return Err(missing()),
            };
        }

        Ok(current)
    }

    /// Resolve one schema node against `data`.
    ///
    /// Returns a copy of `schema` when it carries neither `$ref` nor
    /// `dependencies`. Otherwise the returned node is free of `$ref` and
    /// `dependencies`; its children are left as written.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaResolutionError`] when a `$ref` cannot be followed.
    /// Malformed data never produces an error.
    pub fn resolve(&self, schema: &Value, data: &Value) -> Result<Value, SchemaResolutionError> {
        self.resolve_guarded(schema, data, &mut Vec::new())
    }

    fn resolve_guarded(
        &self,
        schema: &Value,
        data: &Value,
        chain: &mut Vec<String>,
    ) -> Result<Value, SchemaResolutionError> {
        let Value::Object(node) = schema else {
            return Ok(schema.clone());
        };

        if let Some(pointer) = node.get("$ref").and_then(Value::as_str) {
            if chain.iter().any(|p| p == pointer) {
                return Err(SchemaResolutionError::Circular {
                    pointer: pointer.to_string(),
                });
            }
            tracing::debug!(pointer, "following $ref");
            let target = self.find_definition(pointer)?;

            // Local siblings of `$ref` win over the referenced definition.
            let mut merged = target.as_object().cloned().unwrap_or_default();
            for (key, value) in node {
                if key != "$ref" {
                    merged.insert(key.clone(), value.clone());
                }
            }

            chain.push(pointer.to_string());
            let resolved = self.resolve_guarded(&Value::Object(merged), data, chain);
            chain.pop();
            return resolved;
        }

        if node.contains_key("dependencies") {
            let resolved = self.resolve_dependencies(node, data, chain)?;
            return self.resolve_guarded(&resolved, data, chain);
        }

        Ok(schema.clone())
    }

    fn resolve_dependencies(
        &self,
        node: &Map<String, Value>,
        data: &Value,
        chain: &mut Vec<String>,
    ) -> Result<Value, SchemaResolutionError> {
        let mut base = node.clone();
        let Some(Value::Object(dependencies)) = base.remove("dependencies") else {
            return Ok(Value::Object(base));
        };

        let mut resolved = Value::Object(base);
        for (key, dependency) in &dependencies {
            if data.get(key).is_none() {
                continue;
            }
            resolved = match dependency {
                Value::Array(names) => with_dependent_properties(&resolved, names),
                Value::Object(_) => {
                    self.with_dependent_schema(&resolved, data, key, dependency, chain)?
                }
                _ => resolved,
            };
        }
        Ok(resolved)
    }

    fn with_dependent_schema(
        &self,
        schema: &Value,
        data: &Value,
        key: &str,
        dependency: &Value,
        chain: &mut Vec<String>,
    ) -> Result<Value, SchemaResolutionError> {
        let Value::Object(mut dependent) = self.resolve_guarded(dependency, data, chain)? else {
            return Ok(schema.clone());
        };
        let one_of = dependent.remove("oneOf");
        let merged = merge_schemas(schema, &Value::Object(dependent));

        match one_of {
            None => Ok(merged),
            Some(Value::Array(branches)) => {
                self.with_exactly_one_branch(&merged, data, key, &branches, chain)
            }
            Some(other) => {
                tracing::warn!(
                    dependency = key,
                    found = %json_type_name(&other),
                    "ignoring oneOf in dependencies: expected an array"
                );
                Ok(merged)
            }
        }
    }

    fn with_exactly_one_branch(
        &self,
        schema: &Value,
        data: &Value,
        key: &str,
        branches: &[Value],
        chain: &mut Vec<String>,
    ) -> Result<Value, SchemaResolutionError> {
        let mut matching = Vec::new();
        for branch in branches {
            let branch = if branch.get("$ref").is_some() {
                Cow::Owned(self.resolve_guarded(branch, data, chain)?)
            } else {
                Cow::Borrowed(branch)
            };
            let Some(condition) = branch.get("properties").and_then(|p| p.get(key)) else {
                continue;
            };
            if self.condition_holds(key, condition, data) {
                matching.push(branch);
            }
        }

        if matching.len() != 1 {
            tracing::warn!(
                dependency = key,
                matches = matching.len(),
                "ignoring oneOf in dependencies because there isn't exactly one subschema that is valid"
            );
            return Ok(schema.clone());
        }

        let mut branch = matching
            .pop()
            .and_then(|b| b.as_object().cloned())
            .unwrap_or_default();
        if let Some(Value::Object(properties)) = branch.get_mut("properties") {
            properties.remove(key);
        }
        let branch = self.resolve_guarded(&Value::Object(branch), data, chain)?;
        Ok(merge_schemas(schema, &branch))
    }

    /// Whether `data[key]` satisfies a branch's condition schema.
    ///
    /// Conditions made only of `enum`, `const`, `type` and annotations are
    /// decided structurally. Anything else is checked with a compiled
    /// validator; a condition that does not compile is treated as not
    /// holding.
    fn condition_holds(&self, key: &str, condition: &Value, data: &Value) -> bool {
        if let Some(holds) = structural_condition(condition, data.get(key)) {
            return holds;
        }

        let mut condition_schema = json!({
            "type": "object",
            "properties": { key: condition },
        });
        if let Some(definitions) = self.definitions.filter(|_| mentions_ref(condition)) {
            condition_schema["definitions"] = Value::Object(definitions.clone());
        }

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        match opts.build(&condition_schema) {
            Ok(validator) => validator.is_valid(data),
            Err(e) => {
                tracing::warn!(dependency = key, error = %e, "dependency condition does not compile");
                false
            }
        }
    }

    /// Resolved schema of property `name` of an already-resolved object
    /// schema, against that property's data.
    ///
    /// Returns `None` when the property is not declared.
    pub fn property_schema(
        &self,
        resolved: &Value,
        name: &str,
        data: &Value,
    ) -> Result<Option<Value>, SchemaResolutionError> {
        resolved
            .get("properties")
            .and_then(|properties| properties.get(name))
            .map(|schema| self.resolve(schema, data))
            .transpose()
    }

    /// Resolved schema of element `index` of an already-resolved array
    /// schema, against that element's data.
    ///
    /// Returns `None` when no schema governs that index.
    pub fn item_schema(
        &self,
        resolved: &Value,
        index: usize,
        data: &Value,
    ) -> Result<Option<Value>, SchemaResolutionError> {
        raw_item_schema(resolved, index)
            .map(|schema| self.resolve(schema, data))
            .transpose()
    }
}

/// Resolve a root schema (using its own `definitions`) against `data`.
pub fn retrieve_schema(root: &Value, data: &Value) -> Result<Value, SchemaResolutionError> {
    SchemaResolver::for_root(root).resolve(root, data)
}

/// Unresolved schema governing element `index` of an array schema.
///
/// Single-schema `items` govern every index. Tuple `items` govern their own
/// positions; past the tuple, an object `additionalItems` applies.
pub fn raw_item_schema(schema: &Value, index: usize) -> Option<&Value> {
    match schema.get("items") {
        Some(Value::Array(tuple)) => tuple
            .get(index)
            .or_else(|| schema.get("additionalItems").filter(|v| v.is_object())),
        Some(single @ Value::Object(_)) => Some(single),
        _ => None,
    }
}

/// Whether `items` is the tuple (fixed positions) form.
pub fn is_fixed_items(schema: &Value) -> bool {
    matches!(
        schema.get("items"),
        Some(Value::Array(items)) if !items.is_empty() && items.iter().all(Value::is_object)
    )
}

/// The type tag of a schema, explicit or inferred.
///
/// An explicit `type` wins; in a list of types the first one other than
/// `null` is used. Otherwise `properties` implies `object`, `items` implies
/// `array`, and `enum` implies the type of its first value (`string` for an
/// empty enum). Returns `None` when nothing applies.
pub fn infer_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => return Some(t.as_str()),
        Some(Value::Array(types)) => {
            let mut names = types.iter().filter_map(Value::as_str);
            let first = names.clone().next();
            return names.find(|t| *t != "null").or(first);
        }
        _ => {}
    }
    if schema.get("properties").is_some() {
        return Some("object");
    }
    if schema.get("items").is_some() {
        return Some("array");
    }
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return Some(values.first().map(json_type_name).unwrap_or("string"));
    }
    None
}

/// JSON type name of a value, as JSON Schema spells it.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Keywords a condition may carry and still be decided without a validator.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    "enum",
    "const",
    "type",
    "title",
    "description",
    "default",
    "examples",
    "$comment",
];

/// Decide a condition from its `enum`, `const` and `type` alone.
///
/// Returns `None` when the condition uses any other keyword.
fn structural_condition(condition: &Value, value: Option<&Value>) -> Option<bool> {
    let Value::Object(keywords) = condition else {
        return None;
    };
    if keywords
        .keys()
        .any(|k| !STRUCTURAL_KEYWORDS.contains(&k.as_str()))
    {
        return None;
    }
    // `properties` holds vacuously for an absent property.
    let Some(value) = value else {
        return Some(true);
    };

    if let Some(expected) = keywords.get("const") {
        if !deep_equals(expected, value) {
            return Some(false);
        }
    }
    if let Some(allowed) = keywords.get("enum") {
        let allowed = allowed.as_array()?;
        if !allowed.iter().any(|candidate| deep_equals(candidate, value)) {
            return Some(false);
        }
    }
    match keywords.get("type") {
        None => Some(true),
        Some(Value::String(name)) => Some(has_type(value, name)),
        Some(Value::Array(names)) => {
            let names: Option<Vec<&str>> = names.iter().map(Value::as_str).collect();
            Some(names?.into_iter().any(|name| has_type(value, name)))
        }
        Some(_) => None,
    }
}

fn has_type(value: &Value, name: &str) -> bool {
    match (name, value) {
        ("integer", Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        ("number", Value::Number(_)) => true,
        _ => json_type_name(value) == name,
    }
}

fn mentions_ref(schema: &Value) -> bool {
    match schema {
        Value::Object(map) => map.contains_key("$ref") || map.values().any(mentions_ref),
        Value::Array(items) => items.iter().any(mentions_ref),
        _ => false,
    }
}

fn with_dependent_properties(schema: &Value, names: &[Value]) -> Value {
    merge_schemas(schema, &json!({ "required": names }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "connector": {
                    "type": "string",
                    "enum": ["aws", "gcp"],
                    "default": "aws"
                }
            },
            "dependencies": {
                "connector": {
                    "oneOf": [
                        {
                            "type": "object",
                            "properties": {
                                "connector": {"type": "string", "enum": ["aws"]},
                                "key_aws": {"title": "Key AWS", "type": "string"}
                            }
                        },
                        {
                            "type": "object",
                            "properties": {
                                "connector": {"type": "string", "enum": ["gcp"]},
                                "key_gcp": {"title": "Key GCP", "type": "string"}
                            }
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_plain_schema_is_unchanged() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "array", "items": {"type": "number"}}}
        });
        let resolved = SchemaResolver::default().resolve(&schema, &json!({"a": "x"})).unwrap();
        assert_eq!(resolved, schema);
    }

    #[test]
    fn test_single_definition_reference() {
        let schema = json!({
            "definitions": {"testdef": {"title": "From definition", "type": "string"}},
            "$ref": "#/definitions/testdef"
        });
        let resolved = retrieve_schema(&schema, &Value::Null).unwrap();
        assert_eq!(resolved["title"], "From definition");
        assert_eq!(resolved["type"], "string");
        assert!(resolved.get("$ref").is_none());
    }

    #[test]
    fn test_local_siblings_override_definition() {
        let definitions = json!({"testdef": {"title": "From definition", "type": "string"}});
        let defs = definitions.as_object().unwrap();
        let resolver = SchemaResolver::new(defs);
        let resolved = resolver
            .resolve(&json!({"$ref": "#/definitions/testdef", "title": "Local"}), &Value::Null)
            .unwrap();
        assert_eq!(resolved, json!({"title": "Local", "type": "string"}));
    }

    #[test]
    fn test_reference_to_deep_definition() {
        let definitions = json!({
            "testdef": {
                "type": "object",
                "properties": {"bar": {"title": "From deep definition", "type": "string"}}
            }
        });
        let resolver = SchemaResolver::new(definitions.as_object().unwrap());
        let resolved = resolver
            .resolve(&json!({"$ref": "#/definitions/testdef/properties/bar"}), &Value::Null)
            .unwrap();
        assert_eq!(resolved["title"], "From deep definition");
    }

    #[test]
    fn test_intermediate_refs_are_followed() {
        let definitions = json!({
            "alias": {"$ref": "#/definitions/real"},
            "real": {"type": "object", "properties": {"x": {"type": "integer"}}}
        });
        let resolver = SchemaResolver::new(definitions.as_object().unwrap());
        let found = resolver.find_definition("#/definitions/alias/properties/x").unwrap();
        assert_eq!(found, &json!({"type": "integer"}));
    }

    #[test]
    fn test_escaped_definition_names() {
        let definitions = json!({"a/b": {"type": "boolean"}, "c~d": {"type": "null"}});
        let resolver = SchemaResolver::new(definitions.as_object().unwrap());
        assert_eq!(resolver.find_definition("#/definitions/a~1b").unwrap()["type"], "boolean");
        assert_eq!(resolver.find_definition("#/definitions/c~0d").unwrap()["type"], "null");
    }

    #[test]
    fn test_missing_definition_fails() {
        let schema = json!({"$ref": "#/definitions/nonexistent"});
        let err = SchemaResolver::default().resolve(&schema, &Value::Null).unwrap_err();
        assert_eq!(
            err,
            SchemaResolutionError::MissingDefinition {
                pointer: "#/definitions/nonexistent".to_string()
            }
        );
    }

    #[test]
    fn test_unsupported_pointers_fail() {
        let definitions = json!({"list": {"items": [{"type": "string"}]}});
        let resolver = SchemaResolver::new(definitions.as_object().unwrap());
        for pointer in ["#/properties/foo", "http://example.com/schema", "#/definitions/", "#/definitions/list/items/0"] {
            let err = resolver.find_definition(pointer).unwrap_err();
            assert!(
                matches!(err, SchemaResolutionError::UnsupportedPointer { .. }),
                "{pointer}: {err}"
            );
        }
    }

    #[test]
    fn test_circular_ref_chain_fails() {
        let definitions = json!({
            "a": {"$ref": "#/definitions/b"},
            "b": {"$ref": "#/definitions/a"}
        });
        let resolver = SchemaResolver::new(definitions.as_object().unwrap());
        let err = resolver
            .resolve(&json!({"$ref": "#/definitions/a"}), &Value::Null)
            .unwrap_err();
        assert!(matches!(err, SchemaResolutionError::Circular { .. }), "{err}");
    }

    #[test]
    fn test_recursive_schema_resolves_lazily() {
        let schema = json!({
            "$ref": "#/definitions/node",
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "children": {"type": "array", "items": {"$ref": "#/definitions/node"}}
                    }
                }
            }
        });
        let resolver = SchemaResolver::for_root(&schema);
        let root = resolver.resolve(&schema, &Value::Null).unwrap();
        let children = resolver
            .property_schema(&root, "children", &Value::Null)
            .unwrap()
            .unwrap();
        assert_eq!(children["items"], json!({"$ref": "#/definitions/node"}));
        let child = resolver.item_schema(&children, 0, &json!({})).unwrap().unwrap();
        assert_eq!(child["properties"]["name"], json!({"type": "string"}));
    }

    #[test]
    fn test_definition_applies_with_sibling_type() {
        let schema = json!({
            "type": "object",
            "properties": {
                "childObj": {"type": "object", "$ref": "#/definitions/childObj"}
            },
            "definitions": {
                "childObj": {"type": "object", "properties": {"otherName": {"type": "string"}}}
            }
        });
        let resolver = SchemaResolver::for_root(&schema);
        let child = resolver
            .property_schema(&schema, "childObj", &Value::Null)
            .unwrap()
            .unwrap();
        assert_eq!(child["properties"]["otherName"]["type"], "string");
    }

    #[test]
    fn test_one_of_dependency_selects_matching_branch() {
        let schema = connector_schema();
        let resolved = SchemaResolver::default()
            .resolve(&schema, &json!({"connector": "aws"}))
            .unwrap();
        let properties = resolved["properties"].as_object().unwrap();
        assert!(properties.contains_key("key_aws"));
        assert!(!properties.contains_key("key_gcp"));
        // The condition property keeps its own declaration.
        assert_eq!(properties["connector"]["enum"], json!(["aws", "gcp"]));
        assert!(resolved.get("dependencies").is_none());
    }

    #[test]
    fn test_one_of_dependency_other_branch() {
        let resolved = SchemaResolver::default()
            .resolve(&connector_schema(), &json!({"connector": "gcp"}))
            .unwrap();
        let properties = resolved["properties"].as_object().unwrap();
        assert!(properties.contains_key("key_gcp"));
        assert!(!properties.contains_key("key_aws"));
    }

    #[test]
    fn test_one_of_dependency_without_match_merges_nothing() {
        let resolved = SchemaResolver::default()
            .resolve(&connector_schema(), &json!({"connector": "azure"}))
            .unwrap();
        let properties = resolved["properties"].as_object().unwrap();
        assert_eq!(properties.len(), 1);
    }

    #[test]
    fn test_dependency_ignored_when_property_absent() {
        let resolved = SchemaResolver::default()
            .resolve(&connector_schema(), &json!({}))
            .unwrap();
        assert_eq!(resolved["properties"].as_object().unwrap().len(), 1);
        assert!(resolved.get("dependencies").is_none());
    }

    #[test]
    fn test_schema_dependency_merged_unconditionally() {
        let schema = json!({
            "type": "object",
            "properties": {"credit_card": {"type": "number"}},
            "dependencies": {
                "credit_card": {
                    "properties": {"billing_address": {"type": "string"}},
                    "required": ["billing_address"]
                }
            }
        });
        let resolved = SchemaResolver::default()
            .resolve(&schema, &json!({"credit_card": 1234}))
            .unwrap();
        assert_eq!(resolved["properties"]["billing_address"]["type"], "string");
        assert_eq!(resolved["required"], json!(["billing_address"]));
    }

    #[test]
    fn test_property_dependency_extends_required() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}, "a": {"type": "string"}, "b": {"type": "string"}},
            "dependencies": {"a": ["b", "name"]}
        });
        let resolved = SchemaResolver::default().resolve(&schema, &json!({"a": "x"})).unwrap();
        assert_eq!(resolved["required"], json!(["name", "b"]));
    }

    #[test]
    fn test_dependency_branch_by_ref() {
        let schema = json!({
            "type": "object",
            "properties": {"kind": {"type": "string", "enum": ["a", "b"]}},
            "definitions": {
                "branchA": {"properties": {"kind": {"enum": ["a"]}, "onlyA": {"type": "boolean"}}}
            },
            "dependencies": {
                "kind": {
                    "oneOf": [
                        {"$ref": "#/definitions/branchA"},
                        {"properties": {"kind": {"enum": ["b"]}, "onlyB": {"type": "boolean"}}}
                    ]
                }
            }
        });
        let resolved = retrieve_schema(&schema, &json!({"kind": "a"})).unwrap();
        assert!(resolved["properties"].get("onlyA").is_some());
        assert!(resolved["properties"].get("onlyB").is_none());
    }

    #[test]
    fn test_one_of_dependency_ambiguous_merges_nothing() {
        let schema = json!({
            "type": "object",
            "properties": {"connector": {"type": "string"}},
            "dependencies": {
                "connector": {
                    "oneOf": [
                        {"properties": {"connector": {"enum": ["aws", "gcp"]}, "region": {"type": "string"}}},
                        {"properties": {"connector": {"enum": ["aws"]}, "key": {"type": "string"}}}
                    ]
                }
            }
        });
        let resolved = SchemaResolver::default()
            .resolve(&schema, &json!({"connector": "aws"}))
            .unwrap();
        assert_eq!(resolved["properties"], json!({"connector": {"type": "string"}}));

        let resolved = SchemaResolver::default()
            .resolve(&schema, &json!({"connector": "gcp"}))
            .unwrap();
        assert!(resolved["properties"].get("region").is_some());
        assert!(resolved["properties"].get("key").is_none());
    }

    #[test]
    fn test_one_of_dependency_const_condition() {
        let schema = json!({
            "type": "object",
            "properties": {"mode": {"type": "string"}},
            "dependencies": {
                "mode": {
                    "oneOf": [
                        {"properties": {"mode": {"const": "simple"}, "size": {"type": "integer"}}},
                        {"properties": {"mode": {"const": "advanced"}, "layout": {"type": "string"}}}
                    ]
                }
            }
        });
        let resolved = SchemaResolver::default()
            .resolve(&schema, &json!({"mode": "advanced"}))
            .unwrap();
        assert!(resolved["properties"].get("layout").is_some());
        assert!(resolved["properties"].get("size").is_none());
    }

    #[test]
    fn test_one_of_dependency_condition_beyond_enum() {
        let schema = json!({
            "type": "object",
            "properties": {"code": {"type": "string"}},
            "dependencies": {
                "code": {
                    "oneOf": [
                        {"properties": {"code": {"pattern": "^[0-9]+$"}, "numeric": {"type": "boolean"}}},
                        {"properties": {"code": {"pattern": "^[a-z]+$"}, "alpha": {"type": "boolean"}}}
                    ]
                }
            }
        });
        let resolved = SchemaResolver::default()
            .resolve(&schema, &json!({"code": "abc"}))
            .unwrap();
        assert!(resolved["properties"].get("alpha").is_some());
        assert!(resolved["properties"].get("numeric").is_none());
    }

    #[test]
    fn test_structural_condition() {
        let aws = json!("aws");
        assert_eq!(structural_condition(&json!({"enum": ["aws"]}), Some(&aws)), Some(true));
        assert_eq!(structural_condition(&json!({"const": "gcp"}), Some(&aws)), Some(false));
        assert_eq!(
            structural_condition(&json!({"type": "string", "title": "Cloud"}), Some(&aws)),
            Some(true)
        );
        assert_eq!(structural_condition(&json!({"type": "integer"}), Some(&json!(2.0))), Some(true));
        assert_eq!(structural_condition(&json!({"enum": [1]}), Some(&json!(1.0))), Some(true));
        assert_eq!(structural_condition(&json!({"enum": ["aws"]}), None), Some(true));
        assert_eq!(structural_condition(&json!({"minLength": 2}), Some(&aws)), None);
    }

    #[test]
    fn test_self_referencing_dependency_is_circular() {
        let schema = json!({
            "$ref": "#/definitions/node",
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {"x": {"type": "string"}},
                    "dependencies": {"x": {"$ref": "#/definitions/node"}}
                }
            }
        });
        let err = retrieve_schema(&schema, &json!({"x": "a"})).unwrap_err();
        assert_eq!(
            err,
            SchemaResolutionError::Circular {
                pointer: "#/definitions/node".to_string()
            }
        );
        // Without the dependent property the dependency never applies.
        assert!(retrieve_schema(&schema, &json!({})).is_ok());
    }

    #[test]
    fn test_self_referencing_branch_is_circular() {
        let schema = json!({
            "$ref": "#/definitions/node",
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {"kind": {"type": "string"}},
                    "dependencies": {
                        "kind": {"oneOf": [{"$ref": "#/definitions/node"}]}
                    }
                }
            }
        });
        let err = retrieve_schema(&schema, &json!({"kind": "a"})).unwrap_err();
        assert!(matches!(err, SchemaResolutionError::Circular { .. }), "{err}");
    }

    #[test]
    fn test_infer_type() {
        assert_eq!(infer_type(&json!({"type": "number"})), Some("number"));
        assert_eq!(infer_type(&json!({"type": ["null", "string"]})), Some("string"));
        assert_eq!(infer_type(&json!({"type": ["null"]})), Some("null"));
        assert_eq!(infer_type(&json!({"properties": {}})), Some("object"));
        assert_eq!(infer_type(&json!({"items": {}})), Some("array"));
        assert_eq!(infer_type(&json!({"enum": [1, 2]})), Some("number"));
        assert_eq!(infer_type(&json!({"enum": [true]})), Some("boolean"));
        assert_eq!(infer_type(&json!({"enum": []})), Some("string"));
        assert_eq!(infer_type(&json!({"title": "untyped"})), None);
    }

    #[test]
    fn test_item_schema_tuple_and_additional() {
        let schema = json!({
            "type": "array",
            "items": [{"type": "string"}, {"type": "number"}],
            "additionalItems": {"type": "boolean"}
        });
        assert_eq!(raw_item_schema(&schema, 0), Some(&json!({"type": "string"})));
        assert_eq!(raw_item_schema(&schema, 1), Some(&json!({"type": "number"})));
        assert_eq!(raw_item_schema(&schema, 7), Some(&json!({"type": "boolean"})));
        assert!(is_fixed_items(&schema));

        let closed = json!({"items": [{"type": "string"}]});
        assert_eq!(raw_item_schema(&closed, 1), None);
        assert!(!is_fixed_items(&json!({"items": {"type": "string"}})));
    }
}
