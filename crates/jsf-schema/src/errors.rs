//! # Error Trees
//!
//! Reshapes a flat list of validation failures into an [`ErrorSchema`]: a
//! tree mirroring the data, where each node holds the failures local to
//! that exact path and one child per nested property or index in error.
//!
//! ## Invariants
//!
//! - Every node path is reachable in the resolved schema the tree was built
//!   against. A failure whose path is not (an undeclared property, an index
//!   into a closed tuple) is kept on the root node instead of dropped.
//! - A node with no local failures and no non-empty children is absent: it
//!   is neither serialized nor walked, and [`ErrorSchema::prune`] removes it.
//! - [`ErrorSchema::flatten`] walks depth first, local failures
//!   before children, indices numerically before property names in name
//!   order. The first failure of the flat list is therefore a function of
//!   the schema and data alone.
//!
//! Serialized, a tree reads `{"field1": {"__errors": ["should be number"]}}`.

use std::collections::BTreeMap;

use jsf_core::path::{lookup_path, to_property};
use jsf_core::{DataPath, PathSegment};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::resolve::{infer_type, raw_item_schema, SchemaResolver};

/// Key holding the local messages of a node in the serialized tree.
pub const ERRORS_KEY: &str = "__errors";

/// Failure kind given to errors added by custom validation.
pub const CUSTOM_KIND: &str = "custom";

/// One validation failure, independent of the validator that found it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location of the failing value, root first.
    pub path: DataPath,
    /// Human-readable message, e.g. `should be number`.
    pub message: String,
    /// Machine-readable failure kind, usually the schema keyword.
    pub kind: String,
    /// Keyword parameters, e.g. `{"limit": 4}`.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl ValidationError {
    /// Build a failure with no parameters.
    pub fn new(path: DataPath, message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            kind: kind.into(),
            params: Map::new(),
        }
    }

    /// Add one keyword parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// The path in property-access notation, `.level1[1]`.
    pub fn property(&self) -> String {
        to_property(&self.path)
    }

    /// `"<property> <message>"`, the one-line form used in logs.
    pub fn stack(&self) -> String {
        format!("{} {}", self.property(), self.message).trim().to_string()
    }
}

/// Tree of validation failures mirroring the shape of the form data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorSchema {
    errors: Vec<ValidationError>,
    children: BTreeMap<PathSegment, ErrorSchema>,
}

impl ErrorSchema {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a flat list, checking each path against `schema`
    /// resolved for `data`.
    pub fn from_errors(
        errors: impl IntoIterator<Item = ValidationError>,
        schema: &Value,
        data: &Value,
        resolver: SchemaResolver<'_>,
    ) -> Self {
        let mut tree = Self::new();
        for error in errors {
            tree.place(error, schema, data, resolver);
        }
        tree.prune();
        tree
    }

    /// Place one failure at its path, or on the root when its path is not
    /// reachable in `schema`.
    pub fn place(
        &mut self,
        error: ValidationError,
        schema: &Value,
        data: &Value,
        resolver: SchemaResolver<'_>,
    ) {
        if is_reachable(schema, data, &error.path, resolver) {
            self.insert(error);
        } else {
            tracing::debug!(
                path = %error.property(),
                "error path not reachable in schema, attaching to root"
            );
            self.errors.push(error);
        }
    }

    /// Append a failure at exactly its own path, creating nodes on the way.
    pub fn insert(&mut self, error: ValidationError) {
        let node = self.node_mut(&error.path);
        node.errors.push(error);
    }

    fn node_mut(&mut self, path: &[PathSegment]) -> &mut ErrorSchema {
        path.iter().fold(self, |node, segment| {
            node.children.entry(segment.clone()).or_default()
        })
    }

    /// Failures local to this node.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Messages local to this node, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.message.as_str()).collect()
    }

    /// Non-empty child node for a property or index.
    pub fn get(&self, segment: impl Into<PathSegment>) -> Option<&ErrorSchema> {
        self.children
            .get(&segment.into())
            .filter(|child| !child.is_empty())
    }

    /// Non-empty node at a nested path.
    pub fn at(&self, path: &[PathSegment]) -> Option<&ErrorSchema> {
        path.iter()
            .try_fold(self, |node, segment| node.get(segment.clone()))
    }

    /// Child nodes that hold failures, in walk order.
    pub fn children(&self) -> impl Iterator<Item = (&PathSegment, &ErrorSchema)> {
        self.children.iter().filter(|(_, child)| !child.is_empty())
    }

    /// True when no failure is recorded anywhere in the tree.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.children.values().all(ErrorSchema::is_empty)
    }

    /// Total number of failures in the tree.
    pub fn len(&self) -> usize {
        self.errors.len() + self.children.values().map(ErrorSchema::len).sum::<usize>()
    }

    /// Remove nodes that hold no failure.
    pub fn prune(&mut self) {
        self.children.retain(|_, child| {
            child.prune();
            !child.is_empty()
        });
    }

    /// Flatten depth first: local failures, then children in segment order.
    pub fn flatten(&self) -> Vec<ValidationError> {
        let mut list = Vec::with_capacity(self.len());
        self.collect_into(&mut list);
        list
    }

    fn collect_into(&self, list: &mut Vec<ValidationError>) {
        list.extend(self.errors.iter().cloned());
        for (_, child) in self.children() {
            child.collect_into(list);
        }
    }

    fn stacks_into(&self, field: &str, entries: &mut Vec<ErrorListEntry>) {
        entries.extend(self.errors.iter().map(|e| ErrorListEntry {
            stack: format!("{field}: {}", e.message),
        }));
        for (segment, child) in self.children() {
            child.stacks_into(&segment.as_key(), entries);
        }
    }

    /// Combine two trees: local failures are concatenated (left first),
    /// children merged recursively. Neither input is modified.
    pub fn merge(&self, other: &ErrorSchema) -> ErrorSchema {
        let mut merged = self.clone();
        merged.errors.extend(other.errors.iter().cloned());
        for (segment, child) in &other.children {
            let combined = match self.children.get(segment) {
                Some(existing) => existing.merge(child),
                None => child.clone(),
            };
            merged.children.insert(segment.clone(), combined);
        }
        merged
    }

    fn from_value(value: &Value, path: &mut DataPath) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("expected an object error node, found {value}"));
        };
        let mut node = ErrorSchema::new();
        for (key, child) in map {
            if key == ERRORS_KEY {
                let messages = child
                    .as_array()
                    .ok_or_else(|| format!("{ERRORS_KEY} must be an array, found {child}"))?;
                for message in messages {
                    let message = message
                        .as_str()
                        .ok_or_else(|| format!("error messages must be strings, found {message}"))?;
                    node.errors
                        .push(ValidationError::new(path.clone(), message, CUSTOM_KIND));
                }
            } else {
                let segment = PathSegment::from_token(key);
                path.push(segment.clone());
                let parsed = ErrorSchema::from_value(child, path);
                path.pop();
                node.children.insert(segment, parsed?);
            }
        }
        Ok(node)
    }
}

impl Serialize for ErrorSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children: Vec<_> = self.children().collect();
        let has_errors = !self.errors.is_empty();
        let mut map = serializer.serialize_map(Some(children.len() + usize::from(has_errors)))?;
        if has_errors {
            map.serialize_entry(ERRORS_KEY, &self.messages())?;
        }
        for (segment, child) in children {
            map.serialize_entry(&segment.as_key(), child)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ErrorSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ErrorSchema::from_value(&value, &mut Vec::new()).map_err(D::Error::custom)
    }
}

/// One line of the top-level error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorListEntry {
    /// `"<field>: <message>"`, where the field is the key of the node the
    /// message sits on and the root is called `root`.
    pub stack: String,
}

/// The display list for an error tree, in [`ErrorSchema::flatten`] order.
pub fn to_error_list(error_schema: &ErrorSchema) -> Vec<ErrorListEntry> {
    let mut entries = Vec::with_capacity(error_schema.len());
    error_schema.stacks_into("root", &mut entries);
    entries
}

/// Handle given to custom validation: add failures to a tree that already
/// holds the validator's failures.
pub struct ErrorCollector<'a> {
    tree: &'a mut ErrorSchema,
    schema: &'a Value,
    data: &'a Value,
    resolver: SchemaResolver<'a>,
}

impl<'a> ErrorCollector<'a> {
    /// Collector over `tree`, placing against `schema` resolved for `data`.
    pub fn new(
        tree: &'a mut ErrorSchema,
        schema: &'a Value,
        data: &'a Value,
        resolver: SchemaResolver<'a>,
    ) -> Self {
        Self {
            tree,
            schema,
            data,
            resolver,
        }
    }

    /// Record a failure at `path`. Unreachable paths land on the root.
    pub fn add_error(&mut self, path: &[PathSegment], message: impl Into<String>) {
        let error = ValidationError::new(path.to_vec(), message, CUSTOM_KIND);
        self.tree.place(error, self.schema, self.data, self.resolver);
    }

    /// The tree as built so far.
    pub fn tree(&self) -> &ErrorSchema {
        self.tree
    }

    /// The data being validated.
    pub fn data(&self) -> &Value {
        self.data
    }
}

/// Whether `path` names a field of `schema` resolved step by step against
/// `data`.
///
/// Declared properties are reachable, and so is any property of an object
/// with an explicit `additionalProperties` schema (or `true`) or with
/// `patternProperties`. Indices are reachable where an item schema governs
/// them. A `$ref` that fails to resolve makes the rest of the path
/// unreachable.
pub fn is_reachable(
    schema: &Value,
    data: &Value,
    path: &[PathSegment],
    resolver: SchemaResolver<'_>,
) -> bool {
    let Ok(mut current) = resolver.resolve(schema, data) else {
        return false;
    };
    for (depth, segment) in path.iter().enumerate() {
        let Some(next) = child_schema(&current, segment) else {
            return false;
        };
        let child_data = lookup_path(data, &path[..=depth]).unwrap_or(&Value::Null);
        current = match resolver.resolve(&next, child_data) {
            Ok(resolved) => resolved,
            Err(_) => return false,
        };
    }
    true
}

fn child_schema(schema: &Value, segment: &PathSegment) -> Option<Value> {
    match segment {
        PathSegment::Index(index) if infer_type(schema) == Some("array") => {
            raw_item_schema(schema, *index).cloned()
        }
        PathSegment::Index(index) => property_schema(schema, &index.to_string()),
        PathSegment::Key(name) => property_schema(schema, name),
    }
}

fn property_schema(schema: &Value, name: &str) -> Option<Value> {
    if let Some(declared) = schema.get("properties").and_then(|p| p.get(name)) {
        return Some(declared.clone());
    }
    if schema.get("patternProperties").is_some() {
        return Some(Value::Object(Map::new()));
    }
    match schema.get("additionalProperties") {
        Some(additional @ Value::Object(_)) => Some(additional.clone()),
        Some(Value::Bool(true)) => Some(Value::Object(Map::new())),
        _ => None,
    }
}
