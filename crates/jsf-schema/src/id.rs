//! # Id Trees
//!
//! Derives one stable string id per addressable field. Ids are built from
//! the path to the field, joined with `_`, under a root id:
//!
//! ```text
//! root            the form itself
//! root_a          property `a`
//! root_a_b        property `b` of `a`
//! root_list_0     first element of array `list`
//! ```
//!
//! Object properties get ids whether or not the data holds them. Array
//! elements get ids only for the elements present in the data (and for
//! every slot of a fixed tuple). The schema is resolved against the data
//! first, so properties added by a `dependencies` branch only get ids while
//! that branch is selected.

use std::collections::BTreeMap;

use jsf_core::{PathSegment, SchemaResolutionError};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::resolve::{infer_type, is_fixed_items, raw_item_schema, SchemaResolver};

/// Root id used when neither an override nor a prefix is given.
pub const DEFAULT_ID_PREFIX: &str = "root";

/// Joins a parent id and a child path segment.
pub const ID_SEPARATOR: &str = "_";

/// One node of an id tree.
///
/// Serializes as `{"$id": "root", "a": {"$id": "root_a"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdSchema {
    /// The field id. Empty only in partial override trees, where it means
    /// "keep the generated id".
    pub id: String,
    /// Ids of nested fields, by property name or array index.
    pub children: BTreeMap<PathSegment, IdSchema>,
}

impl IdSchema {
    /// A leaf node.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: BTreeMap::new(),
        }
    }

    /// Child node for a property or index.
    pub fn get(&self, segment: impl Into<PathSegment>) -> Option<&IdSchema> {
        self.children.get(&segment.into())
    }

    /// Node at a nested path.
    pub fn at(&self, path: &[PathSegment]) -> Option<&IdSchema> {
        path.iter()
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Number of ids in the tree, this node included.
    pub fn len(&self) -> usize {
        1 + self.children.values().map(IdSchema::len).sum::<usize>()
    }

    /// Always false: a tree holds at least its own id.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Combine a generated tree with a partial override tree.
    ///
    /// The override wins per node: a non-empty override id replaces the
    /// generated one. Children present on both sides are merged
    /// recursively, children present on one side are kept. Neither input
    /// is modified.
    pub fn merge(&self, overrides: &IdSchema) -> IdSchema {
        let mut merged = self.clone();
        if !overrides.id.is_empty() {
            merged.id = overrides.id.clone();
        }
        for (segment, child) in &overrides.children {
            let combined = match self.children.get(segment) {
                Some(existing) => existing.merge(child),
                None => child.clone(),
            };
            merged.children.insert(segment.clone(), combined);
        }
        merged
    }

    fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Object(map) = value else {
            return Err(format!("expected an object id node, found {value}"));
        };
        let mut node = IdSchema::default();
        for (key, child) in map {
            if key == "$id" {
                node.id = child
                    .as_str()
                    .ok_or_else(|| format!("$id must be a string, found {child}"))?
                    .to_string();
            } else {
                node.children
                    .insert(PathSegment::from_token(key), IdSchema::from_value(child)?);
            }
        }
        Ok(node)
    }
}

impl Serialize for IdSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len() + 1))?;
        map.serialize_entry("$id", &self.id)?;
        for (segment, child) in &self.children {
            map.serialize_entry(&segment.as_key(), child)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IdSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        IdSchema::from_value(&value).map_err(D::Error::custom)
    }
}

/// Build the id tree for `schema` against `data`.
///
/// The root id is `root_id` when given (the `ui:rootFieldId` directive),
/// else `id_prefix`, else [`DEFAULT_ID_PREFIX`].
///
/// # Errors
///
/// Returns [`SchemaResolutionError`] when a `$ref` met on the way cannot be
/// resolved.
pub fn to_id_schema(
    schema: &Value,
    root_id: Option<&str>,
    resolver: SchemaResolver<'_>,
    data: &Value,
    id_prefix: Option<&str>,
) -> Result<IdSchema, SchemaResolutionError> {
    let id = root_id.or(id_prefix).unwrap_or(DEFAULT_ID_PREFIX);
    IdWalk {
        resolver,
        expanding: Vec::new(),
    }
    .walk(schema, id.to_string(), Some(data))
}

struct IdWalk<'a> {
    resolver: SchemaResolver<'a>,
    expanding: Vec<String>,
}

impl IdWalk<'_> {
    fn walk(
        &mut self,
        schema: &Value,
        id: String,
        data: Option<&Value>,
    ) -> Result<IdSchema, SchemaResolutionError> {
        let pointer = schema.get("$ref").and_then(Value::as_str).map(str::to_string);
        if let Some(pointer) = &pointer {
            if data.is_none() && self.expanding.contains(pointer) {
                return Ok(IdSchema::new(id));
            }
            self.expanding.push(pointer.clone());
        }

        let node = self.walk_resolved(schema, id, data);

        if pointer.is_some() {
            self.expanding.pop();
        }
        node
    }

    fn walk_resolved(
        &mut self,
        schema: &Value,
        id: String,
        data: Option<&Value>,
    ) -> Result<IdSchema, SchemaResolutionError> {
        let resolved = self.resolver.resolve(schema, data.unwrap_or(&Value::Null))?;
        let mut node = IdSchema::new(id);

        match infer_type(&resolved) {
            Some("object") => {
                if let Some(Value::Object(properties)) = resolved.get("properties") {
                    for (name, property_schema) in properties {
                        let child_id = format!("{}{ID_SEPARATOR}{name}", node.id);
                        let child_data = data.and_then(|d| d.get(name.as_str()));
                        let child = self.walk(property_schema, child_id, child_data)?;
                        node.children.insert(PathSegment::Key(name.clone()), child);
                    }
                }
            }
            Some("array") => {
                let present = data.and_then(Value::as_array).map_or(0, Vec::len);
                let fixed = if is_fixed_items(&resolved) {
                    resolved["items"].as_array().map_or(0, Vec::len)
                } else {
                    0
                };
                for index in 0..present.max(fixed) {
                    let Some(item_schema) = raw_item_schema(&resolved, index) else {
                        continue;
                    };
                    let child_id = format!("{}{ID_SEPARATOR}{index}", node.id);
                    let child_data = data.and_then(|d| d.get(index));
                    let child = self.walk(item_schema, child_id, child_data)?;
                    node.children.insert(PathSegment::Index(index), child);
                }
            }
            _ => {}
        }

        Ok(node)
    }
}
