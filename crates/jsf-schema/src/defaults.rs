//! # Default-State Synthesis
//!
//! Computes a complete form value from a schema and whatever data the
//! caller already has.
//!
//! ## Rules
//!
//! - Caller data is never removed and a defined value is never replaced by
//!   a schema default. Only gaps are filled: missing properties, and array
//!   slots below `minItems` or inside a fixed tuple.
//! - Absence is not a zero value. A scalar with no data and no `default`
//!   stays absent (`None`); `0`, `false`, `""` and `null` are all defined.
//! - Data whose shape disagrees with the schema (a string where an object
//!   is declared) is returned as is.
//! - Synthesis is idempotent: feeding the result back in returns it
//!   unchanged.
//!
//! ## Recursion
//!
//! A `$ref` that is already being expanded higher up the stack is not
//! expanded again unless the caller supplied data at that position. Data
//! that only exists because of a schema `default` does not count: it is
//! kept as written, without further filling. A tree-shaped schema therefore
//! produces exactly as many levels as the caller's data has.

use jsf_core::{deep_merge, SchemaResolutionError};
use serde_json::{Map, Value};

use crate::resolve::{infer_type, is_fixed_items, raw_item_schema, SchemaResolver};

/// Upper bound on re-resolution rounds for one object.
///
/// Each round can only add properties, so real schemas settle within one
/// round per `dependencies` entry.
const MAX_DEPENDENCY_ROUNDS: usize = 32;

/// Synthesize the default value of `schema` on top of `data`.
///
/// # Errors
///
/// Returns [`SchemaResolutionError`] when a `$ref` met on the way cannot be
/// resolved.
pub fn synthesize(
    schema: &Value,
    data: Option<&Value>,
    resolver: SchemaResolver<'_>,
) -> Result<Option<Value>, SchemaResolutionError> {
    Synthesis::new(resolver).run(schema, data, data)
}

/// Default form state for a root schema, resolved against its own
/// `definitions`.
pub fn default_form_state(
    root: &Value,
    data: Option<&Value>,
) -> Result<Option<Value>, SchemaResolutionError> {
    synthesize(root, data, SchemaResolver::for_root(root))
}

struct Synthesis<'a> {
    resolver: SchemaResolver<'a>,
    /// `$ref` pointers currently being expanded, outermost first.
    expanding: Vec<String>,
}

impl<'a> Synthesis<'a> {
    fn new(resolver: SchemaResolver<'a>) -> Self {
        Self {
            resolver,
            expanding: Vec::new(),
        }
    }

    /// `data` is the value at this position so far, including anything a
    /// schema `default` contributed higher up. `caller` is the part of it
    /// the caller supplied.
    fn run(
        &mut self,
        schema: &Value,
        data: Option<&Value>,
        caller: Option<&Value>,
    ) -> Result<Option<Value>, SchemaResolutionError> {
        let pointer = schema.get("$ref").and_then(Value::as_str).map(str::to_string);
        if let Some(pointer) = &pointer {
            if caller.is_none() && self.expanding.contains(pointer) {
                tracing::debug!(pointer = %pointer, "stopping recursive $ref without caller data");
                return Ok(data.cloned());
            }
            self.expanding.push(pointer.clone());
        }

        let result = self.run_resolved(schema, data, caller);

        if pointer.is_some() {
            self.expanding.pop();
        }
        result
    }

    fn run_resolved(
        &mut self,
        schema: &Value,
        data: Option<&Value>,
        caller: Option<&Value>,
    ) -> Result<Option<Value>, SchemaResolutionError> {
        let resolved = self.resolver.resolve(schema, data.unwrap_or(&Value::Null))?;
        match infer_type(&resolved) {
            Some("object") => self.object(schema, resolved, data, caller),
            Some("array") => self.array(&resolved, data, caller),
            _ => Ok(data.cloned().or_else(|| resolved.get("default").cloned())),
        }
    }

    fn object(
        &mut self,
        schema: &Value,
        resolved: Value,
        data: Option<&Value>,
        caller: Option<&Value>,
    ) -> Result<Option<Value>, SchemaResolutionError> {
        let supplied = match data {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => return Ok(Some(other.clone())),
            None => Map::new(),
        };
        let mut current = match resolved.get("default") {
            Some(default @ Value::Object(_)) => match deep_merge(default, &Value::Object(supplied)) {
                Value::Object(merged) => merged,
                _ => Map::new(),
            },
            _ => supplied,
        };

        // Filling properties can switch on `dependencies`, which can declare
        // more properties. Re-resolve until the schema stops changing.
        let mut effective = resolved;
        for _ in 0..MAX_DEPENDENCY_ROUNDS {
            current = self.fill_properties(&effective, current, caller)?;
            let next = self.resolver.resolve(schema, &Value::Object(current.clone()))?;
            if next == effective {
                break;
            }
            effective = next;
        }

        Ok(Some(Value::Object(current)))
    }

    fn fill_properties(
        &mut self,
        schema: &Value,
        current: Map<String, Value>,
        caller: Option<&Value>,
    ) -> Result<Map<String, Value>, SchemaResolutionError> {
        let Some(Value::Object(properties)) = schema.get("properties") else {
            return Ok(current);
        };
        let mut filled = current.clone();
        for (name, property_schema) in properties {
            let supplied = caller.and_then(|c| c.get(name));
            if let Some(value) = self.run(property_schema, current.get(name), supplied)? {
                filled.insert(name.clone(), value);
            }
        }
        Ok(filled)
    }

    fn array(
        &mut self,
        resolved: &Value,
        data: Option<&Value>,
        caller: Option<&Value>,
    ) -> Result<Option<Value>, SchemaResolutionError> {
        let mut items = match data {
            Some(Value::Array(items)) => items.clone(),
            Some(other) => return Ok(Some(other.clone())),
            None => match resolved.get("default") {
                Some(Value::Array(default)) => default.clone(),
                _ => Vec::new(),
            },
        };

        for (index, item) in items.iter_mut().enumerate() {
            if let Some(item_schema) = raw_item_schema(resolved, index) {
                let supplied = caller.and_then(|c| c.get(index));
                if let Some(filled) = self.run(item_schema, Some(&*item), supplied)? {
                    *item = filled;
                }
            }
        }

        let min_items = resolved
            .get("minItems")
            .and_then(Value::as_u64)
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let tuple_len = if is_fixed_items(resolved) {
            resolved["items"].as_array().map_or(0, Vec::len)
        } else {
            0
        };
        let target = min_items.max(tuple_len);

        while items.len() < target {
            let slot = match raw_item_schema(resolved, items.len()) {
                Some(item_schema) => self.run(item_schema, None, None)?,
                None => None,
            };
            items.push(slot.unwrap_or(Value::Null));
        }

        Ok(Some(Value::Array(items)))
    }
}
