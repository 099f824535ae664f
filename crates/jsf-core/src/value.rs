//! # Structural Equality and Merge
//!
//! The primitives the engine uses for change detection and for combining
//! nested default/override objects.
//!
//! ## Invariants
//!
//! - Inputs are borrowed and never mutated; every merge returns a new value.
//! - Merges are right-biased: on a conflicting key the right operand wins.
//! - Arrays are replaced wholesale by [`deep_merge`]. Only [`merge_schemas`]
//!   (and [`merge_objects`] with `concat_arrays`) combine arrays, which is
//!   what unioning `required` lists needs.

use serde_json::{Map, Number, Value};

/// Structural equality for JSON values.
///
/// Arrays compare element by element, in order. Objects compare as maps,
/// ignoring key order. Numbers compare by numeric value, so `1 == 1.0`.
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| deep_equals(x, y)))
        }
        _ => false,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Merge `right` into `left`, recursing into nested objects.
///
/// When both operands are objects, keys of `right` win per key; where both
/// sides hold an object the merge recurses. With `concat_arrays`, two
/// arrays under the same key are concatenated (left first); otherwise the
/// right array replaces the left one. When either operand is not an object
/// the result is a copy of `right`.
pub fn merge_objects(left: &Value, right: &Value, concat_arrays: bool) -> Value {
    let (Value::Object(l), Value::Object(r)) = (left, right) else {
        return right.clone();
    };
    let mut merged: Map<String, Value> = l.clone();
    for (key, right_value) in r {
        let combined = match (l.get(key), right_value) {
            (Some(left_value @ Value::Object(_)), Value::Object(_)) => {
                merge_objects(left_value, right_value, concat_arrays)
            }
            (Some(Value::Array(xs)), Value::Array(ys)) if concat_arrays => {
                Value::Array(xs.iter().chain(ys).cloned().collect())
            }
            _ => right_value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    Value::Object(merged)
}

/// Right-biased deep merge that replaces arrays wholesale.
///
/// Used for lookup dictionaries (field, widget, template tables and option
/// objects) where splicing arrays is never wanted.
pub fn deep_merge(left: &Value, right: &Value) -> Value {
    merge_objects(left, right, false)
}

/// Union two schema fragments.
///
/// Like [`merge_objects`] with array concatenation, except that
/// concatenated arrays drop values already present, so merging two
/// branches that both require `"field1"` lists it once.
pub fn merge_schemas(left: &Value, right: &Value) -> Value {
    let (Value::Object(l), Value::Object(r)) = (left, right) else {
        return right.clone();
    };
    let mut merged = l.clone();
    for (key, right_value) in r {
        let combined = match (l.get(key), right_value) {
            (Some(left_value @ Value::Object(_)), Value::Object(_)) => {
                merge_schemas(left_value, right_value)
            }
            (Some(Value::Array(xs)), Value::Array(ys)) => {
                let mut union = xs.clone();
                for y in ys {
                    if !union.iter().any(|x| deep_equals(x, y)) {
                        union.push(y.clone());
                    }
                }
                Value::Array(union)
            }
            _ => right_value.clone(),
        };
        merged.insert(key.clone(), combined);
    }
    Value::Object(merged)
}
