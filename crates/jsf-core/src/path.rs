//! # Data Paths
//!
//! A location inside form data, expressed as a sequence of property names
//! and array indices. Validators report locations as JSON Pointers
//! (RFC 6901); [`parse_pointer`] turns them into a [`DataPath`] once, at the
//! boundary, so the rest of the engine never handles pointer text.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step into form data.
///
/// Indices order before keys, and indices order numerically, so a sorted
/// collection of segments walks `0, 1, 2, .., 10` before any property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position in an array.
    Index(usize),
    /// Property of an object.
    Key(String),
}

/// A full location inside form data, root first.
pub type DataPath = Vec<PathSegment>;

impl PathSegment {
    /// Build a segment from a raw pointer token. All-digit tokens become
    /// indices; everything else is a property name.
    pub fn from_token(token: &str) -> Self {
        let is_index = !token.is_empty()
            && token.bytes().all(|b| b.is_ascii_digit())
            && (token == "0" || !token.starts_with('0'));
        match token.parse::<usize>() {
            Ok(index) if is_index => Self::Index(index),
            _ => Self::Key(token.to_string()),
        }
    }

    /// The segment as an object key / id fragment.
    pub fn as_key(&self) -> String {
        match self {
            Self::Index(i) => i.to_string(),
            Self::Key(k) => k.clone(),
        }
    }

    /// Look this segment up in a data value.
    ///
    /// Index segments also match object keys spelled as digits, since a
    /// pointer cannot tell `/1` on an array from `/1` on an object.
    pub fn lookup<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        match (self, value) {
            (Self::Index(i), Value::Array(items)) => items.get(*i),
            (Self::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            (Self::Key(k), Value::Object(map)) => map.get(k),
            _ => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => write!(f, "{k}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Parse a JSON Pointer into a [`DataPath`].
///
/// Accepts both the plain form (`/a/0`) and the URI fragment form (`#/a/0`).
/// The empty pointer (and `#`) is the root.
pub fn parse_pointer(pointer: &str) -> DataPath {
    let stripped = pointer.strip_prefix('#').unwrap_or(pointer);
    if stripped.is_empty() {
        return Vec::new();
    }
    stripped
        .strip_prefix('/')
        .unwrap_or(stripped)
        .split('/')
        .map(|token| PathSegment::from_token(&unescape_token(token)))
        .collect()
}

/// Render a [`DataPath`] as a JSON Pointer (`/a/0/b`).
pub fn to_pointer(path: &[PathSegment]) -> String {
    path.iter()
        .map(|seg| format!("/{}", escape_token(&seg.as_key())))
        .collect()
}

/// Render a [`DataPath`] in property-access notation (`.a[0].b`), the form
/// form validators use for their `stack` lines.
pub fn to_property(path: &[PathSegment]) -> String {
    path.iter()
        .map(|seg| match seg {
            PathSegment::Index(i) => format!("[{i}]"),
            PathSegment::Key(k) => format!(".{k}"),
        })
        .collect()
}

/// Look a whole path up in a data value.
pub fn lookup_path<'v>(value: &'v Value, path: &[PathSegment]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, seg| seg.lookup(current))
}

/// Undo RFC 6901 escaping. `~1` is replaced before `~0` so `~01` stays `~1`.
pub fn unescape_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
