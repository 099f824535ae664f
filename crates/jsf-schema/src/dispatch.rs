//! # Field Dispatch
//!
//! Maps a resolved schema to the kind of field that renders it, and keeps a
//! table of per-kind handlers. Rendering layers register one handler per
//! kind they support; anything else goes to the mandatory `unsupported`
//! handler, so every schema has somewhere to go.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resolve::infer_type;

/// The field kind a resolved schema dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// No type could be determined, or the type is not a JSON Schema type.
    Unsupported,
}

impl FieldKind {
    /// All kinds, in declaration order.
    pub fn all() -> &'static [FieldKind] {
        &[
            Self::Object,
            Self::Array,
            Self::String,
            Self::Number,
            Self::Integer,
            Self::Boolean,
            Self::Null,
            Self::Unsupported,
        ]
    }

    /// Kind of an already-resolved schema, using the same type inference
    /// as the rest of the engine.
    pub fn of(resolved: &Value) -> Self {
        infer_type(resolved).map_or(Self::Unsupported, Self::from_type_tag)
    }

    /// Kind for a JSON Schema `type` name. Unknown names are unsupported.
    pub fn from_type_tag(tag: &str) -> Self {
        match tag {
            "object" => Self::Object,
            "array" => Self::Array,
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler table keyed by [`FieldKind`].
#[derive(Debug, Clone)]
pub struct FieldRegistry<H> {
    handlers: HashMap<FieldKind, H>,
    unsupported: H,
}

impl<H> FieldRegistry<H> {
    /// A registry that sends every kind to `unsupported` until handlers are
    /// registered.
    pub fn new(unsupported: H) -> Self {
        Self {
            handlers: HashMap::new(),
            unsupported,
        }
    }

    /// Register `handler` for `kind`, replacing any previous one.
    /// Registering [`FieldKind::Unsupported`] replaces the fallback.
    pub fn register(mut self, kind: FieldKind, handler: H) -> Self {
        if kind == FieldKind::Unsupported {
            self.unsupported = handler;
        } else {
            self.handlers.insert(kind, handler);
        }
        self
    }

    /// Combine with `overrides`; every handler it registers wins,
    /// including its fallback.
    pub fn with_overrides(mut self, overrides: FieldRegistry<H>) -> Self {
        self.handlers.extend(overrides.handlers);
        self.unsupported = overrides.unsupported;
        self
    }

    /// Handler for `kind`, or the fallback.
    pub fn handler(&self, kind: FieldKind) -> &H {
        self.handlers.get(&kind).unwrap_or(&self.unsupported)
    }

    /// Handler for a resolved schema.
    pub fn dispatch(&self, resolved: &Value) -> (FieldKind, &H) {
        let kind = FieldKind::of(resolved);
        tracing::debug!(kind = %kind, "dispatching field");
        (kind, self.handler(kind))
    }

    /// Whether `kind` has its own handler.
    pub fn has_handler(&self, kind: FieldKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}
