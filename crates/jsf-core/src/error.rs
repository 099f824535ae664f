//! # Error Types
//!
//! Errors used throughout jsf. All errors use `thiserror` for derive-based
//! `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Only configuration problems are errors. An unresolvable `$ref` is a
//!   broken schema and fails the resolution call that hit it.
//! - Malformed form data is never an error: missing, extra, or wrongly
//!   shaped values flow through resolution and synthesis untouched.
//! - Validation failures are data (`ValidationError` entries in
//!   `jsf-schema`), not variants of these enums.

use thiserror::Error;

/// A `$ref` pointer that cannot be followed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaResolutionError {
    /// The pointer is well-formed but names nothing in `definitions`.
    #[error("could not find a definition for {pointer}")]
    MissingDefinition {
        /// The `$ref` value as written in the schema.
        pointer: String,
    },

    /// The pointer is not rooted at `#/definitions/`.
    #[error("unsupported $ref pointer {pointer}: only #/definitions/... pointers are resolved")]
    UnsupportedPointer {
        /// The `$ref` value as written in the schema.
        pointer: String,
    },

    /// Following the pointer leads back to itself without reaching a schema.
    #[error("circular $ref chain through {pointer}")]
    Circular {
        /// The first pointer seen twice.
        pointer: String,
    },
}

impl SchemaResolutionError {
    /// The `$ref` pointer that failed.
    pub fn pointer(&self) -> &str {
        match self {
            Self::MissingDefinition { pointer }
            | Self::UnsupportedPointer { pointer }
            | Self::Circular { pointer } => pointer,
        }
    }
}

/// Top-level error type for callers composing the engine with I/O.
#[derive(Error, Debug)]
pub enum JsfError {
    /// A schema reference could not be resolved.
    #[error("schema resolution error: {0}")]
    Resolution(#[from] SchemaResolutionError),

    /// A schema, data, or options document could not be loaded.
    #[error("document load error for '{path}': {reason}")]
    DocumentLoad {
        /// Path of the document that failed to load.
        path: String,
        /// Reason the document could not be loaded.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
