//! # jsf-core: Foundational Types for jsf
//!
//! The leaf crate of the jsf workspace. It defines the primitives every
//! other crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Typed data paths.** A location inside form data is a sequence of
//!    [`PathSegment`]s (property name or array index), never a bare string.
//!    JSON Pointer text is parsed once at the boundary.
//!
//! 2. **Non-mutating structure operations.** [`deep_equals`],
//!    [`merge_objects`] and [`merge_schemas`] borrow their inputs and return
//!    fresh values. Derived form state is recomputed, never patched.
//!
//! 3. **Numeric equality by value.** `1` and `1.0` are the same form value,
//!    whatever `serde_json` used to store them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `jsf-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod path;
pub mod value;

pub use error::{JsfError, SchemaResolutionError};
pub use path::{parse_pointer, DataPath, PathSegment};
pub use value::{deep_equals, deep_merge, merge_objects, merge_schemas};
