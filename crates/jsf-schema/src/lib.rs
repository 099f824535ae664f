//! # jsf-schema: Form-State Engine
//!
//! Turns a JSON Schema plus partial form data into the state a schema-driven
//! form renders: the data with defaults filled in, a stable id per field,
//! and validation errors shaped like the data.
//!
//! ## Resolution (`resolve`)
//!
//! [`SchemaResolver`] follows `#/definitions/...` pointers and applies
//! `dependencies` for the current data, including `oneOf` branch selection
//! keyed on a dependent property. Resolution is lazy: one node at a time,
//! as consumers descend.
//!
//! ## Derived State (`defaults`, `id`)
//!
//! - [`synthesize`] fills gaps in caller data from `default`, `minItems`
//!   and tuple `items`, without ever overwriting a defined value.
//! - [`to_id_schema`] builds the [`IdSchema`] tree (`root`, `root_a`,
//!   `root_a_0`, ...).
//!
//! ## Validation (`validate`, `errors`)
//!
//! [`validate_form_data`] runs a [`FormValidator`] (by default
//! [`JsonSchemaValidator`]) and reshapes its failures into an
//! [`ErrorSchema`] tree plus a flat list. Failures on paths the schema does
//! not declare are kept on the root.
//!
//! ## Form Container (`form`, `dispatch`, `document`)
//!
//! [`FormState`] drives the lifecycle (construct, change, submit, prop
//! updates). [`FieldRegistry`] maps resolved schemas to rendering
//! handlers. [`load_document`] reads JSON or YAML inputs.
//!
//! ## Crate Policy
//!
//! - Depends only on `jsf-core` internally.
//! - Schemas and form data are never mutated; every operation returns
//!   fresh values.
//! - Only an unresolvable `$ref` is an error. Malformed data flows through,
//!   and validation failures are data.

pub mod defaults;
pub mod dispatch;
pub mod document;
pub mod errors;
pub mod form;
pub mod id;
pub mod resolve;
pub mod validate;

pub use defaults::{default_form_state, synthesize};
pub use dispatch::{FieldKind, FieldRegistry};
pub use document::{load_document, parse_document, DocumentFormat};
pub use errors::{to_error_list, ErrorCollector, ErrorListEntry, ErrorSchema, ValidationError};
pub use form::{FormOptions, FormState, Registry, Submission};
pub use id::{to_id_schema, IdSchema, DEFAULT_ID_PREFIX};
pub use resolve::{infer_type, retrieve_schema, SchemaResolver};
pub use validate::{
    validate_form_data, CustomValidate, FormValidator, JsonSchemaValidator, RawFailure,
    TransformErrors, ValidationHooks, ValidationResult,
};
