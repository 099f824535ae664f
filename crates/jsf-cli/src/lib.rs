//! # jsf-cli: Form-State Engine on the Command Line
//!
//! Exposes each engine operation over schema and data files, for
//! inspecting what a form will render and for scripting checks in CI.
//!
//! ## Subcommands
//!
//! - `resolve`: the root schema with `$ref` and `dependencies` applied
//! - `defaults`: the form data with schema defaults filled in
//! - `ids`: the field id tree
//! - `validate`: the error list and error tree; exits non-zero on failures
//! - `state`: the whole derived form state
//!
//! Every subcommand reads JSON or YAML (by extension) and prints pretty
//! JSON on stdout. Logs go to stderr.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the engine calls.
//! - Handlers delegate to `jsf-schema`; no form logic here.

pub mod defaults;
pub mod ids;
pub mod input;
pub mod resolve;
pub mod state;
pub mod validate;

use serde_json::Value;

/// What a subcommand prints, and whether the process should succeed.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub value: Value,
    pub success: bool,
}

impl CommandOutput {
    pub fn ok(value: Value) -> Self {
        Self {
            value,
            success: true,
        }
    }
}
