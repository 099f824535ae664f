//! # Form Inputs
//!
//! Arguments shared by every subcommand, and their loading into engine
//! values. Options are layered: the options file first, then the uiSchema's
//! directives, then command-line flags.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use jsf_schema::{load_document, FormOptions, FormState, JsonSchemaValidator};
use serde_json::Value;

/// Input files and option overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct FormArgs {
    /// Schema file (JSON or YAML).
    #[arg(long)]
    pub schema: PathBuf,

    /// Form data file. Without it the form starts from schema defaults.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Form options file (`id_prefix`, `live_validate`, ...).
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// uiSchema file; only its `ui:rootFieldId` is read.
    #[arg(long)]
    pub ui_schema: Option<PathBuf>,

    /// Prefix for generated field ids.
    #[arg(long)]
    pub id_prefix: Option<String>,

    /// Id of the root field, overriding the prefix.
    #[arg(long)]
    pub root_id: Option<String>,
}

/// Loaded inputs.
#[derive(Debug, Clone)]
pub struct FormInput {
    pub schema: Value,
    pub data: Option<Value>,
    pub options: FormOptions,
}

impl FormArgs {
    /// Read every file the arguments name and layer the options.
    pub fn load(&self) -> anyhow::Result<FormInput> {
        let schema = load_document(&self.schema)
            .with_context(|| format!("loading schema {}", self.schema.display()))?;
        let data = self
            .data
            .as_ref()
            .map(|path| {
                load_document(path).with_context(|| format!("loading data {}", path.display()))
            })
            .transpose()?;

        let mut options = match &self.options {
            Some(path) => FormOptions::load(path)
                .with_context(|| format!("loading options {}", path.display()))?,
            None => FormOptions::default(),
        };
        if let Some(path) = &self.ui_schema {
            let ui_schema = load_document(path)
                .with_context(|| format!("loading uiSchema {}", path.display()))?;
            options = options.with_ui_schema(&ui_schema);
        }
        if let Some(prefix) = &self.id_prefix {
            options.id_prefix = Some(prefix.clone());
        }
        if let Some(root) = &self.root_id {
            options.root_field_id = Some(root.clone());
        }

        tracing::debug!(schema = %self.schema.display(), edit = data.is_some(), "inputs loaded");
        Ok(FormInput {
            schema,
            data,
            options,
        })
    }
}

impl FormInput {
    /// Form state over these inputs with the default validator.
    pub fn into_state(self) -> anyhow::Result<FormState> {
        FormState::new(
            self.schema,
            self.options,
            self.data,
            Arc::new(JsonSchemaValidator::new()),
        )
        .context("building form state")
    }
}
