//! # Form State
//!
//! The state container a rendering layer drives: it owns the schema, the
//! current data, and every output derived from them (synthesized data, id
//! tree, errors), and re-derives all of them on each change.
//!
//! ## Lifecycle
//!
//! | Event                  | Data                 | Validation                                   |
//! |------------------------|----------------------|----------------------------------------------|
//! | [`FormState::new`]     | defaults over input  | only when editing and `live_validate`        |
//! | [`FormState::change`]  | defaults over input  | with `live_validate`, else errors kept        |
//! | [`FormState::submit`]  | unchanged            | always, unless `no_validate`                 |
//! | [`FormState::update_props`] | defaults over input | only when editing and `live_validate`   |
//!
//! "Editing" means the caller supplied form data rather than starting from
//! schema defaults alone.

use std::path::Path;
use std::sync::Arc;

use jsf_core::{deep_equals, JsfError, SchemaResolutionError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults::synthesize;
use crate::dispatch::FieldKind;
use crate::document::{load_document, parse_document, DocumentFormat};
use crate::errors::{ErrorSchema, ValidationError};
use crate::id::{to_id_schema, IdSchema};
use crate::resolve::SchemaResolver;
use crate::validate::{validate_form_data, FormValidator, ValidationHooks, ValidationResult};

/// uiSchema key overriding the root field id.
pub const ROOT_FIELD_ID_KEY: &str = "ui:rootFieldId";

/// Caller options for a form.
///
/// Deserializes from snake_case or camelCase keys, so both a YAML options
/// file and a JavaScript-style props object load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Root id when no `root_field_id` is set. Defaults to `root`.
    #[serde(alias = "idPrefix")]
    pub id_prefix: Option<String>,
    /// Root id taken from the uiSchema's `ui:rootFieldId`.
    #[serde(alias = "rootFieldId", alias = "ui:rootFieldId")]
    pub root_field_id: Option<String>,
    /// Validate on every change, not only on submit.
    #[serde(alias = "liveValidate")]
    pub live_validate: bool,
    /// Never validate.
    #[serde(alias = "noValidate")]
    pub no_validate: bool,
    /// Opaque caller context handed to every field.
    #[serde(alias = "formContext")]
    pub form_context: Value,
}

impl FormOptions {
    /// Options carrying only the directives found in a uiSchema.
    pub fn from_ui_schema(ui_schema: &Value) -> Self {
        Self {
            root_field_id: ui_schema
                .get(ROOT_FIELD_ID_KEY)
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Self::default()
        }
    }

    /// Parse options from JSON or YAML text.
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, String> {
        let value = parse_document(content, format)?;
        Self::from_value(value).map_err(|e| format!("invalid form options: {e}"))
    }

    /// Load options from a JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`JsfError::DocumentLoad`] when the file cannot be read or
    /// parsed, and [`JsfError::Serialization`] when it is not an options
    /// object.
    pub fn load(path: &Path) -> Result<Self, JsfError> {
        Ok(Self::from_value(load_document(path)?)?)
    }

    fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            // An empty YAML document is null.
            Value::Null => Ok(Self::default()),
            other => serde_json::from_value(other),
        }
    }

    /// Apply a uiSchema's directives on top of these options. A
    /// `ui:rootFieldId` in the uiSchema wins.
    pub fn with_ui_schema(mut self, ui_schema: &Value) -> Self {
        if let Some(root) = Self::from_ui_schema(ui_schema).root_field_id {
            self.root_field_id = Some(root);
        }
        self
    }

    fn must_live_validate(&self) -> bool {
        self.live_validate && !self.no_validate
    }
}

/// Read-only context threaded through every resolution call.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub definitions: Map<String, Value>,
    pub form_context: Value,
}

impl Registry {
    /// Registry over a root schema's `definitions`.
    pub fn from_schema(schema: &Value, form_context: Value) -> Self {
        Self {
            definitions: schema
                .get("definitions")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            form_context,
        }
    }

    pub fn resolver(&self) -> SchemaResolver<'_> {
        SchemaResolver::new(&self.definitions)
    }
}

/// Outcome of [`FormState::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// The data passed validation (or validation is off).
    Accepted(Value),
    /// Validation failed. The same errors stay in the form state.
    Rejected(Vec<ValidationError>),
}

/// A form's schema, data, and everything derived from them.
#[derive(Clone)]
pub struct FormState {
    schema: Value,
    options: FormOptions,
    registry: Registry,
    validator: Arc<dyn FormValidator>,
    hooks: Arc<ValidationHooks>,
    edit: bool,
    form_data: Option<Value>,
    id_schema: IdSchema,
    errors: Vec<ValidationError>,
    error_schema: ErrorSchema,
}

impl FormState {
    /// Build the initial state.
    ///
    /// `form_data` of `None` starts from schema defaults alone; `Some`
    /// puts the form in edit mode.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaResolutionError`] when the schema holds a `$ref`
    /// that cannot be resolved.
    pub fn new(
        schema: Value,
        options: FormOptions,
        form_data: Option<Value>,
        validator: Arc<dyn FormValidator>,
    ) -> Result<Self, SchemaResolutionError> {
        Self::with_hooks(schema, options, form_data, validator, ValidationHooks::default())
    }

    /// [`FormState::new`] with transform and custom validation hooks.
    pub fn with_hooks(
        schema: Value,
        options: FormOptions,
        form_data: Option<Value>,
        validator: Arc<dyn FormValidator>,
        hooks: ValidationHooks,
    ) -> Result<Self, SchemaResolutionError> {
        let registry = Registry::from_schema(&schema, options.form_context.clone());
        let mut state = Self {
            schema,
            options,
            registry,
            validator,
            hooks: Arc::new(hooks),
            edit: false,
            form_data: None,
            id_schema: IdSchema::default(),
            errors: Vec::new(),
            error_schema: ErrorSchema::new(),
        };
        state.apply_props(form_data)?;
        Ok(state)
    }

    fn apply_props(&mut self, form_data: Option<Value>) -> Result<(), SchemaResolutionError> {
        self.edit = form_data.is_some();
        self.rederive(form_data.as_ref())?;
        if self.edit && self.options.must_live_validate() {
            self.run_validation();
        }
        Ok(())
    }

    fn rederive(&mut self, data: Option<&Value>) -> Result<(), SchemaResolutionError> {
        let resolver = self.registry.resolver();
        let form_data = synthesize(&self.schema, data, resolver)?;
        let id_schema = to_id_schema(
            &self.schema,
            self.options.root_field_id.as_deref(),
            resolver,
            form_data.as_ref().unwrap_or(&Value::Null),
            self.options.id_prefix.as_deref(),
        )?;
        self.form_data = form_data;
        self.id_schema = id_schema;
        Ok(())
    }

    /// Store a validation run's output. Returns whether the data is valid.
    fn run_validation(&mut self) -> bool {
        let result = self.validate();
        let valid = result.is_valid();
        self.errors = result.errors;
        self.error_schema = result.error_schema;
        valid
    }

    /// Validate the current data without touching the stored errors.
    pub fn validate(&self) -> ValidationResult {
        validate_form_data(
            self.form_data.as_ref().unwrap_or(&Value::Null),
            &self.schema,
            self.registry.resolver(),
            self.validator.as_ref(),
            &self.hooks,
        )
    }

    /// Replace the data after a field edit.
    pub fn change(&mut self, form_data: Value) -> Result<(), SchemaResolutionError> {
        self.rederive(Some(&form_data))?;
        if self.options.must_live_validate() {
            self.run_validation();
        }
        Ok(())
    }

    /// Replace the data along with an error tree computed by the field
    /// itself. Live validation, when on, supersedes the field's tree.
    pub fn change_with_errors(
        &mut self,
        form_data: Value,
        error_schema: ErrorSchema,
    ) -> Result<(), SchemaResolutionError> {
        self.rederive(Some(&form_data))?;
        if self.options.must_live_validate() {
            self.run_validation();
        } else if !self.options.no_validate {
            self.errors = error_schema.flatten();
            self.error_schema = error_schema;
        }
        Ok(())
    }

    /// Validate for submission. Errors are stored on rejection and cleared
    /// on acceptance.
    pub fn submit(&mut self) -> Submission {
        if !self.options.no_validate && !self.run_validation() {
            tracing::debug!(errors = self.errors.len(), "form submission rejected");
            return Submission::Rejected(self.errors.clone());
        }
        self.errors.clear();
        self.error_schema = ErrorSchema::new();
        Submission::Accepted(self.form_data.clone().unwrap_or(Value::Null))
    }

    /// Apply new props from the caller. `None` keeps the current value:
    /// the current schema, and the current data when already editing.
    pub fn update_props(
        &mut self,
        schema: Option<Value>,
        form_data: Option<Value>,
    ) -> Result<(), SchemaResolutionError> {
        if let Some(schema) = schema {
            self.registry = Registry::from_schema(&schema, self.options.form_context.clone());
            self.schema = schema;
        }
        let form_data = match form_data {
            Some(data) => Some(data),
            None if self.edit => self.form_data.clone(),
            None => None,
        };
        self.apply_props(form_data)
    }

    /// Whether a renderer holding `other` must redraw to show `self`.
    pub fn needs_update(&self, other: &FormState) -> bool {
        if self.options != other.options {
            return true;
        }
        match (serde_json::to_value(self), serde_json::to_value(other)) {
            (Ok(current), Ok(previous)) => !deep_equals(&current, &previous),
            _ => true,
        }
    }

    /// The root schema resolved against the current data.
    pub fn resolved_schema(&self) -> Result<Value, SchemaResolutionError> {
        self.registry
            .resolver()
            .resolve(&self.schema, self.form_data.as_ref().unwrap_or(&Value::Null))
    }

    /// Field kind the root dispatches to.
    pub fn root_kind(&self) -> Result<FieldKind, SchemaResolutionError> {
        Ok(FieldKind::of(&self.resolved_schema()?))
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_edit(&self) -> bool {
        self.edit
    }

    pub fn form_data(&self) -> Option<&Value> {
        self.form_data.as_ref()
    }

    pub fn id_schema(&self) -> &IdSchema {
        &self.id_schema
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn error_schema(&self) -> &ErrorSchema {
        &self.error_schema
    }
}

impl std::fmt::Debug for FormState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormState")
            .field("options", &self.options)
            .field("edit", &self.edit)
            .field("form_data", &self.form_data)
            .field("errors", &self.errors.len())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FormStateView<'a> {
    schema: &'a Value,
    edit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_data: Option<&'a Value>,
    id_schema: &'a IdSchema,
    errors: &'a [ValidationError],
    error_schema: &'a ErrorSchema,
}

impl Serialize for FormState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FormStateView {
            schema: &self.schema,
            edit: self.edit,
            form_data: self.form_data.as_ref(),
            id_schema: &self.id_schema,
            errors: &self.errors,
            error_schema: &self.error_schema,
        }
        .serialize(serializer)
    }
}
