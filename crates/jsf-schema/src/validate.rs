//! # Form Validation
//!
//! Runs a JSON Schema validator over form data and turns its output into
//! both a flat error list and an [`ErrorSchema`] tree.
//!
//! The validator sits behind [`FormValidator`] so callers can swap in their
//! own. The default, [`JsonSchemaValidator`], wraps the `jsonschema` crate
//! and reports failures with the short messages forms show next to a field
//! (`should be number`, `should NOT be shorter than 4 characters`). A
//! missing required property is reported at the missing property's own
//! path, so it renders next to that field.
//!
//! ## Flow
//!
//! 1. Resolve the root schema against the data. A resolution failure is
//!    reported as a single root error of kind `$ref`.
//! 2. Run the validator over the resolved schema.
//! 3. Apply the caller's transform to the flat list, if any.
//! 4. Build the tree, then let custom validation add to it.
//! 5. Flatten the final tree into the list returned to the caller.

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, Retrieve, Uri};
use jsf_core::path::unescape_token;
use jsf_core::parse_pointer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorCollector, ErrorSchema, ValidationError};
use crate::resolve::SchemaResolver;

/// One failure as reported by a [`FormValidator`], before reshaping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFailure {
    /// JSON Pointer to the failing value (`""` for the root).
    pub instance_path: String,
    /// Display message.
    pub message: String,
    /// Schema keyword that failed.
    pub keyword: String,
    /// Keyword parameters.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl From<RawFailure> for ValidationError {
    fn from(raw: RawFailure) -> Self {
        ValidationError {
            path: parse_pointer(&raw.instance_path),
            message: raw.message,
            kind: raw.keyword,
            params: raw.params,
        }
    }
}

/// Validates data against an already-resolved schema.
pub trait FormValidator: Send + Sync {
    /// All failures of `data` against `schema`. Empty means valid.
    fn validate(&self, data: &Value, schema: &Value) -> Vec<RawFailure>;
}

impl<F> FormValidator for F
where
    F: Fn(&Value, &Value) -> Vec<RawFailure> + Send + Sync,
{
    fn validate(&self, data: &Value, schema: &Value) -> Vec<RawFailure> {
        self(data, schema)
    }
}

/// Rewrites the flat error list before it is reshaped.
pub type TransformErrors = dyn Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync;

/// Adds caller-defined failures to the tree built from validator output.
pub type CustomValidate = dyn Fn(&Value, &mut ErrorCollector<'_>) + Send + Sync;

/// Optional caller hooks around validation.
#[derive(Default)]
pub struct ValidationHooks {
    /// Applied to the validator's errors before they are placed in the tree.
    pub transform: Option<Box<TransformErrors>>,
    /// Runs after the validator, adding to the same tree.
    pub custom: Option<Box<CustomValidate>>,
}

impl ValidationHooks {
    /// Set the error transform, replacing any earlier one.
    pub fn with_transform(
        mut self,
        transform: impl Fn(Vec<ValidationError>) -> Vec<ValidationError> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Set the custom validation, replacing any earlier one.
    pub fn with_custom(
        mut self,
        custom: impl Fn(&Value, &mut ErrorCollector<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.custom = Some(Box::new(custom));
        self
    }
}

impl std::fmt::Debug for ValidationHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationHooks")
            .field("transform", &self.transform.is_some())
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Outcome of validating form data.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Flat list, in [`ErrorSchema::flatten`] order.
    pub errors: Vec<ValidationError>,
    /// The same failures as a tree.
    pub error_schema: ErrorSchema,
}

impl ValidationResult {
    /// No validator or custom failures.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn single(error: ValidationError) -> Self {
        let mut error_schema = ErrorSchema::new();
        error_schema.insert(error.clone());
        Self {
            errors: vec![error],
            error_schema,
        }
    }
}

/// Validate `data` against `schema`, resolving `$ref` and dependencies
/// through `resolver` first.
pub fn validate_form_data(
    data: &Value,
    schema: &Value,
    resolver: SchemaResolver<'_>,
    validator: &dyn FormValidator,
    hooks: &ValidationHooks,
) -> ValidationResult {
    let resolved = match resolver.resolve(schema, data) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(error = %e, "schema resolution failed during validation");
            return ValidationResult::single(ValidationError::new(
                Vec::new(),
                e.to_string(),
                "$ref",
            ));
        }
    };
    let validation_schema = with_definitions(&resolved, resolver);

    let mut errors: Vec<ValidationError> = validator
        .validate(data, &validation_schema)
        .into_iter()
        .map(ValidationError::from)
        .collect();
    if let Some(transform) = &hooks.transform {
        errors = transform(errors);
    }

    let mut error_schema = ErrorSchema::new();
    for error in errors {
        error_schema.place(error, &resolved, data, resolver);
    }
    if let Some(custom) = &hooks.custom {
        let mut collector = ErrorCollector::new(&mut error_schema, &resolved, data, resolver);
        custom(data, &mut collector);
    }
    error_schema.prune();

    let errors = error_schema.flatten();
    tracing::debug!(count = errors.len(), "form data validated");
    ValidationResult {
        errors,
        error_schema,
    }
}

/// Attach the resolver's definitions to a resolved schema that lacks them,
/// so nested `$ref`s stay resolvable by the validator.
fn with_definitions(resolved: &Value, resolver: SchemaResolver<'_>) -> Value {
    let mut schema = resolved.clone();
    if let (Value::Object(map), Some(definitions)) = (&mut schema, resolver.definitions()) {
        map.entry("definitions")
            .or_insert_with(|| Value::Object(definitions.clone()));
    }
    schema
}

/// Refuses every remote reference: form schemas resolve within
/// their own document.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(uri = uri.as_str(), "refusing remote schema reference");
        Err(format!("remote schema reference not available: {}", uri.as_str()).into())
    }
}

/// [`FormValidator`] backed by the `jsonschema` crate.
///
/// The draft is taken from the schema's `$schema` when recognized, draft-07
/// otherwise, unless pinned with [`JsonSchemaValidator::with_draft`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator {
    draft: Option<Draft>,
}

impl JsonSchemaValidator {
    /// Validator that picks the draft from each schema's `$schema`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always validate with `draft`, ignoring `$schema`.
    pub fn with_draft(draft: Draft) -> Self {
        Self { draft: Some(draft) }
    }

    fn draft_for(&self, schema: &Value) -> Draft {
        if let Some(draft) = self.draft {
            return draft;
        }
        let declared = schema.get("$schema").and_then(Value::as_str).unwrap_or("");
        if declared.contains("draft-04") {
            Draft::Draft4
        } else if declared.contains("draft-06") {
            Draft::Draft6
        } else if declared.contains("2019-09") {
            Draft::Draft201909
        } else if declared.contains("2020-12") {
            Draft::Draft202012
        } else {
            Draft::Draft7
        }
    }
}

impl FormValidator for JsonSchemaValidator {
    fn validate(&self, data: &Value, schema: &Value) -> Vec<RawFailure> {
        let mut opts = jsonschema::options();
        opts.with_draft(self.draft_for(schema));
        opts.with_retriever(OfflineRetriever);
        let validator = match opts.build(schema) {
            Ok(validator) => validator,
            Err(e) => {
                tracing::warn!(error = %e, "schema does not compile");
                return vec![RawFailure {
                    instance_path: String::new(),
                    message: format!("schema is invalid: {e}"),
                    keyword: "schema".to_string(),
                    params: Map::new(),
                }];
            }
        };
        validator
            .iter_errors(data)
            .map(|e| describe_failure(&e, schema))
            .collect()
    }
}

fn describe_failure(error: &jsonschema::ValidationError<'_>, schema: &Value) -> RawFailure {
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path.rsplit('/').next().map(unescape_token).unwrap_or_default();
    let mut raw = RawFailure {
        instance_path: error.instance_path.to_string(),
        message: error.to_string(),
        keyword: keyword.clone(),
        params: Map::new(),
    };

    if let ValidationErrorKind::Required { property } = &error.kind {
        let name = property
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| property.to_string());
        raw.instance_path = format!("{}/{}", raw.instance_path, name.replace('~', "~0").replace('/', "~1"));
        raw.message = "is a required property".to_string();
        raw.params.insert("missingProperty".into(), Value::String(name));
        return raw;
    }

    let Some(value) = keyword_value(schema, &schema_path) else {
        return raw;
    };
    if let Some((message, params)) = keyword_message(&keyword, value) {
        raw.message = message;
        raw.params = params;
    }
    raw
}

/// Walk `schema_path` through `schema`, following `$ref` whether or not
/// the path names it.
fn keyword_value<'s>(schema: &'s Value, schema_path: &str) -> Option<&'s Value> {
    let resolver = SchemaResolver::for_root(schema);
    let mut current = schema;
    for token in schema_path.split('/').skip(1).map(unescape_token) {
        current = if token == "$ref" {
            let pointer = current.get("$ref")?.as_str()?;
            resolver.find_definition(pointer).ok()?
        } else {
            match current {
                Value::Object(map) => match map.get(&token) {
                    Some(found) => found,
                    None => {
                        let pointer = map.get("$ref")?.as_str()?;
                        resolver.find_definition(pointer).ok()?.get(&token)?
                    }
                },
                Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
                _ => return None,
            }
        };
    }
    Some(current)
}

fn keyword_message(keyword: &str, value: &Value) -> Option<(String, Map<String, Value>)> {
    let mut params = Map::new();
    let message = match keyword {
        "type" => {
            let types = match value {
                Value::Array(types) => types
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.as_str()?.to_string(),
            };
            params.insert("type".into(), Value::String(types.clone()));
            format!("should be {types}")
        }
        "minLength" | "maxLength" | "minItems" | "maxItems" | "minProperties"
        | "maxProperties" => {
            let limit = value.as_u64()?;
            params.insert("limit".into(), value.clone());
            let (bound, noun) = match keyword {
                "minLength" => ("be shorter", "characters"),
                "maxLength" => ("be longer", "characters"),
                "minItems" => ("have fewer", "items"),
                "maxItems" => ("have more", "items"),
                "minProperties" => ("have fewer", "properties"),
                _ => ("have more", "properties"),
            };
            format!("should NOT {bound} than {limit} {noun}")
        }
        "minimum" | "maximum" | "exclusiveMinimum" | "exclusiveMaximum" => {
            if !value.is_number() {
                return None;
            }
            let comparison = match keyword {
                "minimum" => ">=",
                "maximum" => "<=",
                "exclusiveMinimum" => ">",
                _ => "<",
            };
            params.insert("comparison".into(), Value::String(comparison.into()));
            params.insert("limit".into(), value.clone());
            format!("should be {comparison} {value}")
        }
        "multipleOf" => {
            params.insert("multipleOf".into(), value.clone());
            format!("should be multiple of {value}")
        }
        "pattern" => {
            let pattern = value.as_str()?;
            params.insert("pattern".into(), value.clone());
            format!("should match pattern \"{pattern}\"")
        }
        "format" => {
            let format = value.as_str()?;
            params.insert("format".into(), value.clone());
            format!("should match format \"{format}\"")
        }
        "enum" => {
            params.insert("allowedValues".into(), value.clone());
            "should be equal to one of the allowed values".to_string()
        }
        "const" => {
            params.insert("allowedValue".into(), value.clone());
            "should be equal to constant".to_string()
        }
        "uniqueItems" => "should NOT have duplicate items".to_string(),
        "additionalProperties" => "should NOT have additional properties".to_string(),
        "oneOf" => "should match exactly one schema in oneOf".to_string(),
        "anyOf" => "should match some schema in anyOf".to_string(),
        "not" => "should NOT be valid".to_string(),
        "contains" => "should contain a valid item".to_string(),
        _ => return None,
    };
    Some((message, params))
}
