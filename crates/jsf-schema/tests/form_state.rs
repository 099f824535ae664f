//! Integration tests: drive whole forms through the public API, from schema
//! files on disk to submitted data.

use std::path::PathBuf;
use std::sync::Arc;

use jsf_core::parse_pointer;
use jsf_schema::{
    load_document, to_error_list, FieldKind, FieldRegistry, FormOptions, FormState,
    JsonSchemaValidator, Submission, ValidationHooks,
};
use serde_json::{json, Value};

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    load_document(&path).unwrap_or_else(|e| panic!("fixture {name}: {e}"))
}

fn form(schema: Value, options: FormOptions, data: Option<Value>) -> FormState {
    FormState::new(schema, options, data, Arc::new(JsonSchemaValidator::new()))
        .expect("fixture schemas resolve")
}

fn live() -> FormOptions {
    FormOptions {
        live_validate: true,
        ..FormOptions::default()
    }
}

fn tree(state: &FormState) -> Value {
    serde_json::to_value(state.error_schema()).unwrap()
}

// -- Dependencies --------------------------------------------------------

#[test]
fn connector_defaults_follow_the_selected_branch() {
    let state = form(fixture("connector.yaml"), FormOptions::default(), None);
    assert_eq!(
        state.form_data(),
        Some(&json!({"name": "primary", "connector": "aws", "key": {}, "region": "us-east-1"}))
    );
    let ids = state.id_schema();
    assert_eq!(ids.get("region").unwrap().id, "root_region");
    assert_eq!(ids.get("key").unwrap().get("id").unwrap().id, "root_key_id");
    assert!(ids.get("project").is_none());
}

#[test]
fn switching_branch_switches_fields() {
    let mut state = form(fixture("connector.yaml"), live(), Some(json!({"connector": "aws"})));
    state.change(json!({"connector": "gcp", "project": "abc"})).unwrap();

    assert_eq!(
        state.form_data(),
        Some(&json!({"name": "primary", "connector": "gcp", "project": "abc"}))
    );
    assert!(state.id_schema().get("key").is_none());
    assert_eq!(state.id_schema().get("project").unwrap().id, "root_project");
    assert_eq!(
        tree(&state),
        json!({"project": {"__errors": ["should NOT be shorter than 6 characters"]}})
    );
}

#[test]
fn errors_inside_referenced_branch_fields() {
    let state = form(
        fixture("connector.yaml"),
        live(),
        Some(json!({"connector": "aws", "key": {"id": "ab"}})),
    );
    assert_eq!(
        tree(&state),
        json!({"key": {"id": {"__errors": ["should NOT be shorter than 4 characters"]}}})
    );
    assert_eq!(state.errors()[0].path, parse_pointer("/key/id"));
}

#[test]
fn missing_required_field_in_branch() {
    let state = form(fixture("connector.yaml"), live(), Some(json!({"connector": "aws"})));
    assert_eq!(
        tree(&state),
        json!({"key": {"id": {"__errors": ["is a required property"]}}})
    );
}

// -- Recursive schemas ---------------------------------------------------

#[test]
fn recursive_schema_expands_only_as_deep_as_data() {
    let state = form(fixture("tree.json"), FormOptions::default(), None);
    assert_eq!(state.form_data(), Some(&json!({"name": "leaf", "children": []})));

    let state = form(
        fixture("tree.json"),
        FormOptions::default(),
        Some(json!({"children": [{"name": "a", "children": [{}]}]})),
    );
    assert_eq!(
        state.form_data(),
        Some(&json!({
            "name": "leaf",
            "children": [{"name": "a", "children": [{"name": "leaf", "children": []}]}]
        }))
    );
    let deepest = state
        .id_schema()
        .at(&parse_pointer("/children/0/children/0/name"))
        .unwrap();
    assert_eq!(deepest.id, "root_children_0_children_0_name");
}

// -- Error contextualization ---------------------------------------------

#[test]
fn root_errors_on_submit() {
    let mut state = form(
        json!({"type": "string", "minLength": 8, "pattern": "d+"}),
        FormOptions::default(),
        Some(json!("short")),
    );
    assert!(matches!(state.submit(), Submission::Rejected(ref errors) if errors.len() == 2));
    let mut stacks: Vec<String> = to_error_list(state.error_schema())
        .into_iter()
        .map(|e| e.stack)
        .collect();
    stacks.sort();
    assert_eq!(
        stacks,
        vec![
            "root: should NOT be shorter than 8 characters",
            "root: should match pattern \"d+\"",
        ]
    );
}

#[test]
fn nested_array_errors() {
    let schema = json!({
        "type": "object",
        "properties": {
            "outer": {
                "type": "array",
                "items": {"type": "array", "items": {"type": "string", "minLength": 4}}
            }
        }
    });
    let state = form(schema, live(), Some(json!({"outer": [["good", "bad"], ["bad", "good"]]})));
    let short = json!({"__errors": ["should NOT be shorter than 4 characters"]});
    assert_eq!(
        tree(&state),
        json!({"outer": {"0": {"1": short.clone()}, "1": {"0": short}}})
    );
    let order: Vec<String> = state.errors().iter().map(|e| e.property()).collect();
    assert_eq!(order, vec![".outer[0][1]", ".outer[1][0]"]);
}

#[test]
fn array_of_objects_errors() {
    let schema = json!({
        "type": "object",
        "properties": {
            "level1": {
                "type": "array",
                "items": {"type": "object", "properties": {"level2": {"type": "string", "minLength": 4}}}
            }
        }
    });
    let state = form(
        schema,
        live(),
        Some(json!({"level1": [{"level2": "good"}, {"level2": "bad"}]})),
    );
    assert_eq!(
        tree(&state),
        json!({"level1": {"1": {"level2": {"__errors": ["should NOT be shorter than 4 characters"]}}}})
    );
}

#[test]
fn custom_validation_runs_with_validator_errors() {
    let schema = json!({
        "type": "object",
        "properties": {
            "pass1": {"type": "string", "minLength": 3},
            "pass2": {"type": "string", "minLength": 3}
        }
    });
    let hooks = ValidationHooks::default().with_custom(|data, errors| {
        if data.get("pass1") != data.get("pass2") {
            errors.add_error(&parse_pointer("/pass2"), "Passwords don't match");
        }
    });
    let mut state = FormState::with_hooks(
        schema,
        FormOptions::default(),
        Some(json!({"pass1": "abcd", "pass2": "abcde"})),
        Arc::new(JsonSchemaValidator::new()),
        hooks,
    )
    .unwrap();

    assert!(matches!(state.submit(), Submission::Rejected(_)));
    assert_eq!(tree(&state), json!({"pass2": {"__errors": ["Passwords don't match"]}}));

    state.change(json!({"pass1": "abcd", "pass2": "abcd"})).unwrap();
    assert_eq!(state.submit(), Submission::Accepted(json!({"pass1": "abcd", "pass2": "abcd"})));
}

#[test]
fn transform_errors_rewrites_before_placement() {
    let schema = json!({"type": "object", "properties": {"age": {"type": "integer", "minimum": 18}}});
    let hooks = ValidationHooks::default().with_transform(|errors| {
        errors
            .into_iter()
            .map(|mut e| {
                if e.kind == "minimum" {
                    e.message = "You need to be 18 because of some legal thing".into();
                }
                e
            })
            .collect()
    });
    let mut state = FormState::with_hooks(
        schema,
        FormOptions::default(),
        Some(json!({"age": 16})),
        Arc::new(JsonSchemaValidator::new()),
        hooks,
    )
    .unwrap();
    state.submit();
    assert_eq!(
        tree(&state),
        json!({"age": {"__errors": ["You need to be 18 because of some legal thing"]}})
    );
}

// -- Ids and dispatch ----------------------------------------------------

#[test]
fn id_prefix_applies_to_dependency_fields() {
    let options = FormOptions {
        id_prefix: Some("rjsf".into()),
        ..FormOptions::default()
    };
    let state = form(fixture("connector.yaml"), options, Some(json!({"connector": "gcp"})));
    assert_eq!(state.id_schema().id, "rjsf");
    assert_eq!(state.id_schema().get("project").unwrap().id, "rjsf_project");
}

#[test]
fn fields_dispatch_by_resolved_kind() {
    let state = form(fixture("connector.yaml"), FormOptions::default(), None);
    let registry = FieldRegistry::new("unsupported")
        .register(FieldKind::Object, "object")
        .register(FieldKind::String, "text");
    let resolver = state.registry().resolver();
    let root = state.resolved_schema().unwrap();
    assert_eq!(*registry.dispatch(&root).1, "object");

    let data = state.form_data().unwrap();
    let key = resolver.property_schema(&root, "key", &data["key"]).unwrap().unwrap();
    assert_eq!(registry.dispatch(&key).0, FieldKind::Object);
    let region = resolver
        .property_schema(&root, "region", &data["region"])
        .unwrap()
        .unwrap();
    assert_eq!(*registry.dispatch(&region).1, "text");
}
