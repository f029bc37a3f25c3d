//! End-to-End Scenario Tests
//!
//! Small schemas exercised the way callers use them: seed, write, read,
//! snapshot.

use schemaobject::{
    Instance, PropertySpec, Schema, SchemaDefinition, SchemaLoader, TypeSpec, Value,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Seeding
// =============================================================================

#[test]
fn test_partial_seed_snapshot() {
    init_tracing();
    let schema = Schema::compile(
        SchemaDefinition::new()
            .property("firstName", TypeSpec::String)
            .property("lastName", TypeSpec::String),
    )
    .unwrap();

    let person = Instance::from_json(&schema, &json!({ "firstName": "Scott" }));
    let object = person.to_object();

    assert_eq!(object.get("firstName"), Some(&Value::from("Scott")));
    assert_eq!(object.get("lastName"), Some(&Value::Undefined));
    assert_eq!(person.to_json(), json!({ "firstName": "Scott" }));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_enum_rejects_unlisted_value() {
    init_tracing();
    let schema = Schema::compile(
        SchemaDefinition::new().property("gender", PropertySpec::string().enum_values(["m", "f"])),
    )
    .unwrap();
    let mut person = Instance::new(&schema);

    person.set("gender", "m");
    person.set("gender", "x");

    assert_eq!(person.get("gender"), Value::from("m"));
}

#[test]
fn test_min_rejects_negative_age() {
    init_tracing();
    let schema =
        Schema::compile(SchemaDefinition::new().property("age", PropertySpec::number().min(0.0)))
            .unwrap();
    let mut person = Instance::new(&schema);

    person.set("age", -5);
    assert_eq!(person.get("age"), Value::Undefined);

    person.set("age", 5);
    person.set("age", -5);
    assert_eq!(person.get("age"), Value::Number(5.0));
}

// =============================================================================
// Aliases
// =============================================================================

#[test]
fn test_alias_write_lands_on_target() {
    init_tracing();
    let schema = Schema::compile(
        SchemaDefinition::new()
            .property("zip", TypeSpec::String)
            .property("postalCode", PropertySpec::alias("zip")),
    )
    .unwrap();
    let mut address = Instance::new(&schema);

    address.set("postalCode", 12345);

    assert_eq!(address.get("zip"), Value::from("12345"));
    assert_eq!(address.to_json(), json!({ "zip": "12345" }));
}

// =============================================================================
// Loaded Schemas
// =============================================================================

#[test]
fn test_order_form_from_json_definition() {
    init_tracing();
    let schema = SchemaLoader::new()
        .load_str(
            r#"{
                "customer": { "type": "string", "minLength": 1 },
                "placed": "date",
                "express": { "type": "boolean", "default": false },
                "lines": [{
                    "sku": { "type": "string", "regex": "^[A-Z]{3}-[0-9]+$" },
                    "qty": { "type": "number", "min": 1 }
                }]
            }"#,
        )
        .unwrap();

    let order = Instance::from_json(
        &schema,
        &json!({
            "customer": "Ada",
            "placed": "2024-03-01T09:30:00Z",
            "lines": [
                { "sku": "ABC-1", "qty": "2" },
                { "sku": "bad", "qty": 0 },
                7
            ]
        }),
    );

    assert_eq!(order.get("express"), Value::Bool(false));
    assert_eq!(order.children("lines").count(), 2);
    assert_eq!(order.rejections().len(), 1);
    assert_eq!(
        order.to_json(),
        json!({
            "customer": "Ada",
            "placed": "2024-03-01T09:30:00.000Z",
            "express": false,
            "lines": [{ "sku": "ABC-1", "qty": 2 }, {}]
        })
    );
}
