// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure construction integration tests
//!
//! Nested records, optional fields, literal constraints and error paths,
//! driven from JSON input.

use castfit::{
    castfit, Annotation, CastError, FieldTableBuilder, FieldValues, Structure, Value,
};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
struct Pet {
    name: String,
    kind: String,
    age: i64,
}

impl Structure for Pet {
    fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
        fields
            .field::<String>("name")
            .field_as("type", Annotation::literal(["cat", "dog", "other"]))
            .field::<i64>("age")
    }

    fn build(values: &mut FieldValues) -> Result<Self, CastError> {
        Ok(Self {
            name: values.take("name")?,
            kind: values.take("type")?,
            age: values.take("age")?,
        })
    }
}

castfit::structure_type!(Pet);

#[derive(Debug, Clone, PartialEq)]
struct Owner {
    name: String,
    email: Option<String>,
    pets: Vec<Pet>,
}

impl Structure for Owner {
    fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
        fields
            .field::<String>("name")
            .field::<Option<String>>("email")
            .field::<Vec<Pet>>("pets")
    }

    fn build(values: &mut FieldValues) -> Result<Self, CastError> {
        Ok(Self {
            name: values.take("name")?,
            email: values.take("email")?,
            pets: values.take("pets")?,
        })
    }
}

castfit::structure_type!(Owner);

#[derive(Debug, Clone, PartialEq)]
struct Args {
    host: String,
    port: i64,
    timeout: Option<f64>,
    output: PathBuf,
    debug: bool,
}

impl Structure for Args {
    fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
        fields
            .field_default::<String>("host", "localhost")
            .field::<i64>("port")
            .field::<Option<f64>>("timeout")
            .field::<PathBuf>("output")
            .field_default::<bool>("debug", false)
    }

    fn build(values: &mut FieldValues) -> Result<Self, CastError> {
        Ok(Self {
            host: values.take("host")?,
            port: values.take("port")?,
            timeout: values.take("timeout")?,
            output: values.take("output")?,
            debug: values.take("debug")?,
        })
    }
}

castfit::structure_type!(Args);

#[test]
fn test_nested_owner_and_pets() {
    let input = json!({
        "name": "Alice",
        "pets": [
            {"name": "Whiskers", "type": "cat", "age": 5},
            {"name": "Rex", "type": "dog", "age": "2.5"},
        ],
    });

    let owner: Owner = castfit(input).unwrap();
    assert_eq!(owner.name, "Alice");
    assert_eq!(owner.email, None);
    assert_eq!(owner.pets.len(), 2);
    assert_eq!(owner.pets[1].age, 2);
    assert_eq!(owner.pets[1].kind, "dog");
}

#[test]
fn test_literal_rejected_with_path() {
    let input = json!({
        "name": "Bob",
        "pets": [
            {"name": "Whiskers", "type": "cat", "age": 5},
            {"name": "Tweety", "type": "bird", "age": 1},
        ],
    });

    let err = castfit::<Owner>(input).unwrap_err();
    match &err {
        CastError::LiteralMismatch {
            path,
            value,
            allowed,
        } => {
            assert_eq!(path.to_string(), "pets[1].type");
            assert_eq!(value, "\"bird\"");
            assert_eq!(allowed.len(), 3);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "\"bird\" is not one of [\"cat\", \"dog\", \"other\"] at pets[1].type"
    );
}

#[test]
fn test_missing_required_field() {
    let err = castfit::<Owner>(json!({"pets": []})).unwrap_err();
    match err {
        CastError::MissingField { path, field } => {
            assert_eq!(field, "name");
            assert!(path.is_root());
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = castfit::<Owner>(json!({"name": "C", "pets": [{"name": "Rex", "type": "dog"}]}))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "missing required field `age` at pets[0]"
    );
}

#[test]
fn test_type_mismatch_path() {
    let err = castfit::<Owner>(json!({
        "name": "D",
        "pets": [{"name": "Rex", "type": "dog", "age": "old"}],
    }))
    .unwrap_err();
    assert!(matches!(err, CastError::TypeMismatch { .. }));
    assert_eq!(err.path().unwrap().to_string(), "pets[0].age");
}

#[test]
fn test_cli_style_arguments() {
    let input = Value::map([
        ("port", Value::from("8080")),
        ("output", Value::from("/tmp/out.json")),
        ("debug", Value::from("yes")),
    ]);
    let args: Args = castfit(input).unwrap();
    assert_eq!(
        args,
        Args {
            host: "localhost".into(),
            port: 8080,
            timeout: None,
            output: PathBuf::from("/tmp/out.json"),
            debug: true,
        }
    );

    let args: Args = castfit(json!({"port": 1, "output": "x", "timeout": "2.5"})).unwrap();
    assert_eq!(args.timeout, Some(2.5));
    assert!(!args.debug);
}

#[test]
fn test_extra_keys_ignored() {
    let pet: Pet = castfit(json!({
        "name": "Rex",
        "type": "dog",
        "age": 3,
        "color": "brown",
    }))
    .unwrap();
    assert_eq!(pet.age, 3);
}

#[test]
fn test_non_map_input_without_converter() {
    let err = castfit::<Pet>(json!(["Rex", "dog", 3])).unwrap_err();
    match err {
        CastError::NoConverter { found, expected, .. } => {
            assert_eq!(found, "list");
            assert_eq!(expected, "Pet");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_field_table_metadata() {
    let table = castfit::fields_of::<Owner>().unwrap();
    assert_eq!(table.name(), "Owner");
    let email = table.get("email").unwrap();
    assert!(email.descriptor.accepts_null());
    assert!(!email.has_default());
    assert_eq!(table.get("pets").unwrap().descriptor.name, "list[Pet]");
}
