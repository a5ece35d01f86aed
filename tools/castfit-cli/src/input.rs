// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Command-line input: `KEY=VALUE` assignments and JSON payloads.

use castfit::{FieldTable, Map, TypeDescriptor, TypeKind, Value};
use thiserror::Error;

/// Input errors.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("expected KEY=VALUE, got `{0}`")]
    MissingSeparator(String),

    #[error("empty key in `{0}`")]
    EmptyKey(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a JSON payload into a castfit value.
pub fn parse_json(text: &str) -> Result<Value, InputError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    Ok(json.into())
}

/// Collect `KEY=VALUE` arguments into a mapping of strings.
///
/// A repeated key collects into a list. A key naming a sequence field of
/// `table` is always a list, even when given once.
pub fn parse_assignments<I, S>(args: I, table: Option<&FieldTable>) -> Result<Map, InputError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut map = Map::new();

    for arg in args {
        let arg = arg.as_ref();
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| InputError::MissingSeparator(arg.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(InputError::EmptyKey(arg.to_string()));
        }
        let value = Value::from(value);

        match map.remove(key) {
            None => {
                map.insert(key.to_string(), value);
            }
            Some(Value::List(mut items)) => {
                items.push(value);
                map.insert(key.to_string(), Value::List(items));
            }
            Some(first) => {
                map.insert(key.to_string(), Value::List(vec![first, value]));
            }
        }
    }

    if let Some(table) = table {
        for field in table.iter().filter(|f| is_sequence(&f.descriptor)) {
            if let Some(value) = map.get_mut(&field.name) {
                if !matches!(value, Value::List(_)) {
                    *value = Value::List(vec![std::mem::take(value)]);
                }
            }
        }
    }

    Ok(map)
}

fn is_sequence(descriptor: &TypeDescriptor) -> bool {
    match &descriptor.kind {
        TypeKind::Sequence(_) | TypeKind::Set(_) | TypeKind::VarTuple(_) => true,
        TypeKind::Optional(inner) => is_sequence(inner),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castfit::{Annotation, FieldTableBuilder, TypeCatalog};

    #[test]
    fn test_single_assignments() {
        let map = parse_assignments(["port=8080", "host=a=b"], None).unwrap();
        assert_eq!(map.get("port"), Some(&Value::from("8080")));
        assert_eq!(map.get("host"), Some(&Value::from("a=b")));
    }

    #[test]
    fn test_repeated_key_collects() {
        let map = parse_assignments(["tag=a", "tag=b", "tag=c"], None).unwrap();
        assert_eq!(map.get("tag"), Some(&Value::list(["a", "b", "c"])));
    }

    #[test]
    fn test_sequence_field_always_list() {
        let catalog = TypeCatalog::new();
        let table = FieldTableBuilder::new("Args")
            .field_as("tag", Annotation::optional(Annotation::list(Annotation::str())))
            .field::<String>("name")
            .build(&catalog)
            .unwrap();

        let map = parse_assignments(["tag=a", "name=x"], Some(&table)).unwrap();
        assert_eq!(map.get("tag"), Some(&Value::list(["a"])));
        assert_eq!(map.get("name"), Some(&Value::from("x")));
    }

    #[test]
    fn test_malformed_assignments() {
        assert!(matches!(
            parse_assignments(["port"], None),
            Err(InputError::MissingSeparator(_))
        ));
        assert!(matches!(
            parse_assignments(["=1"], None),
            Err(InputError::EmptyKey(_))
        ));
    }

    #[test]
    fn test_parse_json() {
        let value = parse_json(r#"{"a": [1, "2"]}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::list([Value::Int(1), Value::from("2")])));
        assert!(matches!(parse_json("{"), Err(InputError::Json(_))));
    }
}
