// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Exact type membership, without coercion.

use crate::types::{TypeDescriptor, TypeKind};
use crate::value::Value;

/// Check whether `value` already belongs to `descriptor`.
///
/// Empty lists, sets and maps match any element type. A list is not a set.
pub fn is_type(value: &Value, descriptor: &TypeDescriptor) -> bool {
    match &descriptor.kind {
        TypeKind::Any => true,
        TypeKind::Never => false,
        TypeKind::Null => value.is_null(),
        TypeKind::Scalar(key) => value.type_key() == *key,
        TypeKind::Optional(inner) => value.is_null() || is_type(value, inner),
        TypeKind::Union(members) => members.iter().any(|m| is_type(value, m)),
        TypeKind::Literal(allowed) => allowed.iter().any(|l| l.matches(value)),
        TypeKind::Sequence(element) | TypeKind::VarTuple(element) => match value {
            Value::List(items) => items.iter().all(|item| is_type(item, element)),
            _ => false,
        },
        TypeKind::Set(element) => match value {
            Value::Set(items) => items.iter().all(|item| is_type(item, element)),
            _ => false,
        },
        TypeKind::Tuple(elements) => match value {
            Value::List(items) => {
                items.len() == elements.len()
                    && items.iter().zip(elements).all(|(item, e)| is_type(item, e))
            }
            _ => false,
        },
        TypeKind::Mapping(element) => match value {
            Value::Map(map) => map.values().all(|item| is_type(item, element)),
            _ => false,
        },
        TypeKind::Structure(structure) => match value {
            Value::Object(obj) => obj.type_key() == structure.key(),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Annotation, TypeCatalog};

    fn check(value: impl Into<Value>, annotation: &str) -> bool {
        let catalog = TypeCatalog::new();
        let annotation: Annotation = annotation.parse().unwrap();
        is_type(&value.into(), &catalog.normalize(&annotation))
    }

    #[test]
    fn test_scalars() {
        assert!(check(1i64, "int"));
        assert!(!check("1", "int"));
        assert!(!check(true, "int"));
        assert!(check(Value::Null, "optional[int]"));
        assert!(check(Value::Null, "none"));
        assert!(!check(0i64, "none"));
        assert!(check("x", "any"));
        assert!(!check("x", "never"));
    }

    #[test]
    fn test_containers() {
        assert!(check(Value::list([1i64, 2]), "list[int]"));
        assert!(!check(Value::list([Value::Int(1), "2".into()]), "list[int]"));
        assert!(check(Value::List(vec![]), "list[str]"));
        assert!(check(
            Value::list([Value::Int(3), "yes".into(), Value::Float(7.5)]),
            "tuple[int, str, float]"
        ));
        assert!(!check(Value::list([3i64]), "tuple[int, str]"));
        assert!(check(Value::list([1i64, 2, 3]), "tuple[int, ...]"));
        assert!(check(Value::map([("a", 1.5)]), "dict[str, float]"));
        assert!(check(Value::set([1i64, 2]), "set[int]"));
        assert!(!check(Value::list([1i64, 2]), "set[int]"));
        assert!(!check(Value::set(["a"]), "set[int]"));
    }

    #[test]
    fn test_unions_and_literals() {
        assert!(check("a", "int | str"));
        assert!(!check(1.5, "int | str"));
        assert!(check("cat", r#"literal["cat", "dog"]"#));
        assert!(!check(1i64, "literal[true]"));
    }
}
