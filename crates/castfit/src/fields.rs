// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structure field tables.
//!
//! A target structure declares its fields once through a
//! [`FieldTableBuilder`]; the resulting [`FieldTable`] is cached per Rust
//! type. Descriptors only hold a [`StructureRef`], so a structure may refer
//! to itself or to types declared later.

use crate::cast::{CastContext, Caster};
use crate::error::{CastError, FieldPath};
use crate::types::{Annotation, TypeCatalog, TypeDescriptor, TypeKey, Typed};
use crate::value::{FromValue, Map, Object, Value};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

static GLOBAL_TABLES: OnceLock<FieldTables> = OnceLock::new();

/// A Rust type that can be built from a mapping.
///
/// ```
/// use castfit::{FieldTableBuilder, FieldValues, Structure, CastError};
///
/// #[derive(Clone)]
/// struct Server {
///     host: String,
///     port: i64,
/// }
///
/// impl Structure for Server {
///     fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
///         fields.field::<String>("host").field_default::<i64>("port", 8080)
///     }
///
///     fn build(values: &mut FieldValues) -> Result<Self, CastError> {
///         Ok(Self {
///             host: values.take("host")?,
///             port: values.take("port")?,
///         })
///     }
/// }
/// ```
pub trait Structure: Any + Clone + Send + Sync {
    /// Declare fields, in order.
    fn declare(fields: FieldTableBuilder) -> FieldTableBuilder;

    /// Assemble the value once every field has been cast.
    fn build(values: &mut FieldValues) -> Result<Self, CastError>;
}

/// Type-erased handle to a [`Structure`] implementation.
#[derive(Clone, Copy)]
pub struct StructureRef {
    key: TypeKey,
    declare: fn(FieldTableBuilder) -> FieldTableBuilder,
    build: fn(&mut FieldValues) -> Result<Object, CastError>,
}

impl StructureRef {
    pub fn of<T: Structure>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            declare: T::declare,
            build: build_object::<T>,
        }
    }

    /// Rust type of the structure.
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }

    pub(crate) fn declare(&self) -> FieldTableBuilder {
        (self.declare)(FieldTableBuilder::new(self.name()))
    }

    pub(crate) fn construct(&self, values: &mut FieldValues) -> Result<Object, CastError> {
        (self.build)(values)
    }
}

fn build_object<T: Structure>(values: &mut FieldValues) -> Result<Object, CastError> {
    T::build(values).map(Object::new)
}

impl PartialEq for StructureRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for StructureRef {}

impl Hash for StructureRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for StructureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructureRef({})", self.key.name())
    }
}

// ============================================================================
// Field tables
// ============================================================================

/// Per-field metadata.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub descriptor: Arc<TypeDescriptor>,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Ordered fields of one structure.
#[derive(Debug, Clone)]
pub struct FieldTable {
    name: String,
    fields: Vec<FieldSpec>,
}

impl FieldTable {
    /// Structure name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter()
    }

    /// Get field by name.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Cast a mapping field by field, without constructing a Rust value.
    ///
    /// Used for tables declared at runtime.
    pub fn cast_fields(&self, caster: &Caster<'_>, input: Map) -> Result<Map, CastError> {
        caster.cast_fields(self, input, &mut CastContext::new())
    }
}

struct FieldDecl {
    name: String,
    annotation: Option<Annotation>,
    default: Option<Value>,
}

/// Fluent field declaration.
pub struct FieldTableBuilder {
    name: String,
    fields: Vec<FieldDecl>,
}

impl FieldTableBuilder {
    /// Start a table for the named structure.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Required field typed after `T`.
    pub fn field<T: Typed>(self, name: &str) -> Self {
        self.declare(name, Some(T::annotation()), None)
    }

    /// Required field with an explicit annotation.
    pub fn field_as(self, name: &str, annotation: Annotation) -> Self {
        self.declare(name, Some(annotation), None)
    }

    /// Field typed after `T` with a default.
    pub fn field_default<T: Typed>(self, name: &str, default: impl Into<Value>) -> Self {
        self.declare(name, Some(T::annotation()), Some(default.into()))
    }

    /// Field with an explicit annotation and a default.
    pub fn field_with_default(
        self,
        name: &str,
        annotation: Annotation,
        default: impl Into<Value>,
    ) -> Self {
        self.declare(name, Some(annotation), Some(default.into()))
    }

    /// Field whose type is inferred from its default.
    pub fn untyped(self, name: &str, default: impl Into<Value>) -> Self {
        self.declare(name, None, Some(default.into()))
    }

    /// General form. A field needs an annotation, a default, or both.
    pub fn declare(
        mut self,
        name: &str,
        annotation: Option<Annotation>,
        default: Option<Value>,
    ) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            annotation,
            default,
        });
        self
    }

    /// Normalize every field through `catalog`.
    pub fn build(self, catalog: &TypeCatalog) -> Result<FieldTable, CastError> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.fields.len());

        for decl in self.fields {
            if !seen.insert(decl.name.clone()) {
                return Err(CastError::InvalidField {
                    structure: self.name,
                    field: decl.name,
                    reason: "declared more than once".into(),
                });
            }
            let annotation = match (decl.annotation, &decl.default) {
                (Some(annotation), _) => annotation,
                (None, Some(default)) => Annotation::infer(default),
                (None, None) => {
                    return Err(CastError::InvalidField {
                        structure: self.name,
                        field: decl.name,
                        reason: "no type annotation and no default".into(),
                    })
                }
            };
            fields.push(FieldSpec {
                name: decl.name,
                descriptor: catalog.normalize(&annotation),
                default: decl.default,
            });
        }

        log::debug!("[fields] built table for {} ({} fields)", self.name, fields.len());
        Ok(FieldTable {
            name: self.name,
            fields,
        })
    }
}

/// Field tables cached per structure type.
#[derive(Debug, Default)]
pub struct FieldTables {
    tables: DashMap<TypeId, Arc<FieldTable>>,
}

impl FieldTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache.
    pub fn global() -> &'static FieldTables {
        GLOBAL_TABLES.get_or_init(FieldTables::new)
    }

    /// Table for `structure`, built on first request.
    ///
    /// Declaration errors are returned every time and never cached.
    pub fn table(
        &self,
        structure: &StructureRef,
        catalog: &TypeCatalog,
    ) -> Result<Arc<FieldTable>, CastError> {
        let id = structure.key().id();
        let cached = self.tables.get(&id).map(|entry| Arc::clone(entry.value()));
        if let Some(table) = cached {
            return Ok(table);
        }
        let table = Arc::new(structure.declare().build(catalog)?);
        let entry = self.tables.entry(id).or_insert(table);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

// ============================================================================
// Resolved values
// ============================================================================

/// Cast field values handed to [`Structure::build`].
#[derive(Debug)]
pub struct FieldValues {
    path: FieldPath,
    values: Map,
}

impl FieldValues {
    pub(crate) fn new(path: FieldPath, values: Map) -> Self {
        Self { path, values }
    }

    /// Take a field as a Rust value.
    ///
    /// Absent fields read as null, so `Option` fields become `None`.
    pub fn take<T: FromValue>(&mut self, name: &str) -> Result<T, CastError> {
        let value = self.take_value(name);
        T::from_value(value).map_err(|err| err.at(self.path.field(name)))
    }

    /// Take a field as a dynamic value (null when absent).
    pub fn take_value(&mut self, name: &str) -> Value {
        self.values.remove(name).unwrap_or_default()
    }

    /// Borrow a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Path of the structure being built.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Sample;

    impl Structure for Sample {
        fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
            fields
                .field::<String>("name")
                .field_default::<i64>("count", 3)
                .untyped("tags", Value::List(vec![]))
                .untyped("extra", Value::Null)
        }

        fn build(_values: &mut FieldValues) -> Result<Self, CastError> {
            Ok(Self)
        }
    }

    #[test]
    fn test_table_from_declaration() {
        let catalog = TypeCatalog::new();
        let tables = FieldTables::new();
        let table = tables.table(&StructureRef::of::<Sample>(), &catalog).unwrap();

        assert_eq!(table.name(), "Sample");
        let names: Vec<&str> = table.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["name", "count", "tags", "extra"]);
        assert!(!table.get("name").unwrap().has_default());
        assert_eq!(table.get("count").unwrap().default, Some(Value::Int(3)));
        assert_eq!(table.get("tags").unwrap().descriptor.name, "list[any]");
        assert_eq!(table.get("extra").unwrap().descriptor.name, "any");
    }

    #[test]
    fn test_table_is_cached() {
        let catalog = TypeCatalog::new();
        let tables = FieldTables::new();
        let first = tables.table(&StructureRef::of::<Sample>(), &catalog).unwrap();
        let second = tables.table(&StructureRef::of::<Sample>(), &catalog).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_concurrent_table_shares_entry() {
        use std::sync::Barrier;
        use std::thread;

        let catalog = Arc::new(TypeCatalog::new());
        let tables = Arc::new(FieldTables::new());
        let barrier = Arc::new(Barrier::new(16));
        let mut handles = vec![];

        for _ in 0..16 {
            let catalog = Arc::clone(&catalog);
            let tables = Arc::clone(&tables);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                tables.table(&StructureRef::of::<Sample>(), &catalog).unwrap()
            }));
        }

        let built: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for table in &built[1..] {
            assert!(Arc::ptr_eq(&built[0], table));
        }
        assert_eq!(tables.len(), 1);
    }

    #[test]
    fn test_invalid_declarations() {
        let catalog = TypeCatalog::new();

        let err = FieldTableBuilder::new("Broken")
            .declare("mystery", None, None)
            .build(&catalog)
            .unwrap_err();
        assert!(matches!(
            err,
            CastError::InvalidField { ref field, .. } if field == "mystery"
        ));

        let err = FieldTableBuilder::new("Broken")
            .field::<i64>("a")
            .field::<String>("a")
            .build(&catalog)
            .unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_take_relocates_errors() {
        let mut values = FieldValues::new(
            FieldPath::root().field("owner"),
            Map::from([("age".to_string(), Value::from("x"))]),
        );
        let err = values.take::<i64>("age").unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "owner.age");
        assert_eq!(values.take::<Option<i64>>("missing").unwrap(), None);
    }
}
