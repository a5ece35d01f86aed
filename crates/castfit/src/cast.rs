// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Recursive object construction.

use crate::check;
use crate::convert::Converters;
use crate::error::{BoxError, CastError, FieldPath, PathSegment};
use crate::fields::{FieldTable, FieldTables, FieldValues, Structure, StructureRef};
use crate::types::{Annotation, TypeCatalog, TypeDescriptor, TypeKind, Typed};
use crate::value::{distinct, FromValue, LiteralValue, Map, Value};
use std::sync::Arc;

/// Per-call state: the path of the value being cast.
#[derive(Debug, Default)]
pub struct CastContext {
    path: FieldPath,
}

impl CastContext {
    /// Start at the root.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Run `f` with `segment` pushed; the segment is popped on both outcomes.
    fn enter<T>(
        &mut self,
        segment: PathSegment,
        f: impl FnOnce(&mut Self) -> Result<T, CastError>,
    ) -> Result<T, CastError> {
        self.path.push(segment);
        let result = f(self);
        self.path.pop();
        result
    }
}

/// Catalog, field tables and converters used for one cast.
///
/// [`Caster::global`] backs the free functions of this crate.
#[derive(Debug, Clone, Copy)]
pub struct Caster<'a> {
    catalog: &'a TypeCatalog,
    tables: &'a FieldTables,
    converters: &'a Converters,
}

impl Caster<'static> {
    /// Caster over the process-wide caches and registry.
    pub fn global() -> Self {
        Self::new(
            TypeCatalog::global(),
            FieldTables::global(),
            Converters::global(),
        )
    }
}

impl<'a> Caster<'a> {
    pub fn new(
        catalog: &'a TypeCatalog,
        tables: &'a FieldTables,
        converters: &'a Converters,
    ) -> Self {
        Self {
            catalog,
            tables,
            converters,
        }
    }

    /// Global caches with a replacement converter registry.
    ///
    /// Only `converters` is consulted for registered functions; built-in
    /// conversions still apply.
    pub fn with_converters(converters: &'a Converters) -> Self {
        Self::new(TypeCatalog::global(), FieldTables::global(), converters)
    }

    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    pub fn tables(&self) -> &'a FieldTables {
        self.tables
    }

    pub fn converters(&self) -> &'a Converters {
        self.converters
    }

    /// Cast `value` against a declared annotation.
    pub fn cast(&self, value: impl Into<Value>, annotation: &Annotation) -> Result<Value, CastError> {
        let descriptor = self.catalog.normalize(annotation);
        self.cast_value(value.into(), &descriptor, &mut CastContext::new())
    }

    /// Cast `value` to the Rust type `T`.
    pub fn to_type<T: Typed + FromValue>(&self, value: impl Into<Value>) -> Result<T, CastError> {
        let descriptor = self.catalog.descriptor_of::<T>();
        let cast = self.cast_value(value.into(), &descriptor, &mut CastContext::new())?;
        T::from_value(cast)
    }

    /// Build the structure `T` from a mapping.
    pub fn castfit<T: Structure>(&self, input: impl Into<Value>) -> Result<T, CastError> {
        let descriptor = self.catalog.normalize(&Annotation::structure::<T>());
        let built = self.cast_value(input.into(), &descriptor, &mut CastContext::new())?;
        built.into_object::<T>()
    }

    /// Check membership without coercion.
    pub fn is_type(&self, value: &Value, annotation: &Annotation) -> bool {
        check::is_type(value, &self.catalog.normalize(annotation))
    }

    /// Descriptor for an annotation through this caster's catalog.
    pub fn normalize(&self, annotation: &Annotation) -> Arc<TypeDescriptor> {
        self.catalog.normalize(annotation)
    }

    /// Field table of `T`.
    pub fn fields_of<T: Structure>(&self) -> Result<Arc<FieldTable>, CastError> {
        self.tables.table(&StructureRef::of::<T>(), self.catalog)
    }

    /// Cast `value` against `descriptor`, dispatching on its kind.
    pub fn cast_value(
        &self,
        value: Value,
        descriptor: &TypeDescriptor,
        ctx: &mut CastContext,
    ) -> Result<Value, CastError> {
        match &descriptor.kind {
            TypeKind::Any => Ok(value),
            TypeKind::Never => Err(no_converter(&value, descriptor, ctx)),
            TypeKind::Null => Ok(Value::Null),
            TypeKind::Optional(inner) => {
                if value.is_null() {
                    Ok(Value::Null)
                } else {
                    self.cast_value(value, inner, ctx)
                }
            }
            TypeKind::Union(members) => self.cast_union(value, descriptor, members, ctx),
            TypeKind::Literal(allowed) => self.cast_literal(value, allowed, ctx),
            TypeKind::Sequence(element) | TypeKind::VarTuple(element) => match value {
                Value::List(items) | Value::Set(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        ctx.enter(PathSegment::Index(i), |ctx| {
                            self.cast_value(item, element, ctx)
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                other => self.convert(other, descriptor, ctx),
            },
            TypeKind::Set(element) => {
                let items = match value {
                    Value::List(items) | Value::Set(items) => items,
                    Value::Map(map) => map.into_keys().map(Value::Str).collect(),
                    other => return self.convert(other, descriptor, ctx),
                };
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| {
                        ctx.enter(PathSegment::Index(i), |ctx| {
                            self.cast_value(item, element, ctx)
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(|cast| Value::Set(distinct(cast)))
            }
            TypeKind::Tuple(elements) => match value {
                Value::List(items) if items.len() == elements.len() => items
                    .into_iter()
                    .zip(elements)
                    .enumerate()
                    .map(|(i, (item, element))| {
                        ctx.enter(PathSegment::Index(i), |ctx| {
                            self.cast_value(item, element, ctx)
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List),
                Value::List(items) => Err(CastError::TypeMismatch {
                    path: ctx.path.clone(),
                    expected: descriptor.name.clone(),
                    found: format!("list of {}", items.len()),
                    source: Some(
                        format!("expected {} elements, got {}", elements.len(), items.len())
                            .into(),
                    ),
                }),
                other => self.convert(other, descriptor, ctx),
            },
            TypeKind::Mapping(element) => match value {
                Value::Map(map) => map
                    .into_iter()
                    .map(|(key, item)| {
                        let cast = ctx.enter(PathSegment::Key(key.clone()), |ctx| {
                            self.cast_value(item, element, ctx)
                        })?;
                        Ok((key, cast))
                    })
                    .collect::<Result<Map, CastError>>()
                    .map(Value::Map),
                other => self.convert(other, descriptor, ctx),
            },
            TypeKind::Structure(structure) => {
                self.cast_structure(value, descriptor, structure, ctx)
            }
            TypeKind::Scalar(_) => self.convert(value, descriptor, ctx),
        }
    }

    /// Cast a mapping against a field table, field by field.
    ///
    /// Keys not named in the table are ignored.
    pub fn cast_fields(
        &self,
        table: &FieldTable,
        mut input: Map,
        ctx: &mut CastContext,
    ) -> Result<Map, CastError> {
        let mut resolved = Map::new();
        for spec in table.iter() {
            let value = match input.remove(&spec.name) {
                Some(value) => value,
                None => match &spec.default {
                    Some(default) => default.clone(),
                    None if spec.descriptor.accepts_null() => Value::Null,
                    None => {
                        return Err(CastError::MissingField {
                            path: ctx.path.clone(),
                            field: spec.name.clone(),
                        })
                    }
                },
            };
            let cast = ctx.enter(PathSegment::Field(spec.name.clone()), |ctx| {
                self.cast_value(value, &spec.descriptor, ctx)
            })?;
            resolved.insert(spec.name.clone(), cast);
        }
        Ok(resolved)
    }

    fn cast_union(
        &self,
        value: Value,
        descriptor: &TypeDescriptor,
        members: &[Arc<TypeDescriptor>],
        ctx: &mut CastContext,
    ) -> Result<Value, CastError> {
        let mut last: Option<CastError> = None;
        for member in members {
            match self.cast_value(value.clone(), member, ctx) {
                Ok(cast) => return Ok(cast),
                Err(err) => {
                    log::trace!(
                        "[cast] {}: alternative {} of {} failed: {}",
                        ctx.path,
                        member.name,
                        descriptor.name,
                        err
                    );
                    last = Some(err);
                }
            }
        }
        Err(CastError::TypeMismatch {
            path: ctx.path.clone(),
            expected: descriptor.name.clone(),
            found: value.describe(),
            source: last.map(|err| Box::new(err) as BoxError),
        })
    }

    fn cast_literal(
        &self,
        value: Value,
        allowed: &[LiteralValue],
        ctx: &mut CastContext,
    ) -> Result<Value, CastError> {
        if allowed.iter().any(|literal| literal.matches(&value)) {
            return Ok(value);
        }

        // One scalar coercion per distinct literal type, kept only when it
        // converts back to the input unchanged.
        let source = value.type_key();
        let mut tried = Vec::new();
        for literal in allowed {
            let key = literal.type_key();
            if key == source || tried.contains(&key) {
                continue;
            }
            tried.push(key);
            let target = self.catalog.normalize(&Annotation::Scalar(key));
            let Some(converter) = self.converters.resolve(source, &target) else {
                continue;
            };
            let Ok(cast) = converter.apply(value.clone(), &target) else {
                continue;
            };
            if !allowed.iter().any(|literal| literal.matches(&cast)) {
                continue;
            }
            let source_descriptor = self.catalog.normalize(&Annotation::Scalar(source));
            let back = self
                .converters
                .resolve(key, &source_descriptor)
                .and_then(|converter| converter.apply(cast.clone(), &source_descriptor).ok());
            if back.as_ref() == Some(&value) {
                return Ok(cast);
            }
        }

        Err(CastError::LiteralMismatch {
            path: ctx.path.clone(),
            value: value.to_string(),
            allowed: allowed.to_vec(),
        })
    }

    fn cast_structure(
        &self,
        value: Value,
        descriptor: &TypeDescriptor,
        structure: &StructureRef,
        ctx: &mut CastContext,
    ) -> Result<Value, CastError> {
        match value {
            Value::Object(obj) if obj.type_key() == structure.key() => Ok(Value::Object(obj)),
            Value::Map(input) => {
                let table = self.tables.table(structure, self.catalog)?;
                let fields = self.cast_fields(&table, input, ctx)?;
                let mut values = FieldValues::new(ctx.path.clone(), fields);
                structure.construct(&mut values).map(Value::Object)
            }
            other => self.convert(other, descriptor, ctx),
        }
    }

    /// Resolve a converter for `value` and apply it.
    fn convert(
        &self,
        value: Value,
        descriptor: &TypeDescriptor,
        ctx: &CastContext,
    ) -> Result<Value, CastError> {
        let converter = match self.converters.resolve(value.type_key(), descriptor) {
            Some(converter) => converter,
            None => return Err(no_converter(&value, descriptor, ctx)),
        };
        let found = value.describe();
        converter
            .apply(value, descriptor)
            .map_err(|source| CastError::TypeMismatch {
                path: ctx.path.clone(),
                expected: descriptor.name.clone(),
                found,
                source: Some(source),
            })
    }
}

fn no_converter(value: &Value, descriptor: &TypeDescriptor, ctx: &CastContext) -> CastError {
    CastError::NoConverter {
        path: ctx.path.clone(),
        found: value.type_key().to_string(),
        expected: descriptor.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeKey;

    fn caster_parts() -> (TypeCatalog, FieldTables, Converters) {
        (TypeCatalog::new(), FieldTables::new(), Converters::new())
    }

    #[test]
    fn test_scalars() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        assert_eq!(caster.to_type::<i64>("4").unwrap(), 4);
        assert_eq!(caster.to_type::<f64>("3.2").unwrap(), 3.2);
        assert_eq!(caster.to_type::<i64>("2.5").unwrap(), 2);
        assert_eq!(caster.to_type::<String>(7i64).unwrap(), "7");
        assert!(caster.to_type::<Value>(Value::Null).unwrap().is_null());
    }

    #[test]
    fn test_null_and_never() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        assert_eq!(caster.cast("anything", &Annotation::None).unwrap(), Value::Null);
        let err = caster.cast(1i64, &Annotation::Never).unwrap_err();
        assert!(matches!(err, CastError::NoConverter { .. }));
    }

    #[test]
    fn test_union_first_success() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        let float_or_int = Annotation::union([Annotation::float(), Annotation::int()]);
        assert_eq!(caster.cast(42i64, &float_or_int).unwrap(), Value::Float(42.0));

        let int_or_str = Annotation::union([Annotation::int(), Annotation::str()]);
        assert_eq!(caster.cast("abc", &int_or_str).unwrap(), Value::from("abc"));

        let err = caster
            .cast(Value::map([("a", 1i64)]), &int_or_str)
            .unwrap_err();
        match err {
            CastError::TypeMismatch { expected, source, .. } => {
                assert_eq!(expected, "int | str");
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_literal_coercion() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        let mode = Annotation::literal([1i64, 2]);
        assert_eq!(caster.cast("2", &mode).unwrap(), Value::Int(2));
        assert_eq!(caster.cast(1i64, &mode).unwrap(), Value::Int(1));

        let err = caster.cast("3", &mode).unwrap_err();
        assert_eq!(err.to_string(), "\"3\" is not one of [1, 2] at <root>");
    }

    #[test]
    fn test_literal_coercion_must_be_lossless() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        let mode = Annotation::literal([1i64, 2]);
        assert_eq!(caster.cast(2.0, &mode).unwrap(), Value::Int(2));
        assert!(matches!(
            caster.cast(2.7, &mode),
            Err(CastError::LiteralMismatch { .. })
        ));
        assert!(matches!(
            caster.cast("1.9", &Annotation::literal([1i64])),
            Err(CastError::LiteralMismatch { .. })
        ));
        assert_eq!(
            caster.cast(1i64, &Annotation::literal(["1", "x"])).unwrap(),
            Value::from("1")
        );
    }

    #[test]
    fn test_containers_record_paths() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);

        let list = Annotation::list(Annotation::int());
        assert_eq!(
            caster.cast(Value::list(["1", "2"]), &list).unwrap(),
            Value::list([1i64, 2])
        );
        let err = caster.cast(Value::list(["1", "x"]), &list).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "[1]");

        let scores = Annotation::dict(Annotation::float());
        let err = caster
            .cast(Value::map([("alice", "9.5"), ("bob", "n/a")]), &scores)
            .unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "[bob]");
    }

    #[test]
    fn test_tuple_arity() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        let pair = Annotation::tuple([Annotation::int(), Annotation::str()]);
        assert_eq!(
            caster.cast(Value::list(["1", "a"]), &pair).unwrap(),
            Value::list([Value::Int(1), Value::from("a")])
        );
        let err = caster.cast(Value::list([1i64]), &pair).unwrap_err();
        assert!(matches!(err, CastError::TypeMismatch { .. }));

        let many = Annotation::var_tuple(Annotation::float());
        assert_eq!(
            caster.cast(Value::list([1i64, 2, 3]), &many).unwrap(),
            Value::list([1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn test_sequence_rejects_non_list() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        let err = caster
            .cast("1,2", &Annotation::list(Annotation::int()))
            .unwrap_err();
        match err {
            CastError::NoConverter { found, expected, .. } => {
                assert_eq!(found, "str");
                assert_eq!(expected, "list[int]");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sets_dedupe_after_cast() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        let floats = Annotation::set(Annotation::float());
        assert_eq!(
            caster
                .cast(Value::list([Value::Int(1), Value::from("2"), Value::Float(3.0)]), &floats)
                .unwrap(),
            Value::set([1.0, 2.0, 3.0])
        );

        let ints = Annotation::set(Annotation::int());
        assert_eq!(
            caster
                .cast(Value::list([Value::from("1"), Value::Int(1), Value::from("1")]), &ints)
                .unwrap(),
            Value::set([1i64])
        );
        assert_eq!(
            caster.cast(Value::map([("b", 1i64), ("a", 2)]), &Annotation::set(Annotation::str())).unwrap(),
            Value::set(["a", "b"])
        );

        let err = caster.cast(Value::list(["1", "x"]), &ints).unwrap_err();
        assert_eq!(err.path().unwrap().to_string(), "[1]");

        // A set still casts to a list.
        assert_eq!(
            caster.cast(Value::set([2i64, 1]), &Annotation::list(Annotation::str())).unwrap(),
            Value::list(["2", "1"])
        );
    }

    #[test]
    fn test_containers_fall_back_to_converters() {
        let (catalog, tables, converters) = caster_parts();
        let caster = Caster::new(&catalog, &tables, &converters);
        converters.register(TypeKey::str(), TypeKey::list(), |value| {
            let text = String::from_value(value)?;
            Ok(Value::list(text.split(',').map(str::to_string).collect::<Vec<_>>()))
        });

        let list = Annotation::list(Annotation::str());
        assert_eq!(caster.cast("a,b", &list).unwrap(), Value::list(["a", "b"]));
        let pair = Annotation::tuple([Annotation::str(), Annotation::str()]);
        assert_eq!(caster.cast("a,b", &pair).unwrap(), Value::list(["a", "b"]));

        let err = caster.cast("a,b", &Annotation::dict(Annotation::int())).unwrap_err();
        assert!(matches!(err, CastError::NoConverter { .. }));
    }

    #[test]
    fn test_converter_errors_carry_cause() {
        let (catalog, tables, converters) = caster_parts();
        converters.register(TypeKey::str(), TypeKey::int(), |_| Err("nope".into()));
        let caster = Caster::new(&catalog, &tables, &converters);
        let err = caster.cast("1", &Annotation::int()).unwrap_err();
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("nope"));
    }
}
