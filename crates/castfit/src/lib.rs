// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Castfit: type coercion for untyped data
//!
//! Builds typed Rust values out of loosely-typed input (parsed JSON,
//! command-line strings, configuration maps) by walking the declared type
//! and coercing each value on the way.
//!
//! # Features
//!
//! - **Type Catalog**: declared types normalized once into shared descriptors
//! - **Converter Registry**: user conversions take precedence over built-ins
//! - **Structures**: nested records, sequences, optional, union and literal types
//! - **Field Paths**: every error says where it happened (`pets[1].type`)
//!
//! # Example
//!
//! ```rust
//! use castfit::{CastError, FieldTableBuilder, FieldValues, Structure, Value};
//!
//! #[derive(Debug, Clone)]
//! struct Pet {
//!     name: String,
//!     kind: String,
//!     age: i64,
//! }
//!
//! impl Structure for Pet {
//!     fn declare(fields: FieldTableBuilder) -> FieldTableBuilder {
//!         fields
//!             .field::<String>("name")
//!             .field_as("type", castfit::Annotation::literal(["cat", "dog"]))
//!             .field::<i64>("age")
//!     }
//!
//!     fn build(values: &mut FieldValues) -> Result<Self, CastError> {
//!         Ok(Self {
//!             name: values.take("name")?,
//!             kind: values.take("type")?,
//!             age: values.take("age")?,
//!         })
//!     }
//! }
//!
//! castfit::structure_type!(Pet);
//!
//! let input = Value::map([
//!     ("name", Value::from("Rex")),
//!     ("type", Value::from("dog")),
//!     ("age", Value::from("3")),
//! ]);
//! let pet: Pet = castfit::castfit(input).unwrap();
//! assert_eq!(pet.age, 3);
//!
//! assert_eq!(castfit::to_type::<Vec<f64>>(Value::list(["1.5", "2"])).unwrap(), [1.5, 2.0]);
//! ```

pub mod cast;
pub mod check;
pub mod convert;
pub mod error;
pub mod fields;
mod macros;
pub mod types;
pub mod value;

pub use cast::{CastContext, Caster};
pub use convert::{Converter, ConverterFn, Converters};
pub use error::{BoxError, CastError, FieldPath, PathSegment};
pub use fields::{
    FieldSpec, FieldTable, FieldTableBuilder, FieldTables, FieldValues, Structure, StructureRef,
};
pub use types::{
    Annotation, AnnotationParseError, TypeCatalog, TypeDescriptor, TypeKey, TypeKind, Typed,
};
pub use value::{Bytes, FromValue, LiteralValue, Map, Object, Value};

use std::sync::Arc;

/// Cast `value` to `T` with the global caches and registry.
pub fn to_type<T: Typed + FromValue>(value: impl Into<Value>) -> Result<T, CastError> {
    Caster::global().to_type(value)
}

/// Cast `value` against a runtime annotation.
pub fn cast(value: impl Into<Value>, annotation: &Annotation) -> Result<Value, CastError> {
    Caster::global().cast(value, annotation)
}

/// Build the structure `T` from a mapping.
pub fn castfit<T: Structure>(input: impl Into<Value>) -> Result<T, CastError> {
    Caster::global().castfit(input)
}

/// Register a typed converter in the global registry.
///
/// The `(source, destination)` pair is taken from the closure signature.
pub fn casts<S, D, E, F>(f: F)
where
    S: Typed + FromValue,
    D: Typed + Into<Value>,
    E: Into<BoxError>,
    F: Fn(S) -> Result<D, E> + Send + Sync + 'static,
{
    Converters::global().casts(f)
}

/// Register a typed converter that also receives the destination descriptor.
pub fn casts_with<S, D, E, F>(f: F)
where
    S: Typed + FromValue,
    D: Typed + Into<Value>,
    E: Into<BoxError>,
    F: Fn(S, &TypeDescriptor) -> Result<D, E> + Send + Sync + 'static,
{
    Converters::global().casts_with(f)
}

/// Register a dynamic converter in the global registry.
pub fn register<F>(source: TypeKey, target: TypeKey, f: F)
where
    F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Converters::global().register(source, target, f)
}

/// Register a dynamic, destination-aware converter in the global registry.
pub fn register_with<F>(source: TypeKey, target: TypeKey, f: F)
where
    F: Fn(Value, &TypeDescriptor) -> Result<Value, BoxError> + Send + Sync + 'static,
{
    Converters::global().register_with(source, target, f)
}

/// Shared descriptor for `annotation`.
pub fn normalize(annotation: &Annotation) -> Arc<TypeDescriptor> {
    TypeCatalog::global().normalize(annotation)
}

/// Field table of the structure `T`.
pub fn fields_of<T: Structure>() -> Result<Arc<FieldTable>, CastError> {
    Caster::global().fields_of::<T>()
}

/// Check whether `value` already matches `annotation`, without coercion.
pub fn is_type(value: &Value, annotation: &Annotation) -> bool {
    Caster::global().is_type(value, annotation)
}
