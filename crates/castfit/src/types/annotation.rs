// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declared type expressions.

use crate::fields::{Structure, StructureRef};
use crate::types::TypeKey;
use crate::value::{Bytes, LiteralValue, Value};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

/// A declared type, before normalization.
///
/// Annotations compare and hash structurally; the catalog uses them as
/// cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// Accepts any value unchanged.
    Any,
    /// Accepts nothing.
    Never,
    /// The null type; every value casts to null.
    None,
    /// Concrete scalar type.
    Scalar(TypeKey),
    /// Nullable wrapper.
    Optional(Box<Annotation>),
    /// Alternatives in priority order.
    Union(Vec<Annotation>),
    /// Explicit set of allowed values.
    Literal(Vec<LiteralValue>),
    /// Homogeneous list.
    List(Box<Annotation>),
    /// Homogeneous set; repeats are dropped.
    Set(Box<Annotation>),
    /// Fixed-arity positional tuple.
    Tuple(Vec<Annotation>),
    /// Homogeneous tuple of any length (`tuple[T, ...]`).
    VarTuple(Box<Annotation>),
    /// String-keyed mapping with typed values.
    Dict(Box<Annotation>),
    /// Nested target structure.
    Structure(StructureRef),
}

impl Annotation {
    /// Annotation of a Rust type.
    pub fn of<T: Typed>() -> Self {
        T::annotation()
    }

    /// Scalar annotation for `T`.
    pub fn scalar<T: Any>() -> Self {
        Self::Scalar(TypeKey::of::<T>())
    }

    /// Structure annotation for `T`.
    pub fn structure<T: Structure>() -> Self {
        Self::Structure(StructureRef::of::<T>())
    }

    pub fn bool() -> Self {
        Self::Scalar(TypeKey::bool())
    }

    pub fn int() -> Self {
        Self::Scalar(TypeKey::int())
    }

    pub fn float() -> Self {
        Self::Scalar(TypeKey::float())
    }

    pub fn str() -> Self {
        Self::Scalar(TypeKey::str())
    }

    pub fn bytes() -> Self {
        Self::Scalar(TypeKey::bytes())
    }

    pub fn path() -> Self {
        Self::Scalar(TypeKey::path())
    }

    pub fn datetime() -> Self {
        Self::Scalar(TypeKey::datetime())
    }

    pub fn optional(inner: Annotation) -> Self {
        Self::Optional(Box::new(inner))
    }

    pub fn union<I: IntoIterator<Item = Annotation>>(members: I) -> Self {
        Self::Union(members.into_iter().collect())
    }

    pub fn literal<L: Into<LiteralValue>, I: IntoIterator<Item = L>>(values: I) -> Self {
        Self::Literal(values.into_iter().map(Into::into).collect())
    }

    pub fn list(element: Annotation) -> Self {
        Self::List(Box::new(element))
    }

    pub fn set(element: Annotation) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn tuple<I: IntoIterator<Item = Annotation>>(elements: I) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    pub fn var_tuple(element: Annotation) -> Self {
        Self::VarTuple(Box::new(element))
    }

    pub fn dict(value: Annotation) -> Self {
        Self::Dict(Box::new(value))
    }

    /// Annotation implied by a default value that carries no declared type.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => Self::Any,
            Value::List(_) => Self::list(Self::Any),
            Value::Set(_) => Self::set(Self::Any),
            Value::Map(_) => Self::dict(Self::Any),
            other => Self::Scalar(other.type_key()),
        }
    }

    /// Origin type, matching [`TypeDescriptor::origin`](crate::TypeDescriptor::origin).
    pub(crate) fn origin(&self) -> Option<TypeKey> {
        match self {
            Self::Scalar(key) => Some(*key),
            Self::None => Some(TypeKey::none()),
            Self::List(_) | Self::Tuple(_) | Self::VarTuple(_) => Some(TypeKey::list()),
            Self::Set(_) => Some(TypeKey::set()),
            Self::Dict(_) => Some(TypeKey::dict()),
            Self::Structure(structure) => Some(structure.key()),
            _ => None,
        }
    }

    /// Canonical form used for caching.
    ///
    /// Unions are flattened and deduplicated, single-member unions collapse,
    /// and a `None` member turns the union into `Optional` of the rest.
    /// Nested optionals collapse into one.
    pub(crate) fn canonical(&self) -> Annotation {
        match self {
            Self::Optional(inner) => match inner.canonical() {
                Self::Optional(inner) => Self::Optional(inner),
                Self::None => Self::None,
                Self::Any => Self::Any,
                inner => Self::optional(inner),
            },
            Self::Union(members) => {
                let mut flat = Vec::with_capacity(members.len());
                let mut nullable = false;
                for member in members {
                    flatten_into(member.canonical(), &mut flat, &mut nullable);
                }
                let inner = match flat.len() {
                    0 => return if nullable { Self::None } else { Self::Never },
                    1 => flat.pop().unwrap_or(Self::Never),
                    _ => Self::Union(flat),
                };
                if nullable && inner != Self::Any {
                    Self::optional(inner)
                } else {
                    inner
                }
            }
            Self::List(inner) => Self::list(inner.canonical()),
            Self::Set(inner) => Self::set(inner.canonical()),
            Self::VarTuple(inner) => Self::var_tuple(inner.canonical()),
            Self::Dict(inner) => Self::dict(inner.canonical()),
            Self::Tuple(elements) => Self::Tuple(elements.iter().map(Self::canonical).collect()),
            other => other.clone(),
        }
    }
}

fn flatten_into(member: Annotation, flat: &mut Vec<Annotation>, nullable: &mut bool) {
    match member {
        Annotation::None => *nullable = true,
        Annotation::Optional(inner) => {
            *nullable = true;
            flatten_into(*inner, flat, nullable);
        }
        Annotation::Union(members) => {
            for m in members {
                flatten_into(m, flat, nullable);
            }
        }
        other => {
            if !flat.contains(&other) {
                flat.push(other);
            }
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Never => f.write_str("never"),
            Self::None => f.write_str("none"),
            Self::Scalar(key) => write!(f, "{}", key),
            Self::Optional(inner) => write!(f, "optional[{}]", inner),
            Self::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", m)?;
                }
                Ok(())
            }
            Self::Literal(values) => {
                f.write_str("literal[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Self::List(inner) => write!(f, "list[{}]", inner),
            Self::Set(inner) => write!(f, "set[{}]", inner),
            Self::Tuple(elements) => {
                f.write_str("tuple[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                f.write_str("]")
            }
            Self::VarTuple(inner) => write!(f, "tuple[{}, ...]", inner),
            Self::Dict(inner) => write!(f, "dict[str, {}]", inner),
            Self::Structure(structure) => write!(f, "{}", structure.key()),
        }
    }
}

/// Rust types with a known annotation.
pub trait Typed: 'static {
    fn annotation() -> Annotation;
}

macro_rules! impl_typed_scalar {
    ($ty:ty, $ctor:ident) => {
        impl Typed for $ty {
            fn annotation() -> Annotation {
                Annotation::$ctor()
            }
        }
    };
}

impl_typed_scalar!(bool, bool);
impl_typed_scalar!(i64, int);
impl_typed_scalar!(f64, float);
impl_typed_scalar!(String, str);
impl_typed_scalar!(Bytes, bytes);
impl_typed_scalar!(PathBuf, path);
impl_typed_scalar!(DateTime<Utc>, datetime);

impl Typed for Value {
    fn annotation() -> Annotation {
        Annotation::Any
    }
}

impl Typed for () {
    fn annotation() -> Annotation {
        Annotation::None
    }
}

impl<T: Typed> Typed for BTreeMap<String, T> {
    fn annotation() -> Annotation {
        Annotation::dict(T::annotation())
    }
}

impl<T: Typed> Typed for Option<T> {
    fn annotation() -> Annotation {
        Annotation::optional(T::annotation())
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn annotation() -> Annotation {
        Annotation::list(T::annotation())
    }
}

impl<T: Typed> Typed for BTreeSet<T> {
    fn annotation() -> Annotation {
        Annotation::set(T::annotation())
    }
}

impl<T: Typed> Typed for HashSet<T> {
    fn annotation() -> Annotation {
        Annotation::set(T::annotation())
    }
}

impl<T: Typed> Typed for HashMap<String, T> {
    fn annotation() -> Annotation {
        Annotation::dict(T::annotation())
    }
}

impl<A: Typed, B: Typed> Typed for (A, B) {
    fn annotation() -> Annotation {
        Annotation::tuple([A::annotation(), B::annotation()])
    }
}

impl<A: Typed, B: Typed, C: Typed> Typed for (A, B, C) {
    fn annotation() -> Annotation {
        Annotation::tuple([A::annotation(), B::annotation(), C::annotation()])
    }
}
