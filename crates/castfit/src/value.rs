// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic value types.

use crate::error::{CastError, FieldPath};
use crate::types::TypeKey;
use chrono::{DateTime, SecondsFormat, Utc};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// String-keyed mapping, the shape of every untyped input record.
pub type Map = BTreeMap<String, Value>;

/// Owned byte string (kept distinct from `Vec<u8>`, which is a list of ints).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for Bytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

/// An already-typed Rust value travelling through the engine.
///
/// Structure instances and custom scalar types are carried this way.
#[derive(Clone)]
pub struct Object {
    key: TypeKey,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Wrap a typed value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Runtime type of the wrapped value.
    pub fn type_key(&self) -> TypeKey {
        self.key
    }

    /// Check the wrapped type.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Take the wrapped value out, cloning only if it is shared.
    pub fn downcast<T: Any + Clone + Send + Sync>(self) -> Result<T, Self> {
        let key = self.key;
        match self.inner.downcast::<T>() {
            Ok(arc) => Ok(Arc::try_unwrap(arc).unwrap_or_else(|shared| (*shared).clone())),
            Err(inner) => Err(Self { key, inner }),
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object(<{}>)", self.key)
    }
}

/// A dynamic value: the untyped input and the intermediate cast result.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Bytes),
    Path(PathBuf),
    DateTime(DateTime<Utc>),
    List(Vec<Value>),
    /// Distinct values in first-seen order.
    Set(Vec<Value>),
    Map(Map),
    Object(Object),
}

impl Value {
    /// Runtime type of this value, the source side of converter lookup.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Self::Null => TypeKey::none(),
            Self::Bool(_) => TypeKey::bool(),
            Self::Int(_) => TypeKey::int(),
            Self::Float(_) => TypeKey::float(),
            Self::Str(_) => TypeKey::str(),
            Self::Bytes(_) => TypeKey::bytes(),
            Self::Path(_) => TypeKey::path(),
            Self::DateTime(_) => TypeKey::datetime(),
            Self::List(_) => TypeKey::list(),
            Self::Set(_) => TypeKey::set(),
            Self::Map(_) => TypeKey::dict(),
            Self::Object(obj) => obj.type_key(),
        }
    }

    /// Short description for diagnostics: `str "abc"`, `list`, `<LatLon>`.
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "none".to_string(),
            Self::List(items) => format!("list of {}", items.len()),
            Self::Set(items) => format!("set of {}", items.len()),
            Self::Map(map) => format!("dict of {}", map.len()),
            Self::Object(obj) => format!("<{}>", obj.type_key()),
            other => {
                let mut shown = other.to_string();
                if shown.len() > 64 {
                    let mut cut = 61;
                    while !shown.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    shown.truncate(cut);
                    shown.push_str("...");
                }
                format!("{} {}", other.type_key(), shown)
            }
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow a wrapped object of type `T`.
    pub fn as_object<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Look up a key when this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    /// Take a wrapped object of type `T` out of this value.
    pub fn into_object<T: Any + Clone + Send + Sync>(self) -> Result<T, CastError> {
        match self {
            Self::Object(obj) => obj.downcast::<T>().map_err(|obj| {
                mismatch(TypeKey::of::<T>().name(), &Self::Object(obj))
            }),
            other => Err(mismatch(TypeKey::of::<T>().name(), &other)),
        }
    }

    /// Collect `(key, value)` pairs into a map value.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Collect values into a list value.
    pub fn list<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Collect values into a set value, dropping repeats.
    pub fn set<V: Into<Value>, I: IntoIterator<Item = V>>(items: I) -> Self {
        Self::Set(distinct(items.into_iter().map(Into::into)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("none"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Str(v) => write!(f, "{:?}", v),
            Self::Bytes(v) => write!(f, "b\"{}\"", v.0.escape_ascii()),
            Self::Path(v) => write!(f, "{:?}", v.display().to_string()),
            Self::DateTime(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Set(items) if items.is_empty() => f.write_str("set()"),
            Self::Set(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("}")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Self::Object(obj) => write!(f, "<{}>", obj.type_key()),
        }
    }
}

/// Drop repeated values, keeping the first occurrence.
pub(crate) fn distinct(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Float rendering that keeps integral values visibly floating (`3.0`).
pub(crate) fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// A value allowed by a `Literal` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl LiteralValue {
    /// Exact match, no coercion (`true` never equals `1`).
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool(a), Value::Bool(b)) => a == b,
            (Self::Int(a), Value::Int(b)) => a == b,
            (Self::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }

    /// Scalar type of this literal.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Self::Bool(_) => TypeKey::bool(),
            Self::Int(_) => TypeKey::int(),
            Self::Str(_) => TypeKey::str(),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for LiteralValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for LiteralValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for LiteralValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

// Conversion traits
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Self::Path(v)
    }
}

impl From<&Path> for Value {
    fn from(v: &Path) -> Self {
        Self::Path(v.to_path_buf())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Self::Object(v)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        Self::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(v: BTreeSet<T>) -> Self {
        Self::set(v)
    }
}

impl<T: Into<Value>> From<HashSet<T>> for Value {
    fn from(v: HashSet<T>) -> Self {
        Self::set(v)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Value {
    fn from((a, b): (A, B)) -> Self {
        Self::List(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Value {
    fn from((a, b, c): (A, B, C)) -> Self {
        Self::List(vec![a.into(), b.into(), c.into()])
    }
}

/// Trait for extracting a native Rust value from a cast result.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, CastError>;
}

pub(crate) fn mismatch(expected: &str, got: &Value) -> CastError {
    CastError::TypeMismatch {
        path: FieldPath::root(),
        expected: expected.to_string(),
        found: got.describe(),
        source: None,
    }
}

macro_rules! impl_from_value {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, CastError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch($name, &other)),
                }
            }
        }
    };
}

impl_from_value!(bool, Bool, "bool");
impl_from_value!(i64, Int, "int");
impl_from_value!(f64, Float, "float");
impl_from_value!(String, Str, "str");
impl_from_value!(Bytes, Bytes, "bytes");
impl_from_value!(PathBuf, Path, "path");
impl_from_value!(DateTime<Utc>, DateTime, "datetime");

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, CastError> {
        Ok(value)
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Null => Ok(()),
            other => Err(mismatch("none", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

impl<T: FromValue> FromValue for HashMap<String, T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch("dict", &other)),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k, v)))
                .collect(),
            other => Err(mismatch("dict", &other)),
        }
    }
}

impl<T: FromValue + Ord> FromValue for BTreeSet<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Set(items) | Value::List(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(mismatch("set", &other)),
        }
    }
}

impl<T: FromValue + Eq + Hash> FromValue for HashSet<T> {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::Set(items) | Value::List(items) => {
                items.into_iter().map(T::from_value).collect()
            }
            other => Err(mismatch("set", &other)),
        }
    }
}

impl<A: FromValue, B: FromValue> FromValue for (A, B) {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::List(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(a), Some(b)) => Ok((A::from_value(a)?, B::from_value(b)?)),
                    _ => Err(mismatch("tuple of 2", &Value::Null)),
                }
            }
            other => Err(mismatch("tuple of 2", &other)),
        }
    }
}

impl<A: FromValue, B: FromValue, C: FromValue> FromValue for (A, B, C) {
    fn from_value(value: Value) -> Result<Self, CastError> {
        match value {
            Value::List(items) if items.len() == 3 => {
                let mut items = items.into_iter();
                match (items.next(), items.next(), items.next()) {
                    (Some(a), Some(b), Some(c)) => {
                        Ok((A::from_value(a)?, B::from_value(b)?, C::from_value(c)?))
                    }
                    _ => Err(mismatch("tuple of 3", &Value::Null)),
                }
            }
            other => Err(mismatch("tuple of 3", &other)),
        }
    }
}

#[cfg(feature = "json")]
mod json {
    use super::{format_float, Map, Value};
    use chrono::SecondsFormat;

    impl From<serde_json::Value> for Value {
        fn from(v: serde_json::Value) -> Self {
            match v {
                serde_json::Value::Null => Self::Null,
                serde_json::Value::Bool(b) => Self::Bool(b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => Self::Int(i),
                    None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                serde_json::Value::String(s) => Self::Str(s),
                serde_json::Value::Array(items) => {
                    Self::List(items.into_iter().map(Into::into).collect())
                }
                serde_json::Value::Object(fields) => Self::Map(
                    fields
                        .into_iter()
                        .map(|(k, v)| (k, v.into()))
                        .collect::<Map>(),
                ),
            }
        }
    }

    impl Value {
        /// Render for display. Bytes become an array of numbers, objects an
        /// opaque `<Type>` string, non-finite floats their text form.
        pub fn to_json(&self) -> serde_json::Value {
            match self {
                Self::Null => serde_json::Value::Null,
                Self::Bool(v) => serde_json::Value::Bool(*v),
                Self::Int(v) => serde_json::Value::from(*v),
                Self::Float(v) => serde_json::Number::from_f64(*v)
                    .map(serde_json::Value::Number)
                    .unwrap_or_else(|| serde_json::Value::String(format_float(*v))),
                Self::Str(v) => serde_json::Value::String(v.clone()),
                Self::Bytes(v) => serde_json::Value::from(v.0.clone()),
                Self::Path(v) => serde_json::Value::String(v.to_string_lossy().into_owned()),
                Self::DateTime(v) => {
                    serde_json::Value::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                }
                Self::List(items) | Self::Set(items) => {
                    serde_json::Value::Array(items.iter().map(Value::to_json).collect())
                }
                Self::Map(map) => serde_json::Value::Object(
                    map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
                ),
                Self::Object(obj) => serde_json::Value::String(format!("<{}>", obj.type_key())),
            }
        }
    }
}
