// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type identity.

use crate::value::{Bytes, Map, Value};
use chrono::{DateTime, Utc};
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Identity of a concrete Rust type plus a display name.
///
/// Equality and hashing only look at the `TypeId`; the name is for messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key for `T`, named after its last path segment.
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_type_name(type_name::<T>()),
        }
    }

    /// Key for `T` with an explicit display name.
    pub fn named<T: Any + ?Sized>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
        }
    }

    /// Underlying `TypeId`.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether this key identifies `T`.
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    pub fn none() -> Self {
        Self::named::<()>("none")
    }

    pub fn bool() -> Self {
        Self::named::<bool>("bool")
    }

    pub fn int() -> Self {
        Self::named::<i64>("int")
    }

    pub fn float() -> Self {
        Self::named::<f64>("float")
    }

    pub fn str() -> Self {
        Self::named::<String>("str")
    }

    pub fn bytes() -> Self {
        Self::named::<Bytes>("bytes")
    }

    pub fn path() -> Self {
        Self::named::<PathBuf>("path")
    }

    pub fn datetime() -> Self {
        Self::named::<DateTime<Utc>>("datetime")
    }

    pub fn list() -> Self {
        Self::named::<Vec<Value>>("list")
    }

    pub fn dict() -> Self {
        Self::named::<Map>("dict")
    }

    pub fn set() -> Self {
        Self::named::<SetOrigin>("set")
    }
}

// Origin of every set type; values carry sets as `Value::Set`.
enum SetOrigin {}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// `my_app::geo::LatLon` -> `LatLon`; generic arguments are kept verbatim.
fn short_type_name(full: &'static str) -> &'static str {
    let head_end = full.find('<').unwrap_or(full.len());
    match full[..head_end].rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
