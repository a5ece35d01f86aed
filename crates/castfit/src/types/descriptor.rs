// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Normalized type descriptors.

use crate::fields::StructureRef;
use crate::types::TypeKey;
use crate::value::LiteralValue;
use std::fmt::{self, Write as _};
use std::slice;
use std::sync::Arc;

/// Type kind with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Anything passes unchanged.
    Any,
    /// Nothing passes.
    Never,
    /// Always produces null.
    Null,
    /// Concrete scalar, resolved through the converter registry.
    Scalar(TypeKey),
    /// Null or the child.
    Optional(Arc<TypeDescriptor>),
    /// Alternatives, tried in order.
    Union(Vec<Arc<TypeDescriptor>>),
    /// Allowed value set, order kept.
    Literal(Vec<LiteralValue>),
    /// Homogeneous list.
    Sequence(Arc<TypeDescriptor>),
    /// Homogeneous set, repeats dropped after casting.
    Set(Arc<TypeDescriptor>),
    /// Positional tuple.
    Tuple(Vec<Arc<TypeDescriptor>>),
    /// Homogeneous tuple of any length.
    VarTuple(Arc<TypeDescriptor>),
    /// String-keyed mapping with typed values.
    Mapping(Arc<TypeDescriptor>),
    /// Nested structure, fields resolved on first use.
    Structure(StructureRef),
}

/// A normalized type, shared through the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Display name (`list[int]`, `optional[str]`, `Owner`).
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Origin type, for kinds that have one.
    ///
    /// Scalars report their own key; sequences report `list`, sets `set`, mappings
    /// `dict`, structures their Rust type.
    pub fn origin(&self) -> Option<TypeKey> {
        match &self.kind {
            TypeKind::Scalar(key) => Some(*key),
            TypeKind::Null => Some(TypeKey::none()),
            TypeKind::Sequence(_) | TypeKind::Tuple(_) | TypeKind::VarTuple(_) => {
                Some(TypeKey::list())
            }
            TypeKind::Set(_) => Some(TypeKey::set()),
            TypeKind::Mapping(_) => Some(TypeKey::dict()),
            TypeKind::Structure(structure) => Some(structure.key()),
            TypeKind::Any | TypeKind::Never | TypeKind::Optional(_) => None,
            TypeKind::Union(_) | TypeKind::Literal(_) => None,
        }
    }

    /// Child descriptors in declaration order (empty for leaves).
    pub fn args(&self) -> &[Arc<TypeDescriptor>] {
        match &self.kind {
            TypeKind::Optional(inner)
            | TypeKind::Sequence(inner)
            | TypeKind::Set(inner)
            | TypeKind::VarTuple(inner)
            | TypeKind::Mapping(inner) => slice::from_ref(inner),
            TypeKind::Union(members) | TypeKind::Tuple(members) => members,
            _ => &[],
        }
    }

    /// Check if a missing field of this type may default to null.
    pub fn accepts_null(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Any | TypeKind::Null | TypeKind::Optional(_)
        )
    }

    /// Short kind label.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Any => "any",
            TypeKind::Never => "never",
            TypeKind::Null => "null",
            TypeKind::Scalar(_) => "scalar",
            TypeKind::Optional(_) => "optional",
            TypeKind::Union(_) => "union",
            TypeKind::Literal(_) => "literal",
            TypeKind::Sequence(_) => "sequence",
            TypeKind::Set(_) => "set",
            TypeKind::Tuple(_) => "tuple",
            TypeKind::VarTuple(_) => "var_tuple",
            TypeKind::Mapping(_) => "mapping",
            TypeKind::Structure(_) => "structure",
        }
    }

    /// Indented tree rendering, one descriptor per line.
    pub fn tree(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        let _ = write!(out, "{:indent$}{} ({})", "", self.name, self.kind_name(), indent = depth * 2);
        if let Some(origin) = self.origin() {
            let _ = write!(out, " origin={}", origin);
        }
        out.push('\n');
        for child in self.args() {
            child.write_tree(out, depth + 1);
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
