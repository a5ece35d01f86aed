// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor cache.

use crate::types::{Annotation, TypeDescriptor, TypeKind, Typed};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::{Arc, OnceLock};

static GLOBAL_CATALOG: OnceLock<TypeCatalog> = OnceLock::new();

/// Maps annotations to shared, immutable descriptors.
///
/// Entries are only ever added. Racing first lookups may normalize twice,
/// but all callers get the entry that was inserted first.
#[derive(Debug, Default)]
pub struct TypeCatalog {
    descriptors: DashMap<Annotation, Arc<TypeDescriptor>>,
    by_type: DashMap<TypeId, Arc<TypeDescriptor>>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide catalog.
    pub fn global() -> &'static TypeCatalog {
        GLOBAL_CATALOG.get_or_init(TypeCatalog::new)
    }

    /// Descriptor for an annotation; identical annotations share one `Arc`.
    pub fn normalize(&self, annotation: &Annotation) -> Arc<TypeDescriptor> {
        let cached = self
            .descriptors
            .get(annotation)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(descriptor) = cached {
            return descriptor;
        }

        let canonical = annotation.canonical();
        let descriptor = if canonical == *annotation {
            log::trace!("[catalog] normalizing {}", annotation);
            Arc::new(self.build(&canonical))
        } else {
            self.normalize(&canonical)
        };

        let entry = self
            .descriptors
            .entry(annotation.clone())
            .or_insert(descriptor);
        Arc::clone(entry.value())
    }

    /// Descriptor for a Rust type, cached by `TypeId`.
    pub fn descriptor_of<T: Typed>(&self) -> Arc<TypeDescriptor> {
        let id = TypeId::of::<T>();
        let cached = self.by_type.get(&id).map(|entry| Arc::clone(entry.value()));
        if let Some(descriptor) = cached {
            return descriptor;
        }
        let descriptor = self.normalize(&T::annotation());
        let entry = self.by_type.entry(id).or_insert(descriptor);
        Arc::clone(entry.value())
    }

    /// Number of cached annotations.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    // Expects a canonical annotation; children go through `normalize` so
    // they are shared with other descriptors.
    fn build(&self, annotation: &Annotation) -> TypeDescriptor {
        let kind = match annotation {
            Annotation::Any => TypeKind::Any,
            Annotation::Never => TypeKind::Never,
            Annotation::None => TypeKind::Null,
            Annotation::Scalar(key) => TypeKind::Scalar(*key),
            Annotation::Optional(inner) => TypeKind::Optional(self.normalize(inner)),
            Annotation::Union(members) => {
                TypeKind::Union(members.iter().map(|m| self.normalize(m)).collect())
            }
            Annotation::Literal(values) => TypeKind::Literal(values.clone()),
            Annotation::List(inner) => TypeKind::Sequence(self.normalize(inner)),
            Annotation::Set(inner) => TypeKind::Set(self.normalize(inner)),
            Annotation::Tuple(elements) => {
                TypeKind::Tuple(elements.iter().map(|e| self.normalize(e)).collect())
            }
            Annotation::VarTuple(inner) => TypeKind::VarTuple(self.normalize(inner)),
            Annotation::Dict(inner) => TypeKind::Mapping(self.normalize(inner)),
            Annotation::Structure(structure) => TypeKind::Structure(structure.clone()),
        };
        TypeDescriptor::new(annotation.to_string(), kind)
    }
}
