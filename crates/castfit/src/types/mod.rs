// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type catalog: annotations, identities and normalized descriptors.
//!
//! An [`Annotation`] is what callers declare. The [`TypeCatalog`] turns it
//! into a shared [`TypeDescriptor`], the only form the caster dispatches on.

mod annotation;
mod catalog;
mod descriptor;
mod key;
mod parse;

pub use annotation::{Annotation, Typed};
pub use catalog::TypeCatalog;
pub use descriptor::{TypeDescriptor, TypeKind};
pub use key::TypeKey;
pub use parse::AnnotationParseError;
