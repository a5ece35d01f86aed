// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cast errors and field paths.

use crate::value::LiteralValue;
use std::fmt;
use thiserror::Error;

/// Boxed cause carried by converter failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Structure field (`owner.name`).
    Field(String),
    /// Sequence or tuple position (`pets[1]`).
    Index(usize),
    /// Mapping key (`scores[alice]`).
    Key(String),
}

/// Location of a value inside the input, accumulated during recursion.
///
/// Rendered as `pets[1].age`; the empty path renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Check if this is the empty path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this path extended by one segment.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Copy of this path extended by a field name.
    pub fn field(&self, name: &str) -> Self {
        self.child(PathSegment::Field(name.to_string()))
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) => write!(f, "[{}]", key)?,
            }
        }
        Ok(())
    }
}

impl<I: Into<PathSegment>> FromIterator<I> for FieldPath {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Errors raised while building typed values.
///
/// The first failure aborts the whole call; errors are never aggregated.
#[derive(Debug, Error)]
pub enum CastError {
    /// Required field absent from the input and no default declared.
    #[error("missing required field `{field}` at {path}")]
    MissingField { path: FieldPath, field: String },

    /// Value could not be coerced to the expected type.
    #[error("cannot cast {found} to {expected} at {path}")]
    TypeMismatch {
        path: FieldPath,
        expected: String,
        found: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Value outside an allowed literal set.
    #[error("{value} is not one of {} at {path}", display_literals(.allowed))]
    LiteralMismatch {
        path: FieldPath,
        value: String,
        allowed: Vec<LiteralValue>,
    },

    /// No converter between the observed and expected types.
    #[error("no converter from {found} to {expected} at {path}")]
    NoConverter {
        path: FieldPath,
        found: String,
        expected: String,
    },

    /// Structure field declaration that cannot be cast.
    #[error("invalid field `{field}` on {structure}: {reason}")]
    InvalidField {
        structure: String,
        field: String,
        reason: String,
    },
}

impl CastError {
    /// Path where the failure happened (None for declaration errors).
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::MissingField { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::LiteralMismatch { path, .. }
            | Self::NoConverter { path, .. } => Some(path),
            Self::InvalidField { .. } => None,
        }
    }

    /// Replace the recorded path.
    pub(crate) fn at(mut self, location: FieldPath) -> Self {
        match &mut self {
            Self::MissingField { path, .. }
            | Self::TypeMismatch { path, .. }
            | Self::LiteralMismatch { path, .. }
            | Self::NoConverter { path, .. } => *path = location,
            Self::InvalidField { .. } => {}
        }
        self
    }
}

fn display_literals(allowed: &[LiteralValue]) -> String {
    let items: Vec<String> = allowed.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}
