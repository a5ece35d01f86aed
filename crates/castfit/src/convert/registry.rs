// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Converter registry and resolution.

use super::builtin;
use crate::error::BoxError;
use crate::types::{TypeDescriptor, TypeKey, Typed};
use crate::value::{FromValue, Value};
use dashmap::DashMap;
use std::any::type_name;
use std::fmt;
use std::sync::{Arc, OnceLock};

static GLOBAL_CONVERTERS: OnceLock<Converters> = OnceLock::new();

type UnaryFn = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;
type TargetFn = dyn Fn(Value, &TypeDescriptor) -> Result<Value, BoxError> + Send + Sync;

/// A registered conversion function.
#[derive(Clone)]
pub enum ConverterFn {
    /// Takes only the value.
    Unary(Arc<UnaryFn>),
    /// Also receives the exact destination descriptor.
    WithTarget(Arc<TargetFn>),
}

impl fmt::Debug for ConverterFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unary(_) => f.write_str("ConverterFn::Unary"),
            Self::WithTarget(_) => f.write_str("ConverterFn::WithTarget"),
        }
    }
}

/// Outcome of [`Converters::resolve`].
#[derive(Debug, Clone)]
pub enum Converter {
    /// User-registered function for the exact pair.
    Registered(ConverterFn),
    /// Built-in scalar conversion into the given type.
    Builtin(TypeKey),
    /// Value already has the destination type.
    Identity,
}

impl Converter {
    /// Run the conversion.
    pub fn apply(&self, value: Value, target: &TypeDescriptor) -> Result<Value, BoxError> {
        match self {
            Self::Registered(ConverterFn::Unary(f)) => f(value),
            Self::Registered(ConverterFn::WithTarget(f)) => f(value, target),
            Self::Builtin(key) => builtin::convert(value, *key),
            Self::Identity => Ok(value),
        }
    }
}

/// Registered conversions keyed by `(source, destination)`.
///
/// Resolution order: registered pair, then built-in, then identity.
#[derive(Default)]
pub struct Converters {
    entries: DashMap<(TypeKey, TypeKey), ConverterFn>,
}

impl Converters {
    /// Create an empty registry (built-ins still apply).
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> &'static Converters {
        GLOBAL_CONVERTERS.get_or_init(Converters::new)
    }

    /// Register a converter for `source -> target`.
    ///
    /// A later registration for the same pair replaces this one.
    pub fn register<F>(&self, source: TypeKey, target: TypeKey, f: F)
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.insert(source, target, ConverterFn::Unary(Arc::new(f)));
    }

    /// Register a converter that also receives the destination descriptor.
    pub fn register_with<F>(&self, source: TypeKey, target: TypeKey, f: F)
    where
        F: Fn(Value, &TypeDescriptor) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.insert(source, target, ConverterFn::WithTarget(Arc::new(f)));
    }

    /// Register a typed converter; the pair comes from the closure signature.
    ///
    /// ```
    /// use castfit::Converters;
    ///
    /// let converters = Converters::new();
    /// converters.casts(|s: String| s.parse::<i64>().map(|v| v * 2));
    /// assert_eq!(converters.len(), 1);
    /// ```
    pub fn casts<S, D, E, F>(&self, f: F)
    where
        S: Typed + FromValue,
        D: Typed + Into<Value>,
        E: Into<BoxError>,
        F: Fn(S) -> Result<D, E> + Send + Sync + 'static,
    {
        let source = origin_key::<S>();
        let target = origin_key::<D>();
        self.register(source, target, move |value| {
            let input = S::from_value(value)?;
            f(input).map(Into::into).map_err(Into::into)
        });
    }

    /// Typed form of [`register_with`](Self::register_with).
    pub fn casts_with<S, D, E, F>(&self, f: F)
    where
        S: Typed + FromValue,
        D: Typed + Into<Value>,
        E: Into<BoxError>,
        F: Fn(S, &TypeDescriptor) -> Result<D, E> + Send + Sync + 'static,
    {
        let source = origin_key::<S>();
        let target = origin_key::<D>();
        self.register_with(source, target, move |value, descriptor| {
            let input = S::from_value(value)?;
            f(input, descriptor).map(Into::into).map_err(Into::into)
        });
    }

    /// Find the converter for a runtime type and a destination.
    pub fn resolve(&self, source: TypeKey, target: &TypeDescriptor) -> Option<Converter> {
        let destination = target.origin()?;
        // Clone out so no shard lock is held while the converter runs.
        let registered = self
            .entries
            .get(&(source, destination))
            .map(|entry| entry.value().clone());
        if let Some(f) = registered {
            return Some(Converter::Registered(f));
        }
        if builtin::supports(source, destination) {
            return Some(Converter::Builtin(destination));
        }
        if source == destination {
            return Some(Converter::Identity);
        }
        None
    }

    /// Check whether a converter is registered for the exact pair.
    pub fn contains(&self, source: TypeKey, target: TypeKey) -> bool {
        self.entries.contains_key(&(source, target))
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&self, source: TypeKey, target: TypeKey, f: ConverterFn) {
        if self.entries.insert((source, target), f).is_some() {
            log::debug!("[converters] replaced {} -> {}", source, target);
        } else {
            log::debug!("[converters] registered {} -> {}", source, target);
        }
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Registry key for a Rust type: its annotation's origin when it has one.
fn origin_key<T: Typed>() -> TypeKey {
    T::annotation()
        .origin()
        .unwrap_or_else(|| TypeKey::named::<T>(type_name::<T>()))
}
