// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Converter registry.
//!
//! A converter maps a value of one runtime type to a destination type.
//! [`Converters::resolve`] picks, in order: a registered function for the
//! exact `(source, destination)` pair, a built-in scalar conversion, or the
//! identity when the value already has the destination type.

pub mod builtin;
pub mod datetime;
mod registry;

pub use registry::{Converter, ConverterFn, Converters};
