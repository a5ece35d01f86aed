// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Glue macros for user types.

/// Make custom scalar types usable as cast targets and converter endpoints.
///
/// Implements [`Typed`](crate::Typed), [`FromValue`](crate::FromValue) and
/// `From<T> for Value`; values travel as [`Value::Object`](crate::Value::Object).
/// Types need `Clone + Send + Sync + 'static`.
///
/// ```
/// #[derive(Debug, Clone, PartialEq)]
/// struct Celsius(f64);
///
/// castfit::scalar_type!(Celsius);
///
/// castfit::casts(|v: f64| Ok::<_, String>(Celsius(v)));
/// assert_eq!(castfit::to_type::<Celsius>(21.5).unwrap(), Celsius(21.5));
/// ```
#[macro_export]
macro_rules! scalar_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Typed for $ty {
                fn annotation() -> $crate::Annotation {
                    $crate::Annotation::scalar::<$ty>()
                }
            }

            $crate::__object_value!($ty);
        )+
    };
}

/// Same as [`scalar_type!`] for types implementing [`Structure`](crate::Structure).
#[macro_export]
macro_rules! structure_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Typed for $ty {
                fn annotation() -> $crate::Annotation {
                    $crate::Annotation::structure::<$ty>()
                }
            }

            $crate::__object_value!($ty);
        )+
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __object_value {
    ($ty:ty) => {
        impl $crate::FromValue for $ty {
            fn from_value(
                value: $crate::Value,
            ) -> ::std::result::Result<Self, $crate::CastError> {
                value.into_object::<$ty>()
            }
        }

        impl ::std::convert::From<$ty> for $crate::Value {
            fn from(value: $ty) -> Self {
                $crate::Value::Object($crate::Object::new(value))
            }
        }
    };
}
