// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host classes for plain Rust values.

use std::any::Any;
use std::sync::OnceLock;

use super::class::{HostClass, HostClassBuilder, NativeKind};
use super::object::HostObject;

/// A Rust type with a single, process-wide host class.
pub trait NativeClass {
    fn native_class() -> &'static HostClass;
}

macro_rules! native_class {
    (@impl $ty:ty, $name:literal, $decorate:expr) => {
        impl NativeClass for $ty {
            fn native_class() -> &'static HostClass {
                static CLASS: OnceLock<HostClass> = OnceLock::new();
                CLASS.get_or_init(|| ($decorate)(HostClass::builder($name)).build())
            }
        }

        impl HostObject for $ty {
            fn host_class(&self) -> &HostClass {
                <$ty as NativeClass>::native_class()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
    ($ty:ty, $name:literal) => {
        native_class!(@impl $ty, $name, |b: HostClassBuilder| b);
    };
    ($ty:ty, $name:literal, $kind:expr) => {
        native_class!(@impl $ty, $name, |b: HostClassBuilder| b.native($kind));
    };
}

native_class!(i32, "i32", NativeKind::Int);
native_class!(i64, "i64", NativeKind::Int);
native_class!(f64, "f64", NativeKind::Float);
native_class!(bool, "bool");
native_class!(String, "String");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Object;
    use std::sync::Arc;

    #[test]
    fn test_native_markers() {
        assert_eq!(i32::native_class().native_kind(), Some(NativeKind::Int));
        assert_eq!(i64::native_class().native_kind(), Some(NativeKind::Int));
        assert_eq!(f64::native_class().native_kind(), Some(NativeKind::Float));
        assert_eq!(bool::native_class().native_kind(), None);
        assert_ne!(i32::native_class(), i64::native_class());
    }

    #[test]
    fn test_values_report_their_class() {
        let v: Object = Arc::new(String::from("spam"));
        assert_eq!(v.host_class(), String::native_class());
        assert_eq!(v.as_any().downcast_ref::<String>().map(String::as_str), Some("spam"));
    }
}
