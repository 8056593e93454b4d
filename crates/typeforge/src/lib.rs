// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # typeforge - object and type representation kernel
//!
//! The layer of a guest-language runtime that answers, for any value the
//! interpreter handles, "what guest type is this, and how is it laid out
//! on the host". New host layout classes are synthesized on demand when
//! the guest program defines classes at run time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use typeforge::{type_system, Object, Result};
//!
//! fn main() -> Result<()> {
//!     let types = type_system();
//!
//!     // class Point: __slots__ = ("x", "y")
//!     let point = types.define_class("Point", &[], Some(&["x", "y"][..]), false)?;
//!     let p = types.new_instance(&point)?;
//!
//!     let ty = types.registry().guest_type_of(p.as_ref())?;
//!     assert!(Arc::ptr_eq(&ty, &point));
//!
//!     let answer: Object = Arc::new(42i64);
//!     println!("{}", types.registry().guest_type_of(answer.as_ref())?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                       Interpreter (external)                        |
//! |        registry().of(obj) -> Representation -> guest type           |
//! +---------------------------------------------------------------------+
//! |                          TypeRegistry                               |
//! |   lookup | ensure_init(class) | lookup | escalate | publish-once    |
//! +---------------------------------------------------------------------+
//! |                 TypeFactory (re-entrant, sole writer)               |
//! |   TypeSpec -> GuestType | workshop -> register_all | layout cache   |
//! +---------------------------------------------------------------------+
//! |     RepresentationSpec (frozen)  ->  SubclassFactory                |
//! |     unique name | ClassBody | dump | SubclassLoader -> Layout       |
//! +---------------------------------------------------------------------+
//! |                       Host platform model                           |
//! |   HostClass | static init | interfaces | HostObject | native types  |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HostClass`] | Host implementation class, compared by identity |
//! | [`Representation`] | Canonical, adopted or shared mapping to a guest type |
//! | [`GuestType`] | Simple, adoptive or replaceable guest type |
//! | [`TypeRegistry`] | Concurrent host class to representation cache |
//! | [`TypeFactory`] | Creates types and publishes their representations |
//! | [`RepresentationSpec`] | Comparable description of a layout class |
//! | [`SubclassFactory`] | Synthesizes layout classes from frozen specs |
//! | [`DerivedObject`] | Instance of a synthesized layout class |
//!
//! ## Features
//!
//! - `config-loaders` (default): YAML loading of [`KernelConfig`].
//!
//! ## Modules Overview
//!
//! - [`host`] - Host classes, static initialization, object capabilities
//! - [`kernel`] - Guest types, representations, registry and type factory
//! - [`subclass`] - Class body synthesis, loading and derived instances
//! - [`config`] - Kernel configuration and environment overrides
//! - [`error`] - Error types

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

// Allow the derive macro to work inside this crate's tests
extern crate self as typeforge;

/// Kernel configuration (subclass naming, dump directory).
pub mod config;
/// Error types shared by the whole kernel.
pub mod error;
/// Host platform model: classes, objects and their capabilities.
pub mod host;
/// Guest types, representations, the registry and the type factory.
pub mod kernel;
/// Synthesis of layout classes for guest-defined classes.
pub mod subclass;

use std::sync::{Arc, OnceLock};

pub use config::KernelConfig;
pub use error::{Clash, ClashMode, Error, InterpreterError, Result, SpecError};
pub use host::{
    class_assignment_interface, dict_assignment_interface, ClassKind, HostClass,
    HostClassBuilder, HostObject, InstanceDict, NativeClass, NativeKind, Object,
    WithClassAssignment, WithDictAssignment,
};
pub use kernel::{
    Escalation, GuestType, KernelTypeFlags, Representation, RepresentationSpec, TypeFactory,
    TypeFlags, TypeRegistry, TypeSpec,
};
pub use subclass::{DerivedObject, SubclassFactory};

/// `#[derive(HostObject)]`: craft a host class for a struct.
pub use typeforge_derive::HostObject;

/// The process-wide type factory, created on first use.
///
/// Configuration comes from the defaults plus environment overrides
/// (`TYPEFORGE_SUBCLASS_PACKAGE`, `TYPEFORGE_DUMP_DIR`). An override that
/// fails validation is dropped in favour of the defaults.
pub fn type_system() -> &'static Arc<TypeFactory> {
    static SYSTEM: OnceLock<Arc<TypeFactory>> = OnceLock::new();
    SYSTEM.get_or_init(|| {
        let config = KernelConfig::default().with_env_overrides();
        TypeFactory::new(config).unwrap_or_else(|e| {
            log::warn!("Invalid kernel configuration ({}), using defaults", e);
            default_factory()
        })
    })
}

#[allow(clippy::expect_used)] // defaults always validate
fn default_factory() -> Arc<TypeFactory> {
    TypeFactory::new(KernelConfig::default()).expect("default kernel configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_system_is_shared() {
        let a = type_system();
        let b = type_system();
        assert!(Arc::ptr_eq(a, b));
        assert_eq!(a.object_type().name(), "object");
    }

    #[test]
    fn test_native_values_resolve_through_type_system() {
        let v: Object = Arc::new(true);
        let ty = type_system().registry().guest_type_of(v.as_ref()).unwrap();
        assert_eq!(ty.name(), "bool");
    }
}
