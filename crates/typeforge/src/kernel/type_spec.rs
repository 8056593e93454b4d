// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builder describing a guest type to the [`TypeFactory`](super::TypeFactory).

use std::fmt;
use std::sync::Arc;

use super::flags::{KernelTypeFlags, TypeFlags};
use super::types::{GuestType, TypeHeader};
use crate::host::HostClass;

/// Everything the factory needs to create a guest type.
///
/// ```ignore
/// let spec = TypeSpec::new("float", &float_class)
///     .adopt(f64::native_class())
///     .flag(TypeFlags::BASETYPE);
/// ```
#[derive(Clone)]
pub struct TypeSpec {
    name: String,
    primary: HostClass,
    adopted: Vec<HostClass>,
    accepted: Vec<HostClass>,
    bases: Vec<Arc<GuestType>>,
    features: TypeFlags,
    kernel: KernelTypeFlags,
}

impl TypeSpec {
    pub fn new(name: impl Into<String>, primary: &HostClass) -> Self {
        Self {
            name: name.into(),
            primary: primary.clone(),
            adopted: Vec::new(),
            accepted: Vec::new(),
            bases: Vec::new(),
            features: TypeFlags::empty(),
            kernel: KernelTypeFlags::empty(),
        }
    }

    /// Add a class whose instances are instances of this type.
    pub fn adopt(mut self, class: &HostClass) -> Self {
        self.adopted.push(class.clone());
        self
    }

    /// Add a class accepted where this type is expected (not registered).
    pub fn accept(mut self, class: &HostClass) -> Self {
        self.accepted.push(class.clone());
        self
    }

    pub fn base(mut self, base: &Arc<GuestType>) -> Self {
        self.bases.push(base.clone());
        self
    }

    pub fn flag(mut self, flag: TypeFlags) -> Self {
        self.features |= flag;
        self
    }

    pub fn kernel_flag(mut self, flag: KernelTypeFlags) -> Self {
        self.kernel |= flag;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary(&self) -> &HostClass {
        &self.primary
    }

    pub fn adopted(&self) -> &[HostClass] {
        &self.adopted
    }

    pub fn accepted(&self) -> &[HostClass] {
        &self.accepted
    }

    pub fn bases(&self) -> &[Arc<GuestType>] {
        &self.bases
    }

    pub fn features(&self) -> TypeFlags {
        self.features
    }

    pub fn is_replaceable(&self) -> bool {
        self.features.contains(TypeFlags::REPLACEABLE)
    }

    /// Header for the type, with `default_bases` when none were given.
    pub(crate) fn header(&self, default_bases: &[Arc<GuestType>]) -> TypeHeader {
        let bases = if self.bases.is_empty() {
            default_bases.to_vec()
        } else {
            self.bases.clone()
        };
        TypeHeader {
            name: self.name.clone(),
            bases,
            features: self.features,
            kernel: self.kernel,
        }
    }
}

impl fmt::Debug for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSpec")
            .field("name", &self.name)
            .field("primary", &self.primary)
            .field("adopted", &self.adopted)
            .field("accepted", &self.accepted)
            .field("features", &self.features)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates() {
        let p = HostClass::builder("P").build();
        let a = HostClass::builder("A").build();
        let spec = TypeSpec::new("t", &p)
            .adopt(&a)
            .flag(TypeFlags::BASETYPE)
            .flag(TypeFlags::REPLACEABLE)
            .kernel_flag(KernelTypeFlags::HAS_ITER);
        assert_eq!(spec.adopted(), &[a]);
        assert!(spec.is_replaceable());
        assert!(spec.features().contains(TypeFlags::BASETYPE));
        let h = spec.header(&[]);
        assert_eq!(h.kernel, KernelTypeFlags::HAS_ITER);
        assert!(h.bases.is_empty());
    }
}
