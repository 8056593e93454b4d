// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Feature flags carried by guest types.

use bitflags::bitflags;

bitflags! {
    /// Features a guest type exposes to guest code.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u32 {
        /// Guest classes may subclass the type.
        const BASETYPE = 1 << 0;
        /// Attributes of the type object cannot be set or deleted.
        const IMMUTABLE = 1 << 1;
        /// Instances share a layout and may have `__class__` reassigned.
        const REPLACEABLE = 1 << 2;
        /// The type can be called to create instances.
        const INSTANTIABLE = 1 << 3;
        /// Matches a sequence pattern.
        const SEQUENCE = 1 << 4;
        /// Matches a mapping pattern.
        const MAPPING = 1 << 5;
        /// Instances are method descriptors (bind `self` when called).
        const METHOD_DESCR = 1 << 6;
    }
}

bitflags! {
    /// Features the interpreter tests on its fast paths.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KernelTypeFlags: u32 {
        /// Instances match the class pattern by themselves.
        const MATCH_SELF = 1 << 0;
        const HAS_GETITEM = 1 << 1;
        const HAS_ITER = 1 << 2;
        const HAS_NEXT = 1 << 3;
        const HAS_INDEX = 1 << 4;
        const HAS_GET = 1 << 5;
        const HAS_SET = 1 << 6;
        const HAS_DELETE = 1 << 7;
        /// Instances are descriptors.
        const IS_DESCR = 1 << 8;
        /// Instances are data descriptors.
        const IS_DATA_DESCR = 1 << 9;
    }
}

impl KernelTypeFlags {
    /// Flags a subtype acquires from its bases.
    pub const HERITABLE: Self = Self::HAS_GETITEM
        .union(Self::HAS_ITER)
        .union(Self::HAS_NEXT)
        .union(Self::HAS_INDEX)
        .union(Self::HAS_GET)
        .union(Self::HAS_SET)
        .union(Self::HAS_DELETE)
        .union(Self::IS_DESCR)
        .union(Self::IS_DATA_DESCR);

    /// The part of these flags a subtype would inherit.
    pub fn heritable(self) -> Self {
        self & Self::HERITABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_self_not_inherited() {
        let f = KernelTypeFlags::MATCH_SELF | KernelTypeFlags::HAS_ITER;
        assert_eq!(f.heritable(), KernelTypeFlags::HAS_ITER);
        assert!(!KernelTypeFlags::HERITABLE.contains(KernelTypeFlags::MATCH_SELF));
    }

    #[test]
    fn test_default_empty() {
        assert!(TypeFlags::default().is_empty());
        assert!(KernelTypeFlags::default().is_empty());
    }
}
