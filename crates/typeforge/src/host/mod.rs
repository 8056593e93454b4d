// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host platform model: classes, objects and capabilities.

mod class;
mod native;
mod object;

pub use class::{ClassKey, ClassKind, HostClass, HostClassBuilder, Initializer, NativeKind};
pub use native::NativeClass;
pub use object::{
    class_assignment_interface, dict_assignment_interface, HostObject, InstanceDict, Object,
    WithClassAssignment, WithDictAssignment,
};
