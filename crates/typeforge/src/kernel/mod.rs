// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Guest types, their representations, and the machinery that binds host
//! classes to them.

mod factory;
mod flags;
mod registry;
mod representation;
mod spec;
mod type_spec;
mod types;

pub use factory::TypeFactory;
pub use flags::{KernelTypeFlags, TypeFlags};
pub use registry::{Escalation, RegistryStats, TypeRegistry};
pub use representation::{AdoptedRepresentation, Representation, SharedRepresentation};
pub use spec::RepresentationSpec;
pub use type_spec::TypeSpec;
pub use types::GuestType;
