// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Representations: how a host class maps to a guest type.
//!
//! - `Canonical`: the class is the primary class of a type; the type is
//!   its own representation.
//! - `Adopted`: the class is a secondary implementation of a type,
//!   identified by its index among the type's self classes.
//! - `Shared`: the class backs many guest types. The type is read from
//!   the instance, which must implement
//!   [`WithClassAssignment`](crate::host::WithClassAssignment).

use std::fmt;
use std::sync::Arc;

use super::flags::{KernelTypeFlags, TypeFlags};
use super::types::GuestType;
use crate::error::{InterpreterError, Result};
use crate::host::{HostClass, HostObject, NativeKind};

/// Mapping from one host class to the guest type of its instances.
#[derive(Clone)]
pub enum Representation {
    /// A type acting for its own primary class.
    Canonical(Arc<GuestType>),
    /// A secondary host class of an adoptive type.
    Adopted(AdoptedRepresentation),
    /// A class whose instances carry their type.
    Shared(Arc<SharedRepresentation>),
}

impl Representation {
    /// The host class this representation governs.
    pub fn host_class(&self) -> &HostClass {
        match self {
            Self::Canonical(t) => t.primary_class(),
            Self::Adopted(a) => a.host_class(),
            Self::Shared(s) => s.host_class(),
        }
    }

    /// Guest type of `x`, an instance of [`host_class`](Self::host_class).
    ///
    /// Only a shared representation consults `x`; an instance without the
    /// type capability there is an internal fault.
    pub fn guest_type(&self, x: &dyn HostObject) -> Result<Arc<GuestType>> {
        match self {
            Self::Canonical(t) => Ok(t.clone()),
            Self::Adopted(a) => Ok(a.owner().clone()),
            Self::Shared(s) => Ok(s.guest_type(x)?),
        }
    }

    /// As [`guest_type`](Self::guest_type), but a missing instance gives
    /// the fixed type if there is one, and no type for a shared class.
    pub fn probe(&self, x: Option<&dyn HostObject>) -> Result<Option<Arc<GuestType>>> {
        match (self, x) {
            (Self::Shared(_), None) => Ok(None),
            (Self::Canonical(t), _) => Ok(Some(t.clone())),
            (Self::Adopted(a), _) => Ok(Some(a.owner().clone())),
            (Self::Shared(s), Some(x)) => Ok(Some(s.guest_type(x)?)),
        }
    }

    /// The type fixed by the class, if the class fixes one.
    pub fn fixed_type(&self) -> Option<&Arc<GuestType>> {
        match self {
            Self::Canonical(t) => Some(t),
            Self::Adopted(a) => Some(a.owner()),
            Self::Shared(_) => None,
        }
    }

    pub fn has_feature(&self, x: &dyn HostObject, flag: TypeFlags) -> Result<bool> {
        match self.fixed_type() {
            Some(t) => Ok(t.has_feature(flag)),
            None => Ok(self.guest_type(x)?.has_feature(flag)),
        }
    }

    pub fn has_kernel_feature(&self, x: &dyn HostObject, flag: KernelTypeFlags) -> Result<bool> {
        match self.fixed_type() {
            Some(t) => Ok(t.has_kernel_feature(flag)),
            None => Ok(self.guest_type(x)?.has_kernel_feature(flag)),
        }
    }

    /// Position among the owning type's representations.
    pub fn index(&self) -> usize {
        match self {
            Self::Adopted(a) => a.index(),
            Self::Canonical(_) | Self::Shared(_) => 0,
        }
    }

    /// Instances are exactly the guest `int`.
    pub fn is_int_exact(&self) -> bool {
        self.is_exact(NativeKind::Int)
    }

    /// Instances are exactly the guest `float`.
    pub fn is_float_exact(&self) -> bool {
        self.is_exact(NativeKind::Float)
    }

    /// Only an adopted (never an accepted) native class is exact.
    fn is_exact(&self, kind: NativeKind) -> bool {
        matches!(self, Self::Adopted(a) if !a.is_accepted() && a.host_class().native_kind() == Some(kind))
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared(_))
    }

    pub fn as_shared(&self) -> Option<&Arc<SharedRepresentation>> {
        match self {
            Self::Shared(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_adopted(&self) -> Option<&AdoptedRepresentation> {
        match self {
            Self::Adopted(a) => Some(a),
            _ => None,
        }
    }
}

impl PartialEq for Representation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Canonical(a), Self::Canonical(b)) => Arc::ptr_eq(a, b),
            (Self::Adopted(a), Self::Adopted(b)) => a == b,
            (Self::Shared(a), Self::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Representation {}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(t) => write!(f, "{}", t.name()),
            Self::Adopted(a) => write!(f, "{}", a),
            Self::Shared(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Debug for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canonical(t) => write!(f, "Canonical({})", t.name()),
            Self::Adopted(a) => write!(f, "Adopted({}#{})", a.owner().name(), a.index()),
            Self::Shared(s) => write!(f, "{}", s),
        }
    }
}

/// Secondary host class of an adoptive type.
#[derive(Clone)]
pub struct AdoptedRepresentation {
    owner: Arc<GuestType>,
    index: usize,
}

impl AdoptedRepresentation {
    pub(crate) fn new(owner: Arc<GuestType>, index: usize) -> Self {
        debug_assert!(index > 0 && index < owner.self_classes().len());
        Self { owner, index }
    }

    pub fn owner(&self) -> &Arc<GuestType> {
        &self.owner
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn host_class(&self) -> &HostClass {
        &self.owner.self_classes()[self.index]
    }

    /// Accepted for widening only, never registered for its class.
    pub fn is_accepted(&self) -> bool {
        self.index > self.owner.adopted_count()
    }
}

impl PartialEq for AdoptedRepresentation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.owner, &other.owner) && self.index == other.index
    }
}

impl fmt::Display for AdoptedRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.host_class().simple_name(), self.owner)
    }
}

/// One host class for many guest types.
pub struct SharedRepresentation {
    host_class: HostClass,
    canonical_class: Option<HostClass>,
}

impl SharedRepresentation {
    /// `canonical_class` is the class of the built-in base the shared
    /// class was derived for, when there is one.
    pub(crate) fn new(host_class: HostClass, canonical_class: Option<HostClass>) -> Self {
        Self {
            host_class,
            canonical_class,
        }
    }

    pub fn host_class(&self) -> &HostClass {
        &self.host_class
    }

    pub fn canonical_class(&self) -> Option<&HostClass> {
        self.canonical_class.as_ref()
    }

    fn guest_type(&self, x: &dyn HostObject) -> core::result::Result<Arc<GuestType>, InterpreterError> {
        match x.as_with_class() {
            Some(wc) => Ok(wc.get_type()),
            None => Err(InterpreterError::NotShared {
                class: x.host_class().name().to_string(),
                representation: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for SharedRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared[{}]", self.host_class.simple_name())
    }
}

impl fmt::Debug for SharedRepresentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
