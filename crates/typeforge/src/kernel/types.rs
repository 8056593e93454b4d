// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Guest types.
//!
//! A [`GuestType`] is one of three kinds:
//!
//! | Kind        | Representations                            | Host classes        |
//! |-------------|--------------------------------------------|---------------------|
//! | Simple      | itself (canonical)                         | primary             |
//! | Adoptive    | itself, adopted..., accepted...            | primary, adopted... |
//! | Replaceable | the one shared representation              | the shared class    |
//!
//! Types are immutable once built. Adopted representations are not stored
//! on the type: they are `(type, index)` pairs produced on demand, so the
//! type never owns a handle on itself.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::flags::{KernelTypeFlags, TypeFlags};
use super::representation::{AdoptedRepresentation, Representation, SharedRepresentation};
use crate::error::Result;
use crate::host::{HostClass, HostObject};

#[derive(Debug, Clone)]
enum TypeKind {
    Simple,
    Adoptive { adopted_count: usize },
    Replaceable { shared: Arc<SharedRepresentation> },
}

/// A type defined in (or exposed to) the guest language.
pub struct GuestType {
    name: String,
    bases: Vec<Arc<GuestType>>,
    features: TypeFlags,
    kernel: KernelTypeFlags,
    /// Primary class first, then adopted, then accepted classes.
    self_classes: Vec<HostClass>,
    kind: TypeKind,
}

/// Attributes common to every kind of type.
#[derive(Debug, Clone)]
pub(crate) struct TypeHeader {
    pub name: String,
    pub bases: Vec<Arc<GuestType>>,
    pub features: TypeFlags,
    pub kernel: KernelTypeFlags,
}

impl TypeHeader {
    /// Kernel flags with those inherited from the bases folded in.
    fn effective_kernel(&self) -> KernelTypeFlags {
        self.bases
            .iter()
            .fold(self.kernel, |acc, b| acc | b.kernel.heritable())
    }
}

impl GuestType {
    /// A type whose only representation is itself.
    pub(crate) fn simple(header: TypeHeader, primary: HostClass) -> Arc<Self> {
        Arc::new(Self {
            kernel: header.effective_kernel(),
            name: header.name,
            bases: header.bases,
            features: header.features,
            self_classes: vec![primary],
            kind: TypeKind::Simple,
        })
    }

    /// A type with adopted and accepted host classes.
    ///
    /// `registrar` is called once per adopted class, in order, with the
    /// representation it should be published under. Accepted classes are
    /// never offered to the registrar. Every adopted class is offered even
    /// if an earlier one is refused; the first refusal is returned.
    pub(crate) fn adoptive<R>(
        header: TypeHeader,
        primary: HostClass,
        adopted: &[HostClass],
        accepted: &[HostClass],
        mut registrar: R,
    ) -> Result<Arc<Self>>
    where
        R: FnMut(&HostClass, Representation) -> Result<()>,
    {
        let mut self_classes = Vec::with_capacity(1 + adopted.len() + accepted.len());
        self_classes.push(primary);
        self_classes.extend(adopted.iter().cloned());
        self_classes.extend(accepted.iter().cloned());

        let ty = Arc::new(Self {
            kernel: header.effective_kernel(),
            name: header.name,
            bases: header.bases,
            features: header.features,
            self_classes,
            kind: TypeKind::Adoptive {
                adopted_count: adopted.len(),
            },
        });

        let mut refused = None;
        for (i, class) in adopted.iter().enumerate() {
            let rep = Representation::Adopted(AdoptedRepresentation::new(ty.clone(), i + 1));
            if let Err(e) = registrar(class, rep) {
                refused.get_or_insert(e);
            }
        }
        match refused {
            Some(e) => Err(e),
            None => Ok(ty),
        }
    }

    /// A type sharing `shared` with its sibling types.
    pub(crate) fn replaceable(header: TypeHeader, shared: Arc<SharedRepresentation>) -> Arc<Self> {
        Arc::new(Self {
            kernel: header.effective_kernel(),
            name: header.name,
            bases: header.bases,
            features: header.features | TypeFlags::REPLACEABLE,
            self_classes: vec![shared.host_class().clone()],
            kind: TypeKind::Replaceable { shared },
        })
    }

    /// Host class of type objects themselves.
    pub fn type_class() -> &'static HostClass {
        static TYPE: OnceLock<HostClass> = OnceLock::new();
        TYPE.get_or_init(|| HostClass::builder("type").build())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[Arc<GuestType>] {
        &self.bases
    }

    /// The host class instances of this type are (primarily) made of.
    pub fn primary_class(&self) -> &HostClass {
        &self.self_classes[0]
    }

    /// Representations in index order. For a simple or adoptive type,
    /// index 0 is the type itself.
    pub fn representations(self: &Arc<Self>) -> Vec<Representation> {
        match &self.kind {
            TypeKind::Replaceable { shared } => vec![Representation::Shared(shared.clone())],
            TypeKind::Simple | TypeKind::Adoptive { .. } => {
                let mut reps = Vec::with_capacity(self.self_classes.len());
                reps.push(Representation::Canonical(self.clone()));
                for index in 1..self.self_classes.len() {
                    reps.push(Representation::Adopted(AdoptedRepresentation::new(
                        self.clone(),
                        index,
                    )));
                }
                reps
            }
        }
    }

    /// Host classes parallel to [`representations`](Self::representations).
    pub fn self_classes(&self) -> &[HostClass] {
        &self.self_classes
    }

    pub fn adopted_count(&self) -> usize {
        match self.kind {
            TypeKind::Adoptive { adopted_count } => adopted_count,
            _ => 0,
        }
    }

    pub fn accepted_count(&self) -> usize {
        match self.kind {
            TypeKind::Adoptive { adopted_count } => self.self_classes.len() - 1 - adopted_count,
            _ => 0,
        }
    }

    /// Index of `class` among this type's self classes.
    pub fn index_of(&self, class: &HostClass) -> Option<usize> {
        self.self_classes.iter().position(|c| c == class)
    }

    pub fn features(&self) -> TypeFlags {
        self.features
    }

    pub fn kernel_flags(&self) -> KernelTypeFlags {
        self.kernel
    }

    pub fn has_feature(&self, flag: TypeFlags) -> bool {
        self.features.contains(flag)
    }

    pub fn has_kernel_feature(&self, flag: KernelTypeFlags) -> bool {
        self.kernel.contains(flag)
    }

    /// Whether attributes of the type object may be changed. Replaceable
    /// types never allow it.
    pub fn is_mutable(&self) -> bool {
        !matches!(self.kind, TypeKind::Replaceable { .. }) && !self.has_feature(TypeFlags::IMMUTABLE)
    }

    pub fn is_replaceable(&self) -> bool {
        matches!(self.kind, TypeKind::Replaceable { .. })
    }

    pub fn is_adoptive(&self) -> bool {
        matches!(self.kind, TypeKind::Adoptive { .. })
    }

    /// The shared representation of a replaceable type.
    pub fn shared_representation(&self) -> Option<&Arc<SharedRepresentation>> {
        match &self.kind {
            TypeKind::Replaceable { shared } => Some(shared),
            _ => None,
        }
    }

    /// Whether an instance of this type could have its `__class__` set to
    /// `other`: both must be replaceable over the same shared class.
    pub fn has_same_layout(&self, other: &GuestType) -> bool {
        match (self.shared_representation(), other.shared_representation()) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Depth-first search of the bases.
    pub fn is_subtype_of(&self, other: &GuestType) -> bool {
        std::ptr::eq(self, other) || self.bases.iter().any(|b| b.is_subtype_of(other))
    }
}

impl HostObject for GuestType {
    fn host_class(&self) -> &HostClass {
        Self::type_class()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl PartialEq for GuestType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for GuestType {}

impl fmt::Display for GuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class '{}'>", self.name)
    }
}

impl fmt::Debug for GuestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestType")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("self_classes", &self.self_classes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Clash, Error};

    fn header(name: &str) -> TypeHeader {
        TypeHeader {
            name: name.into(),
            bases: Vec::new(),
            features: TypeFlags::empty(),
            kernel: KernelTypeFlags::empty(),
        }
    }

    #[test]
    fn test_adoptive_layout() {
        let p = HostClass::builder("P").build();
        let a = HostClass::builder("A").build();
        let b = HostClass::builder("B").build();
        let x = HostClass::builder("X").build();
        let mut offered = Vec::new();
        let t = GuestType::adoptive(header("t"), p.clone(), &[a.clone(), b.clone()], &[x.clone()], |c, r| {
            offered.push((c.clone(), r.index()));
            Ok(())
        })
        .unwrap();

        assert_eq!(offered, vec![(a.clone(), 1), (b.clone(), 2)]);
        assert_eq!(t.adopted_count(), 2);
        assert_eq!(t.accepted_count(), 1);
        let reps = t.representations();
        assert_eq!(reps.len(), 1 + 2 + 1);
        assert_eq!(t.self_classes(), &[p.clone(), a, b, x.clone()]);
        assert_eq!(reps[0], Representation::Canonical(t.clone()));
        assert_eq!(reps[3].index(), 3);
        assert_eq!(reps[3].host_class(), &x);
        assert_eq!(t.index_of(&x), Some(3));
        assert_eq!(t.index_of(&p), Some(0));
    }

    #[test]
    fn test_adoptive_reports_first_refusal() {
        let p = HostClass::builder("P").build();
        let a = HostClass::builder("A").build();
        let b = HostClass::builder("B").build();
        let mut calls = 0;
        let err = GuestType::adoptive(header("t"), p, &[a.clone(), b], &[], |c, _| {
            calls += 1;
            Err(Clash::existing(c, "something").into())
        })
        .unwrap_err();
        assert_eq!(calls, 2);
        match err {
            Error::Clash(clash) => assert_eq!(clash.class, a),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_kernel_flags_inherited() {
        let base = GuestType::simple(
            TypeHeader {
                kernel: KernelTypeFlags::HAS_ITER | KernelTypeFlags::MATCH_SELF,
                ..header("base")
            },
            HostClass::builder("Base").build(),
        );
        let sub = GuestType::simple(
            TypeHeader {
                bases: vec![base.clone()],
                ..header("sub")
            },
            HostClass::builder("Sub").build(),
        );
        assert!(sub.has_kernel_feature(KernelTypeFlags::HAS_ITER));
        assert!(!sub.has_kernel_feature(KernelTypeFlags::MATCH_SELF));
        assert!(sub.is_subtype_of(&base));
        assert!(!base.is_subtype_of(&sub));
    }

    #[test]
    fn test_replaceable_is_immutable() {
        let shared = Arc::new(SharedRepresentation::new(HostClass::builder("S").build(), None));
        let t = GuestType::replaceable(header("r"), shared.clone());
        let u = GuestType::replaceable(header("u"), shared.clone());
        assert!(!t.is_mutable());
        assert!(t.has_feature(TypeFlags::REPLACEABLE));
        assert!(t.has_same_layout(&u));
        assert_eq!(t.representations(), vec![Representation::Shared(shared)]);
        assert_eq!(t.to_string(), "<class 'r'>");
    }
}
