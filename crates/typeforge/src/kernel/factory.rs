// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The type factory: sole writer of the registry.
//!
//! # Locking
//!
//! The factory lock is re-entrant: a crafted class initialised while the
//! factory is working may itself call [`TypeFactory::from_spec`]. Work in
//! progress accumulates in a workshop of unpublished bindings, published
//! all together when the outermost request completes.
//!
//! The factory lock is always taken before the registry's lock. The
//! registry calls back into the factory ([`Escalation`]) only when it holds
//! no lock of its own.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use super::flags::TypeFlags;
use super::registry::{Escalation, TypeRegistry};
use super::representation::{Representation, SharedRepresentation};
use super::spec::RepresentationSpec;
use super::type_spec::TypeSpec;
use super::types::{GuestType, TypeHeader};
use crate::config::KernelConfig;
use crate::error::{Clash, Error, Result, SpecError};
use crate::host::{class_assignment_interface, ClassKey, HostClass, Object};
use crate::subclass::{DerivedObject, SubclassFactory};

/// Bindings made but not yet published.
#[derive(Default)]
struct Workshop {
    depth: usize,
    /// Names of the type specifications in progress, outermost first.
    tasks: Vec<String>,
    unpublished: HashMap<ClassKey, (HostClass, Representation)>,
}

impl Workshop {
    fn indent(&self) -> String {
        ". ".repeat(self.depth.min(24))
    }

    fn context(&self) -> Option<&str> {
        self.tasks.first().map(String::as_str)
    }
}

type Guard<'a> = ReentrantMutexGuard<'a, RefCell<Workshop>>;

/// Creates guest types and publishes their representations.
pub struct TypeFactory {
    registry: TypeRegistry,
    lock: ReentrantMutex<RefCell<Workshop>>,
    subclasses: SubclassFactory,
    /// Frozen specification to the layout class synthesized for it.
    layouts: DashMap<RepresentationSpec, HostClass>,
    object_type: Arc<GuestType>,
    type_type: Arc<GuestType>,
}

impl TypeFactory {
    /// A factory with its own registry, holding the `object` and `type`
    /// types.
    pub fn new(config: KernelConfig) -> Result<Arc<Self>> {
        log::info!("Type factory being created.");
        let subclasses = SubclassFactory::new(config)?;

        let object_type = GuestType::simple(
            TypeHeader {
                name: "object".into(),
                bases: Vec::new(),
                features: TypeFlags::BASETYPE | TypeFlags::INSTANTIABLE | TypeFlags::IMMUTABLE,
                kernel: Default::default(),
            },
            HostClass::object().clone(),
        );
        let type_type = GuestType::simple(
            TypeHeader {
                name: "type".into(),
                bases: vec![object_type.clone()],
                features: TypeFlags::BASETYPE | TypeFlags::INSTANTIABLE | TypeFlags::IMMUTABLE,
                kernel: Default::default(),
            },
            GuestType::type_class().clone(),
        );

        let factory = Arc::new_cyclic(|me: &Weak<Self>| Self {
            registry: TypeRegistry::new(me.clone() as Weak<dyn Escalation>),
            lock: ReentrantMutex::new(RefCell::new(Workshop::default())),
            subclasses,
            layouts: DashMap::new(),
            object_type: object_type.clone(),
            type_type: type_type.clone(),
        });
        factory.registry.register_all([
            (HostClass::object().clone(), Representation::Canonical(object_type)),
            (GuestType::type_class().clone(), Representation::Canonical(type_type)),
        ])?;
        Ok(factory)
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn subclass_factory(&self) -> &SubclassFactory {
        &self.subclasses
    }

    /// The root guest type.
    pub fn object_type(&self) -> &Arc<GuestType> {
        &self.object_type
    }

    /// The type of type objects.
    pub fn type_type(&self) -> &Arc<GuestType> {
        &self.type_type
    }

    /// Number of distinct layouts synthesized so far.
    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    /// Create a type from `spec` and publish its representations.
    ///
    /// Called re-entrantly (from a class initializer), publication waits
    /// for the outermost call.
    pub fn from_spec(&self, spec: TypeSpec) -> Result<Arc<GuestType>> {
        let guard = self.lock.lock();
        self.enter(&guard, Some(spec.name()));
        {
            let ws = guard.borrow();
            log::debug!("{}Creating partial type for '{}'", ws.indent(), spec.name());
        }
        let result = self.add_partial_from_spec(&guard, &spec);
        self.leave(&guard, result)
    }

    /// Representation of `class` if published or in progress.
    pub fn find(&self, class: &HostClass) -> Option<Representation> {
        let guard = self.lock.lock();
        self.find_locked(&guard, class)
    }

    /// Create a guest class `name` with the given bases.
    ///
    /// `slots` is `None` when the class declares no `__slots__`, in which
    /// case instances get a dictionary. Classes whose layouts are equal
    /// share one synthesized host class and one shared representation.
    pub fn define_class(
        &self,
        name: &str,
        bases: &[Arc<GuestType>],
        slots: Option<&[&str]>,
        dict: bool,
    ) -> Result<Arc<GuestType>> {
        let bases: Vec<Arc<GuestType>> = if bases.is_empty() {
            vec![self.object_type.clone()]
        } else {
            bases.to_vec()
        };
        let spec = self.layout_spec(name, &bases, slots, dict)?;

        let guard = self.lock.lock();
        let layout_class = self.layout_class(&spec)?;
        let mut type_spec = TypeSpec::new(name, &layout_class)
            .flag(TypeFlags::REPLACEABLE | TypeFlags::BASETYPE | TypeFlags::INSTANTIABLE);
        for base in &bases {
            type_spec = type_spec.base(base);
        }
        let ty = self.from_spec(type_spec);
        drop(guard);
        ty
    }

    /// A new instance of `ty`.
    ///
    /// Only types defined by [`define_class`](Self::define_class) can be
    /// instantiated here so far.
    pub fn new_instance(&self, ty: &Arc<GuestType>) -> Result<Object> {
        if ty.is_replaceable() && ty.primary_class().is_synthesized() {
            let obj = DerivedObject::new(ty.primary_class(), ty.clone())?;
            Ok(Arc::new(obj))
        } else {
            Err(Error::NotYetSupported(format!("creating instances of '{}'", ty.name())))
        }
    }

    /// Frozen spec for a guest class over `bases`, inheriting the slots and
    /// dictionary of any guest-defined base.
    fn layout_spec(
        &self,
        name: &str,
        bases: &[Arc<GuestType>],
        slots: Option<&[&str]>,
        dict: bool,
    ) -> Result<RepresentationSpec> {
        let mut base_class = HostClass::object().clone();
        let mut inherited: Vec<String> = Vec::new();
        let mut inherited_dict = false;

        for b in bases {
            let canonical = match b.shared_representation() {
                Some(shared) => {
                    if let Some(layout) = b.primary_class().layout() {
                        for s in layout.slot_names() {
                            if !inherited.contains(s) {
                                inherited.push(s.clone());
                            }
                        }
                        inherited_dict |= layout.has_dict();
                    }
                    shared
                        .canonical_class()
                        .cloned()
                        .unwrap_or_else(|| HostClass::object().clone())
                }
                None => b.primary_class().clone(),
            };
            if canonical.is_subclass_of(&base_class) {
                base_class = canonical;
            } else if !base_class.is_subclass_of(&canonical) {
                return Err(Error::LayoutConflict {
                    name: name.to_string(),
                    bases: bases.iter().map(|b| b.name().to_string()).collect(),
                });
            }
        }

        let mut spec = RepresentationSpec::new(name, &base_class);
        if !inherited.is_empty() {
            spec.add_slots(inherited.iter().cloned())?;
            if slots.is_none() {
                inherited_dict = true;
            }
        }
        if let Some(declared) = slots {
            for s in declared {
                if !inherited.iter().any(|i| i == s) {
                    spec.add_slot(*s)?;
                }
            }
        }
        spec.add_dict_if(dict || inherited_dict)?;
        spec.freeze();
        Ok(spec)
    }

    /// Cached or newly synthesized class for a frozen layout.
    fn layout_class(&self, spec: &RepresentationSpec) -> Result<HostClass> {
        if let Some(class) = self.layouts.get(spec) {
            return Ok(class.clone());
        }
        let class = self.subclasses.find_or_create_subclass(spec)?;
        self.layouts.insert(spec.clone(), class.clone());
        Ok(class)
    }

    fn enter(&self, guard: &Guard<'_>, task: Option<&str>) {
        let mut ws = guard.borrow_mut();
        ws.depth += 1;
        if let Some(task) = task {
            ws.tasks.push(task.to_string());
        }
    }

    /// Finish one level of work; at the outermost level publish it, or on
    /// failure discard it.
    fn leave<T>(&self, guard: &Guard<'_>, result: Result<T>) -> Result<T> {
        let outermost = {
            let mut ws = guard.borrow_mut();
            ws.depth -= 1;
            ws.depth == 0
        };
        if !outermost {
            return result;
        }
        match result {
            Ok(value) => {
                self.publish_all(guard)?;
                Ok(value)
            }
            Err(e) => {
                let mut ws = guard.borrow_mut();
                ws.unpublished.clear();
                ws.tasks.clear();
                Err(e)
            }
        }
    }

    fn publish_all(&self, guard: &Guard<'_>) -> Result<()> {
        let (bindings, context) = {
            let mut ws = guard.borrow_mut();
            let context = ws.context().map(str::to_string);
            ws.tasks.clear();
            (std::mem::take(&mut ws.unpublished), context)
        };
        // A binding published meanwhile by the registry itself is the one
        // we computed; anything else is a clash.
        let fresh: Vec<(HostClass, Representation)> = bindings
            .into_values()
            .filter(|(c, r)| self.registry.lookup(c).as_ref() != Some(r))
            .collect();
        self.registry.register_all(fresh).map_err(|clash| match context {
            Some(context) => Error::Clash(clash.in_context(context)),
            None => Error::Clash(clash),
        })
    }

    fn find_locked(&self, guard: &Guard<'_>, class: &HostClass) -> Option<Representation> {
        self.registry.lookup(class).or_else(|| {
            guard
                .borrow()
                .unpublished
                .get(&class.key())
                .map(|(_, rep)| rep.clone())
        })
    }

    fn add_representation(&self, guard: &Guard<'_>, class: &HostClass, rep: Representation) -> Result<()> {
        if let Some(existing) = self.find_locked(guard, class) {
            let clash = Clash::existing(class, &existing);
            return Err(match guard.borrow().context() {
                Some(context) => clash.in_context(context),
                None => clash,
            }
            .into());
        }
        guard
            .borrow_mut()
            .unpublished
            .insert(class.key(), (class.clone(), rep));
        Ok(())
    }

    fn add_partial_from_spec(&self, guard: &Guard<'_>, spec: &TypeSpec) -> Result<Arc<GuestType>> {
        check_classes(spec)?;
        let header = spec.header(std::slice::from_ref(&self.object_type));
        let primary = spec.primary();

        if spec.is_replaceable() {
            if !spec.adopted().is_empty() || !spec.accepted().is_empty() {
                return Err(Error::internal(format!(
                    "replaceable type {} cannot adopt or accept classes",
                    spec.name()
                )));
            }
            let shared = match self.find_locked(guard, primary) {
                None => {
                    let shared = Arc::new(SharedRepresentation::new(
                        primary.clone(),
                        primary.superclass().cloned(),
                    ));
                    self.add_representation(guard, primary, Representation::Shared(shared.clone()))?;
                    shared
                }
                Some(Representation::Shared(shared)) => shared,
                Some(existing) => {
                    let clash = Clash::not_sharable(primary, &existing).in_context(spec.name());
                    return Err(clash.into());
                }
            };
            Ok(GuestType::replaceable(header, shared))
        } else if spec.adopted().is_empty() && spec.accepted().is_empty() {
            let ty = GuestType::simple(header, primary.clone());
            self.add_representation(guard, primary, Representation::Canonical(ty.clone()))?;
            Ok(ty)
        } else {
            let ty = GuestType::adoptive(header, primary.clone(), spec.adopted(), spec.accepted(), |c, rep| {
                self.add_representation(guard, c, rep)
            })?;
            self.add_representation(guard, primary, Representation::Canonical(ty.clone()))?;
            Ok(ty)
        }
    }

    /// Superclass chain lookup for crafted classes that carry their type.
    fn resolve(&self, guard: &Guard<'_>, class: &HostClass) -> Option<Representation> {
        if let Some(rep) = self.find_locked(guard, class) {
            return Some(rep);
        }
        if class.implements(class_assignment_interface()) && !class.is_synthesized() {
            let rep = self.resolve(guard, class.superclass()?)?;
            guard
                .borrow_mut()
                .unpublished
                .insert(class.key(), (class.clone(), rep.clone()));
            return Some(rep);
        }
        None
    }

    fn find_or_create_locked(&self, guard: &Guard<'_>, class: &HostClass) -> Result<Representation> {
        {
            let ws = guard.borrow();
            log::debug!("{}Finding representation for '{}'", ws.indent(), class.name());
        }
        if let Some(rep) = self.resolve(guard, class) {
            return Ok(rep);
        }
        if class.is_synthesized() {
            let shared = Arc::new(SharedRepresentation::new(class.clone(), class.superclass().cloned()));
            let rep = Representation::Shared(shared);
            self.add_representation(guard, class, rep.clone())?;
            return Ok(rep);
        }
        if class.is_interface() {
            return Err(Error::internal(format!(
                "interface {} cannot be the class of an object",
                class.name()
            )));
        }
        let spec = TypeSpec::new(class.name(), class).flag(TypeFlags::IMMUTABLE);
        self.enter(guard, Some(spec.name()));
        let result = self.add_partial_from_spec(guard, &spec);
        self.guard_depth_down(guard);
        result?;
        self.find_locked(guard, class)
            .ok_or_else(|| Clash::missing(class).into())
    }

    /// Undo a nested [`enter`](Self::enter) without publishing.
    fn guard_depth_down(&self, guard: &Guard<'_>) {
        guard.borrow_mut().depth -= 1;
    }
}

impl Escalation for TypeFactory {
    fn find_or_create(&self, class: &HostClass) -> Result<Representation> {
        // Static initialisation runs before the factory lock is taken.
        class.ensure_init()?;
        let guard = self.lock.lock();
        if let Some(rep) = self.registry.lookup(class) {
            return Ok(rep);
        }
        self.enter(&guard, None);
        let result = self.find_or_create_locked(&guard, class);
        self.leave(&guard, result)
    }
}

impl std::fmt::Debug for TypeFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeFactory")
            .field("registry", &self.registry)
            .field("layouts", &self.layouts.len())
            .finish()
    }
}

/// Reject a class named twice among primary, adopted and accepted.
fn check_classes(spec: &TypeSpec) -> Result<()> {
    let mut seen = vec![spec.primary()];
    let lists = [("adopt", spec.adopted()), ("accept", spec.accepted())];
    for (op, classes) in lists {
        for c in classes {
            if seen.contains(&c) {
                return Err(SpecError::Repeat {
                    spec: spec.name().to_string(),
                    op,
                    item: c.name().to_string(),
                }
                .into());
            }
            seen.push(c);
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
