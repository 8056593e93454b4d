// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host classes: run-time class identity for values handled by the kernel.
//!
//! A [`HostClass`] is the unit the registry is keyed on. Identity is the
//! allocation, not the name: two classes built with the same name are
//! different classes, exactly as two classes from different loaders are.
//!
//! # Static initialisation
//!
//! ```text
//! Uninitialised --ensure_init--> Running(thread) --ok--> Done
//!                                        |
//!                                        +--err/panic--> Failed(reason)
//! ```
//!
//! Superclasses are initialised first. A second thread asking for a class
//! that is `Running` blocks until the owner finishes; the owner itself
//! (re-entrant request from its own initializer) returns at once. A
//! `Failed` class is never retried.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::error::{InterpreterError, Result};
use crate::subclass::Layout;

/// Static initializer of a host class.
///
/// Crafted classes use this to define their guest type (and so publish
/// their representation) the first time the class is needed.
pub type Initializer = Arc<dyn Fn(&HostClass) -> Result<()> + Send + Sync>;

/// Whether a host class is instantiable or only a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// A concrete (or abstract) class with instances.
    Class,
    /// A capability that classes may implement.
    Interface,
}

/// Marker for the built-in numeric fast paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    /// Exact guest `int` values.
    Int,
    /// Exact guest `float` values.
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InitState {
    Uninitialised,
    Running(ThreadId),
    Done,
    Failed(String),
}

struct ClassInner {
    name: String,
    kind: ClassKind,
    superclass: Option<HostClass>,
    interfaces: Vec<HostClass>,
    native: Option<NativeKind>,
    initializer: Option<Initializer>,
    layout: Option<Arc<Layout>>,
    init: Mutex<InitState>,
    init_done: Condvar,
}

/// Handle on a host class. Cloning is cheap; equality is identity.
#[derive(Clone)]
pub struct HostClass(Arc<ClassInner>);

/// Identity of a host class, usable as a map key while the class is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassKey(usize);

impl HostClass {
    /// Start describing a new class. The superclass defaults to
    /// [`HostClass::object`].
    pub fn builder(name: impl Into<String>) -> HostClassBuilder {
        HostClassBuilder::new(name.into(), ClassKind::Class)
    }

    /// Start describing a new interface (capability) class.
    pub fn interface(name: impl Into<String>) -> HostClassBuilder {
        HostClassBuilder::new(name.into(), ClassKind::Interface)
    }

    /// The root of every class hierarchy.
    pub fn object() -> &'static HostClass {
        static OBJECT: OnceLock<HostClass> = OnceLock::new();
        OBJECT.get_or_init(|| HostClassBuilder::new("object".into(), ClassKind::Class).root())
    }

    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Name without any package prefix.
    pub fn simple_name(&self) -> &str {
        match self.0.name.rfind('.') {
            Some(dot) => &self.0.name[dot + 1..],
            None => &self.0.name,
        }
    }

    /// Package part of the name, empty if there is none.
    pub fn package(&self) -> &str {
        match self.0.name.rfind('.') {
            Some(dot) => &self.0.name[..dot],
            None => "",
        }
    }

    pub fn kind(&self) -> ClassKind {
        self.0.kind
    }

    pub fn is_interface(&self) -> bool {
        self.0.kind == ClassKind::Interface
    }

    pub fn superclass(&self) -> Option<&HostClass> {
        self.0.superclass.as_ref()
    }

    /// Interfaces declared directly by this class.
    pub fn interfaces(&self) -> &[HostClass] {
        &self.0.interfaces
    }

    pub fn native_kind(&self) -> Option<NativeKind> {
        self.0.native
    }

    /// Field layout, present only on synthesized classes.
    pub fn layout(&self) -> Option<&Arc<Layout>> {
        self.0.layout.as_ref()
    }

    pub fn is_synthesized(&self) -> bool {
        self.0.layout.is_some()
    }

    pub fn key(&self) -> ClassKey {
        ClassKey(Arc::as_ptr(&self.0) as usize)
    }

    /// Whether this class (or an ancestor) declares `iface`, directly or
    /// through a super-interface.
    pub fn implements(&self, iface: &HostClass) -> bool {
        let mut c = Some(self);
        while let Some(class) = c {
            if class.0.interfaces.iter().any(|i| i == iface || i.implements(iface)) {
                return true;
            }
            c = class.superclass();
        }
        false
    }

    /// Whether instances of this class are instances of `other`.
    pub fn is_subclass_of(&self, other: &HostClass) -> bool {
        if other.is_interface() {
            return self == other || self.implements(other);
        }
        let mut c = Some(self);
        while let Some(class) = c {
            if class == other {
                return true;
            }
            c = class.superclass();
        }
        false
    }

    /// Whether static initialisation has completed successfully.
    pub fn is_initialised(&self) -> bool {
        *self.0.init.lock() == InitState::Done
    }

    /// Run static initialisation if it has not happened yet.
    ///
    /// Blocks while another thread initialises the class. Must not be
    /// called while holding any registry lock.
    pub fn ensure_init(&self) -> core::result::Result<(), InterpreterError> {
        if let Some(sup) = &self.0.superclass {
            sup.ensure_init()?;
        }

        let me = thread::current().id();
        let mut state = self.0.init.lock();
        loop {
            match &*state {
                InitState::Done => return Ok(()),
                InitState::Failed(reason) => {
                    return Err(InterpreterError::ClassInit {
                        class: self.0.name.clone(),
                        reason: reason.clone(),
                    })
                }
                InitState::Running(owner) if *owner == me => return Ok(()),
                InitState::Running(_) => {}
                InitState::Uninitialised => break,
            }
            self.0.init_done.wait(&mut state);
        }
        *state = InitState::Running(me);
        drop(state);

        let guard = InitGuard { class: self };
        let outcome = match &self.0.initializer {
            Some(init) => init(self),
            None => Ok(()),
        };
        let reason = outcome.err().map(|e| e.to_string());
        guard.finish(reason.clone());

        match reason {
            None => Ok(()),
            Some(reason) => Err(InterpreterError::ClassInit {
                class: self.0.name.clone(),
                reason,
            }),
        }
    }
}

/// Completes initialisation, marking the class failed if the initializer
/// unwinds so that waiting threads are released.
struct InitGuard<'a> {
    class: &'a HostClass,
}

impl InitGuard<'_> {
    fn finish(self, failure: Option<String>) {
        self.settle(match failure {
            None => InitState::Done,
            Some(reason) => InitState::Failed(reason),
        });
        std::mem::forget(self);
    }

    fn settle(&self, to: InitState) {
        let mut state = self.class.0.init.lock();
        *state = to;
        self.class.0.init_done.notify_all();
    }
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        self.settle(InitState::Failed("initializer panicked".into()));
    }
}

impl PartialEq for HostClass {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for HostClass {}

impl Hash for HostClass {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostClass({})", self.0.name)
    }
}

impl fmt::Display for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Builder for [`HostClass`].
pub struct HostClassBuilder {
    name: String,
    kind: ClassKind,
    superclass: Option<HostClass>,
    interfaces: Vec<HostClass>,
    native: Option<NativeKind>,
    initializer: Option<Initializer>,
    layout: Option<Arc<Layout>>,
}

impl HostClassBuilder {
    fn new(name: String, kind: ClassKind) -> Self {
        Self {
            name,
            kind,
            superclass: None,
            interfaces: Vec::new(),
            native: None,
            initializer: None,
            layout: None,
        }
    }

    /// Set the superclass (ignored for interfaces).
    pub fn extends(mut self, superclass: &HostClass) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    /// Declare an implemented interface (or super-interface).
    pub fn implements(mut self, iface: &HostClass) -> Self {
        self.interfaces.push(iface.clone());
        self
    }

    pub fn native(mut self, kind: NativeKind) -> Self {
        self.native = Some(kind);
        self
    }

    /// Install a static initializer, run at most once.
    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&HostClass) -> Result<()> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(init));
        self
    }

    pub(crate) fn layout(mut self, layout: Arc<Layout>) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Build the class.
    pub fn build(mut self) -> HostClass {
        if self.kind == ClassKind::Class && self.superclass.is_none() {
            self.superclass = Some(HostClass::object().clone());
        }
        self.root()
    }

    /// Build a class with no superclass at all.
    fn root(self) -> HostClass {
        let superclass = match self.kind {
            ClassKind::Class => self.superclass,
            ClassKind::Interface => None,
        };
        HostClass(Arc::new(ClassInner {
            name: self.name,
            kind: self.kind,
            superclass,
            interfaces: self.interfaces,
            native: self.native,
            initializer: self.initializer,
            layout: self.layout,
            init: Mutex::new(InitState::Uninitialised),
            init_done: Condvar::new(),
        }))
    }
}
