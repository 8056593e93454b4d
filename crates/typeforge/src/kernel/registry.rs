// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent map from host class to [`Representation`].
//!
//! # Lookup protocol
//!
//! ```text
//! get(c)
//!   1. read lock, hit?                 -> return            (fast path)
//!   2. c.ensure_init()                    no lock held; crafted classes
//!                                         register themselves here
//!   3. read lock, hit?                 -> return
//!   4. escalation.find_or_create(c)       no lock held; takes the factory
//!                                         lock, which orders before ours
//!   5. write lock, publish             -> first published entry wins
//! ```
//!
//! The internal lock is only held for single map reads and writes. It is
//! never held across class initialisation or escalation, both of which can
//! re-enter the registry.
//!
//! # Retention
//!
//! Host classes are never unloaded, so the map is a plain one: an entry
//! holds its class, and a class once bound stays bound for the life of
//! the registry. Keys are class identities and cannot be reused while the
//! entry exists.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::representation::Representation;
use super::types::GuestType;
use crate::error::{Clash, Error, Result};
use crate::host::{ClassKey, HostClass, HostObject};

/// Source of representations for classes nobody registered.
///
/// Implementations take their own lock before touching the registry's,
/// and initialise `class` before taking their own.
pub trait Escalation: Send + Sync {
    /// Find or create, and publish, the representation of `class`.
    fn find_or_create(&self, class: &HostClass) -> Result<Representation>;
}

/// Lookup statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
    pub escalations: u64,
}

struct Entry {
    class: HostClass,
    rep: Representation,
}

/// Host class to representation cache.
pub struct TypeRegistry {
    map: RwLock<HashMap<ClassKey, Entry>>,
    escalation: Option<Weak<dyn Escalation>>,
    hits: AtomicU64,
    misses: AtomicU64,
    escalations: AtomicU64,
}

impl TypeRegistry {
    /// A registry that escalates misses to `escalation`.
    pub fn new(escalation: Weak<dyn Escalation>) -> Self {
        Self::with_escalation(Some(escalation))
    }

    /// A registry that only knows what is registered with it.
    pub fn without_escalation() -> Self {
        Self::with_escalation(None)
    }

    fn with_escalation(escalation: Option<Weak<dyn Escalation>>) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            escalation,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            escalations: AtomicU64::new(0),
        }
    }

    /// Published representation of `class`, without side effects.
    pub fn lookup(&self, class: &HostClass) -> Option<Representation> {
        let map = self.map.read();
        map.get(&class.key()).map(|e| e.rep.clone())
    }

    /// Representation of `class`, initialising the class and escalating
    /// if necessary.
    pub fn get(&self, class: &HostClass) -> Result<Representation> {
        if let Some(rep) = self.lookup(class) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(rep);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        class.ensure_init()?;
        if let Some(rep) = self.lookup(class) {
            return Ok(rep);
        }

        self.escalations.fetch_add(1, Ordering::Relaxed);
        let rep = self.escalate(class)?;
        Ok(self.publish(class, rep))
    }

    /// Representation of the class of `obj`.
    pub fn of(&self, obj: &dyn HostObject) -> Result<Representation> {
        self.get(obj.host_class())
    }

    /// Guest type of `obj`.
    pub fn guest_type_of(&self, obj: &dyn HostObject) -> Result<Arc<GuestType>> {
        self.of(obj)?.guest_type(obj)
    }

    fn escalate(&self, class: &HostClass) -> Result<Representation> {
        let escalation = match &self.escalation {
            Some(weak) => weak
                .upgrade()
                .ok_or_else(|| Error::internal("type factory no longer exists"))?,
            None => return Err(Clash::missing(class).into()),
        };
        escalation.find_or_create(class)
    }

    /// Publish `rep` for `class` unless something already is, returning
    /// whichever representation is now published.
    fn publish(&self, class: &HostClass, rep: Representation) -> Representation {
        let mut map = self.map.write();
        if let Some(existing) = map.get(&class.key()) {
            return existing.rep.clone();
        }
        log::debug!("Publishing '{}' -> '{}'", class.name(), rep);
        map.insert(
            class.key(),
            Entry {
                class: class.clone(),
                rep: rep.clone(),
            },
        );
        rep
    }

    /// Bind `class` to `rep`; fails if `class` is already bound.
    pub fn register(&self, class: &HostClass, rep: Representation) -> core::result::Result<(), Clash> {
        self.register_all(vec![(class.clone(), rep)])
    }

    /// Bind every class to its representation, or none of them if any is
    /// already bound.
    pub fn register_all<I>(&self, bindings: I) -> core::result::Result<(), Clash>
    where
        I: IntoIterator<Item = (HostClass, Representation)>,
    {
        let bindings: Vec<(HostClass, Representation)> = bindings.into_iter().collect();
        let mut map = self.map.write();
        for (class, _) in &bindings {
            if let Some(existing) = map.get(&class.key()) {
                return Err(Clash::existing(class, &existing.rep));
            }
        }
        for (class, rep) in bindings {
            log::debug!("Publishing '{}' -> '{}'", class.name(), rep);
            map.insert(class.key(), Entry { class, rep });
        }
        Ok(())
    }

    /// Every bound class, sorted by name.
    pub fn classes(&self) -> Vec<HostClass> {
        let mut classes: Vec<HostClass> = self.map.read().values().map(|e| e.class.clone()).collect();
        classes.sort_by(|a, b| a.name().cmp(b.name()));
        classes
    }

    /// Number of bound classes.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            escalations: self.escalations.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("entries", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
