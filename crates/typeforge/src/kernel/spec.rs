// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shape of a host class wanted by a guest class definition.
//!
//! A [`RepresentationSpec`] is built up by the class-definition code and
//! then frozen. A frozen spec is a cache key for "a layout class exists
//! with exactly this shape": equality and hashing look at the base class,
//! the dictionary flag, the sorted slot names and the set of interfaces,
//! never the provisional name.
//!
//! # Freezing
//!
//! - No slot ever added: the layout is "ordinary object with a dict", so
//!   the dictionary flag becomes `true` and the slot list is empty.
//! - Some slots added: the slots are sorted; the dictionary flag is left
//!   as explicitly requested.
//!
//! Freezing is idempotent. Comparison and hashing freeze both operands,
//! so specs must only be compared once nothing more will be added.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use crate::error::SpecError;
use crate::host::{ClassKey, HostClass};

type SpecResult<T> = core::result::Result<T, SpecError>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct FrozenLayout {
    slots: Vec<String>,
    has_dict: bool,
}

/// Description of a desired host class layout.
#[derive(Clone)]
pub struct RepresentationSpec {
    name: String,
    base: HostClass,
    interfaces: Vec<HostClass>,
    /// `None` until the first slot is added.
    slots: Option<Vec<String>>,
    dict: bool,
    frozen: OnceLock<FrozenLayout>,
}

impl RepresentationSpec {
    /// Start a specification named provisionally `name`, extending `base`.
    pub fn new(name: impl Into<String>, base: &HostClass) -> Self {
        Self {
            name: name.into(),
            base: base.clone(),
            interfaces: Vec::new(),
            slots: None,
            dict: false,
            frozen: OnceLock::new(),
        }
    }

    fn check_not_frozen(&self) -> SpecResult<()> {
        if self.is_frozen() {
            Err(SpecError::Frozen {
                spec: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> SpecResult<&mut Self> {
        self.check_not_frozen()?;
        self.name = name.into();
        Ok(self)
    }

    /// Add an interface the layout class must implement.
    pub fn add_interface(&mut self, iface: &HostClass) -> SpecResult<&mut Self> {
        self.check_not_frozen()?;
        if !iface.is_interface() {
            return Err(SpecError::NotInterface {
                spec: self.name.clone(),
                class: iface.name().to_string(),
            });
        }
        if self.interfaces.contains(iface) {
            return Err(SpecError::Repeat {
                spec: self.name.clone(),
                op: "add_interface",
                item: iface.name().to_string(),
            });
        }
        self.interfaces.push(iface.clone());
        Ok(self)
    }

    pub fn add_interfaces<'a, I>(&mut self, ifaces: I) -> SpecResult<&mut Self>
    where
        I: IntoIterator<Item = &'a HostClass>,
    {
        self.check_not_frozen()?;
        for iface in ifaces {
            self.add_interface(iface)?;
        }
        Ok(self)
    }

    /// Add a named slot. Slot names are kept in canonical (sorted) order
    /// once frozen.
    pub fn add_slot(&mut self, slot: impl Into<String>) -> SpecResult<&mut Self> {
        self.check_not_frozen()?;
        let slot = slot.into();
        let slots = self.slots.get_or_insert_with(Vec::new);
        if slots.contains(&slot) {
            return Err(SpecError::Repeat {
                spec: self.name.clone(),
                op: "add_slot",
                item: slot,
            });
        }
        slots.push(slot);
        Ok(self)
    }

    pub fn add_slots<I, S>(&mut self, slots: I) -> SpecResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_not_frozen()?;
        for slot in slots {
            self.add_slot(slot)?;
        }
        Ok(self)
    }

    /// Request an instance dictionary.
    pub fn add_dict(&mut self) -> SpecResult<&mut Self> {
        self.check_not_frozen()?;
        self.dict = true;
        Ok(self)
    }

    /// Request an instance dictionary if `cond` holds.
    pub fn add_dict_if(&mut self, cond: bool) -> SpecResult<&mut Self> {
        self.check_not_frozen()?;
        self.dict |= cond;
        Ok(self)
    }

    /// Fix the layout. Later calls do nothing.
    pub fn freeze(&self) -> &Self {
        self.frozen.get_or_init(|| match &self.slots {
            None => FrozenLayout {
                slots: Vec::new(),
                has_dict: true,
            },
            Some(slots) => {
                let mut slots = slots.clone();
                slots.sort();
                FrozenLayout {
                    slots,
                    has_dict: self.dict,
                }
            }
        });
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }

    /// Provisional name (not part of the layout identity).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> &HostClass {
        &self.base
    }

    /// Interfaces in the order they were added.
    pub fn interfaces(&self) -> &[HostClass] {
        &self.interfaces
    }

    /// Slot names: sorted once frozen, insertion order before.
    pub fn slots(&self) -> &[String] {
        match (self.frozen.get(), &self.slots) {
            (Some(frozen), _) => &frozen.slots,
            (None, Some(slots)) => slots,
            (None, None) => &[],
        }
    }

    pub fn has_dict(&self) -> bool {
        match self.frozen.get() {
            Some(frozen) => frozen.has_dict,
            None => self.dict,
        }
    }

    fn interface_keys(&self) -> Vec<ClassKey> {
        let mut keys: Vec<ClassKey> = self.interfaces.iter().map(HostClass::key).collect();
        keys.sort();
        keys
    }
}

impl PartialEq for RepresentationSpec {
    fn eq(&self, other: &Self) -> bool {
        self.freeze();
        other.freeze();
        self.base == other.base
            && self.has_dict() == other.has_dict()
            && self.slots() == other.slots()
            && self.interface_keys() == other.interface_keys()
    }
}

impl Eq for RepresentationSpec {}

impl Hash for RepresentationSpec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.freeze();
        self.base.hash(state);
        self.has_dict().hash(state);
        self.slots().hash(state);
        self.interface_keys().hash(state);
    }
}

impl fmt::Display for RepresentationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} extends {}", self.name, self.base.simple_name())?;
        if !self.interfaces.is_empty() {
            let names: Vec<&str> = self.interfaces.iter().map(HostClass::simple_name).collect();
            write!(f, " implements {}", names.join(", "))?;
        }
        if self.has_dict() {
            f.write_str(" +dict")?;
        }
        if self.slots.is_some() {
            write!(f, " +slots({})", self.slots().join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Debug for RepresentationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepresentationSpec({}", self)?;
        if self.is_frozen() {
            f.write_str(", frozen")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
