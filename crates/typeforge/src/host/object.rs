// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Objects as the interpreter sees them, and the two assignment
//! capabilities an instance may expose.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::class::HostClass;
use super::native::NativeClass;
use crate::error::{Error, Result};
use crate::kernel::GuestType;

/// Any value handled by the interpreter.
pub type Object = Arc<dyn HostObject>;

/// A value with a host class.
///
/// Implement by hand, or with `#[derive(HostObject)]` for crafted
/// classes.
pub trait HostObject: Any + Send + Sync {
    /// The host class governing this value.
    fn host_class(&self) -> &HostClass;

    fn as_any(&self) -> &dyn Any;

    /// Present when the instance carries its own guest type.
    fn as_with_class(&self) -> Option<&dyn WithClassAssignment> {
        None
    }

    /// Present when the instance carries an instance dictionary.
    fn as_with_dict(&self) -> Option<&dyn WithDictAssignment> {
        None
    }
}

impl fmt::Debug for dyn HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object>", self.host_class().name())
    }
}

/// Capability of an instance whose guest type is stored on the instance
/// (and may be reassigned via `__class__`).
pub trait WithClassAssignment {
    /// Current guest type.
    fn get_type(&self) -> Arc<GuestType>;

    /// Validate then store a new guest type.
    fn set_type(&self, replacement: Arc<GuestType>) -> Result<()>;

    /// Reject `replacement` unless it shares this object's layout.
    fn check_class_assignment(&self, replacement: &GuestType) -> Result<()> {
        let current = self.get_type();
        if current.has_same_layout(replacement) {
            Ok(())
        } else {
            Err(Error::ClassAssignment {
                from: current.name().to_string(),
                to: replacement.name().to_string(),
            })
        }
    }
}

/// Capability of an instance with a replaceable `__dict__`.
pub trait WithDictAssignment {
    /// Current instance dictionary (an [`InstanceDict`]).
    fn get_dict(&self) -> Object;

    /// Validate then store a new instance dictionary.
    fn set_dict(&self, dict: Object) -> Result<()>;

    /// Reject anything that is not an [`InstanceDict`].
    fn check_dict_assignment(&self, dict: &Object) -> Result<()> {
        if dict.as_any().is::<InstanceDict>() {
            Ok(())
        } else {
            Err(Error::DictAssignment(format!(
                "__dict__ must be set to a dictionary, not a '{}'",
                dict.host_class().name()
            )))
        }
    }
}

/// The interface class standing for [`WithClassAssignment`].
pub fn class_assignment_interface() -> &'static HostClass {
    static IFACE: OnceLock<HostClass> = OnceLock::new();
    IFACE.get_or_init(|| HostClass::interface("typeforge.WithClassAssignment").build())
}

/// The interface class standing for [`WithDictAssignment`].
pub fn dict_assignment_interface() -> &'static HostClass {
    static IFACE: OnceLock<HostClass> = OnceLock::new();
    IFACE.get_or_init(|| HostClass::interface("typeforge.WithDictAssignment").build())
}

/// Instance dictionary: attribute name to value.
#[derive(Default)]
pub struct InstanceDict {
    entries: RwLock<HashMap<String, Object>>,
}

impl InstanceDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        self.entries.read().get(name).cloned()
    }

    /// Store `value`, returning whatever was bound before.
    pub fn insert(&self, name: impl Into<String>, value: Object) -> Option<Object> {
        self.entries.write().insert(name.into(), value)
    }

    pub fn remove(&self, name: &str) -> Option<Object> {
        self.entries.write().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Attribute names, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl fmt::Debug for InstanceDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

impl NativeClass for InstanceDict {
    fn native_class() -> &'static HostClass {
        static DICT: OnceLock<HostClass> = OnceLock::new();
        DICT.get_or_init(|| HostClass::builder("dict").build())
    }
}

impl HostObject for InstanceDict {
    fn host_class(&self) -> &HostClass {
        Self::native_class()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
