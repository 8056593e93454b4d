// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Instances of synthesized classes.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::loader::Layout;
use crate::error::{Error, Result};
use crate::host::{HostClass, HostObject, InstanceDict, Object, WithClassAssignment, WithDictAssignment};
use crate::kernel::GuestType;

/// The `$type` field and its accessors.
struct TypeField(RwLock<Arc<GuestType>>);

impl WithClassAssignment for TypeField {
    fn get_type(&self) -> Arc<GuestType> {
        self.0.read().clone()
    }

    fn set_type(&self, replacement: Arc<GuestType>) -> Result<()> {
        self.check_class_assignment(&replacement)?;
        *self.0.write() = replacement;
        Ok(())
    }
}

/// The `$dict` field and its accessors.
struct DictField(RwLock<Object>);

impl WithDictAssignment for DictField {
    fn get_dict(&self) -> Object {
        self.0.read().clone()
    }

    fn set_dict(&self, dict: Object) -> Result<()> {
        self.check_dict_assignment(&dict)?;
        *self.0.write() = dict;
        Ok(())
    }
}

/// An object whose fields are laid out by its class's [`Layout`].
pub struct DerivedObject {
    class: HostClass,
    layout: Arc<Layout>,
    ty: TypeField,
    dict: Option<DictField>,
    slots: RwLock<Box<[Option<Object>]>>,
}

impl DerivedObject {
    /// A new instance of the synthesized `class` with guest type `ty`.
    ///
    /// Slots start empty; the dictionary, if any, starts empty.
    pub fn new(class: &HostClass, ty: Arc<GuestType>) -> Result<Self> {
        let layout = class
            .layout()
            .cloned()
            .ok_or_else(|| Error::internal(format!("{} is not a synthesized class", class.name())))?;
        let dict = layout
            .has_dict()
            .then(|| DictField(RwLock::new(Arc::new(InstanceDict::new()) as Object)));
        let slots = vec![None; layout.slot_count()].into_boxed_slice();
        Ok(Self {
            class: class.clone(),
            layout,
            ty: TypeField(RwLock::new(ty)),
            dict,
            slots: RwLock::new(slots),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.layout.slot_index(name).ok_or_else(|| {
            Error::internal(format!("'{}' is not a slot of {}", name, self.class.name()))
        })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.layout.slot_count() {
            Ok(())
        } else {
            Err(Error::internal(format!(
                "slot index {} out of range for {}",
                index,
                self.class.name()
            )))
        }
    }

    /// Value of slot `index`, `None` if unset.
    pub fn slot_at(&self, index: usize) -> Result<Option<Object>> {
        self.check_index(index)?;
        Ok(self.slots.read()[index].clone())
    }

    /// Store into slot `index`, returning the previous value.
    pub fn set_slot_at(&self, index: usize, value: Option<Object>) -> Result<Option<Object>> {
        self.check_index(index)?;
        Ok(std::mem::replace(&mut self.slots.write()[index], value))
    }

    pub fn slot(&self, name: &str) -> Result<Option<Object>> {
        self.slot_at(self.index_of(name)?)
    }

    pub fn set_slot(&self, name: &str, value: Object) -> Result<Option<Object>> {
        self.set_slot_at(self.index_of(name)?, Some(value))
    }

    /// Clear a slot, returning what it held.
    pub fn delete_slot(&self, name: &str) -> Result<Option<Object>> {
        self.set_slot_at(self.index_of(name)?, None)
    }

    /// The instance dictionary, if the layout has one.
    pub fn dict(&self) -> Option<Object> {
        self.dict.as_ref().map(|d| d.get_dict())
    }
}

impl HostObject for DerivedObject {
    fn host_class(&self) -> &HostClass {
        &self.class
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_with_class(&self) -> Option<&dyn WithClassAssignment> {
        Some(&self.ty)
    }

    fn as_with_dict(&self) -> Option<&dyn WithDictAssignment> {
        self.dict.as_ref().map(|d| d as &dyn WithDictAssignment)
    }
}

impl WithClassAssignment for DerivedObject {
    fn get_type(&self) -> Arc<GuestType> {
        self.ty.get_type()
    }

    fn set_type(&self, replacement: Arc<GuestType>) -> Result<()> {
        self.ty.set_type(replacement)
    }
}

impl fmt::Debug for DerivedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedObject")
            .field("class", &self.class)
            .field("type", &self.ty.get_type().name())
            .field("slots", &self.layout.slot_names())
            .finish()
    }
}
