// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Turning class bodies into host classes.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashSet;

use super::body::{ClassBody, FieldKind, MethodRole, DICT_FIELD, TYPE_FIELD};
use crate::error::{Error, Result};
use crate::host::HostClass;

/// Field offset table of a synthesized class.
///
/// Offset 0 is the type field; the dictionary, if any, follows; then the
/// slots in sorted name order. Slot indices count from the first slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    dict_offset: Option<usize>,
    slots: Vec<String>,
}

impl Layout {
    pub const TYPE_OFFSET: usize = 0;

    fn new(has_dict: bool, mut slots: Vec<String>) -> Self {
        slots.sort();
        Self {
            dict_offset: has_dict.then_some(1),
            slots,
        }
    }

    pub fn has_dict(&self) -> bool {
        self.dict_offset.is_some()
    }

    pub fn dict_offset(&self) -> Option<usize> {
        self.dict_offset
    }

    /// Slot names in index order.
    pub fn slot_names(&self) -> &[String] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots
            .binary_search_by(|s| s.as_str().cmp(name))
            .ok()
    }

    fn first_slot_offset(&self) -> usize {
        Self::TYPE_OFFSET + 1 + usize::from(self.has_dict())
    }

    /// Offset of a named slot within the whole object.
    pub fn slot_offset(&self, name: &str) -> Option<usize> {
        self.slot_index(name).map(|i| self.first_slot_offset() + i)
    }

    /// Total number of fields.
    pub fn field_count(&self) -> usize {
        self.first_slot_offset() + self.slots.len()
    }
}

/// Defines classes from bodies, once per name.
#[derive(Default)]
pub struct SubclassLoader {
    defined: DashSet<String>,
}

impl SubclassLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify `body` and define the class it describes.
    ///
    /// A body that fails verification means the synthesizer is broken:
    /// every failure is an internal fault.
    pub fn define_class(&self, body: &ClassBody) -> Result<HostClass> {
        let layout = verify(body).map_err(|e| Error::internal(format!("class {}: {}", body.name, e)))?;
        if !self.defined.insert(body.name.clone()) {
            return Err(Error::internal(format!("duplicate class definition {}", body.name)));
        }

        let mut builder = HostClass::builder(body.name.clone())
            .extends(&body.base)
            .layout(Arc::new(layout));
        for iface in &body.interfaces {
            builder = builder.implements(iface);
        }
        Ok(builder.build())
    }

    /// Number of classes defined.
    pub fn len(&self) -> usize {
        self.defined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defined.is_empty()
    }
}

fn verify(body: &ClassBody) -> core::result::Result<Layout, String> {
    if body.base.is_interface() {
        return Err(format!("base {} is an interface", body.base.name()));
    }
    if let Some(iface) = body.interfaces.iter().find(|i| !i.is_interface()) {
        return Err(format!("{} is not an interface", iface.name()));
    }

    let mut names = HashSet::new();
    for field in &body.fields {
        if !names.insert(field.name.as_str()) {
            return Err(format!("duplicate field {}", field.name));
        }
    }

    for method in &body.methods {
        match (&method.role, &method.field) {
            (MethodRole::Init, None) => {}
            (MethodRole::Init, Some(_)) => return Err("constructor bound to a field".into()),
            (_, None) => return Err(format!("accessor {} has no field", method.name)),
            (_, Some(field)) => {
                if body.field(field).is_none() {
                    return Err(format!("accessor {} refers to missing field {}", method.name, field));
                }
            }
        }
        if method.role == MethodRole::Set {
            let check = method
                .check
                .and_then(|c| body.method(c))
                .filter(|c| c.role == MethodRole::Check && c.field == method.field);
            if check.is_none() {
                return Err(format!("setter {} has no matching check", method.name));
            }
        }
    }

    match body.field(TYPE_FIELD) {
        Some(f) if f.kind == FieldKind::Type => {}
        _ => return Err(format!("no {} field", TYPE_FIELD)),
    }
    let has_dict = match body.field(DICT_FIELD) {
        None => false,
        Some(f) if f.kind == FieldKind::Dict => true,
        Some(_) => return Err(format!("{} is not a dictionary field", DICT_FIELD)),
    };
    let slots = body
        .fields
        .iter()
        .filter(|f| f.kind == FieldKind::Slot)
        .map(|f| f.name.clone())
        .collect();
    Ok(Layout::new(has_dict, slots))
}
