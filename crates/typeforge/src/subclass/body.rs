// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class bodies: the definition a synthesized class is loaded from.

use std::fmt;

use crate::host::{class_assignment_interface, dict_assignment_interface, HostClass};
use crate::kernel::RepresentationSpec;

/// Field holding the current guest type.
pub const TYPE_FIELD: &str = "$type";

/// Field holding the instance dictionary.
pub const DICT_FIELD: &str = "$dict";

/// What a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The guest type (`GuestType`).
    Type,
    /// The instance dictionary (`InstanceDict`).
    Dict,
    /// Any object (a named slot).
    Slot,
}

impl FieldKind {
    fn descriptor(self) -> &'static str {
        match self {
            Self::Type => "GuestType",
            Self::Dict => "InstanceDict",
            Self::Slot => "Object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Only reachable through accessor methods.
    pub private: bool,
}

/// Behaviour of a synthesized method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodRole {
    /// No-argument constructor.
    Init,
    /// Return the field.
    Get,
    /// Call the check method, then store into the field.
    Set,
    /// Validation hook called by the setter.
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: &'static str,
    pub role: MethodRole,
    /// Field the accessor reads or writes (`None` for the constructor).
    pub field: Option<String>,
    /// For a setter, the check method it calls first.
    pub check: Option<&'static str>,
}

/// Names of one get/set/check accessor triple.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Accessors {
    pub get: &'static str,
    pub set: &'static str,
    pub check: &'static str,
}

pub(crate) const TYPE_ACCESSORS: Accessors = Accessors {
    get: "get_type",
    set: "set_type",
    check: "check_class_assignment",
};

pub(crate) const DICT_ACCESSORS: Accessors = Accessors {
    get: "get_dict",
    set: "set_dict",
    check: "check_dict_assignment",
};

/// A loadable class definition.
#[derive(Debug, Clone)]
pub struct ClassBody {
    pub name: String,
    pub base: HostClass,
    pub interfaces: Vec<HostClass>,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<MethodDef>,
}

impl ClassBody {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Simple name, as used for a dump file.
    pub fn simple_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) => &self.name[dot + 1..],
            None => &self.name,
        }
    }
}

/// `javap`-like listing.
impl fmt::Display for ClassBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {} extends {}", self.name, self.base.name())?;
        if !self.interfaces.is_empty() {
            let names: Vec<&str> = self.interfaces.iter().map(HostClass::name).collect();
            write!(f, " implements {}", names.join(", "))?;
        }
        writeln!(f, " {{")?;
        for field in &self.fields {
            let access = if field.private { "private " } else { "" };
            writeln!(f, "  {}{} {};", access, field.kind.descriptor(), field.name)?;
        }
        for method in &self.methods {
            let descriptor = |name: &Option<String>| {
                name.as_ref()
                    .and_then(|n| self.field(n))
                    .map_or("Object", |fd| fd.kind.descriptor())
            };
            match method.role {
                MethodRole::Init => writeln!(f, "  public {}();", self.simple_name())?,
                MethodRole::Get => {
                    writeln!(f, "  public {} {}();", descriptor(&method.field), method.name)?
                }
                MethodRole::Set => writeln!(
                    f,
                    "  public void {}(Object);    // {} then store",
                    method.name,
                    method.check.unwrap_or("?")
                )?,
                MethodRole::Check => {
                    writeln!(f, "  public {} {}(Object);", descriptor(&method.field), method.name)?
                }
            }
        }
        write!(f, "}}")
    }
}

/// Assembles the body of a class realising a frozen specification.
pub(crate) struct SubclassBuilder<'a> {
    spec: &'a RepresentationSpec,
    body: ClassBody,
}

impl<'a> SubclassBuilder<'a> {
    pub fn new(name: String, spec: &'a RepresentationSpec) -> Self {
        Self {
            spec,
            body: ClassBody {
                name,
                base: spec.base().clone(),
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            },
        }
    }

    pub fn build(mut self) -> ClassBody {
        self.begin();
        self.add_constructor();
        self.add_get_set(TYPE_FIELD, FieldKind::Type, TYPE_ACCESSORS);
        if self.spec.has_dict() {
            self.add_get_set(DICT_FIELD, FieldKind::Dict, DICT_ACCESSORS);
        }
        for slot in self.spec.slots() {
            self.add_object_attr(slot);
        }
        self.body
    }

    fn begin(&mut self) {
        self.body.interfaces = self.spec.interfaces().to_vec();
        self.add_interface(class_assignment_interface());
        if self.spec.has_dict() {
            self.add_interface(dict_assignment_interface());
        }
    }

    fn add_interface(&mut self, iface: &HostClass) {
        if !self.body.interfaces.contains(iface) {
            self.body.interfaces.push(iface.clone());
        }
    }

    fn add_constructor(&mut self) {
        self.body.methods.push(MethodDef {
            name: "<init>",
            role: MethodRole::Init,
            field: None,
            check: None,
        });
    }

    fn add_get_set(&mut self, field: &str, kind: FieldKind, names: Accessors) {
        self.body.fields.push(FieldDef {
            name: field.to_string(),
            kind,
            private: true,
        });
        let accessor = |name, role, check| MethodDef {
            name,
            role,
            field: Some(field.to_string()),
            check,
        };
        self.body.methods.push(accessor(names.get, MethodRole::Get, None));
        self.body
            .methods
            .push(accessor(names.set, MethodRole::Set, Some(names.check)));
        self.body.methods.push(accessor(names.check, MethodRole::Check, None));
    }

    fn add_object_attr(&mut self, name: &str) {
        self.body.fields.push(FieldDef {
            name: name.to_string(),
            kind: FieldKind::Slot,
            private: false,
        });
    }
}
