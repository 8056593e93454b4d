// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::error::ClashMode;
use crate::host::{dict_assignment_interface, InstanceDict, NativeClass};

fn factory() -> Arc<TypeFactory> {
    TypeFactory::new(KernelConfig::default()).unwrap()
}

#[test]
fn test_bootstrap_types() {
    let f = factory();
    let obj = f.registry().get(HostClass::object()).unwrap();
    assert!(Arc::ptr_eq(obj.fixed_type().unwrap(), f.object_type()));
    let ty = f.registry().guest_type_of(f.object_type().as_ref()).unwrap();
    assert!(Arc::ptr_eq(&ty, f.type_type()));
    assert!(f.type_type().is_subtype_of(f.object_type()));
}

#[test]
fn test_from_spec_simple_defaults_to_object_base() {
    let f = factory();
    let c = HostClass::builder("demo.Simple").build();
    let t = f.from_spec(TypeSpec::new("simple", &c)).unwrap();
    assert_eq!(t.bases().len(), 1);
    assert!(t.is_subtype_of(f.object_type()));
    assert_eq!(f.registry().lookup(&c), Some(Representation::Canonical(t)));
}

#[test]
fn test_from_spec_publishes_adopted() {
    let f = factory();
    let p = HostClass::builder("demo.Int").build();
    let t = f
        .from_spec(TypeSpec::new("int", &p).adopt(i64::native_class()).accept(bool::native_class()))
        .unwrap();
    let rep = f.registry().lookup(i64::native_class()).unwrap();
    assert_eq!(rep.index(), 1);
    assert!(rep.is_int_exact());
    assert!(f.registry().lookup(bool::native_class()).is_none());
    assert_eq!(t.representations().len(), 3);
}

#[test]
fn test_second_binding_clashes_with_context() {
    let f = factory();
    let p = HostClass::builder("demo.P").build();
    f.from_spec(TypeSpec::new("first", &p)).unwrap();
    match f.from_spec(TypeSpec::new("second", &p)) {
        Err(Error::Clash(clash)) => {
            assert_eq!(clash.mode, ClashMode::Existing);
            assert_eq!(clash.context.as_deref(), Some("second"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_repeated_class_in_spec() {
    let f = factory();
    let p = HostClass::builder("demo.P").build();
    let a = HostClass::builder("demo.A").build();
    let err = f
        .from_spec(TypeSpec::new("t", &p).adopt(&a).accept(&a))
        .unwrap_err();
    assert!(matches!(err, Error::Spec(SpecError::Repeat { op: "accept", .. })));
    // nothing from the failed spec was published
    assert!(f.registry().lookup(&a).is_none());
    assert!(f.registry().lookup(&p).is_none());
}

#[test]
fn test_replaceable_reuses_shared() {
    let f = factory();
    let layout = HostClass::builder("demo.Layout")
        .implements(class_assignment_interface())
        .build();
    let spec = |name: &str| TypeSpec::new(name, &layout).flag(TypeFlags::REPLACEABLE);
    let a = f.from_spec(spec("A")).unwrap();
    let b = f.from_spec(spec("B")).unwrap();
    assert!(a.has_same_layout(&b));
    assert!(f.registry().lookup(&layout).unwrap().is_shared());
}

#[test]
fn test_replaceable_over_canonical_not_sharable() {
    let f = factory();
    let c = HostClass::builder("demo.Fixed").build();
    f.from_spec(TypeSpec::new("fixed", &c)).unwrap();
    match f.from_spec(TypeSpec::new("r", &c).flag(TypeFlags::REPLACEABLE)) {
        Err(Error::Clash(clash)) => assert_eq!(clash.mode, ClashMode::NotSharable),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_escalation_creates_simple_type_for_found_class() {
    let f = factory();
    let found = HostClass::builder("demo.Found").build();
    let rep = f.registry().get(&found).unwrap();
    let t = rep.fixed_type().unwrap();
    assert_eq!(t.name(), "demo.Found");
    assert_eq!(f.registry().stats().escalations, 1);
    assert_eq!(f.registry().get(&found).unwrap(), rep);
}

#[test]
fn test_escalation_interface_is_internal_fault() {
    let f = factory();
    let err = f.registry().get(dict_assignment_interface()).unwrap_err();
    assert!(err.is_internal());
}

#[test]
fn test_crafted_subclass_inherits_representation() {
    let f = factory();
    let base = HostClass::builder("demo.Base")
        .implements(class_assignment_interface())
        .build();
    f.from_spec(TypeSpec::new("base", &base).flag(TypeFlags::REPLACEABLE))
        .unwrap();
    let sub = HostClass::builder("demo.Sub").extends(&base).build();
    let rep = f.registry().get(&sub).unwrap();
    assert_eq!(rep, f.registry().lookup(&base).unwrap());
}

#[test]
fn test_reentrant_from_spec_in_initializer() {
    let f = factory();
    let weak = Arc::downgrade(&f);
    let inner = HostClass::builder("demo.Inner")
        .initializer(move |c| {
            let f = weak.upgrade().ok_or_else(|| Error::internal("factory gone"))?;
            f.from_spec(TypeSpec::new("inner", c))?;
            Ok(())
        })
        .build();
    let rep = f.registry().get(&inner).unwrap();
    assert_eq!(rep.fixed_type().unwrap().name(), "inner");
    assert_eq!(f.registry().stats().escalations, 0);
}

#[test]
fn test_direct_escalation_initialises_before_locking() {
    let f = factory();
    let weak = Arc::downgrade(&f);
    let other = HostClass::builder("demo.Other").build();
    let o = other.clone();
    // the initializer waits on a thread that needs the factory lock
    let cold = HostClass::builder("demo.Cold")
        .initializer(move |_| {
            let f = weak.upgrade().ok_or_else(|| Error::internal("factory gone"))?;
            let o = o.clone();
            std::thread::spawn(move || f.from_spec(TypeSpec::new("other", &o)).map(|_| ()))
                .join()
                .map_err(|_| Error::internal("worker panicked"))?
        })
        .build();

    let rep = f.find_or_create(&cold).unwrap();
    assert_eq!(rep.fixed_type().unwrap().name(), "demo.Cold");
    assert!(cold.is_initialised());
    assert_eq!(
        f.registry().lookup(&other).and_then(|r| r.fixed_type().map(|t| t.name().to_string())),
        Some("other".to_string())
    );
}

#[test]
fn test_define_class_shares_equal_layouts() {
    let f = factory();
    let a = f.define_class("A", &[], None, false).unwrap();
    let b = f.define_class("B", &[], None, false).unwrap();
    let c = f.define_class("C", &[], Some(&["x"][..]), false).unwrap();
    assert!(a.has_same_layout(&b));
    assert!(!a.has_same_layout(&c));
    assert_eq!(f.layout_count(), 2);
    assert!(a.is_replaceable() && !a.is_mutable());
    assert!(a.primary_class().is_synthesized());
}

#[test]
fn test_define_class_inherits_slots() {
    let f = factory();
    let point = f.define_class("Point", &[], Some(&["x", "y"][..]), false).unwrap();
    let point3 = f.define_class("Point3", &[point.clone()], Some(&["z"][..]), false).unwrap();
    let layout = point3.primary_class().layout().unwrap();
    assert_eq!(layout.slot_names(), &["x".to_string(), "y".to_string(), "z".to_string()]);
    assert!(!layout.has_dict());
    assert!(point3.is_subtype_of(&point));

    let open = f.define_class("Open", &[point], None, false).unwrap();
    assert!(open.primary_class().layout().unwrap().has_dict());
}

#[test]
fn test_define_class_layout_conflict() {
    let f = factory();
    let c1 = HostClass::builder("demo.One").build();
    let c2 = HostClass::builder("demo.Two").build();
    let t1 = f.from_spec(TypeSpec::new("one", &c1)).unwrap();
    let t2 = f.from_spec(TypeSpec::new("two", &c2)).unwrap();
    let err = f.define_class("Both", &[t1, t2], None, false).unwrap_err();
    assert!(matches!(err, Error::LayoutConflict { .. }));
}

#[test]
fn test_new_instance_and_class_assignment() {
    let f = factory();
    let a = f.define_class("A", &[], None, false).unwrap();
    let b = f.define_class("B", &[], None, false).unwrap();
    let slotted = f.define_class("S", &[], Some(&["v"][..]), false).unwrap();

    let obj = f.new_instance(&a).unwrap();
    assert!(Arc::ptr_eq(&f.registry().guest_type_of(obj.as_ref()).unwrap(), &a));

    let wc = obj.as_with_class().unwrap();
    wc.set_type(b.clone()).unwrap();
    assert!(Arc::ptr_eq(&f.registry().guest_type_of(obj.as_ref()).unwrap(), &b));

    match wc.set_type(slotted) {
        Err(Error::ClassAssignment { from, to }) => {
            assert_eq!(from, "B");
            assert_eq!(to, "S");
        }
        other => panic!("unexpected {:?}", other),
    }

    let wd = obj.as_with_dict().unwrap();
    assert!(wd.set_dict(Arc::new(3i32)).is_err());
    wd.set_dict(Arc::new(InstanceDict::new())).unwrap();
}

#[test]
fn test_new_instance_not_yet_supported() {
    let f = factory();
    let err = f.new_instance(f.object_type()).unwrap_err();
    assert!(matches!(err, Error::NotYetSupported(_)));
}
