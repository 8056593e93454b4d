// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic

//! Guest type determination through each kind of representation.

use std::any::Any;
use std::sync::Arc;

use typeforge::{
    class_assignment_interface, DerivedObject, Error, HostClass, HostObject, InstanceDict,
    KernelConfig, NativeClass, Object, TypeFactory, TypeFlags, TypeSpec,
};

fn factory() -> Arc<TypeFactory> {
    TypeFactory::new(KernelConfig::default()).expect("factory")
}

/// An instance of some class that claims none of the capabilities.
struct Bare(HostClass);

impl HostObject for Bare {
    fn host_class(&self) -> &HostClass {
        &self.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_number_type_over_adopted_classes() {
    let f = factory();
    let p = HostClass::builder("demo.Number").build();
    let l = i64::native_class();
    let fl = f64::native_class();
    let number = f
        .from_spec(TypeSpec::new("number", &p).adopt(l).adopt(fl))
        .unwrap();

    let rep_p = f.registry().get(&p).unwrap();
    let rep_l = f.registry().get(l).unwrap();
    let rep_f = f.registry().get(fl).unwrap();
    for rep in [&rep_p, &rep_l, &rep_f] {
        assert!(Arc::ptr_eq(rep.fixed_type().unwrap(), &number));
    }

    assert!(rep_l.is_int_exact() && !rep_l.is_float_exact());
    assert!(rep_f.is_float_exact() && !rep_f.is_int_exact());
    assert!(!rep_p.is_int_exact() && !rep_p.is_float_exact());
    assert_eq!([rep_p.index(), rep_l.index(), rep_f.index()], [0, 1, 2]);

    let values: [Object; 3] = [Arc::new(Bare(p.clone())), Arc::new(7i64), Arc::new(0.5f64)];
    for v in &values {
        let ty = f.registry().guest_type_of(v.as_ref()).unwrap();
        assert!(Arc::ptr_eq(&ty, &number), "{:?}", v);
    }
    assert_eq!(number.adopted_count(), 2);
    assert_eq!(number.self_classes().len(), 3);
}

#[test]
fn test_accepted_class_is_not_published() {
    let f = factory();
    let p = HostClass::builder("demo.Wide").build();
    let ty = f
        .from_spec(TypeSpec::new("wide", &p).adopt(i64::native_class()).accept(i32::native_class()))
        .unwrap();
    assert_eq!(ty.accepted_count(), 1);
    assert_eq!(ty.index_of(i32::native_class()), Some(2));
    assert!(f.registry().lookup(i32::native_class()).is_none());

    // Found on first use instead, as a type of its own.
    let found = f.registry().get(i32::native_class()).unwrap();
    assert_eq!(found.fixed_type().unwrap().name(), "i32");
}

#[test]
fn test_accepted_native_class_is_not_exact() {
    let f = factory();
    let p = HostClass::builder("demo.Float").build();
    let float = f
        .from_spec(TypeSpec::new("float", &p).adopt(f64::native_class()).accept(i64::native_class()))
        .unwrap();

    let reps = float.representations();
    assert_eq!(reps.len(), 3);
    assert!(reps[1].is_float_exact());
    assert_eq!(reps[2].index(), 2);
    assert!(!reps[2].is_int_exact() && !reps[2].is_float_exact());
    assert!(reps[2].as_adopted().unwrap().is_accepted());
    assert!(!reps[1].as_adopted().unwrap().is_accepted());
}

#[test]
fn test_shared_class_without_type_capability_is_a_fault() {
    let f = factory();
    let layout = HostClass::builder("demo.SharedLayout")
        .implements(class_assignment_interface())
        .build();
    f.from_spec(TypeSpec::new("Shared", &layout).flag(TypeFlags::REPLACEABLE))
        .unwrap();

    let bare = Bare(layout);
    let err = f.registry().guest_type_of(&bare).unwrap_err();
    assert!(err.is_internal(), "{}", err);
    assert!(matches!(err, Error::Interpreter(_)));
}

#[test]
fn test_defined_classes_share_layout_and_swap_types() {
    let f = factory();
    let a = f.define_class("A", &[], Some(&["x", "y"][..]), false).unwrap();
    let b = f.define_class("B", &[], Some(&["y", "x"][..]), false).unwrap();
    assert_eq!(a.primary_class(), b.primary_class());
    assert_eq!(f.layout_count(), 1);

    let obj = f.new_instance(&a).unwrap();
    let derived = obj.as_any().downcast_ref::<DerivedObject>().unwrap();
    assert!(derived.slot("x").unwrap().is_none());
    derived.set_slot("x", Arc::new(1i64)).unwrap();
    let x = derived.slot("x").unwrap().unwrap();
    assert_eq!(x.as_any().downcast_ref::<i64>(), Some(&1));
    assert!(derived.slot("z").is_err());
    assert!(derived.dict().is_none());

    obj.as_with_class().unwrap().set_type(b.clone()).unwrap();
    assert!(Arc::ptr_eq(&f.registry().guest_type_of(obj.as_ref()).unwrap(), &b));
    assert!(derived.delete_slot("x").unwrap().is_some());
}

#[test]
fn test_instance_dict_swap() {
    let f = factory();
    let open = f.define_class("Open", &[], None, false).unwrap();
    let obj = f.new_instance(&open).unwrap();
    let with_dict = obj.as_with_dict().unwrap();

    let replacement = Arc::new(InstanceDict::new());
    replacement.insert("answer", Arc::new(42i32));
    with_dict.set_dict(replacement).unwrap();
    let dict = with_dict.get_dict();
    let dict = dict.as_any().downcast_ref::<InstanceDict>().unwrap();
    assert!(dict.contains("answer"));

    let err = with_dict.set_dict(Arc::new(String::from("nope"))).unwrap_err();
    assert!(matches!(err, Error::DictAssignment(_)));
}
