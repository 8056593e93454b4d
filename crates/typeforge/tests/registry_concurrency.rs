// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::items_after_statements)] // Test helpers

//! Registry behaviour under concurrent first use.
//!
//! - every thread resolving an unknown class sees the same representation
//! - adopted classes resolve without escalating to the factory
//! - subclass names never collide across threads

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use typeforge::{
    HostClass, KernelConfig, Representation, RepresentationSpec, SubclassFactory, TypeFactory,
    TypeSpec,
};

const THREADS: usize = 8;

fn factory() -> Arc<TypeFactory> {
    TypeFactory::new(KernelConfig::default()).expect("factory")
}

/// Resolve `class` from every thread at once and collect the answers.
fn race(f: &Arc<TypeFactory>, class: &HostClass) -> Vec<Representation> {
    let barrier = Arc::new(Barrier::new(THREADS));
    let (tx, rx) = channel::unbounded();
    thread::scope(|s| {
        for _ in 0..THREADS {
            let barrier = barrier.clone();
            let tx = tx.clone();
            s.spawn(move || {
                barrier.wait();
                tx.send(f.registry().get(class)).expect("send");
            });
        }
    });
    drop(tx);
    rx.iter().map(|r| r.expect("representation")).collect()
}

#[test]
fn test_single_publish_for_found_class() {
    let f = factory();
    let class = HostClass::builder("race.Found").build();
    let reps = race(&f, &class);

    assert_eq!(reps.len(), THREADS);
    let first = &reps[0];
    assert!(reps.iter().all(|r| r == first));
    assert_eq!(f.registry().lookup(&class).as_ref(), Some(first));
    assert_eq!(first.index(), 0);
}

#[test]
fn test_single_publish_with_slow_initializer() {
    let f = factory();
    let class = HostClass::builder("race.Slow")
        .initializer(|_| {
            thread::sleep(Duration::from_millis(20));
            Ok(())
        })
        .build();
    let reps = race(&f, &class);

    let first = &reps[0];
    assert!(reps.iter().all(|r| r == first));
    let ty = first.fixed_type().expect("fixed type");
    assert_eq!(ty.name(), "race.Slow");
}

#[test]
fn test_single_publish_for_synthesized_layout() {
    let f = factory();
    let spec = RepresentationSpec::new("Racy", HostClass::object());
    spec.freeze();
    let class = f.subclass_factory().find_or_create_subclass(&spec).unwrap();
    assert!(f.registry().lookup(&class).is_none());

    let reps = race(&f, &class);
    assert!(reps.iter().all(Representation::is_shared));
    assert!(reps.iter().all(|r| r == &reps[0]));
}

#[test]
fn test_adopted_classes_resolve_without_escalation() {
    let f = factory();
    let p = HostClass::builder("adopt.P").build();
    let a = HostClass::builder("adopt.A").build();
    let b = HostClass::builder("adopt.B").build();
    let ty = f
        .from_spec(TypeSpec::new("adoptive", &p).adopt(&a).adopt(&b))
        .unwrap();

    for (class, index) in [(&a, 1), (&b, 2)] {
        let rep = f.registry().get(class).unwrap();
        assert_eq!(rep.index(), index);
        assert!(Arc::ptr_eq(rep.fixed_type().unwrap(), &ty));
    }
    let stats = f.registry().stats();
    assert_eq!(stats.escalations, 0);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.hits, 2);
}

#[test]
fn test_unique_names_across_threads() {
    const PER_THREAD: usize = 200;
    let subclasses = Arc::new(SubclassFactory::new(KernelConfig::default()).unwrap());
    let (tx, rx) = channel::unbounded();
    thread::scope(|s| {
        for _ in 0..THREADS {
            let subclasses = subclasses.clone();
            let tx = tx.clone();
            s.spawn(move || {
                for _ in 0..PER_THREAD {
                    tx.send(subclasses.unique_name("object")).expect("send");
                }
            });
        }
    });
    drop(tx);

    let names: Vec<String> = rx.iter().collect();
    let distinct: HashSet<&String> = names.iter().collect();
    assert_eq!(names.len(), THREADS * PER_THREAD);
    assert_eq!(distinct.len(), names.len());
}

#[test]
fn test_sequential_names_distinct() {
    let subclasses = SubclassFactory::new(KernelConfig::default()).unwrap();
    let names: HashSet<String> = (0..50).map(|_| subclasses.unique_name("float")).collect();
    assert_eq!(names.len(), 50);
    assert!(names.contains("Derived$float$1"));
    assert!(names.contains("Derived$float$50"));
}
