// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handler cache integration tests
//!
//! Validates idempotent lookups, concurrent first requests and recursive
//! types through the public API.

use shapecast::{from_value, handler, to_value, HandlerCache, Inspect};
use std::sync::{Arc, Barrier};
use std::thread;

#[derive(Inspect, Debug, PartialEq)]
struct Telemetry {
    node: String,
    samples: Vec<f32>,
}

#[derive(Inspect, Debug, PartialEq)]
struct Node {
    value: i32,
    next: Option<Box<Node>>,
}

#[derive(Inspect, Debug, PartialEq)]
struct Tree {
    label: String,
    children: Vec<Tree>,
}

#[test]
fn test_repeated_lookup_returns_same_handler() {
    let first = handler::<Telemetry>().expect("handler");
    let second = handler::<Telemetry>().expect("handler");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.type_index(), second.type_index());
}

#[test]
fn test_concurrent_first_requests_agree() {
    const THREADS: usize = 8;

    #[derive(Inspect)]
    struct RacedGlobal {
        id: u64,
    }

    let barrier = Arc::new(Barrier::new(THREADS));
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                handler::<RacedGlobal>().expect("handler")
            })
        })
        .collect();
    let handlers: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker panicked"))
        .collect();

    for other in &handlers[1..] {
        assert!(Arc::ptr_eq(&handlers[0], other));
    }
}

#[test]
fn test_race_statistics_on_private_cache() {
    const THREADS: usize = 6;

    #[derive(Inspect)]
    struct RacedLocal {
        a: u8,
        b: u8,
    }

    let cache = Arc::new(HandlerCache::new());
    let barrier = Arc::new(Barrier::new(THREADS));
    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                cache.handler::<RacedLocal>().expect("handler")
            })
        })
        .collect();
    let handlers: Vec<_> = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker panicked"))
        .collect();

    for other in &handlers[1..] {
        assert!(Arc::ptr_eq(&handlers[0], other));
    }
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, THREADS as u64);
    assert!(stats.misses >= 1);
    assert_eq!(stats.races_lost, stats.misses - 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_self_recursive_type() {
    let mut list = Node {
        value: 1,
        next: Some(Box::new(Node {
            value: 2,
            next: Some(Box::new(Node {
                value: 3,
                next: None,
            })),
        })),
    };
    let tree = to_value(&mut list).expect("describe");
    let back: Node = from_value(&tree).expect("create");
    assert_eq!(back, list);
}

#[test]
fn test_recursion_through_collection() {
    let mut tree = Tree {
        label: "root".into(),
        children: vec![
            Tree {
                label: "a".into(),
                children: Vec::new(),
            },
            Tree {
                label: "b".into(),
                children: vec![Tree {
                    label: "b1".into(),
                    children: Vec::new(),
                }],
            },
        ],
    };
    let value = to_value(&mut tree).expect("describe");
    let back: Tree = from_value(&value).expect("create");
    assert_eq!(back, tree);
}

#[test]
fn test_classifier_queries() {
    assert!(shapecast::is_nullable::<Option<Node>>());
    assert!(!shapecast::is_nullable::<Node>());
    assert!(!shapecast::is_self_describing::<Tree>());
    assert_eq!(shapecast::declared_version::<Tree>(), 0);
}
