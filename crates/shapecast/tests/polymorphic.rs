// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Polymorphic member integration tests
//!
//! Validates runtime-type dispatch for `Box<dyn Trait>` members, subtype
//! registration for Create, and untyped object lists.

mod support;

use shapecast::{
    from_value, polymorphic, registered_subtypes, runtime_handler, subtypes, to_value, Error,
    Inspect, Object, ObjectList, Value,
};
use std::sync::Once;
use support::{describe, Call};

pub trait Shape: Object {
    fn area(&self) -> f64;
}
polymorphic!(dyn Shape);

#[derive(Inspect, Debug, Default, PartialEq)]
struct Circle {
    radius: f64,
}

impl Shape for Circle {
    fn area(&self) -> f64 {
        3.0 * self.radius * self.radius
    }
}

#[derive(Inspect, Debug, Default, PartialEq)]
struct Square {
    side: f64,
}

impl Shape for Square {
    fn area(&self) -> f64 {
        self.side * self.side
    }
}

/// Implements `Shape` but is never registered.
#[derive(Inspect, Debug, Default)]
struct Hexagon {
    side: f64,
}

impl Shape for Hexagon {
    fn area(&self) -> f64 {
        2.6 * self.side * self.side
    }
}

#[derive(Inspect)]
struct Scene {
    name: String,
    items: Vec<Box<dyn Shape>>,
    focus: Option<Box<dyn Shape>>,
}

fn register() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        subtypes!(dyn Shape => Circle, Square);
        subtypes!(dyn Object => Circle, u32, String);
    });
}

fn areas(items: &[Box<dyn Shape>]) -> Vec<f64> {
    items.iter().map(|item| item.area()).collect()
}

#[test]
fn test_runtime_handler_follows_concrete_type() {
    let circle: Box<dyn Shape> = Box::new(Circle { radius: 1.0 });
    let square: Box<dyn Shape> = Box::new(Square { side: 2.0 });
    let first = runtime_handler::<dyn Shape>(&*circle).expect("circle adapter");
    let second = runtime_handler::<dyn Shape>(&*square).expect("square adapter");
    assert_eq!(first.names().short, "Circle");
    assert_eq!(second.names().short, "Square");
    assert_eq!(first.declared_names().short, "dyn Shape");
    assert_ne!(first.type_index(), second.type_index());
}

#[test]
fn test_describe_needs_no_registration() {
    let mut item: Box<dyn Shape> = Box::new(Hexagon { side: 1.0 });
    let log = describe(&mut item);
    assert_eq!(
        log.calls,
        vec![Call::Field("side".into(), shapecast::ScalarValue::F64(1.0))]
    );
}

#[test]
fn test_scene_round_trip() {
    register();
    let mut scene = Scene {
        name: "demo".into(),
        items: vec![
            Box::new(Circle { radius: 1.0 }),
            Box::new(Square { side: 3.0 }),
        ],
        focus: Some(Box::new(Square { side: 0.5 })),
    };
    let tree = to_value(&mut scene).expect("describe");
    let back: Scene = from_value(&tree).expect("create");
    assert_eq!(back.name, "demo");
    assert_eq!(areas(&back.items), areas(&scene.items));
    let focus = back.focus.as_ref().expect("focus survives");
    assert_eq!(Object::type_names(&**focus).short, "Square");
    assert_eq!(focus.area(), 0.25);
}

#[test]
fn test_member_records_concrete_type() {
    let mut scene = Scene {
        name: String::new(),
        items: vec![Box::new(Circle { radius: 2.0 })],
        focus: None,
    };
    let log = describe(&mut scene);
    assert!(log.calls.contains(&Call::Typed {
        name: String::new(),
        type_name: "Circle".into(),
    }));
    assert!(log.calls.contains(&Call::Null("focus".into())));
}

#[test]
fn test_unregistered_subtype_cannot_be_created() {
    register();
    let mut scene = Scene {
        name: "x".into(),
        items: vec![Box::new(Hexagon { side: 1.0 })],
        focus: None,
    };
    let tree = to_value(&mut scene).expect("describe works without registration");
    let err = from_value::<Scene>(&tree)
        .err()
        .expect("Hexagon is not registered");
    assert!(matches!(err, Error::UnknownSubtype { .. }));
}

#[test]
fn test_untyped_object_list() {
    register();
    let mut list: ObjectList = vec![
        Box::new(7u32),
        Box::new(String::from("seven")),
        Box::new(Circle { radius: 7.0 }),
    ];
    let tree = to_value(&mut list).expect("describe");
    match &tree {
        Value::Array { items, .. } => assert!(matches!(items[0], Value::Typed { .. })),
        other => panic!("expected array, got {other:?}"),
    }
    let back: ObjectList = from_value(&tree).expect("create");
    assert_eq!(back.len(), 3);
    assert_eq!(Object::as_any(&*back[0]).downcast_ref::<u32>(), Some(&7));
    assert_eq!(
        Object::as_any(&*back[1]).downcast_ref::<String>().map(String::as_str),
        Some("seven")
    );
    assert_eq!(
        Object::as_any(&*back[2]).downcast_ref::<Circle>(),
        Some(&Circle { radius: 7.0 })
    );
}

#[test]
fn test_registered_names_are_listed() {
    register();
    let names = registered_subtypes::<dyn Shape>();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|name| name.ends_with("Circle")));
    assert!(names.iter().any(|name| name.ends_with("Square")));
}
