// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Place, Registration};
use crate::cache::{self, HandlerCache};
use crate::config::ELEMENT_NAME;
use crate::contract::{
    Context, Inspector, NullableSlot, ObjectKind, ObjectSlot, ScalarMut, ScalarValue, TypedSlot,
};
use crate::error::{Error, Result};
use crate::memory::{from_value, Value};
use crate::shape::{RecordShape, TypeShape};
use crate::Inspect;

/// Encode-only backend that logs one line per contract call.
#[derive(Default)]
struct Trace {
    calls: Vec<String>,
    context: Context,
}

impl Inspector for Trace {
    fn field(&mut self, name: &str, value: ScalarMut<'_>) -> Result<()> {
        self.calls.push(format!("field {name}={:?}", value.get()));
        Ok(())
    }

    fn nullable_field(&mut self, name: &str, slot: &mut dyn NullableSlot) -> Result<()> {
        if slot.is_present() {
            slot.value(self)
        } else {
            self.calls.push(format!("null {name}"));
            Ok(())
        }
    }

    fn object_field(&mut self, name: &str, slot: &mut dyn ObjectSlot) -> Result<()> {
        self.calls.push(format!("open {name}:{}", slot.names().short));
        let version = slot.latest_version();
        slot.describe(self, version)?;
        self.calls.push(format!("close {name}"));
        Ok(())
    }

    fn typed_field(&mut self, name: &str, slot: &mut dyn TypedSlot) -> Result<()> {
        let version = slot.latest_version()?;
        self.calls.push(format!("typed {name}"));
        slot.describe(self, version)
    }

    fn begin_array(&mut self, lengths: &mut [usize]) -> Result<()> {
        self.calls.push(format!("array {lengths:?}"));
        Ok(())
    }

    fn enter_array_level(&mut self, rank: usize) -> Result<()> {
        self.calls.push(format!("enter {rank}"));
        Ok(())
    }

    fn leave_array_level(&mut self, rank: usize) -> Result<()> {
        self.calls.push(format!("leave {rank}"));
        Ok(())
    }

    fn byte_array(&mut self, name: &str, bytes: &mut Vec<u8>) -> Result<()> {
        self.calls.push(format!("bytes {name}={bytes:?}"));
        Ok(())
    }

    fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}

fn trace<T: Inspect>(value: &mut T) -> Vec<String> {
    let mut trace = Trace::default();
    let handler = cache::handler::<T>().expect("handler");
    handler
        .describe(value, &mut trace, handler.latest_version())
        .expect("describe");
    trace.calls
}

#[derive(Inspect, Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Inspect, Debug, PartialEq)]
struct Stamped {
    #[inspect(readonly)]
    created: u64,
    seq: u32,
}

#[derive(Inspect, Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
enum Mode {
    Idle = 1,
    Busy = 4,
}

#[test]
fn test_structural_record_registers_fields_in_order() {
    let calls = trace(&mut Point { x: 3, y: 4 });
    assert_eq!(calls, vec!["field x=I32(3)", "field y=I32(4)"]);
}

#[test]
fn test_readonly_field_is_not_registered() {
    let calls = trace(&mut Stamped { created: 99, seq: 7 });
    assert_eq!(calls, vec!["field seq=U32(7)"]);
}

#[test]
fn test_readonly_field_defaults_on_assembly() {
    let tree = Value::Object {
        type_name: "Stamped".into(),
        version: 1,
        members: vec![("seq".into(), Value::Scalar(ScalarValue::U32(5)))],
    };
    let stamped: Stamped = from_value(&tree).expect("assemble");
    assert_eq!(stamped, Stamped { created: 0, seq: 5 });
}

#[test]
fn test_scalar_describes_as_single_element_field() {
    let calls = trace(&mut 12u8);
    assert_eq!(calls, vec![format!("field {ELEMENT_NAME}=U8(12)")]);
}

#[test]
fn test_enum_registers_as_repr() {
    let handler = cache::handler::<Mode>().expect("enum handler");
    assert_eq!(handler.registration(), Registration::Scalar(crate::ScalarKind::U8));
    let calls = trace(&mut Mode::Busy);
    assert_eq!(calls, vec!["field =U8(4)"]);
}

#[test]
fn test_enum_rejects_unknown_discriminant() {
    let err = from_value::<Mode>(&Value::Scalar(ScalarValue::U8(2))).expect_err("2 is not a Mode");
    assert!(matches!(err, Error::InvalidDiscriminant { value: 2, .. }));
    let idle = from_value::<Mode>(&Value::Scalar(ScalarValue::U8(1))).expect("1 is Idle");
    assert_eq!(idle, Mode::Idle);
}

#[test]
fn test_wide_unsigned_enum_round_trips_at_i64_max() {
    #[derive(Inspect, Debug, Clone, Copy, PartialEq)]
    #[repr(u64)]
    enum Wide {
        Low = 0,
        Top = 9_223_372_036_854_775_807,
    }

    let mut top = Wide::Top;
    let tree = crate::memory::to_value(&mut top).expect("describe");
    assert_eq!(tree, Value::Scalar(ScalarValue::U64(i64::MAX as u64)));
    assert_eq!(from_value::<Wide>(&tree).expect("create"), Wide::Top);
    assert_eq!(
        from_value::<Wide>(&Value::Scalar(ScalarValue::U64(0))).expect("create"),
        Wide::Low
    );
}

#[test]
fn test_nested_array_brackets_every_level() {
    let mut grid = crate::NdArray::from_fn([2, 2], |[r, c]| (r * 2 + c) as u16);
    let calls = trace(&mut grid);
    assert_eq!(
        calls,
        vec![
            "array [2, 2]",
            "enter 0",
            "enter 1",
            "field =U16(0)",
            "field =U16(1)",
            "leave 1",
            "enter 1",
            "field =U16(2)",
            "field =U16(3)",
            "leave 1",
            "leave 0",
        ]
    );
}

#[test]
fn test_byte_containers_take_bulk_path() {
    assert_eq!(trace(&mut vec![1u8, 2]), vec!["bytes =[1, 2]"]);
    assert_eq!(trace(&mut [7u8; 2]), vec!["bytes =[7, 7]"]);
    let handler = cache::handler::<Box<[u8]>>().expect("boxed bytes");
    assert_eq!(handler.registration(), Registration::Bytes);
}

#[test]
fn test_nested_record_goes_through_object_slot() {
    #[derive(Inspect)]
    struct Segment {
        from: Point,
        to: Option<Point>,
    }

    let calls = trace(&mut Segment {
        from: Point { x: 0, y: 1 },
        to: None,
    });
    assert_eq!(
        calls,
        vec!["open from:Point", "field x=I32(0)", "field y=I32(1)", "close from", "null to"]
    );
}

#[test]
fn test_collection_registration_is_reference() {
    let handler = cache::handler::<Vec<Point>>().expect("vec handler");
    assert_eq!(
        handler.registration(),
        Registration::Object {
            kind: ObjectKind::Collection,
            reference: true
        }
    );
    let fixed = cache::handler::<[Point; 2]>().expect("array handler");
    assert_eq!(
        fixed.registration(),
        Registration::Object {
            kind: ObjectKind::Array,
            reference: false
        }
    );
}

#[test]
fn test_self_describe_claim_without_method_is_shape_error() {
    struct Broken;
    impl Inspect for Broken {
        fn shape() -> TypeShape<Self> {
            TypeShape::Record(RecordShape::<Self>::new().self_describing(1))
        }
    }

    let err = HandlerCache::new().handler::<Broken>().expect_err("no describe method");
    assert!(matches!(err, Error::Shape { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_broken_member_fails_the_parent_build() {
    struct Broken;
    impl Inspect for Broken {
        fn shape() -> TypeShape<Self> {
            TypeShape::Record(RecordShape::<Self>::new().self_describing(1))
        }
    }

    #[derive(Inspect)]
    struct Holder {
        inner: Broken,
    }

    #[derive(Inspect)]
    struct Many {
        items: Vec<Option<Broken>>,
    }

    let cache = HandlerCache::new();
    let err = cache.handler::<Holder>().expect_err("member shape is broken");
    assert!(matches!(err, Error::Shape { .. }));
    assert!(!cache.contains::<Holder>());

    // Nested wrappers surface the same error.
    let err = cache.handler::<Many>().expect_err("element shape is broken");
    assert!(matches!(err, Error::Shape { .. }));
    assert!(!cache.contains::<Many>());
}

#[test]
fn test_newer_version_requires_legacy_method() {
    struct Unversioned;
    impl Inspect for Unversioned {
        fn shape() -> TypeShape<Self> {
            TypeShape::Record(
                RecordShape::<Self>::new()
                    .self_describing(3)
                    .describe_with(|_value: &mut Unversioned, _inspector: &mut dyn Inspector| Ok(())),
            )
        }
    }

    let err = cache::handler::<Unversioned>().expect_err("v3 without legacy");
    match err {
        Error::Shape { reason, .. } => assert!(reason.contains("legacy")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_record_without_constructor_is_not_constructible() {
    #[derive(Inspect, Debug)]
    #[inspect(describe = "Self::walk")]
    struct Opaque {
        level: u8,
    }
    impl Opaque {
        fn walk(&mut self, inspector: &mut dyn Inspector) -> Result<()> {
            inspector.member("level", &mut self.level)
        }
    }

    let handler = cache::handler::<Opaque>().expect("self-describing handler");
    assert!(!handler.has_create());
    assert!(handler.is_self_describing());
    assert_eq!(handler.latest_version(), 1);
    let err = handler
        .create(&mut Trace::default(), 1)
        .expect_err("nothing can build Opaque");
    assert!(matches!(err, Error::NotConstructible { .. }));
}

#[test]
fn test_construct_latest_wins_over_construct() {
    struct Both(bool);
    impl Inspect for Both {
        fn shape() -> TypeShape<Self> {
            TypeShape::Record(
                RecordShape::<Self>::new()
                    .construct_with(|_inspector: &mut dyn Inspector, _version: u32| Ok(Both(false)))
                    .construct_latest_with(
                        |_inspector: &mut dyn Inspector, _version: u32, latest: bool| Ok(Both(latest)),
                    ),
            )
        }
    }

    let handler = cache::handler::<Both>().expect("handler");
    let built = handler.create(&mut Trace::default(), 1).expect("create");
    assert!(built.0, "3-arg constructor should run with latest=true");
}

#[test]
fn test_default_hook_runs_before_describe() {
    #[derive(Default)]
    struct Counter {
        hooked: bool,
        hits: u32,
    }
    impl Inspect for Counter {
        fn shape() -> TypeShape<Self> {
            TypeShape::Record(
                RecordShape::<Self>::new()
                    .field::<u32>("hits", |c: &mut Counter| &mut c.hits)
                    .default_with(Counter::default)
                    .after_construct(|c: &mut Counter| c.hooked = true),
            )
        }
    }

    let tree = Value::Object {
        type_name: "Counter".into(),
        version: 1,
        members: vec![("hits".into(), Value::Scalar(ScalarValue::U32(3)))],
    };
    let counter: Counter = from_value(&tree).expect("default + describe");
    assert!(counter.hooked);
    assert_eq!(counter.hits, 3);
}

#[test]
fn test_type_index_follows_creation_order() {
    #[derive(Inspect)]
    struct First(u8);
    #[derive(Inspect)]
    struct Second(u8);

    let first = cache::handler::<First>().expect("first");
    let second = cache::handler::<Second>().expect("second");
    assert!(first.type_index() >= 1);
    assert!(second.type_index() > first.type_index());
    assert_eq!(
        cache::handler::<First>().expect("cached").type_index(),
        first.type_index()
    );
}

#[test]
fn test_place_put_fills_vacant_cell() {
    let mut cell: Option<u8> = None;
    let mut place = Place::Vacant(&mut cell);
    assert!(!place.is_present());
    place.put(4);
    assert_eq!(place.get(), Some(&4));
    assert_eq!(cell, Some(4));

    let mut value = 1u8;
    let place = Place::Occupied(&mut value);
    *place.or_insert_with(|| 9) += 1;
    assert_eq!(value, 2);
}

#[test]
fn test_field_on_empty_cell_reports_unpopulated() {
    // A backend that accepts the call but never writes anything.
    struct Silent(Context);
    impl Inspector for Silent {
        fn field(&mut self, _: &str, _: ScalarMut<'_>) -> Result<()> {
            Ok(())
        }
        fn nullable_field(&mut self, _: &str, _: &mut dyn NullableSlot) -> Result<()> {
            Ok(())
        }
        fn object_field(&mut self, _: &str, _: &mut dyn ObjectSlot) -> Result<()> {
            Ok(())
        }
        fn typed_field(&mut self, _: &str, _: &mut dyn TypedSlot) -> Result<()> {
            Ok(())
        }
        fn begin_array(&mut self, _: &mut [usize]) -> Result<()> {
            Ok(())
        }
        fn enter_array_level(&mut self, _: usize) -> Result<()> {
            Ok(())
        }
        fn leave_array_level(&mut self, _: usize) -> Result<()> {
            Ok(())
        }
        fn byte_array(&mut self, _: &str, _: &mut Vec<u8>) -> Result<()> {
            Ok(())
        }
        fn context(&mut self) -> &mut Context {
            &mut self.0
        }
    }

    let handler = cache::handler::<Point>().expect("point");
    let err = handler
        .create_field(&mut Silent(Context::new()), "p")
        .expect_err("object slot left empty");
    assert_eq!(
        err,
        Error::Unpopulated {
            type_name: handler.names().full.clone(),
            member: "p".into()
        }
    );
}
