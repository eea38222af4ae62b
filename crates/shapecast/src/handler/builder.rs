// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handler synthesis.
//!
//! Called by the cache on a miss. Consumes `T::shape()` once, classifies it,
//! and composes the four operations. Shapes are matched in priority order:
//!
//! 1. self-describing record
//! 2. array (bulk byte path for rank-1 `u8`)
//! 3. enum
//! 4. collection
//! 5. structural record
//!
//! followed by the leaf and wrapper shapes (scalar, nullable, boxed,
//! polymorphic), which never overlap with the above.

use super::record;
use super::{
    element_create, element_describe, member_fn, prop_fn, Ops, Place, TypeHandler,
};
use crate::contract::{Inspector, ScalarKind, ScalarValue};
use crate::error::{Error, Result};
use crate::shape::{classify, names, EnumShape, ScalarShape, TypeNames, TypeShape};
use crate::Inspect;

/// Synthesize the handler for `T`.
pub(crate) fn build<T: Inspect>() -> Result<TypeHandler<T>> {
    let names = names::of::<T>();
    let shape = T::shape();
    let label = shape.label();
    let info = classify::inspect_shape(&shape);

    let ops = match shape {
        TypeShape::Record(shape) if info.self_describing => record::self_describing(&names, shape)?,
        TypeShape::Array(synth) => (synth.build)()?,
        TypeShape::Enum(shape) => enumeration(&names, shape)?,
        TypeShape::Collection(synth) => (synth.build)()?,
        TypeShape::Record(shape) => record::structural(shape),
        TypeShape::Scalar(shape) => scalar(shape),
        TypeShape::Nullable(synth) | TypeShape::Boxed(synth) | TypeShape::Polymorphic(synth) => {
            (synth.build)()?
        }
    };

    let handler = TypeHandler::new(names, info, ops);
    log::debug!(
        "[shapecast] built {} handler #{} for {} (latest v{}, create={})",
        label,
        handler.type_index(),
        handler.names().full,
        handler.latest_version(),
        handler.has_create()
    );
    Ok(handler)
}

/// Construction-time shape error for `names`.
pub(crate) fn shape_error(names: &TypeNames, reason: impl Into<String>) -> Error {
    Error::Shape {
        declared: names.full.clone(),
        concrete: names.full.clone(),
        reason: reason.into(),
    }
}

fn scalar<T: Inspect>(shape: ScalarShape<T>) -> Ops<T> {
    let ScalarShape {
        kind,
        as_mut,
        get,
        from,
        blank,
    } = shape;

    let member = member_fn(
        move |_: &TypeHandler<T>, inspector: &mut dyn Inspector, name: &str, place: Place<'_, T>| {
            let value = place.or_insert_with(blank);
            inspector.field(name, as_mut(value))
        },
    );
    let prop = prop_fn(
        move |_: &TypeHandler<T>,
              inspector: &mut dyn Inspector,
              name: &str,
              value: T,
              set: &mut dyn FnMut(T)| {
            inspector.property(name, get(&value), &mut |raw: ScalarValue| {
                let found = raw.kind();
                let value = from(raw).ok_or_else(|| mismatch(kind, found))?;
                set(value);
                Ok(())
            })
        },
    );
    Ops {
        member,
        prop,
        describe: element_describe(),
        create: Some(element_create()),
        children: Vec::new(),
    }
}

fn mismatch(expected: ScalarKind, found: ScalarKind) -> Error {
    Error::TypeMismatch {
        expected: expected.name().to_string(),
        found: found.name().to_string(),
    }
}

/// Enums register as their integral repr; unknown discriminants coming
/// back from the backend are errors.
fn enumeration<T: Inspect>(names: &TypeNames, shape: EnumShape<T>) -> Result<Ops<T>> {
    let EnumShape {
        repr,
        to_repr,
        from_repr,
    } = shape;
    if !repr.is_integral() {
        return Err(shape_error(
            names,
            format!("enum repr must be integral, got {}", repr.name()),
        ));
    }

    let member = member_fn(
        move |handler: &TypeHandler<T>,
              inspector: &mut dyn Inspector,
              name: &str,
              mut place: Place<'_, T>| {
            let raw = place.get().map(to_repr).unwrap_or(0);
            let mut cell = repr_cell(handler, repr, raw)?;
            inspector.field(name, cell.as_mut())?;
            place.put(from_cell(handler, &cell, from_repr)?);
            Ok(())
        },
    );
    let prop = prop_fn(
        move |handler: &TypeHandler<T>,
              inspector: &mut dyn Inspector,
              name: &str,
              value: T,
              set: &mut dyn FnMut(T)| {
            let cell = repr_cell(handler, repr, to_repr(&value))?;
            inspector.property(name, cell, &mut |raw: ScalarValue| {
                set(from_cell(handler, &raw, from_repr)?);
                Ok(())
            })
        },
    );
    Ok(Ops {
        member,
        prop,
        describe: element_describe(),
        create: Some(element_create()),
        children: Vec::new(),
    })
}

fn repr_cell<T>(handler: &TypeHandler<T>, repr: ScalarKind, raw: i64) -> Result<ScalarValue> {
    ScalarValue::from_i64(repr, raw).ok_or_else(|| Error::InvalidDiscriminant {
        type_name: handler.names().full.clone(),
        value: raw,
    })
}

fn from_cell<T>(
    handler: &TypeHandler<T>,
    cell: &ScalarValue,
    from_repr: fn(i64) -> Option<T>,
) -> Result<T> {
    let raw = cell.as_i64().ok_or_else(|| Error::TypeMismatch {
        expected: "integral enum value".to_string(),
        found: cell.kind().name().to_string(),
    })?;
    from_repr(raw).ok_or_else(|| Error::InvalidDiscriminant {
        type_name: handler.names().full.clone(),
        value: raw,
    })
}
