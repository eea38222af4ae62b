// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wrapper shapes: `Option<U>` (nullable) and `Box<U>` (transparent).

use super::slots::NullableView;
use super::{
    child, create_fn, describe_fn, element_create, element_describe, member_fn, prop_fn,
    HandlerSlot, Ops, Place, Registration, TypeHandler,
};
use crate::contract::Inspector;
use crate::error::Result;
use crate::shape::{classify, Synth, TypeShape};
use crate::Inspect;
use std::sync::Arc;

impl<U: Inspect> TypeShape<Option<U>> {
    pub fn nullable() -> Self {
        TypeShape::Nullable(Synth::new(nullable_ops::<U>, || Registration::Nullable))
    }
}

impl<U: Inspect> TypeShape<Box<U>> {
    pub fn boxed() -> Self {
        TypeShape::Boxed(
            Synth::new(boxed_ops::<U>, super::registration::<U>).transparent(classify::info::<U>),
        )
    }
}

fn nullable_ops<U: Inspect>() -> Result<Ops<Option<U>>> {
    let inner = Arc::new(HandlerSlot::<U>::new());
    let children = vec![child(&inner)];

    let member = {
        let inner = Arc::clone(&inner);
        member_fn(
            move |_: &TypeHandler<Option<U>>,
                  inspector: &mut dyn Inspector,
                  name: &str,
                  place: Place<'_, Option<U>>| {
                let handler = inner.get()?;
                let value = place.or_insert_with(|| None);
                inspector.nullable_field(
                    name,
                    &mut NullableView {
                        value,
                        handler,
                        name,
                    },
                )
            },
        )
    };
    let prop = prop_fn(
        move |_: &TypeHandler<Option<U>>,
              inspector: &mut dyn Inspector,
              name: &str,
              value: Option<U>,
              set: &mut dyn FnMut(Option<U>)| {
            let handler = inner.get()?;
            let mut value = value;
            inspector.nullable_property(
                name,
                &mut NullableView {
                    value: &mut value,
                    handler,
                    name,
                },
            )?;
            set(value);
            Ok(())
        },
    );
    Ok(Ops {
        member,
        prop,
        describe: element_describe(),
        create: Some(element_create()),
        children,
    })
}

/// `Box<U>` registers, describes and creates exactly like `U`.
fn boxed_ops<U: Inspect>() -> Result<Ops<Box<U>>> {
    let inner = Arc::new(HandlerSlot::<U>::new());
    let children = vec![child(&inner)];

    let member = {
        let inner = Arc::clone(&inner);
        member_fn(
            move |_: &TypeHandler<Box<U>>,
                  inspector: &mut dyn Inspector,
                  name: &str,
                  place: Place<'_, Box<U>>| {
                let handler = inner.get()?;
                match place {
                    Place::Occupied(boxed) => handler.field(inspector, name, boxed),
                    Place::Vacant(cell) => match cell {
                        Some(boxed) => handler.field(inspector, name, boxed),
                        None => {
                            *cell = Some(Box::new(handler.create_field(inspector, name)?));
                            Ok(())
                        }
                    },
                }
            },
        )
    };
    let prop = {
        let inner = Arc::clone(&inner);
        prop_fn(
            move |_: &TypeHandler<Box<U>>,
                  inspector: &mut dyn Inspector,
                  name: &str,
                  value: Box<U>,
                  set: &mut dyn FnMut(Box<U>)| {
                inner
                    .get()?
                    .prop(inspector, name, *value, &mut |u| set(Box::new(u)))
            },
        )
    };
    let describe = {
        let inner = Arc::clone(&inner);
        describe_fn(
            move |_: &TypeHandler<Box<U>>,
                  value: &mut Box<U>,
                  inspector: &mut dyn Inspector,
                  version: u32| { inner.get()?.describe(value, inspector, version) },
        )
    };
    let create = create_fn(
        move |_: &TypeHandler<Box<U>>, inspector: &mut dyn Inspector, version: u32| {
            Ok(Box::new(inner.get()?.create(inspector, version)?))
        },
    );
    Ok(Ops {
        member,
        prop,
        describe,
        create: Some(create),
        children,
    })
}
