// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Slot adapters handed to backends for object and nullable members.

use super::{member_fn, prop_fn, MemberFn, Place, PropFn, Registration, TypeHandler};
use crate::contract::{Inspector, NullableSlot, ObjectKind, ObjectSlot};
use crate::error::{Error, Result};
use crate::shape::TypeNames;
use crate::Inspect;

/// Object member: a record, array or collection value (or an empty cell).
struct ObjectView<'a, T> {
    handler: &'a TypeHandler<T>,
    place: Place<'a, T>,
}

impl<'a, T: Inspect> ObjectView<'a, T> {
    fn new(handler: &'a TypeHandler<T>, place: Place<'a, T>) -> Self {
        Self { handler, place }
    }
}

impl<T: Inspect> ObjectSlot for ObjectView<'_, T> {
    fn names(&self) -> &TypeNames {
        self.handler.names()
    }

    fn kind(&self) -> ObjectKind {
        match self.handler.registration() {
            Registration::Object { kind, .. } => kind,
            _ => ObjectKind::Record,
        }
    }

    fn is_reference(&self) -> bool {
        matches!(
            self.handler.registration(),
            Registration::Object {
                reference: true,
                ..
            }
        )
    }

    fn latest_version(&self) -> u32 {
        self.handler.latest_version()
    }

    fn is_present(&self) -> bool {
        self.place.is_present()
    }

    fn describe(&mut self, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        match self.place.get_mut() {
            Some(value) => self.handler.describe(value, inspector, version),
            None => self.create(inspector, version),
        }
    }

    fn create(&mut self, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        let value = self.handler.create(inspector, version)?;
        self.place.put(value);
        Ok(())
    }
}

/// Field/Prop delegates for every object-registered type.
pub(crate) fn object_delegates<T: Inspect>() -> (MemberFn<T>, PropFn<T>) {
    let member = member_fn(
        |handler: &TypeHandler<T>, inspector: &mut dyn Inspector, name: &str, place: Place<'_, T>| {
            inspector.object_field(name, &mut ObjectView::new(handler, place))
        },
    );
    let prop = prop_fn(
        |handler: &TypeHandler<T>,
         inspector: &mut dyn Inspector,
         name: &str,
         value: T,
         set: &mut dyn FnMut(T)| {
            let mut value = value;
            inspector.object_property(name, &mut ObjectView::new(handler, Place::Occupied(&mut value)))?;
            set(value);
            Ok(())
        },
    );
    (member, prop)
}

/// Nullable member: registers the inner value under the same member name.
pub(crate) struct NullableView<'a, U> {
    pub(crate) value: &'a mut Option<U>,
    pub(crate) handler: &'a TypeHandler<U>,
    pub(crate) name: &'a str,
}

impl<U: Inspect> NullableSlot for NullableView<'_, U> {
    fn inner_names(&self) -> &TypeNames {
        self.handler.names()
    }

    fn is_present(&self) -> bool {
        self.value.is_some()
    }

    fn value(&mut self, inspector: &mut dyn Inspector) -> Result<()> {
        if let Some(inner) = self.value.as_mut() {
            return self.handler.field(inspector, self.name, inner);
        }
        let created = self.handler.create_field(inspector, self.name)?;
        *self.value = Some(created);
        Ok(())
    }

    fn clear(&mut self) {
        *self.value = None;
    }
}

/// Error for a slot asked to walk a value it does not hold.
pub(crate) fn absent(names: &TypeNames, member: &str) -> Error {
    Error::Unpopulated {
        type_name: names.full.clone(),
        member: member.to_string(),
    }
}
