// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collection shapes: growable containers walked as a rank-1 array.
//!
//! Maps are collections of `(key, value)` tuples. The untyped object list
//! (`Vec<Box<dyn Object>>`) is simply a collection whose element is
//! polymorphic. `Vec<u8>` takes the bulk byte path.

use super::array::walk;
use super::bytes::{self, ByteCodec};
use super::slots::object_delegates;
use super::{child, create_fn, describe_fn, HandlerSlot, Ops, Registration, TypeHandler};
use crate::config::{self, ELEMENT_NAME};
use crate::contract::{Inspector, ObjectKind};
use crate::error::{Error, Result};
use crate::shape::{Synth, TypeShape};
use crate::Inspect;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

/// Growable container of inspectable elements.
pub trait Collection: Default + Send + Sync + 'static {
    type Elem: Inspect;

    fn count(&self) -> usize;

    /// Drain all elements in enumeration order.
    fn take_elements(&mut self) -> Vec<Self::Elem>;

    /// Append elements in order.
    fn put_elements(&mut self, elements: Vec<Self::Elem>);

    /// Visit elements in enumeration order. Containers whose elements
    /// cannot be borrowed mutably in place drain and refill themselves.
    fn visit_elements(
        &mut self,
        visit: &mut dyn FnMut(&mut Self::Elem) -> Result<()>,
    ) -> Result<()> {
        let mut elements = self.take_elements();
        let outcome = elements.iter_mut().try_for_each(|e| visit(e));
        self.put_elements(elements);
        outcome
    }
}

impl<U: Inspect> Collection for Vec<U> {
    type Elem = U;

    fn count(&self) -> usize {
        self.len()
    }

    fn take_elements(&mut self) -> Vec<U> {
        std::mem::take(self)
    }

    fn put_elements(&mut self, elements: Vec<U>) {
        self.extend(elements);
    }

    fn visit_elements(&mut self, visit: &mut dyn FnMut(&mut U) -> Result<()>) -> Result<()> {
        self.iter_mut().try_for_each(|e| visit(e))
    }
}

impl<U: Inspect> Collection for VecDeque<U> {
    type Elem = U;

    fn count(&self) -> usize {
        self.len()
    }

    fn take_elements(&mut self) -> Vec<U> {
        self.drain(..).collect()
    }

    fn put_elements(&mut self, elements: Vec<U>) {
        self.extend(elements);
    }

    fn visit_elements(&mut self, visit: &mut dyn FnMut(&mut U) -> Result<()>) -> Result<()> {
        self.iter_mut().try_for_each(|e| visit(e))
    }
}

impl<U: Inspect + Ord> Collection for BTreeSet<U> {
    type Elem = U;

    fn count(&self) -> usize {
        self.len()
    }

    fn take_elements(&mut self) -> Vec<U> {
        std::mem::take(self).into_iter().collect()
    }

    fn put_elements(&mut self, elements: Vec<U>) {
        self.extend(elements);
    }
}

impl<U: Inspect + Eq + Hash> Collection for HashSet<U> {
    type Elem = U;

    fn count(&self) -> usize {
        self.len()
    }

    fn take_elements(&mut self) -> Vec<U> {
        self.drain().collect()
    }

    fn put_elements(&mut self, elements: Vec<U>) {
        self.extend(elements);
    }
}

impl<K: Inspect + Ord, V: Inspect> Collection for BTreeMap<K, V> {
    type Elem = (K, V);

    fn count(&self) -> usize {
        self.len()
    }

    fn take_elements(&mut self) -> Vec<(K, V)> {
        std::mem::take(self).into_iter().collect()
    }

    fn put_elements(&mut self, elements: Vec<(K, V)>) {
        self.extend(elements);
    }
}

impl<K: Inspect + Eq + Hash, V: Inspect> Collection for HashMap<K, V> {
    type Elem = (K, V);

    fn count(&self) -> usize {
        self.len()
    }

    fn take_elements(&mut self) -> Vec<(K, V)> {
        self.drain().collect()
    }

    fn put_elements(&mut self, elements: Vec<(K, V)>) {
        self.extend(elements);
    }
}

impl<C: Collection + Inspect> TypeShape<C> {
    pub fn collection() -> Self {
        TypeShape::Collection(Synth::new(collection_ops::<C>, collection_registration::<C>))
    }
}

fn is_byte_vec<C: 'static>() -> bool {
    TypeId::of::<C>() == TypeId::of::<Vec<u8>>()
}

fn collection_registration<C: Collection>() -> Registration {
    if is_byte_vec::<C>() {
        Registration::Bytes
    } else {
        Registration::Object {
            kind: ObjectKind::Collection,
            reference: true,
        }
    }
}

fn byte_vec_codec<C: Collection>() -> ByteCodec<C> {
    ByteCodec {
        take: |value: &mut C| {
            (value as &mut dyn Any)
                .downcast_mut::<Vec<u8>>()
                .map(std::mem::take)
                .unwrap_or_default()
        },
        make: |raw: Vec<u8>| {
            let boxed: Box<dyn Any> = Box::new(raw);
            boxed
                .downcast::<C>()
                .map(|value| *value)
                .map_err(|_| Error::TypeMismatch {
                    expected: std::any::type_name::<C>().to_string(),
                    found: "Vec<u8>".to_string(),
                })
        },
    }
}

fn collection_ops<C: Collection + Inspect>() -> Result<Ops<C>> {
    if is_byte_vec::<C>() {
        return Ok(bytes::byte_ops(byte_vec_codec::<C>()));
    }

    let element = Arc::new(HandlerSlot::<C::Elem>::new());
    let children = vec![child(&element)];
    let describe = {
        let element = Arc::clone(&element);
        describe_fn(
            move |_: &TypeHandler<C>, value: &mut C, inspector: &mut dyn Inspector, _version: u32| {
                let element = element.get()?;
                let before = value.count();
                let mut lengths = [before];
                inspector.begin_array(&mut lengths)?;
                if lengths[0] != before {
                    *value = create_elements::<C>(element, inspector, lengths[0])?;
                    return Ok(());
                }
                inspector.enter_array_level(0)?;
                value.visit_elements(&mut |item: &mut C::Elem| {
                    element.field(&mut *inspector, ELEMENT_NAME, item)
                })?;
                inspector.leave_array_level(0)
            },
        )
    };
    let create = create_fn(
        move |_: &TypeHandler<C>, inspector: &mut dyn Inspector, _version: u32| {
            let element = element.get()?;
            let mut lengths = [0usize];
            inspector.begin_array(&mut lengths)?;
            create_elements::<C>(element, inspector, lengths[0])
        },
    );
    let (member, prop) = object_delegates();
    Ok(Ops {
        member,
        prop,
        describe,
        create: Some(create),
        children,
    })
}

fn create_elements<C: Collection>(
    element: &TypeHandler<C::Elem>,
    inspector: &mut dyn Inspector,
    count: usize,
) -> Result<C> {
    let total = config::limits().check_extent(&[count])?;
    let mut items = Vec::with_capacity(total);
    walk(inspector, &[count], 0, &mut |inspector: &mut dyn Inspector| {
        items.push(element.create_field(inspector, ELEMENT_NAME)?);
        Ok(())
    })?;
    let mut collection = C::default();
    collection.put_elements(items);
    Ok(collection)
}
