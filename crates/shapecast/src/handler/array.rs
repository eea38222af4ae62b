// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Array shapes: fixed-rank, row-major element storage.
//!
//! Describe announces the extents, then walks the elements with every
//! dimension bracketed by enter/leave calls. If the backend answers
//! `begin_array` with different extents (decoding into an existing value),
//! the array is rebuilt from backend-created elements instead.

use super::bytes::{self, ByteCodec};
use super::slots::object_delegates;
use super::{child, create_fn, describe_fn, HandlerSlot, Ops, Registration, TypeHandler};
use crate::config::{self, ELEMENT_NAME};
use crate::contract::{Inspector, ObjectKind};
use crate::error::{Error, Result};
use crate::shape::{names, Synth, TypeShape};
use crate::Inspect;
use std::sync::Arc;

/// Storage behind an array shape.
pub trait ArrayStorage: Sized + Send + Sync + 'static {
    type Elem: Inspect;

    /// Number of dimensions; at least 1.
    const RANK: usize;

    /// Stored inline (fixed arrays) rather than on the heap.
    const INLINE: bool = false;

    /// Extents, one per dimension.
    fn lengths(&self) -> Vec<usize>;

    /// All elements in row-major order.
    fn elements_mut(&mut self) -> &mut [Self::Elem];

    /// Rebuild from extents and row-major elements.
    fn from_elements(lengths: &[usize], elements: Vec<Self::Elem>) -> Result<Self>;

    /// Extents fixed by the type, if any.
    fn fixed_lengths() -> Option<Vec<usize>> {
        None
    }
}

impl<U: Inspect, const N: usize> ArrayStorage for [U; N] {
    type Elem = U;
    const RANK: usize = 1;
    const INLINE: bool = true;

    fn lengths(&self) -> Vec<usize> {
        vec![N]
    }

    fn elements_mut(&mut self) -> &mut [U] {
        self.as_mut_slice()
    }

    fn from_elements(_lengths: &[usize], elements: Vec<U>) -> Result<Self> {
        <[U; N]>::try_from(elements).map_err(|elements: Vec<U>| Error::LengthMismatch {
            type_name: names::of::<[U; N]>().full.clone(),
            expected: N,
            found: elements.len(),
        })
    }

    fn fixed_lengths() -> Option<Vec<usize>> {
        Some(vec![N])
    }
}

impl<U: Inspect> ArrayStorage for Box<[U]> {
    type Elem = U;
    const RANK: usize = 1;

    fn lengths(&self) -> Vec<usize> {
        vec![self.len()]
    }

    fn elements_mut(&mut self) -> &mut [U] {
        self
    }

    fn from_elements(_lengths: &[usize], elements: Vec<U>) -> Result<Self> {
        Ok(elements.into_boxed_slice())
    }
}

impl<A: ArrayStorage + Inspect> TypeShape<A> {
    pub fn array() -> Self {
        TypeShape::Array(Synth::new(array_ops::<A>, array_registration::<A>))
    }
}

fn is_bytes<A: ArrayStorage>() -> bool {
    A::RANK == 1 && bytes::is_byte::<A::Elem>()
}

fn array_registration<A: ArrayStorage>() -> Registration {
    if is_bytes::<A>() {
        Registration::Bytes
    } else {
        Registration::Object {
            kind: ObjectKind::Array,
            reference: !A::INLINE,
        }
    }
}

fn array_ops<A: ArrayStorage + Inspect>() -> Result<Ops<A>> {
    let type_names = names::of::<A>();
    let limits = config::limits();
    if A::RANK == 0 || A::RANK > limits.max_rank {
        return Err(super::builder::shape_error(
            &type_names,
            format!("array rank {} outside 1..={}", A::RANK, limits.max_rank),
        ));
    }
    if is_bytes::<A>() {
        return Ok(bytes::byte_ops(ByteCodec {
            take: |value: &mut A| bytes::collect_bytes(value.elements_mut()),
            make: |raw: Vec<u8>| {
                let lengths = [raw.len()];
                A::from_elements(&lengths, bytes::into_elements(raw)?)
            },
        }));
    }

    let element = Arc::new(HandlerSlot::<A::Elem>::new());
    let children = vec![child(&element)];
    let describe = {
        let element = Arc::clone(&element);
        describe_fn(
            move |_: &TypeHandler<A>, value: &mut A, inspector: &mut dyn Inspector, _version: u32| {
                let element = element.get()?;
                let before = value.lengths();
                let mut lengths = before.clone();
                inspector.begin_array(&mut lengths)?;
                if lengths != before {
                    *value = create_elements::<A>(element, inspector, &lengths)?;
                    return Ok(());
                }
                let mut items = value.elements_mut().iter_mut();
                walk(inspector, &lengths, 0, &mut |inspector: &mut dyn Inspector| {
                    match items.next() {
                        Some(item) => element.field(inspector, ELEMENT_NAME, item),
                        None => Err(Error::LengthMismatch {
                            type_name: element.names().full.clone(),
                            expected: lengths.iter().product(),
                            found: 0,
                        }),
                    }
                })
            },
        )
    };
    let create = create_fn(
        move |_: &TypeHandler<A>, inspector: &mut dyn Inspector, _version: u32| {
            let element = element.get()?;
            let mut lengths = A::fixed_lengths().unwrap_or_else(|| vec![0; A::RANK]);
            inspector.begin_array(&mut lengths)?;
            create_elements::<A>(element, inspector, &lengths)
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

/// Create `product(lengths)` elements from the backend and assemble them.
/// `begin_array` must already have been called.
fn create_elements<A: ArrayStorage>(
    element: &TypeHandler<A::Elem>,
    inspector: &mut dyn Inspector,
    lengths: &[usize],
) -> Result<A> {
    if let Some(fixed) = A::fixed_lengths() {
        if fixed.as_slice() != lengths {
            return Err(Error::LengthMismatch {
                type_name: names::of::<A>().full.clone(),
                expected: fixed.iter().product(),
                found: lengths.iter().product(),
            });
        }
    }
    let total = config::limits().check_extent(lengths)?;
    let mut items = Vec::with_capacity(total);
    walk(inspector, lengths, 0, &mut |inspector: &mut dyn Inspector| {
        items.push(element.create_field(inspector, ELEMENT_NAME)?);
        Ok(())
    })?;
    A::from_elements(lengths, items)
}

/// Visit every element position in row-major order, bracketing each
/// dimension with enter/leave.
pub(crate) fn walk(
    inspector: &mut dyn Inspector,
    lengths: &[usize],
    rank: usize,
    visit: &mut dyn FnMut(&mut dyn Inspector) -> Result<()>,
) -> Result<()> {
    let count = lengths.get(rank).copied().unwrap_or(0);
    inspector.enter_array_level(rank)?;
    for _ in 0..count {
        if rank + 1 < lengths.len() {
            walk(inspector, lengths, rank + 1, visit)?;
        } else {
            visit(inspector)?;
        }
    }
    inspector.leave_array_level(rank)
}
