// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Inspector contract
//!
//! The backend-facing half of the crate. A backend (binary writer, text
//! reader, in-memory tree, test recorder) implements [`Inspector`]; handlers
//! drive it by registering members one at a time.
//!
//! ## Registration styles
//!
//! - **Field**: the value is borrowed in place and may be overwritten.
//! - **Property**: the value is passed by copy together with a setter; the
//!   backend calls the setter to replace it.
//!
//! Non-primitive members reach the backend through three thin adapters:
//!
//! - [`NullableSlot`] for `Option<U>`
//! - [`ObjectSlot`] for records, arrays and collections
//! - [`TypedSlot`] for polymorphic `Box<dyn Trait>` members
//!
//! A backend decides per slot whether to encode (walk the present value) or
//! decode (create a fresh one).
//!
//! ## Arrays
//!
//! Arrays and collections announce their extents with
//! [`Inspector::begin_array`] and bracket every dimension with
//! [`Inspector::enter_array_level`] / [`Inspector::leave_array_level`].
//! Elements are registered as fields named [`ELEMENT_NAME`](crate::config::ELEMENT_NAME).

mod context;
mod scalar;

pub use context::Context;
pub use scalar::{Scalar, ScalarKind, ScalarMut, ScalarValue};

use crate::cache;
use crate::error::Result;
use crate::shape::TypeNames;
use crate::Inspect;
use std::sync::Arc;

/// Backend contract. Object-safe; handlers only ever see `&mut dyn Inspector`.
pub trait Inspector {
    /// Register a primitive member in place.
    fn field(&mut self, name: &str, value: ScalarMut<'_>) -> Result<()>;

    /// Register a primitive member by copy. The default routes through
    /// [`field`](Self::field) and always calls `set` with the result.
    fn property(
        &mut self,
        name: &str,
        value: ScalarValue,
        set: &mut dyn FnMut(ScalarValue) -> Result<()>,
    ) -> Result<()> {
        let mut value = value;
        self.field(name, value.as_mut())?;
        set(value)
    }

    fn nullable_field(&mut self, name: &str, slot: &mut dyn NullableSlot) -> Result<()>;

    fn nullable_property(&mut self, name: &str, slot: &mut dyn NullableSlot) -> Result<()> {
        self.nullable_field(name, slot)
    }

    fn object_field(&mut self, name: &str, slot: &mut dyn ObjectSlot) -> Result<()>;

    fn object_property(&mut self, name: &str, slot: &mut dyn ObjectSlot) -> Result<()> {
        self.object_field(name, slot)
    }

    fn typed_field(&mut self, name: &str, slot: &mut dyn TypedSlot) -> Result<()>;

    fn typed_property(&mut self, name: &str, slot: &mut dyn TypedSlot) -> Result<()> {
        self.typed_field(name, slot)
    }

    /// Announce array extents. On decode the backend overwrites `lengths`
    /// with the extents it is about to supply; the slice length (the rank)
    /// is fixed by the type.
    fn begin_array(&mut self, lengths: &mut [usize]) -> Result<()>;

    fn enter_array_level(&mut self, rank: usize) -> Result<()>;

    fn leave_array_level(&mut self, rank: usize) -> Result<()>;

    /// Bulk path for rank-1 `u8` sequences. Replaces the usual
    /// begin/enter/element/leave sequence.
    fn byte_array(&mut self, name: &str, bytes: &mut Vec<u8>) -> Result<()>;

    /// Scratch storage that lives as long as the backend.
    fn context(&mut self) -> &mut Context;
}

impl<'a> dyn Inspector + 'a {
    /// Register any inspectable member in place.
    pub fn member<U: Inspect>(&mut self, name: &str, value: &mut U) -> Result<()> {
        cache::handler::<U>()?.field(self, name, value)
    }

    /// Register any inspectable member by copy; `set` receives the final value.
    pub fn member_prop<U: Inspect>(
        &mut self,
        name: &str,
        value: U,
        set: &mut dyn FnMut(U),
    ) -> Result<()> {
        cache::handler::<U>()?.prop(self, name, value, set)
    }

    /// Create a member from the backend with no prior value.
    pub fn create_member<U: Inspect>(&mut self, name: &str) -> Result<U> {
        cache::handler::<U>()?.create_field(self, name)
    }
}

/// Structural kind of an [`ObjectSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Record,
    Array,
    Collection,
}

/// View over an `Option<U>` member.
pub trait NullableSlot {
    /// Names of `U`.
    fn inner_names(&self) -> &TypeNames;

    fn is_present(&self) -> bool;

    /// Register the inner value under the slot's member name, creating it
    /// first when absent.
    fn value(&mut self, inspector: &mut dyn Inspector) -> Result<()>;

    /// Set the member to `None`.
    fn clear(&mut self);
}

/// View over a non-primitive, non-polymorphic member.
pub trait ObjectSlot {
    fn names(&self) -> &TypeNames;

    fn kind(&self) -> ObjectKind;

    /// True for heap-shaped values (collections, boxed slices, n-d arrays),
    /// false for inline records and fixed arrays.
    fn is_reference(&self) -> bool;

    fn latest_version(&self) -> u32;

    fn is_present(&self) -> bool;

    /// Walk the present value at `version`.
    fn describe(&mut self, inspector: &mut dyn Inspector, version: u32) -> Result<()>;

    /// Build a fresh value at `version` and store it in the slot.
    fn create(&mut self, inspector: &mut dyn Inspector, version: u32) -> Result<()>;
}

/// View over a polymorphic `Box<dyn B>` member.
pub trait TypedSlot {
    /// Names of the declared base (`dyn B`).
    fn declared(&self) -> &TypeNames;

    /// Names of the runtime type currently held, if any.
    fn concrete(&self) -> Option<Arc<TypeNames>>;

    /// Latest version of the runtime type currently held.
    fn latest_version(&self) -> Result<u32>;

    fn describe(&mut self, inspector: &mut dyn Inspector, version: u32) -> Result<()>;

    /// Create a registered subtype looked up by name and store it.
    fn create_as(
        &mut self,
        type_name: &str,
        inspector: &mut dyn Inspector,
        version: u32,
    ) -> Result<()>;
}
