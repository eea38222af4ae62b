// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Type handlers
//!
//! A [`TypeHandler<T>`] bundles four composed operations for `T`:
//!
//! - **Field**: register a `T` member in place (encode or decode)
//! - **Prop**: register a `T` member by copy, with a setter
//! - **Describe**: walk an existing `T` at a given version
//! - **Create**: build a fresh `T` at a given version (optional)
//!
//! Handlers are synthesized once per type by [`builder`] and shared through
//! the process-wide cache. Every per-call decision (shape, delegate kind,
//! self-describe method) is made at build time; the operations themselves
//! are straight-line closures.
//!
//! Child handlers live in [`HandlerSlot`]s and are resolved before the parent
//! is cached. A child that is still being built on the same thread (a
//! recursive type) resolves on first use instead.

mod array;
pub(crate) mod builder;
mod bytes;
mod collection;
mod dispatch;
mod nullable;
mod record;
mod slots;

#[cfg(test)]
mod tests;

pub use array::ArrayStorage;
pub use collection::Collection;
pub use dispatch::{registration, Registration};

pub(crate) use slots::absent;

use crate::cache;
use crate::config::{DEFAULT_VERSION, ELEMENT_NAME};
use crate::contract::Inspector;
use crate::error::{Error, Result};
use crate::shape::{ShapeInfo, TypeNames};
use crate::version;
use crate::Inspect;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Value location handed to Field: either an existing value to register
/// in place, or an empty cell for the backend to populate.
pub(crate) enum Place<'a, T> {
    Occupied(&'a mut T),
    Vacant(&'a mut Option<T>),
}

impl<'a, T> Place<'a, T> {
    pub(crate) fn is_present(&self) -> bool {
        match self {
            Place::Occupied(_) => true,
            Place::Vacant(cell) => cell.is_some(),
        }
    }

    pub(crate) fn get(&self) -> Option<&T> {
        match self {
            Place::Occupied(value) => Some(&**value),
            Place::Vacant(cell) => cell.as_ref(),
        }
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Place::Occupied(value) => Some(&mut **value),
            Place::Vacant(cell) => cell.as_mut(),
        }
    }

    /// Existing value, or `make()` stored first.
    pub(crate) fn or_insert_with(self, make: impl FnOnce() -> T) -> &'a mut T {
        match self {
            Place::Occupied(value) => value,
            Place::Vacant(cell) => cell.get_or_insert_with(make),
        }
    }

    pub(crate) fn put(&mut self, value: T) {
        match self {
            Place::Occupied(slot) => **slot = value,
            Place::Vacant(cell) => **cell = Some(value),
        }
    }
}

pub(crate) type MemberFn<T> =
    Box<dyn Fn(&TypeHandler<T>, &mut dyn Inspector, &str, Place<'_, T>) -> Result<()> + Send + Sync>;
pub(crate) type PropFn<T> = Box<
    dyn Fn(&TypeHandler<T>, &mut dyn Inspector, &str, T, &mut dyn FnMut(T)) -> Result<()>
        + Send
        + Sync,
>;
pub(crate) type DescribeFn<T> =
    Box<dyn Fn(&TypeHandler<T>, &mut T, &mut dyn Inspector, u32) -> Result<()> + Send + Sync>;
pub(crate) type CreateFn<T> =
    Box<dyn Fn(&TypeHandler<T>, &mut dyn Inspector, u32) -> Result<T> + Send + Sync>;
/// Resolves one child handler ahead of first use.
pub(crate) type ChildFn = Box<dyn Fn() -> Result<()> + Send + Sync>;

pub(crate) fn member_fn<T, F>(f: F) -> MemberFn<T>
where
    F: Fn(&TypeHandler<T>, &mut dyn Inspector, &str, Place<'_, T>) -> Result<()>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

pub(crate) fn prop_fn<T, F>(f: F) -> PropFn<T>
where
    F: Fn(&TypeHandler<T>, &mut dyn Inspector, &str, T, &mut dyn FnMut(T)) -> Result<()>
        + Send
        + Sync
        + 'static,
{
    Box::new(f)
}

pub(crate) fn describe_fn<T, F>(f: F) -> DescribeFn<T>
where
    F: Fn(&TypeHandler<T>, &mut T, &mut dyn Inspector, u32) -> Result<()> + Send + Sync + 'static,
{
    Box::new(f)
}

pub(crate) fn create_fn<T, F>(f: F) -> CreateFn<T>
where
    F: Fn(&TypeHandler<T>, &mut dyn Inspector, u32) -> Result<T> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Describe as a single Field named [`ELEMENT_NAME`]. Used by every shape
/// that is not an object (scalars, enums, nullables, byte arrays).
pub(crate) fn element_describe<T: Inspect>() -> DescribeFn<T> {
    describe_fn(
        |handler: &TypeHandler<T>, value: &mut T, inspector: &mut dyn Inspector, _version: u32| {
            handler.field(inspector, ELEMENT_NAME, value)
        },
    )
}

/// Create counterpart of [`element_describe`].
pub(crate) fn element_create<T: Inspect>() -> CreateFn<T> {
    create_fn(
        |handler: &TypeHandler<T>, inspector: &mut dyn Inspector, _version: u32| {
            handler.create_field(inspector, ELEMENT_NAME)
        },
    )
}

/// The four synthesized operations, before they are bound to a handler.
pub(crate) struct Ops<T> {
    pub(crate) member: MemberFn<T>,
    pub(crate) prop: PropFn<T>,
    pub(crate) describe: DescribeFn<T>,
    pub(crate) create: Option<CreateFn<T>>,
    /// Handlers of the types this one contains.
    pub(crate) children: Vec<ChildFn>,
}

/// Process-wide creation counter; first handler gets index 1.
static NEXT_TYPE_INDEX: AtomicU64 = AtomicU64::new(1);

/// Composed operations for one type.
pub struct TypeHandler<T> {
    names: Arc<TypeNames>,
    info: ShapeInfo,
    latest_version: u32,
    type_index: u64,
    member: MemberFn<T>,
    prop: PropFn<T>,
    describe: DescribeFn<T>,
    create: Option<CreateFn<T>>,
    children: Vec<ChildFn>,
}

impl<T: Inspect> TypeHandler<T> {
    pub(crate) fn new(names: Arc<TypeNames>, info: ShapeInfo, ops: Ops<T>) -> Self {
        let latest_version = if info.self_describing {
            info.declared_version
        } else {
            DEFAULT_VERSION
        };
        Self {
            names,
            info,
            latest_version,
            type_index: NEXT_TYPE_INDEX.fetch_add(1, Ordering::SeqCst),
            member: ops.member,
            prop: ops.prop,
            describe: ops.describe,
            create: ops.create,
            children: ops.children,
        }
    }

    /// Resolve every child handler so that their construction errors
    /// surface now rather than on first traversal.
    pub(crate) fn preload_children(&self) -> Result<()> {
        self.children.iter().try_for_each(|resolve| resolve())
    }

    /// Register `value` as member `name` in place.
    pub fn field(&self, inspector: &mut dyn Inspector, name: &str, value: &mut T) -> Result<()> {
        (self.member)(self, inspector, name, Place::Occupied(value))
    }

    /// Register member `name` with no prior value and return what the
    /// backend populated.
    pub fn create_field(&self, inspector: &mut dyn Inspector, name: &str) -> Result<T> {
        let mut cell = None;
        (self.member)(self, inspector, name, Place::Vacant(&mut cell))?;
        cell.ok_or_else(|| Error::Unpopulated {
            type_name: self.names.full.clone(),
            member: name.to_string(),
        })
    }

    /// Register member `name` by copy; `set` receives the final value.
    pub fn prop(
        &self,
        inspector: &mut dyn Inspector,
        name: &str,
        value: T,
        set: &mut dyn FnMut(T),
    ) -> Result<()> {
        (self.prop)(self, inspector, name, value, set)
    }

    /// Walk `value` at `version`.
    pub fn describe(&self, value: &mut T, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        (self.describe)(self, value, inspector, version)
    }

    /// Build a fresh value at `version`.
    pub fn create(&self, inspector: &mut dyn Inspector, version: u32) -> Result<T> {
        match &self.create {
            Some(create) => create(self, inspector, version),
            None => Err(Error::NotConstructible {
                type_name: self.names.full.clone(),
            }),
        }
    }

    /// Reject versions above [`latest_version`](Self::latest_version) for
    /// self-describing types. Other types accept any version.
    pub fn check_version(&self, requested: u32) -> Result<()> {
        if self.info.self_describing {
            version::check(&self.names, self.latest_version, requested)
        } else {
            Ok(())
        }
    }
}

impl<T> TypeHandler<T> {
    pub fn has_create(&self) -> bool {
        self.create.is_some()
    }

    pub fn is_nullable(&self) -> bool {
        self.info.nullable
    }

    pub fn is_self_describing(&self) -> bool {
        self.info.self_describing
    }

    /// Declared version for self-describing types, 1 otherwise.
    pub fn latest_version(&self) -> u32 {
        self.latest_version
    }

    /// Creation order of this handler across the process.
    pub fn type_index(&self) -> u64 {
        self.type_index
    }

    pub fn names(&self) -> &TypeNames {
        &self.names
    }

    pub fn registration(&self) -> Registration {
        self.info.registration
    }
}

impl<T> fmt::Debug for TypeHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandler")
            .field("type", &self.names.full)
            .field("type_index", &self.type_index)
            .field("latest_version", &self.latest_version)
            .field("registration", &self.info.registration)
            .field("has_create", &self.create.is_some())
            .finish()
    }
}

/// Lazily resolved child handler.
///
/// The cell is filled from the global cache on first use, which is what
/// lets a type contain itself (directly or through other types).
pub(crate) struct HandlerSlot<U> {
    cell: OnceLock<Arc<TypeHandler<U>>>,
}

impl<U: Inspect> HandlerSlot<U> {
    pub(crate) fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub(crate) fn get(&self) -> Result<&TypeHandler<U>> {
        if let Some(handler) = self.cell.get() {
            return Ok(handler.as_ref());
        }
        let handler = cache::handler::<U>()?;
        Ok(self.cell.get_or_init(|| handler).as_ref())
    }

    /// Resolve now, unless `U` is still being built further up this
    /// thread's stack (recursive types); that edge resolves on first use.
    pub(crate) fn preload(&self) -> Result<()> {
        if cache::is_building(TypeId::of::<U>()) {
            return Ok(());
        }
        self.get().map(|_| ())
    }
}

/// Preloader for a shared child slot.
pub(crate) fn child<U: Inspect>(slot: &Arc<HandlerSlot<U>>) -> ChildFn {
    let slot = Arc::clone(slot);
    Box::new(move || slot.preload())
}
