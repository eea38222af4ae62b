// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Polymorphic members
//!
//! A member declared as `Box<dyn B>` may hold any type implementing `B`.
//! Its handler cannot know the concrete type when it is built, so Field and
//! Describe look up a second handler keyed by the runtime type of the value:
//! a [`SubtypeHandler<B>`] wrapping the concrete type's handler behind the
//! type-erased [`ErasedHandler`] view.
//!
//! Creating a polymorphic member requires the backend to name the concrete
//! type. Candidates are registered per base with [`register_subtype`] or the
//! [`subtypes!`](crate::subtypes) macro.
//!
//! ```rust
//! use shapecast::{polymorphic, subtypes, Inspect, Object};
//!
//! pub trait Animal: Object {
//!     fn legs(&self) -> u32;
//! }
//! polymorphic!(dyn Animal);
//!
//! #[derive(Inspect, Default)]
//! pub struct Dog {
//!     name: String,
//! }
//! impl Animal for Dog {
//!     fn legs(&self) -> u32 {
//!         4
//!     }
//! }
//!
//! subtypes!(dyn Animal => Dog);
//! ```

use crate::cache;
use crate::contract::{Inspector, TypedSlot};
use crate::error::{Error, Result};
use crate::handler::{absent, describe_fn, member_fn, prop_fn, Ops, Place, Registration, TypeHandler};
use crate::shape::{names, Synth, TypeNames, TypeShape};
use crate::Inspect;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Base of every polymorphic trait. Implemented for all inspectable types.
pub trait Object: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// `TypeId` of the concrete type.
    fn concrete_type_id(&self) -> TypeId;

    fn type_names(&self) -> Arc<TypeNames>;

    /// Handler of the concrete type, type-erased.
    fn erased_handler(&self) -> Result<Arc<dyn ErasedHandler>>;
}

impl<T: Inspect> Object for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn concrete_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_names(&self) -> Arc<TypeNames> {
        names::of::<T>()
    }

    fn erased_handler(&self) -> Result<Arc<dyn ErasedHandler>> {
        let handler: Arc<dyn ErasedHandler> = cache::handler::<T>()?;
        Ok(handler)
    }
}

/// Type-erased view of a [`TypeHandler`].
pub trait ErasedHandler: Send + Sync {
    fn names(&self) -> &TypeNames;

    fn latest_version(&self) -> u32;

    fn type_index(&self) -> u64;

    fn describe_any(&self, value: &mut dyn Any, inspector: &mut dyn Inspector, version: u32) -> Result<()>;

    fn create_any(&self, inspector: &mut dyn Inspector, version: u32) -> Result<Box<dyn Any + Send + Sync>>;
}

impl<T: Inspect> ErasedHandler for TypeHandler<T> {
    fn names(&self) -> &TypeNames {
        TypeHandler::names(self)
    }

    fn latest_version(&self) -> u32 {
        TypeHandler::latest_version(self)
    }

    fn type_index(&self) -> u64 {
        TypeHandler::type_index(self)
    }

    fn describe_any(&self, value: &mut dyn Any, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        match value.downcast_mut::<T>() {
            Some(value) => self.describe(value, inspector, version),
            None => Err(Error::TypeMismatch {
                expected: TypeHandler::names(self).full.clone(),
                found: "value of another type".to_string(),
            }),
        }
    }

    fn create_any(&self, inspector: &mut dyn Inspector, version: u32) -> Result<Box<dyn Any + Send + Sync>> {
        Ok(Box::new(self.create(inspector, version)?))
    }
}

type Upcast<B> = Arc<dyn Fn(Box<dyn Any + Send + Sync>) -> Option<Box<B>> + Send + Sync>;

/// A subtype registered for create-by-name.
struct Registered<B: ?Sized> {
    handler: fn() -> Result<Arc<dyn ErasedHandler>>,
    upcast: Upcast<B>,
}

fn erased<C: Inspect>() -> Result<Arc<dyn ErasedHandler>> {
    let handler: Arc<dyn ErasedHandler> = cache::handler::<C>()?;
    Ok(handler)
}

/// Handler for one concrete type seen through base `B`.
pub struct SubtypeHandler<B: ?Sized> {
    declared: Arc<TypeNames>,
    concrete: Arc<dyn ErasedHandler>,
    concrete_id: TypeId,
    _base: PhantomData<fn() -> Box<B>>,
}

impl<B: ?Sized + Object> SubtypeHandler<B> {
    /// Names of the concrete type.
    pub fn names(&self) -> &TypeNames {
        self.concrete.names()
    }

    /// Names of the declared base.
    pub fn declared_names(&self) -> &TypeNames {
        &self.declared
    }

    pub fn latest_version(&self) -> u32 {
        self.concrete.latest_version()
    }

    /// Index of the wrapped concrete handler.
    pub fn type_index(&self) -> u64 {
        self.concrete.type_index()
    }

    pub fn describe(&self, value: &mut B, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        self.concrete
            .describe_any(Object::as_any_mut(value), inspector, version)
    }

    /// Create the concrete type and upcast it to `Box<B>`. Requires the
    /// concrete type to be registered for `B`.
    pub fn create(&self, inspector: &mut dyn Inspector, version: u32) -> Result<Box<B>> {
        let upcast = cache::global()
            .poly_table::<B>()
            .upcast(self.concrete_id)
            .ok_or_else(|| Error::UnknownSubtype {
                declared: self.declared.full.clone(),
                name: self.names().full.clone(),
            })?;
        let created = self.concrete.create_any(inspector, version)?;
        upcast(created).ok_or_else(|| Error::TypeMismatch {
            expected: self.names().full.clone(),
            found: "created value of another type".to_string(),
        })
    }
}

impl<B: ?Sized> fmt::Debug for SubtypeHandler<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtypeHandler")
            .field("declared", &self.declared.full)
            .field("concrete", &self.concrete.names().full)
            .finish()
    }
}

/// Per-base registry: adapters by runtime `TypeId`, registered subtypes by
/// `TypeId` and by name.
pub(crate) struct PolyTable<B: ?Sized> {
    declared: Arc<TypeNames>,
    adapters: DashMap<TypeId, Arc<SubtypeHandler<B>>>,
    registered: DashMap<TypeId, Registered<B>>,
    by_name: RwLock<HashMap<String, TypeId>>,
}

impl<B: ?Sized + Object> PolyTable<B> {
    pub(crate) fn new() -> Self {
        Self {
            declared: names::of::<B>(),
            adapters: DashMap::new(),
            registered: DashMap::new(),
            by_name: RwLock::new(HashMap::new()),
        }
    }

    pub(crate) fn declared(&self) -> &TypeNames {
        &self.declared
    }

    /// Adapter for the runtime type of `value`, built on first use.
    pub(crate) fn adapter_for(&self, value: &B) -> Result<Arc<SubtypeHandler<B>>> {
        let id = Object::concrete_type_id(value);
        if let Some(hit) = self.adapters.get(&id) {
            return Ok(Arc::clone(hit.value()));
        }
        let concrete = Object::erased_handler(value)
            .map_err(|err| self.wrap(&Object::type_names(value), err))?;
        Ok(self.insert_adapter(id, concrete))
    }

    /// Adapter for a registered subtype looked up by any of its names.
    pub(crate) fn adapter_named(&self, name: &str) -> Result<Arc<SubtypeHandler<B>>> {
        let id = self.by_name.read().get(name).copied().ok_or_else(|| Error::UnknownSubtype {
            declared: self.declared.full.clone(),
            name: name.to_string(),
        })?;
        if let Some(hit) = self.adapters.get(&id) {
            return Ok(Arc::clone(hit.value()));
        }
        let factory = self
            .registered
            .get(&id)
            .map(|entry| entry.handler)
            .ok_or_else(|| Error::UnknownSubtype {
                declared: self.declared.full.clone(),
                name: name.to_string(),
            })?;
        let concrete = factory().map_err(|err| self.wrap(&TypeNames::from_type_name(name), err))?;
        Ok(self.insert_adapter(id, concrete))
    }

    fn insert_adapter(&self, id: TypeId, concrete: Arc<dyn ErasedHandler>) -> Arc<SubtypeHandler<B>> {
        let adapter = Arc::new(SubtypeHandler {
            declared: Arc::clone(&self.declared),
            concrete,
            concrete_id: id,
            _base: PhantomData,
        });
        Arc::clone(self.adapters.entry(id).or_insert(adapter).value())
    }

    fn upcast(&self, id: TypeId) -> Option<Upcast<B>> {
        self.registered.get(&id).map(|entry| Arc::clone(&entry.upcast))
    }

    fn register<C: Inspect>(&self, upcast: Upcast<B>) {
        let id = TypeId::of::<C>();
        let concrete = names::of::<C>();
        {
            let mut by_name = self.by_name.write();
            for name in [&concrete.full, &concrete.short, &concrete.qualified] {
                if let Some(previous) = by_name.insert(name.clone(), id) {
                    if previous != id {
                        log::warn!(
                            "[shapecast] subtype name '{}' of {} now resolves to {}",
                            name,
                            self.declared.full,
                            concrete.full
                        );
                    }
                }
            }
        }
        self.registered.insert(
            id,
            Registered {
                handler: erased::<C>,
                upcast,
            },
        );
        log::debug!(
            "[shapecast] registered {} as subtype of {}",
            concrete.full,
            self.declared.full
        );
    }

    /// Names of every registered subtype (full form), sorted.
    pub(crate) fn registered_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registered
            .iter()
            .filter_map(|entry| {
                let id = *entry.key();
                self.by_name
                    .read()
                    .iter()
                    .filter(|(_, registered)| **registered == id)
                    .map(|(name, _)| name.clone())
                    .max_by_key(String::len)
            })
            .collect();
        names.sort();
        names
    }

    /// Shape errors keep the declared base alongside the concrete type.
    fn wrap(&self, concrete: &TypeNames, err: Error) -> Error {
        match err {
            Error::Shape { reason, .. } => Error::Shape {
                declared: self.declared.full.clone(),
                concrete: concrete.full.clone(),
                reason,
            },
            other => other,
        }
    }
}

/// Register `C` as a creatable subtype of `B`.
///
/// `upcast` converts the created value; `|c| Box::new(c)` works for any
/// `C: B`. Registering the same type again replaces its entry.
pub fn register_subtype<B, C>(upcast: fn(C) -> Box<B>)
where
    B: ?Sized + Object,
    C: Inspect,
{
    let convert: Upcast<B> = Arc::new(move |created: Box<dyn Any + Send + Sync>| {
        created.downcast::<C>().ok().map(|value| upcast(*value))
    });
    cache::global().poly_table::<B>().register::<C>(convert);
}

/// Names under which subtypes of `B` are registered, sorted.
pub fn registered_subtypes<B: ?Sized + Object>() -> Vec<String> {
    cache::global().poly_table::<B>().registered_names()
}

impl<B: ?Sized + Object> TypeShape<Box<B>> {
    pub fn polymorphic() -> Self {
        TypeShape::Polymorphic(Synth::new(polymorphic_ops::<B>, || Registration::Typed))
    }
}

fn polymorphic_ops<B: ?Sized + Object>() -> Result<Ops<Box<B>>> {
    let table = cache::global().poly_table::<B>();

    let member = {
        let table = Arc::clone(&table);
        member_fn(
            move |_: &TypeHandler<Box<B>>,
                  inspector: &mut dyn Inspector,
                  name: &str,
                  place: Place<'_, Box<B>>| {
                inspector.typed_field(name, &mut TypedView { place, table: &table })
            },
        )
    };
    let prop = {
        let table = Arc::clone(&table);
        prop_fn(
            move |_: &TypeHandler<Box<B>>,
                  inspector: &mut dyn Inspector,
                  name: &str,
                  value: Box<B>,
                  set: &mut dyn FnMut(Box<B>)| {
                let mut value = value;
                inspector.typed_property(
                    name,
                    &mut TypedView {
                        place: Place::Occupied(&mut value),
                        table: &table,
                    },
                )?;
                set(value);
                Ok(())
            },
        )
    };
    let describe = describe_fn(
        move |_: &TypeHandler<Box<B>>,
              value: &mut Box<B>,
              inspector: &mut dyn Inspector,
              version: u32| {
            table
                .adapter_for(&**value)?
                .describe(&mut **value, inspector, version)
        },
    );
    Ok(Ops {
        member,
        prop,
        describe,
        // The concrete type is unknown without a backend-supplied name.
        create: None,
        children: Vec::new(),
    })
}

/// Typed member: a `Box<dyn B>` value (or an empty cell).
struct TypedView<'a, B: ?Sized + Object> {
    place: Place<'a, Box<B>>,
    table: &'a PolyTable<B>,
}

impl<B: ?Sized + Object> TypedSlot for TypedView<'_, B> {
    fn declared(&self) -> &TypeNames {
        self.table.declared()
    }

    fn concrete(&self) -> Option<Arc<TypeNames>> {
        self.place.get().map(|value| Object::type_names(&**value))
    }

    fn latest_version(&self) -> Result<u32> {
        match self.place.get() {
            Some(value) => Ok(self.table.adapter_for(&**value)?.latest_version()),
            None => Err(absent(self.table.declared(), "<runtime type>")),
        }
    }

    fn describe(&mut self, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        let table = self.table;
        match self.place.get_mut() {
            Some(value) => table
                .adapter_for(&**value)?
                .describe(&mut **value, inspector, version),
            None => Err(absent(table.declared(), "<runtime type>")),
        }
    }

    fn create_as(&mut self, type_name: &str, inspector: &mut dyn Inspector, version: u32) -> Result<()> {
        let created = self.table.adapter_named(type_name)?.create(inspector, version)?;
        self.place.put(created);
        Ok(())
    }
}

/// Declare `Box<dyn Trait>` as a polymorphic member type.
///
/// Each trait must have [`Object`] as a supertrait.
#[macro_export]
macro_rules! polymorphic {
    ($(dyn $base:path),+ $(,)?) => {
        $(
            impl $crate::Inspect for ::std::boxed::Box<dyn $base> {
                fn shape() -> $crate::TypeShape<Self> {
                    $crate::TypeShape::polymorphic()
                }
            }
        )+
    };
}

/// Register concrete types as creatable subtypes of a polymorphic base.
#[macro_export]
macro_rules! subtypes {
    (dyn $base:path => $($concrete:ty),+ $(,)?) => {
        $(
            $crate::register_subtype::<dyn $base, $concrete>(|value| ::std::boxed::Box::new(value));
        )+
    };
}
