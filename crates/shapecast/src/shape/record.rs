// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record shapes: the member list and optional lifecycle hooks of a struct.
//!
//! Usually produced by `#[derive(Inspect)]`, but hand-written shapes use the
//! same builder:
//!
//! ```rust
//! use shapecast::{Inspect, RecordShape, TypeShape};
//!
//! #[derive(Default)]
//! struct Reading {
//!     kelvin: f64,
//!     source: String,
//! }
//!
//! impl Inspect for Reading {
//!     fn shape() -> TypeShape<Self> {
//!         TypeShape::Record(
//!             RecordShape::<Self>::new()
//!                 .field::<String>("source", |r: &mut Reading| &mut r.source)
//!                 .property::<f64>(
//!                     "celsius",
//!                     |r: &Reading| r.kelvin - 273.15,
//!                     |r: &mut Reading, c: f64| r.kelvin = c + 273.15,
//!                 )
//!                 .default_with(Reading::default),
//!         )
//!     }
//! }
//! ```

use crate::contract::Inspector;
use crate::error::Result;
use crate::handler::{child, ChildFn, HandlerSlot};
use crate::Inspect;
use std::sync::Arc;

/// Current-version self-describe method.
pub type DescribeCurrentFn<T> = fn(&mut T, &mut dyn Inspector) -> Result<()>;
/// Legacy self-describe method, called with the requested (older) version.
pub type DescribeLegacyFn<T> = fn(&mut T, &mut dyn Inspector, u32) -> Result<()>;
/// Constructor reading its own members from the backend.
pub type ConstructFn<T> = fn(&mut dyn Inspector, u32) -> Result<T>;
/// Constructor additionally told whether the version is the latest.
pub type ConstructLatestFn<T> = fn(&mut dyn Inspector, u32, bool) -> Result<T>;

pub(crate) type Registrar<T> = Box<dyn Fn(&mut T, &mut dyn Inspector) -> Result<()> + Send + Sync>;

/// One stored member.
pub struct FieldSpec<T> {
    pub(crate) name: &'static str,
    pub(crate) registrar: Option<Registrar<T>>,
    pub(crate) child: Option<ChildFn>,
}

impl<T: 'static> FieldSpec<T> {
    pub fn new<U: Inspect>(name: &'static str, access: fn(&mut T) -> &mut U) -> Self {
        let slot = Arc::new(HandlerSlot::<U>::new());
        Self {
            name,
            child: Some(child(&slot)),
            registrar: Some(Box::new(
                move |value: &mut T, inspector: &mut dyn Inspector| {
                    slot.get()?.field(inspector, name, access(value))
                },
            )),
        }
    }

    /// Listed in the shape but never registered.
    pub fn readonly(name: &'static str) -> Self {
        Self {
            name,
            registrar: None,
            child: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_readonly(&self) -> bool {
        self.registrar.is_none()
    }
}

/// One computed member, registered by copy after all stored fields.
pub struct PropertySpec<T> {
    pub(crate) name: &'static str,
    pub(crate) registrar: Registrar<T>,
    pub(crate) child: ChildFn,
}

impl<T: 'static> PropertySpec<T> {
    pub fn new<U: Inspect>(name: &'static str, get: fn(&T) -> U, set: fn(&mut T, U)) -> Self {
        let slot = Arc::new(HandlerSlot::<U>::new());
        Self {
            name,
            child: child(&slot),
            registrar: Box::new(move |value: &mut T, inspector: &mut dyn Inspector| {
                let mut replaced = None;
                slot.get()?
                    .prop(inspector, name, get(value), &mut |u| replaced = Some(u))?;
                if let Some(u) = replaced {
                    set(value, u);
                }
                Ok(())
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Members and hooks of a record type.
pub struct RecordShape<T> {
    pub(crate) fields: Vec<FieldSpec<T>>,
    pub(crate) properties: Vec<PropertySpec<T>>,
    pub(crate) declared_version: Option<u32>,
    pub(crate) describe: Option<DescribeCurrentFn<T>>,
    pub(crate) legacy: Option<DescribeLegacyFn<T>>,
    pub(crate) construct: Option<ConstructFn<T>>,
    pub(crate) construct_latest: Option<ConstructLatestFn<T>>,
    pub(crate) default: Option<fn() -> T>,
    pub(crate) after_construct: Option<fn(&mut T)>,
    pub(crate) assemble: Option<ConstructFn<T>>,
}

impl<T> Default for RecordShape<T> {
    fn default() -> Self {
        Self {
            fields: Vec::new(),
            properties: Vec::new(),
            declared_version: None,
            describe: None,
            legacy: None,
            construct: None,
            construct_latest: None,
            default: None,
            after_construct: None,
            assemble: None,
        }
    }
}

impl<T: 'static> RecordShape<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored member registered in place, in declaration order.
    pub fn field<U: Inspect>(mut self, name: &'static str, access: fn(&mut T) -> &mut U) -> Self {
        self.fields.push(FieldSpec::new(name, access));
        self
    }

    /// Stored member excluded from traversal.
    pub fn readonly_field(mut self, name: &'static str) -> Self {
        self.fields.push(FieldSpec::readonly(name));
        self
    }

    /// Computed member registered by copy through a getter/setter pair.
    pub fn property<U: Inspect>(
        mut self,
        name: &'static str,
        get: fn(&T) -> U,
        set: fn(&mut T, U),
    ) -> Self {
        self.properties.push(PropertySpec::new(name, get, set));
        self
    }

    /// Claim self-describe at `version` (1 when only `describe_with` is used).
    pub fn self_describing(mut self, version: u32) -> Self {
        self.declared_version = Some(version);
        self
    }

    pub fn describe_with(mut self, describe: DescribeCurrentFn<T>) -> Self {
        self.describe = Some(describe);
        self
    }

    pub fn legacy_with(mut self, legacy: DescribeLegacyFn<T>) -> Self {
        self.legacy = Some(legacy);
        self
    }

    pub fn construct_with(mut self, construct: ConstructFn<T>) -> Self {
        self.construct = Some(construct);
        self
    }

    pub fn construct_latest_with(mut self, construct: ConstructLatestFn<T>) -> Self {
        self.construct_latest = Some(construct);
        self
    }

    /// Default constructor used before Describe populates the value.
    pub fn default_with(mut self, default: fn() -> T) -> Self {
        self.default = Some(default);
        self
    }

    /// Hook run on a default-constructed value before it is populated.
    pub fn after_construct(mut self, hook: fn(&mut T)) -> Self {
        self.after_construct = Some(hook);
        self
    }

    /// Field-wise constructor, used when nothing else can build the value.
    pub fn assemble_with(mut self, assemble: ConstructFn<T>) -> Self {
        self.assemble = Some(assemble);
        self
    }

    /// True if any self-describe capability is declared.
    pub fn claims_self_describe(&self) -> bool {
        self.declared_version.is_some() || self.describe.is_some() || self.legacy.is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(FieldSpec::name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(PropertySpec::name)
    }
}
