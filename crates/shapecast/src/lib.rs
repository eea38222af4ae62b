// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # shapecast - shape-driven traversal of Rust values
//!
//! One traversal engine for every serialization-like backend. A type states
//! its structure once (usually through `#[derive(Inspect)]`), the engine
//! composes four operations for it on first use and caches them for the
//! lifetime of the process. Backends implement [`Inspector`] and never see
//! concrete Rust types.
//!
//! ## Quick Start
//!
//! ```rust
//! use shapecast::{from_value, to_value, Inspect};
//!
//! #[derive(Inspect, Debug, PartialEq)]
//! struct Sample {
//!     id: u32,
//!     label: Option<String>,
//!     history: Vec<f64>,
//! }
//!
//! let mut sample = Sample {
//!     id: 7,
//!     label: Some("north".into()),
//!     history: vec![0.5, 1.5],
//! };
//! let tree = to_value(&mut sample).unwrap();
//! assert_eq!(from_value::<Sample>(&tree).unwrap(), sample);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                     Backend (Inspector impl)                        |
//! |   field | property | nullable | object | typed | arrays | bytes     |
//! +---------------------------------------------------------------------+
//! |                        Type handlers                                |
//! |   Field | Prop | Describe | Create   (composed once per type)       |
//! +---------------------------------------------------------------------+
//! |                  Shapes + classifier + versioning                   |
//! |   TypeShape<T> | ShapeInfo | legacy/current routing                 |
//! +---------------------------------------------------------------------+
//! |                        Handler cache                                |
//! |   TypeId -> handler | polymorphic tables per declared base          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Inspect`] | Implemented by every traversable type |
//! | [`Inspector`] | Backend contract |
//! | [`TypeHandler`] | Composed operations for one type |
//! | [`SubtypeHandler`] | Runtime-type handler seen through a trait object |
//! | [`Value`] | In-memory tree produced by [`to_value`] |
//!
//! ## Modules Overview
//!
//! - [`contract`] - backend contract and slot adapters
//! - [`shape`] - structural descriptions and classifier queries
//! - [`handler`] - handler synthesis
//! - [`cache`] - process-wide handler cache
//! - [`poly`] - trait-object members and subtype registration
//! - [`memory`] - in-memory backend
//! - [`config`] - constants and runtime limits

// Allow the derive macro to work inside this crate's tests
extern crate self as shapecast;

/// Process-wide handler cache and statistics.
pub mod cache;
/// Constants and runtime limits.
pub mod config;
/// Backend contract (`Inspector`, slots, scalars, context).
pub mod contract;
/// Error type shared by handlers and backends.
pub mod error;
/// Handler synthesis for every shape.
pub mod handler;
mod impls;
/// In-memory backend (`Value` trees).
pub mod memory;
/// Row-major rank-N arrays.
pub mod ndarray;
/// Trait-object members and subtype registration.
pub mod poly;
/// Structural type descriptions.
pub mod shape;
/// Legacy/current version routing.
pub mod version;

pub use cache::{handler, runtime_handler, stats, CacheStats, HandlerCache};
pub use contract::{
    Context, Inspector, NullableSlot, ObjectKind, ObjectSlot, Scalar, ScalarKind, ScalarMut,
    ScalarValue, TypedSlot,
};
pub use error::{Error, Result};
pub use handler::{registration, ArrayStorage, Collection, Registration, TypeHandler};
pub use impls::ObjectList;
pub use memory::{from_value, read_into, to_value, Value, ValueReader, ValueWriter};
pub use ndarray::{Array2, Array3, NdArray};
pub use poly::{register_subtype, registered_subtypes, ErasedHandler, Object, SubtypeHandler};
pub use shape::classify::{declared_version, is_nullable, is_self_describing};
pub use shape::{EnumShape, FieldSpec, PropertySpec, RecordShape, ShapeInfo, TypeNames, TypeShape};

// Derive macro (for #[derive(shapecast::Inspect)])
pub use shapecast_derive::Inspect;

/// A type the engine can traverse.
///
/// `shape` is called once per process, when the type's handler is built.
/// Implement it by hand for custom records, or derive it:
///
/// ```rust
/// use shapecast::{handler, Inspect};
///
/// #[derive(Inspect)]
/// struct Pair(u8, String);
///
/// let handler = handler::<Pair>().unwrap();
/// assert!(handler.has_create());
/// ```
pub trait Inspect: Sized + Send + Sync + 'static {
    fn shape() -> TypeShape<Self>;
}

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
