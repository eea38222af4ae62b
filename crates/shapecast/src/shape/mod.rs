// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Type shapes
//!
//! A [`TypeShape`] is the structural description of one Rust type that the
//! handler builder consumes exactly once. Shapes are plain data: building one
//! never resolves child handlers, so recursive types describe themselves
//! without recursion.
//!
//! | Shape          | Rust types                                                   |
//! |----------------|--------------------------------------------------------------|
//! | `Scalar`       | `bool`, integers, floats, `char`, `String`                   |
//! | `Enum`         | fieldless enums (`#[derive(Inspect)]`)                       |
//! | `Nullable`     | `Option<U>`                                                  |
//! | `Boxed`        | `Box<U>`                                                     |
//! | `Array`        | `[U; N]`, `Box<[U]>`, `NdArray<U, R>`                        |
//! | `Collection`   | `Vec`, `VecDeque`, sets, maps                                |
//! | `Record`       | structs, tuples, hand-written shapes                         |
//! | `Polymorphic`  | `Box<dyn Trait>` declared with [`polymorphic!`](crate::polymorphic) |

pub mod classify;
pub mod names;
mod record;

pub use classify::ShapeInfo;
pub use names::TypeNames;
pub use record::{
    ConstructFn, ConstructLatestFn, DescribeCurrentFn, DescribeLegacyFn, FieldSpec, PropertySpec,
    RecordShape,
};

use crate::contract::{Scalar, ScalarKind, ScalarMut, ScalarValue};
use crate::error::Result;
use crate::handler::{Ops, Registration};

/// Structural description of `T`.
pub enum TypeShape<T> {
    Scalar(ScalarShape<T>),
    Enum(EnumShape<T>),
    Nullable(Synth<T>),
    Boxed(Synth<T>),
    Array(Synth<T>),
    Collection(Synth<T>),
    Record(RecordShape<T>),
    Polymorphic(Synth<T>),
}

impl<T> TypeShape<T> {
    /// Shape tag, for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            TypeShape::Scalar(_) => "scalar",
            TypeShape::Enum(_) => "enum",
            TypeShape::Nullable(_) => "nullable",
            TypeShape::Boxed(_) => "boxed",
            TypeShape::Array(_) => "array",
            TypeShape::Collection(_) => "collection",
            TypeShape::Record(_) => "record",
            TypeShape::Polymorphic(_) => "polymorphic",
        }
    }
}

impl<S: Scalar> TypeShape<S> {
    pub fn scalar() -> Self {
        TypeShape::Scalar(ScalarShape {
            kind: S::KIND,
            as_mut: S::scalar_mut,
            get: S::to_scalar,
            from: S::from_scalar,
            blank: S::default,
        })
    }
}

/// Accessors of a primitive type.
pub struct ScalarShape<T> {
    pub(crate) kind: ScalarKind,
    pub(crate) as_mut: fn(&mut T) -> ScalarMut<'_>,
    pub(crate) get: fn(&T) -> ScalarValue,
    pub(crate) from: fn(ScalarValue) -> Option<T>,
    pub(crate) blank: fn() -> T,
}

/// Fieldless enum carried as an integral value.
pub struct EnumShape<T> {
    pub(crate) repr: ScalarKind,
    pub(crate) to_repr: fn(&T) -> i64,
    pub(crate) from_repr: fn(i64) -> Option<T>,
}

impl<T> EnumShape<T> {
    /// `repr` must be integral; the builder rejects anything else.
    pub fn new(repr: ScalarKind, to_repr: fn(&T) -> i64, from_repr: fn(i64) -> Option<T>) -> Self {
        Self {
            repr,
            to_repr,
            from_repr,
        }
    }

    pub fn repr(&self) -> ScalarKind {
        self.repr
    }
}

/// Shape whose operations are synthesized by a generic builder
/// (nullable, boxed, array, collection, polymorphic).
pub struct Synth<T> {
    pub(crate) build: fn() -> Result<Ops<T>>,
    pub(crate) registration: fn() -> Registration,
    /// Classification of a wrapped type this shape stands in for.
    pub(crate) transparent: Option<fn() -> ShapeInfo>,
}

impl<T> Synth<T> {
    pub(crate) fn new(build: fn() -> Result<Ops<T>>, registration: fn() -> Registration) -> Self {
        Self {
            build,
            registration,
            transparent: None,
        }
    }

    /// Classify as the wrapped type does: same registration, versioning
    /// and nullability.
    pub(crate) fn transparent(mut self, inner: fn() -> ShapeInfo) -> Self {
        self.transparent = Some(inner);
        self
    }
}
