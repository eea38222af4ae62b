// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member registration kinds.
//!
//! Every type registers with a backend in exactly one way. The builder picks
//! the Field/Prop delegates from this classification once, and backends can
//! query it to pre-plan layouts.

use crate::contract::{ObjectKind, ScalarKind};
use crate::shape::classify;
use crate::Inspect;

/// How members of a type reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Registration {
    /// `Inspector::field` / `property` with a primitive of this kind.
    /// Enums register as their integral repr.
    Scalar(ScalarKind),
    /// `Inspector::byte_array`.
    Bytes,
    /// `Inspector::nullable_field` / `nullable_property`.
    Nullable,
    /// `Inspector::object_field` / `object_property`.
    Object { kind: ObjectKind, reference: bool },
    /// `Inspector::typed_field` / `typed_property`.
    Typed,
}

impl Registration {
    /// True for registrations that go through a slot adapter.
    pub fn uses_slot(self) -> bool {
        matches!(
            self,
            Registration::Nullable | Registration::Object { .. } | Registration::Typed
        )
    }
}

/// Registration of `T`, memoized alongside its shape classification.
pub fn registration<T: Inspect>() -> Registration {
    classify::info::<T>().registration
}
