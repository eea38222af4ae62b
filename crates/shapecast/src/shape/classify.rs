// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shape classification: the pure queries the builder and the dispatch
//! locator consult before synthesizing anything.
//!
//! Results are memoized per `TypeId`; each entry is computed from a fresh
//! `T::shape()` and never changes afterwards.

use super::{DescribeCurrentFn, DescribeLegacyFn, RecordShape, Synth, TypeShape};
use crate::config::DEFAULT_VERSION;
use crate::contract::ObjectKind;
use crate::handler::Registration;
use crate::Inspect;
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::OnceLock;

/// Classification of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeInfo {
    /// Values of the type may be absent (`Option<U>`).
    pub nullable: bool,
    /// The type claims to describe itself.
    pub self_describing: bool,
    /// Declared version; 0 when the type is not self-describing.
    pub declared_version: u32,
    /// How the type registers as a member.
    pub registration: Registration,
}

fn memo() -> &'static DashMap<TypeId, ShapeInfo> {
    static INFO: OnceLock<DashMap<TypeId, ShapeInfo>> = OnceLock::new();
    INFO.get_or_init(DashMap::new)
}

/// Classification of `T`, memoized.
pub fn info<T: Inspect>() -> ShapeInfo {
    let id = TypeId::of::<T>();
    if let Some(hit) = memo().get(&id) {
        return *hit;
    }
    inspect_shape::<T>(&T::shape())
}

/// Classify an already-built shape of `T` and record the result.
pub(crate) fn inspect_shape<T: 'static>(shape: &TypeShape<T>) -> ShapeInfo {
    if let TypeShape::Boxed(Synth {
        transparent: Some(inner),
        ..
    }) = shape
    {
        let info = inner();
        return *memo().entry(TypeId::of::<T>()).or_insert(info);
    }
    let (self_describing, declared_version) = match shape {
        TypeShape::Record(record) if record.claims_self_describe() => {
            (true, record.declared_version.unwrap_or(DEFAULT_VERSION))
        }
        _ => (false, 0),
    };
    let registration = match shape {
        TypeShape::Scalar(scalar) => Registration::Scalar(scalar.kind),
        TypeShape::Enum(shape) => Registration::Scalar(shape.repr),
        TypeShape::Nullable(_) => Registration::Nullable,
        TypeShape::Polymorphic(_) => Registration::Typed,
        TypeShape::Record(_) => Registration::Object {
            kind: ObjectKind::Record,
            reference: false,
        },
        TypeShape::Boxed(synth) | TypeShape::Array(synth) | TypeShape::Collection(synth) => {
            (synth.registration)()
        }
    };
    let info = ShapeInfo {
        nullable: matches!(shape, TypeShape::Nullable(_)),
        self_describing,
        declared_version,
        registration,
    };
    *memo().entry(TypeId::of::<T>()).or_insert(info)
}

/// True if values of `T` may be absent.
pub fn is_nullable<T: Inspect>() -> bool {
    info::<T>().nullable
}

/// True if `T` claims to describe itself.
pub fn is_self_describing<T: Inspect>() -> bool {
    info::<T>().self_describing
}

/// Declared version of a self-describing `T`; 0 otherwise.
pub fn declared_version<T: Inspect>() -> u32 {
    info::<T>().declared_version
}

/// Locate the current-version self-describe method.
///
/// `Ok(None)` for records that do not claim self-describe. A claim without
/// a method, or a declared version of 0, is an error carrying the reason.
pub(crate) fn locate_current<T: 'static>(
    record: &RecordShape<T>,
) -> Result<Option<DescribeCurrentFn<T>>, String> {
    if !record.claims_self_describe() {
        return Ok(None);
    }
    if record.declared_version == Some(0) {
        return Err("version 0 is reserved for types that do not describe themselves".into());
    }
    match record.describe {
        Some(describe) => Ok(Some(describe)),
        None => Err("claims self-describe but provides no describe method".into()),
    }
}

/// Locate the legacy self-describe method.
///
/// Required once a type declares a version above 1, so that older payloads
/// stay readable.
pub(crate) fn locate_legacy<T: 'static>(
    record: &RecordShape<T>,
) -> Result<Option<DescribeLegacyFn<T>>, String> {
    if !record.claims_self_describe() {
        return Ok(None);
    }
    let version = record.declared_version.unwrap_or(DEFAULT_VERSION);
    match record.legacy {
        Some(legacy) => Ok(Some(legacy)),
        None if version > DEFAULT_VERSION => Err(format!(
            "declares version {} but provides no legacy describe method",
            version
        )),
        None => Ok(None),
    }
}
