// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record operations: self-describing and structural Describe, plus the
//! Create fallback chain shared by both.

use super::builder::shape_error;
use super::slots::object_delegates;
use super::{create_fn, describe_fn, ChildFn, CreateFn, DescribeFn, Ops, TypeHandler};
use crate::contract::Inspector;
use crate::error::Result;
use crate::shape::classify::{locate_current, locate_legacy};
use crate::shape::{RecordShape, TypeNames};
use crate::version::{self, Route};
use crate::Inspect;

/// Ops for a record that describes itself.
pub(crate) fn self_describing<T: Inspect>(names: &TypeNames, record: RecordShape<T>) -> Result<Ops<T>> {
    let reject = |reason: String| shape_error(names, reason);
    let current = locate_current(&record)
        .map_err(reject)?
        .ok_or_else(|| reject("record does not describe itself".into()))?;
    let legacy = locate_legacy(&record).map_err(reject)?;

    let describe = describe_fn(
        move |handler: &TypeHandler<T>, value: &mut T, inspector: &mut dyn Inspector, requested: u32| {
            let route = version::route(
                handler.names(),
                handler.latest_version(),
                requested,
                legacy.is_some(),
            )?;
            match (route, legacy) {
                (Route::Legacy(older), Some(legacy)) => legacy(value, inspector, older),
                _ => current(value, inspector),
            }
        },
    );
    let create = create_chain(&record, true);
    let children = member_children(record);
    let (member, prop) = object_delegates();
    Ok(Ops {
        member,
        prop,
        describe,
        create,
        children,
    })
}

/// Ops for a record walked member by member: stored fields in declaration
/// order (read-only ones skipped), then computed properties.
pub(crate) fn structural<T: Inspect>(record: RecordShape<T>) -> Ops<T> {
    let create = create_chain(&record, false);
    let mut registrars = Vec::new();
    let mut children = Vec::new();
    for field in record.fields {
        registrars.extend(field.registrar);
        children.extend(field.child);
    }
    for prop in record.properties {
        registrars.push(prop.registrar);
        children.push(prop.child);
    }

    let describe: DescribeFn<T> = describe_fn(
        move |_: &TypeHandler<T>, value: &mut T, inspector: &mut dyn Inspector, _version: u32| {
            registrars
                .iter()
                .try_for_each(|register| register(value, inspector))
        },
    );
    let (member, prop) = object_delegates();
    Ops {
        member,
        prop,
        describe,
        create,
        children,
    }
}

/// Preloaders of every declared member, read-only ones excluded.
fn member_children<T>(record: RecordShape<T>) -> Vec<ChildFn> {
    record
        .fields
        .into_iter()
        .filter_map(|field| field.child)
        .chain(record.properties.into_iter().map(|prop| prop.child))
        .collect()
}

/// Pick the first available construction path:
///
/// 1. version-aware constructor (`construct_latest`)
/// 2. plain constructor (`construct`)
/// 3. default value + `after_construct` hook + Describe
/// 4. field-wise assembly (structural records only)
///
/// `None` leaves Create undefined.
fn create_chain<T: Inspect>(record: &RecordShape<T>, self_describing: bool) -> Option<CreateFn<T>> {
    if let Some(construct) = record.construct_latest {
        return Some(create_fn(
            move |handler: &TypeHandler<T>, inspector: &mut dyn Inspector, requested: u32| {
                handler.check_version(requested)?;
                construct(inspector, requested, requested == handler.latest_version())
            },
        ));
    }
    if let Some(construct) = record.construct {
        return Some(create_fn(
            move |handler: &TypeHandler<T>, inspector: &mut dyn Inspector, requested: u32| {
                handler.check_version(requested)?;
                construct(inspector, requested)
            },
        ));
    }
    if let Some(default) = record.default {
        let hook = record.after_construct;
        return Some(create_fn(
            move |handler: &TypeHandler<T>, inspector: &mut dyn Inspector, requested: u32| {
                let mut value = default();
                if let Some(hook) = hook {
                    hook(&mut value);
                }
                handler.describe(&mut value, inspector, requested)?;
                Ok(value)
            },
        ));
    }
    match record.assemble {
        Some(assemble) if !self_describing => Some(create_fn(
            move |_: &TypeHandler<T>, inspector: &mut dyn Inspector, requested: u32| {
                assemble(inspector, requested)
            },
        )),
        _ => None,
    }
}
