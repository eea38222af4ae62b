// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type naming with three levels of detail.
//!
//! - `short`: last path segment of every component (`Vec<Point>`)
//! - `qualified`: short name plus defining crate (`Vec<Point>, demo`)
//! - `full`: `std::any::type_name` verbatim (`alloc::vec::Vec<demo::Point>`)
//!
//! Names are computed once per type and shared behind `Arc`.

use dashmap::DashMap;
use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Names of one Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeNames {
    pub short: String,
    pub qualified: String,
    pub full: String,
}

impl TypeNames {
    /// Derive all three names from a `std::any::type_name` string.
    pub fn from_type_name(full: &str) -> Self {
        let short = shorten(full);
        let qualified = match crate_of(full) {
            Some(krate) => format!("{}, {}", short, krate),
            None => short.clone(),
        };
        Self {
            short,
            qualified,
            full: full.to_string(),
        }
    }

    /// True if `name` equals any of the three forms.
    pub fn matches(&self, name: &str) -> bool {
        name == self.full || name == self.short || name == self.qualified
    }
}

impl fmt::Display for TypeNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// Memoized names of `T`.
pub fn of<T: ?Sized + 'static>() -> Arc<TypeNames> {
    static NAMES: OnceLock<DashMap<TypeId, Arc<TypeNames>>> = OnceLock::new();
    let table = NAMES.get_or_init(DashMap::new);
    let id = TypeId::of::<T>();
    if let Some(names) = table.get(&id) {
        return Arc::clone(names.value());
    }
    let names = Arc::new(TypeNames::from_type_name(std::any::type_name::<T>()));
    Arc::clone(table.entry(id).or_insert(names).value())
}

/// Strip module paths from every path component, keeping punctuation.
fn shorten(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for c in full.chars() {
        if is_separator(c) {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(c);
        } else {
            segment.push(c);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn is_separator(c: char) -> bool {
    matches!(c, '<' | '>' | ',' | '(' | ')' | '[' | ']' | ';' | '&' | '*' | ' ')
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Crate of the outermost path, if the name starts with one.
fn crate_of(full: &str) -> Option<&str> {
    let head = full.split(is_separator).next()?;
    let (krate, _) = head.split_once("::")?;
    Some(krate)
}
