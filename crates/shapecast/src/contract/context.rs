// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-traversal scratch storage.
//!
//! Every inspector owns one [`Context`]. Self-describe methods reach it
//! through [`Inspector::context`](super::Inspector::context) to share state
//! across a traversal (object tables, format options, counters) without
//! threading extra parameters through handlers.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// String-keyed heterogeneous map.
#[derive(Default)]
pub struct Context {
    entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, returning true if an entry was replaced.
    pub fn insert<V: Any + Send + Sync>(&mut self, key: impl Into<String>, value: V) -> bool {
        self.entries.insert(key.into(), Box::new(value)).is_some()
    }

    /// Typed lookup. `None` when missing or stored with another type.
    pub fn get<V: Any>(&self, key: &str) -> Option<&V> {
        self.entries.get(key)?.downcast_ref::<V>()
    }

    pub fn get_mut<V: Any>(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)?.downcast_mut::<V>()
    }

    /// Typed lookup, inserting `make()` first when the key is missing.
    /// `None` only when the key holds a value of another type.
    pub fn get_or_insert_with<V: Any + Send + Sync>(
        &mut self,
        key: &str,
        make: impl FnOnce() -> V,
    ) -> Option<&mut V> {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| Box::new(make()) as Box<dyn Any + Send + Sync>)
            .downcast_mut::<V>()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}
