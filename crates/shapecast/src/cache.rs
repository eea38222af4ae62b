// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide handler cache.
//!
//! Handlers are keyed by `TypeId` and built at most once per winning
//! insertion. Building runs without holding any lock (a handler build may
//! request other handlers), then the result is inserted with
//! insert-if-absent semantics: when two threads race on the same type, the
//! first insertion wins, the loser's handler is discarded and every caller
//! receives the winner. Entries are never evicted or replaced.
//!
//! Construction failures are returned to the caller and not cached. A
//! handler is inserted only after every child handler it contains has
//! resolved, so a contained type's shape error surfaces when the parent is
//! built. Children still being built further up the same thread's stack
//! (recursive types) are left to resolve on first use.
//!
//! The same map family also holds one polymorphic table per declared base
//! trait (see [`crate::poly`]).

use crate::error::{Error, Result};
use crate::handler::{builder, TypeHandler};
use crate::poly::{Object, PolyTable, SubtypeHandler};
use crate::Inspect;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

thread_local! {
    /// Types whose handlers are being built on this thread, outermost first.
    static BUILDING: RefCell<Vec<TypeId>> = const { RefCell::new(Vec::new()) };
}

/// True if `id` is being built further up this thread's stack.
pub(crate) fn is_building(id: TypeId) -> bool {
    BUILDING.with(|stack| stack.borrow().contains(&id))
}

/// Marks a type as in progress until dropped.
struct BuildGuard;

impl BuildGuard {
    fn enter(id: TypeId) -> Self {
        BUILDING.with(|stack| stack.borrow_mut().push(id));
        BuildGuard
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        BUILDING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Cache hit/miss statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Builds discarded because another thread inserted first.
    pub races_lost: u64,
    pub last_build_ns: u64,
}

/// Concurrent `TypeId -> handler` map.
pub struct HandlerCache {
    handlers: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    polymorphic: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    hits: AtomicU64,
    misses: AtomicU64,
    races_lost: AtomicU64,
    last_build_ns: AtomicU64,
}

impl Default for HandlerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            polymorphic: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            races_lost: AtomicU64::new(0),
            last_build_ns: AtomicU64::new(0),
        }
    }

    /// Handler for `T`, building it on first request.
    pub fn handler<T: Inspect>(&self) -> Result<Arc<TypeHandler<T>>> {
        let id = TypeId::of::<T>();
        if let Some(hit) = self.handlers.get(&id) {
            let hit = Arc::clone(hit.value());
            self.hits.fetch_add(1, Ordering::Relaxed);
            return downcast_handler::<T>(hit);
        }

        let start = Instant::now();
        let built = {
            let _guard = BuildGuard::enter(id);
            let handler = builder::build::<T>()?;
            handler.preload_children()?;
            handler
        };
        let built: Arc<dyn Any + Send + Sync> = Arc::new(built);
        let winner = Arc::clone(
            self.handlers
                .entry(id)
                .or_insert_with(|| Arc::clone(&built))
                .value(),
        );
        let won = Arc::ptr_eq(&winner, &built);
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.last_build_ns.store(
            u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX),
            Ordering::Relaxed,
        );
        if !won {
            self.races_lost.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "[shapecast] discarded duplicate handler for {}",
                std::any::type_name::<T>()
            );
        }
        downcast_handler::<T>(winner)
    }

    /// Polymorphic table for base `B`, created empty on first request.
    pub(crate) fn poly_table<B: ?Sized + Object>(&self) -> Arc<PolyTable<B>> {
        let id = TypeId::of::<B>();
        let entry = match self.polymorphic.get(&id) {
            Some(hit) => Arc::clone(hit.value()),
            None => Arc::clone(
                self.polymorphic
                    .entry(id)
                    .or_insert_with(|| Arc::new(PolyTable::<B>::new()))
                    .value(),
            ),
        };
        match entry.downcast::<PolyTable<B>>() {
            Ok(table) => table,
            // Keyed by TypeId::of::<B>(), so the entry is always a PolyTable<B>.
            Err(_) => Arc::new(PolyTable::<B>::new()),
        }
    }

    /// Number of cached handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// True if a handler for `T` is already cached.
    pub fn contains<T: Inspect>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<T>())
    }

    /// Snapshot of the counters. Each field is read independently.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            races_lost: self.races_lost.load(Ordering::Relaxed),
            last_build_ns: self.last_build_ns.load(Ordering::Relaxed),
        }
    }
}

fn downcast_handler<T: Inspect>(entry: Arc<dyn Any + Send + Sync>) -> Result<Arc<TypeHandler<T>>> {
    entry
        .downcast::<TypeHandler<T>>()
        .map_err(|_| Error::TypeMismatch {
            expected: std::any::type_name::<TypeHandler<T>>().to_string(),
            found: "foreign cache entry".to_string(),
        })
}

static GLOBAL: OnceLock<HandlerCache> = OnceLock::new();

/// The process-wide cache.
pub fn global() -> &'static HandlerCache {
    GLOBAL.get_or_init(HandlerCache::new)
}

/// Handler for `T` from the process-wide cache.
///
/// Repeated calls return the same `Arc`. Safe to call from any thread.
pub fn handler<T: Inspect>() -> Result<Arc<TypeHandler<T>>> {
    global().handler::<T>()
}

/// Handler for the runtime type of `value`, seen through base `B`.
///
/// ```rust
/// use shapecast::{polymorphic, runtime_handler, Inspect, Object};
///
/// trait Shape: Object {}
/// polymorphic!(dyn Shape);
///
/// #[derive(Inspect, Default)]
/// struct Circle {
///     radius: f64,
/// }
/// impl Shape for Circle {}
///
/// let value: Box<dyn Shape> = Box::new(Circle { radius: 2.0 });
/// let handler = runtime_handler::<dyn Shape>(&*value).unwrap();
/// assert_eq!(handler.names().short, "Circle");
/// ```
pub fn runtime_handler<B: ?Sized + Object>(value: &B) -> Result<Arc<SubtypeHandler<B>>> {
    global().poly_table::<B>().adapter_for(value)
}

/// Statistics of the process-wide cache.
pub fn stats() -> CacheStats {
    global().stats()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_lookup_is_a_hit() {
        let cache = HandlerCache::new();
        let first = cache.handler::<u32>().expect("u32 handler");
        let second = cache.handler::<u32>().expect("u32 handler");
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.races_lost, 0);
        assert!(cache.contains::<u32>());
        assert!(!cache.contains::<u64>());
    }

    #[test]
    fn test_build_guard_pops_on_drop() {
        struct Marker;
        let id = TypeId::of::<Marker>();
        {
            let _outer = BuildGuard::enter(id);
            assert!(is_building(id));
        }
        assert!(!is_building(id));
    }

    #[test]
    fn test_concurrent_hits_are_all_counted() {
        let cache = Arc::new(HandlerCache::new());
        cache.handler::<u16>().expect("u16");
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        cache.handler::<u16>().expect("u16");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker");
        }
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1000);
    }

    #[test]
    fn test_distinct_types_get_distinct_entries() {
        let cache = HandlerCache::new();
        cache.handler::<i8>().expect("i8");
        cache.handler::<Vec<i8>>().expect("Vec<i8>");
        assert_eq!(cache.len(), 2);
    }
}
