// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration - constants and runtime limits
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (element name, default version)
//! - **Level 2 (Dynamic)**: `RuntimeConfig` holding `Limits`, swapped atomically
//!
//! Limits bound what a backend may ask a handler to allocate while creating
//! arrays and collections. They are seeded from the environment on first use
//! and can be replaced at any time with [`set_limits`].
//!
//! # Exemple
//!
//! ```rust
//! use shapecast::config::{self, Limits};
//!
//! config::set_limits(Limits { max_elements: 4096, ..Limits::default() });
//! assert_eq!(config::limits().max_elements, 4096);
//! ```

use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

// =======================================================================
// Static constants
// =======================================================================

/// Member name used for array/collection elements and for the value of a
/// scalar, enum or nullable described at top level.
pub const ELEMENT_NAME: &str = "";

/// Version of every type that does not declare one.
pub const DEFAULT_VERSION: u32 = 1;

/// Default cap on the number of elements a backend may request for one
/// array or collection (16M).
pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 24;

/// Default cap on array rank.
pub const DEFAULT_MAX_RANK: usize = 8;

/// Environment override for [`Limits::max_elements`].
pub const ENV_MAX_ELEMENTS: &str = "SHAPECAST_MAX_ELEMENTS";

/// Environment override for [`Limits::max_rank`].
pub const ENV_MAX_RANK: &str = "SHAPECAST_MAX_RANK";

// =======================================================================
// Runtime limits
// =======================================================================

/// Allocation limits applied to backend-supplied extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element count of a single array or collection.
    pub max_elements: usize,
    /// Maximum rank of a multi-dimensional array type.
    pub max_rank: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_elements: DEFAULT_MAX_ELEMENTS,
            max_rank: DEFAULT_MAX_RANK,
        }
    }
}

impl Limits {
    /// Build limits from `SHAPECAST_MAX_ELEMENTS` / `SHAPECAST_MAX_RANK`,
    /// falling back to the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_elements: env_usize(ENV_MAX_ELEMENTS).unwrap_or(defaults.max_elements),
            max_rank: env_usize(ENV_MAX_RANK).unwrap_or(defaults.max_rank),
        }
    }

    /// Total element count for `lengths`, rejecting overflow and anything
    /// above `max_elements`.
    pub fn check_extent(&self, lengths: &[usize]) -> Result<usize> {
        let total = lengths
            .iter()
            .try_fold(1usize, |acc, &len| acc.checked_mul(len))
            .ok_or(Error::LimitExceeded {
                requested: usize::MAX,
                limit: self.max_elements,
            })?;
        if total > self.max_elements {
            log::warn!(
                "[shapecast] backend requested {} elements (limit {})",
                total,
                self.max_elements
            );
            return Err(Error::LimitExceeded {
                requested: total,
                limit: self.max_elements,
            });
        }
        Ok(total)
    }
}

fn env_usize(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[shapecast] ignoring {}={:?}: not an unsigned integer", key, raw);
            None
        }
    }
}

/// Process-wide runtime configuration.
///
/// `ArcSwap` keeps reads on the traversal path to a single atomic load.
pub struct RuntimeConfig {
    limits: ArcSwap<Limits>,
}

impl RuntimeConfig {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits: ArcSwap::new(Arc::new(limits)),
        }
    }

    /// Current limits snapshot.
    pub fn limits(&self) -> Limits {
        **self.limits.load()
    }

    /// Replace the limits for all subsequent traversals.
    pub fn set_limits(&self, limits: Limits) {
        log::debug!("[shapecast] limits updated: {:?}", limits);
        self.limits.store(Arc::new(limits));
    }
}

static RUNTIME: OnceLock<RuntimeConfig> = OnceLock::new();

/// Global runtime configuration, seeded from the environment on first use.
pub fn runtime() -> &'static RuntimeConfig {
    RUNTIME.get_or_init(|| RuntimeConfig::new(Limits::from_env()))
}

/// Shorthand for `runtime().limits()`.
pub fn limits() -> Limits {
    runtime().limits()
}

/// Shorthand for `runtime().set_limits(limits)`.
pub fn set_limits(limits: Limits) {
    runtime().set_limits(limits);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_extent_multiplies_lengths() {
        let limits = Limits {
            max_elements: 100,
            max_rank: 4,
        };
        assert_eq!(limits.check_extent(&[4, 5]).ok(), Some(20));
        assert_eq!(limits.check_extent(&[]).ok(), Some(1));
        assert_eq!(limits.check_extent(&[0, 1000]).ok(), Some(0));
    }

    #[test]
    fn test_check_extent_rejects_over_limit() {
        let limits = Limits {
            max_elements: 10,
            max_rank: 4,
        };
        assert_eq!(
            limits.check_extent(&[3, 4]),
            Err(Error::LimitExceeded {
                requested: 12,
                limit: 10
            })
        );
    }

    #[test]
    fn test_check_extent_rejects_overflow() {
        let limits = Limits::default();
        assert!(matches!(
            limits.check_extent(&[usize::MAX, 2]),
            Err(Error::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_runtime_config_swap() {
        let config = RuntimeConfig::new(Limits::default());
        config.set_limits(Limits {
            max_elements: 7,
            max_rank: 2,
        });
        assert_eq!(config.limits().max_elements, 7);
        assert_eq!(config.limits().max_rank, 2);
    }
}
