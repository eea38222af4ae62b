// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Version routing for self-describing types.
//!
//! A self-describing type declares the newest version it understands. Older
//! requests go to its legacy method; newer requests are fatal, since the
//! payload may carry members the type cannot represent.

use crate::error::{Error, Result};
use crate::shape::TypeNames;

/// Which self-describe method serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Current,
    /// Legacy method, called with the requested version.
    Legacy(u32),
}

/// Fail with `VersionOverflow` when `requested` is newer than `latest`.
pub fn check(names: &TypeNames, latest: u32, requested: u32) -> Result<()> {
    if requested > latest {
        log::error!(
            "[shapecast] {} asked for v{} but only understands up to v{}",
            names.full,
            requested,
            latest
        );
        return Err(Error::VersionOverflow {
            type_name: names.full.clone(),
            requested,
            latest,
        });
    }
    Ok(())
}

/// Route a request: the latest version (or any version when no legacy
/// method exists) goes to the current method, older ones to legacy.
pub fn route(names: &TypeNames, latest: u32, requested: u32, has_legacy: bool) -> Result<Route> {
    check(names, latest, requested)?;
    if requested == latest || !has_legacy {
        Ok(Route::Current)
    } else {
        Ok(Route::Legacy(requested))
    }
}
