// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by handler construction and traversal.
//!
//! Construction errors (`Shape`) surface the first time a handler is
//! requested for a type and are never cached: a later request retries the
//! build. Traversal errors propagate unchanged through nested handlers so
//! that the backend sees the innermost failure.

/// Errors returned by handler construction and by Describe/Create traversal.
///
/// # Example
///
/// ```rust
/// use shapecast::{handler, Error};
///
/// #[derive(shapecast::Inspect)]
/// #[inspect(version = 2, describe = "Self::describe_now")]
/// struct Broken {
///     level: u8,
/// }
///
/// impl Broken {
///     fn describe_now(&mut self, ins: &mut dyn shapecast::Inspector) -> shapecast::Result<()> {
///         ins.member("level", &mut self.level)
///     }
/// }
///
/// // Version 2 needs a legacy describe for version 1 payloads.
/// match handler::<Broken>() {
///     Err(Error::Shape { reason, .. }) => println!("rejected: {}", reason),
///     Err(e) => println!("other error: {}", e),
///     Ok(_) => println!("accepted"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// A type claims a capability but the member backing it is missing,
    /// or its shape cannot be synthesized.
    Shape {
        declared: String,
        concrete: String,
        reason: String,
    },
    /// Create requested on a type with no construction path.
    NotConstructible { type_name: String },

    // ========================================================================
    // Version Errors
    // ========================================================================
    /// Requested version is newer than the type understands. Fatal.
    VersionOverflow {
        type_name: String,
        requested: u32,
        latest: u32,
    },

    // ========================================================================
    // Traversal Errors
    // ========================================================================
    /// A backend returned without populating a value it was asked to create.
    Unpopulated { type_name: String, member: String },
    /// Integral value has no matching enum variant.
    InvalidDiscriminant { type_name: String, value: i64 },
    /// Fixed-extent array received a different element count.
    LengthMismatch {
        type_name: String,
        expected: usize,
        found: usize,
    },
    /// Backend-supplied extent exceeds the configured limit.
    LimitExceeded { requested: usize, limit: usize },
    /// No subtype registered under the requested name.
    UnknownSubtype { declared: String, name: String },
    /// Backend supplied a value of the wrong kind.
    TypeMismatch { expected: String, found: String },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Failure reported by an inspector backend.
    Backend(String),
}

impl Error {
    /// Backend failure with a free-form message.
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// True for errors that abort the whole traversal regardless of
    /// backend policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::VersionOverflow { .. } | Error::Shape { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Construction
            Error::Shape {
                declared,
                concrete,
                reason,
            } => {
                if declared == concrete {
                    write!(f, "Invalid shape for {}: {}", concrete, reason)
                } else {
                    write!(
                        f,
                        "Invalid shape for {} (declared as {}): {}",
                        concrete, declared, reason
                    )
                }
            }
            Error::NotConstructible { type_name } => {
                write!(f, "{} has no construction path", type_name)
            }
            // Version
            Error::VersionOverflow {
                type_name,
                requested,
                latest,
            } => write!(
                f,
                "Version overflow: {} requested v{} but only understands up to v{}",
                type_name, requested, latest
            ),
            // Traversal
            Error::Unpopulated { type_name, member } => {
                write!(f, "Member '{}' of type {} was not populated", member, type_name)
            }
            Error::InvalidDiscriminant { type_name, value } => {
                write!(f, "Invalid discriminant {} for enum {}", value, type_name)
            }
            Error::LengthMismatch {
                type_name,
                expected,
                found,
            } => write!(
                f,
                "Length mismatch for {}: expected {} elements, found {}",
                type_name, expected, found
            ),
            Error::LimitExceeded { requested, limit } => write!(
                f,
                "Element limit exceeded: {} requested (limit {})",
                requested, limit
            ),
            Error::UnknownSubtype { declared, name } => {
                write!(f, "Unknown subtype '{}' for {}", name, declared)
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            // Backend
            Error::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for API results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;
