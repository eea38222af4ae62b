// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Primitive values exchanged with backends.
//!
//! [`ScalarMut`] borrows a primitive in place (Field registration), while
//! [`ScalarValue`] owns one (Property registration, enum reprs, in-memory
//! trees). Both cover the same closed set of [`ScalarKind`]s.

use crate::error::{Error, Result};

/// Closed set of primitives a backend must understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
}

impl ScalarKind {
    /// True for the eight integer kinds usable as an enum repr.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::I64
                | ScalarKind::U8
                | ScalarKind::U16
                | ScalarKind::U32
                | ScalarKind::U64
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
        }
    }
}

/// Mutable borrow of a primitive member.
#[derive(Debug)]
pub enum ScalarMut<'a> {
    Bool(&'a mut bool),
    I8(&'a mut i8),
    I16(&'a mut i16),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U8(&'a mut u8),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Char(&'a mut char),
    String(&'a mut String),
}

impl ScalarMut<'_> {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarMut::Bool(_) => ScalarKind::Bool,
            ScalarMut::I8(_) => ScalarKind::I8,
            ScalarMut::I16(_) => ScalarKind::I16,
            ScalarMut::I32(_) => ScalarKind::I32,
            ScalarMut::I64(_) => ScalarKind::I64,
            ScalarMut::U8(_) => ScalarKind::U8,
            ScalarMut::U16(_) => ScalarKind::U16,
            ScalarMut::U32(_) => ScalarKind::U32,
            ScalarMut::U64(_) => ScalarKind::U64,
            ScalarMut::F32(_) => ScalarKind::F32,
            ScalarMut::F64(_) => ScalarKind::F64,
            ScalarMut::Char(_) => ScalarKind::Char,
            ScalarMut::String(_) => ScalarKind::String,
        }
    }

    /// Owned copy of the current value.
    pub fn get(&self) -> ScalarValue {
        match self {
            ScalarMut::Bool(v) => ScalarValue::Bool(**v),
            ScalarMut::I8(v) => ScalarValue::I8(**v),
            ScalarMut::I16(v) => ScalarValue::I16(**v),
            ScalarMut::I32(v) => ScalarValue::I32(**v),
            ScalarMut::I64(v) => ScalarValue::I64(**v),
            ScalarMut::U8(v) => ScalarValue::U8(**v),
            ScalarMut::U16(v) => ScalarValue::U16(**v),
            ScalarMut::U32(v) => ScalarValue::U32(**v),
            ScalarMut::U64(v) => ScalarValue::U64(**v),
            ScalarMut::F32(v) => ScalarValue::F32(**v),
            ScalarMut::F64(v) => ScalarValue::F64(**v),
            ScalarMut::Char(v) => ScalarValue::Char(**v),
            ScalarMut::String(v) => ScalarValue::String((**v).clone()),
        }
    }

    /// Overwrite the borrowed primitive. Kinds must match exactly.
    pub fn set(&mut self, value: ScalarValue) -> Result<()> {
        match (self, value) {
            (ScalarMut::Bool(slot), ScalarValue::Bool(v)) => **slot = v,
            (ScalarMut::I8(slot), ScalarValue::I8(v)) => **slot = v,
            (ScalarMut::I16(slot), ScalarValue::I16(v)) => **slot = v,
            (ScalarMut::I32(slot), ScalarValue::I32(v)) => **slot = v,
            (ScalarMut::I64(slot), ScalarValue::I64(v)) => **slot = v,
            (ScalarMut::U8(slot), ScalarValue::U8(v)) => **slot = v,
            (ScalarMut::U16(slot), ScalarValue::U16(v)) => **slot = v,
            (ScalarMut::U32(slot), ScalarValue::U32(v)) => **slot = v,
            (ScalarMut::U64(slot), ScalarValue::U64(v)) => **slot = v,
            (ScalarMut::F32(slot), ScalarValue::F32(v)) => **slot = v,
            (ScalarMut::F64(slot), ScalarValue::F64(v)) => **slot = v,
            (ScalarMut::Char(slot), ScalarValue::Char(v)) => **slot = v,
            (ScalarMut::String(slot), ScalarValue::String(v)) => **slot = v,
            (slot, value) => {
                return Err(Error::TypeMismatch {
                    expected: slot.kind().name().to_string(),
                    found: value.kind().name().to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Owned primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
}

impl ScalarValue {
    pub fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Bool(_) => ScalarKind::Bool,
            ScalarValue::I8(_) => ScalarKind::I8,
            ScalarValue::I16(_) => ScalarKind::I16,
            ScalarValue::I32(_) => ScalarKind::I32,
            ScalarValue::I64(_) => ScalarKind::I64,
            ScalarValue::U8(_) => ScalarKind::U8,
            ScalarValue::U16(_) => ScalarKind::U16,
            ScalarValue::U32(_) => ScalarKind::U32,
            ScalarValue::U64(_) => ScalarKind::U64,
            ScalarValue::F32(_) => ScalarKind::F32,
            ScalarValue::F64(_) => ScalarKind::F64,
            ScalarValue::Char(_) => ScalarKind::Char,
            ScalarValue::String(_) => ScalarKind::String,
        }
    }

    /// Borrow as a Field-style cell.
    pub fn as_mut(&mut self) -> ScalarMut<'_> {
        match self {
            ScalarValue::Bool(v) => ScalarMut::Bool(v),
            ScalarValue::I8(v) => ScalarMut::I8(v),
            ScalarValue::I16(v) => ScalarMut::I16(v),
            ScalarValue::I32(v) => ScalarMut::I32(v),
            ScalarValue::I64(v) => ScalarMut::I64(v),
            ScalarValue::U8(v) => ScalarMut::U8(v),
            ScalarValue::U16(v) => ScalarMut::U16(v),
            ScalarValue::U32(v) => ScalarMut::U32(v),
            ScalarValue::U64(v) => ScalarMut::U64(v),
            ScalarValue::F32(v) => ScalarMut::F32(v),
            ScalarValue::F64(v) => ScalarMut::F64(v),
            ScalarValue::Char(v) => ScalarMut::Char(v),
            ScalarValue::String(v) => ScalarMut::String(v),
        }
    }

    /// Widen an integral value. `None` for non-integral kinds and for
    /// `u64` values above `i64::MAX`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            ScalarValue::I8(v) => Some(i64::from(v)),
            ScalarValue::I16(v) => Some(i64::from(v)),
            ScalarValue::I32(v) => Some(i64::from(v)),
            ScalarValue::I64(v) => Some(v),
            ScalarValue::U8(v) => Some(i64::from(v)),
            ScalarValue::U16(v) => Some(i64::from(v)),
            ScalarValue::U32(v) => Some(i64::from(v)),
            ScalarValue::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Narrow `raw` into the integral `kind`. `None` when out of range or
    /// when `kind` is not integral.
    pub fn from_i64(kind: ScalarKind, raw: i64) -> Option<Self> {
        Some(match kind {
            ScalarKind::I8 => ScalarValue::I8(i8::try_from(raw).ok()?),
            ScalarKind::I16 => ScalarValue::I16(i16::try_from(raw).ok()?),
            ScalarKind::I32 => ScalarValue::I32(i32::try_from(raw).ok()?),
            ScalarKind::I64 => ScalarValue::I64(raw),
            ScalarKind::U8 => ScalarValue::U8(u8::try_from(raw).ok()?),
            ScalarKind::U16 => ScalarValue::U16(u16::try_from(raw).ok()?),
            ScalarKind::U32 => ScalarValue::U32(u32::try_from(raw).ok()?),
            ScalarKind::U64 => ScalarValue::U64(u64::try_from(raw).ok()?),
            _ => return None,
        })
    }
}

/// Rust primitive that maps onto one [`ScalarKind`].
pub trait Scalar: Default + Clone + Send + Sync + 'static {
    const KIND: ScalarKind;

    fn scalar_mut(&mut self) -> ScalarMut<'_>;

    fn to_scalar(&self) -> ScalarValue;

    fn from_scalar(value: ScalarValue) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const KIND: ScalarKind = ScalarKind::$variant;

                fn scalar_mut(&mut self) -> ScalarMut<'_> {
                    ScalarMut::$variant(self)
                }

                fn to_scalar(&self) -> ScalarValue {
                    ScalarValue::$variant(self.clone())
                }

                fn from_scalar(value: ScalarValue) -> Option<Self> {
                    match value {
                        ScalarValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_through_borrow() {
        let mut value = 5i32;
        let mut cell = value.scalar_mut();
        cell.set(ScalarValue::I32(42)).expect("same kind");
        assert_eq!(value, 42);
    }

    #[test]
    fn test_set_rejects_other_kind() {
        let mut value = String::from("a");
        let mut cell = value.scalar_mut();
        let err = cell.set(ScalarValue::U8(1)).expect_err("kind mismatch");
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: "String".to_string(),
                found: "u8".to_string()
            }
        );
        assert_eq!(value, "a");
    }

    #[test]
    fn test_integral_narrowing() {
        assert_eq!(
            ScalarValue::from_i64(ScalarKind::U8, 255),
            Some(ScalarValue::U8(255))
        );
        assert_eq!(ScalarValue::from_i64(ScalarKind::U8, 256), None);
        assert_eq!(ScalarValue::from_i64(ScalarKind::F32, 1), None);
        assert_eq!(ScalarValue::U64(u64::MAX).as_i64(), None);
        assert_eq!(ScalarValue::I16(-3).as_i64(), Some(-3));
    }

    #[test]
    fn test_kind_names_are_integral_only_for_integers() {
        assert!(ScalarKind::U64.is_integral());
        assert!(!ScalarKind::Char.is_integral());
        assert!(!ScalarKind::Bool.is_integral());
    }
}
