// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `Inspect` for standard library types.

use crate::contract::Inspector;
use crate::poly::Object;
use crate::shape::{RecordShape, TypeShape};
use crate::Inspect;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;

macro_rules! inspect_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Inspect for $ty {
                fn shape() -> TypeShape<Self> {
                    TypeShape::scalar()
                }
            }
        )*
    };
}

inspect_scalar!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, char, String);

impl<U: Inspect> Inspect for Option<U> {
    fn shape() -> TypeShape<Self> {
        TypeShape::nullable()
    }
}

impl<U: Inspect> Inspect for Box<U> {
    fn shape() -> TypeShape<Self> {
        TypeShape::boxed()
    }
}

impl<U: Inspect, const N: usize> Inspect for [U; N] {
    fn shape() -> TypeShape<Self> {
        TypeShape::array()
    }
}

impl<U: Inspect> Inspect for Box<[U]> {
    fn shape() -> TypeShape<Self> {
        TypeShape::array()
    }
}

impl<U: Inspect> Inspect for Vec<U> {
    fn shape() -> TypeShape<Self> {
        TypeShape::collection()
    }
}

impl<U: Inspect> Inspect for VecDeque<U> {
    fn shape() -> TypeShape<Self> {
        TypeShape::collection()
    }
}

impl<U: Inspect + Ord> Inspect for BTreeSet<U> {
    fn shape() -> TypeShape<Self> {
        TypeShape::collection()
    }
}

impl<U: Inspect + Eq + Hash> Inspect for HashSet<U> {
    fn shape() -> TypeShape<Self> {
        TypeShape::collection()
    }
}

impl<K: Inspect + Ord, V: Inspect> Inspect for BTreeMap<K, V> {
    fn shape() -> TypeShape<Self> {
        TypeShape::collection()
    }
}

impl<K: Inspect + Eq + Hash, V: Inspect> Inspect for HashMap<K, V> {
    fn shape() -> TypeShape<Self> {
        TypeShape::collection()
    }
}

/// Untyped polymorphic member; any registered inspectable type.
impl Inspect for Box<dyn Object> {
    fn shape() -> TypeShape<Self> {
        TypeShape::polymorphic()
    }
}

/// Heterogeneous list of inspectable values.
pub type ObjectList = Vec<Box<dyn Object>>;

// Tuples are records with positional member names.
macro_rules! inspect_tuple {
    ($(($($name:ident : $idx:tt),+))*) => {
        $(
            impl<$($name: Inspect),+> Inspect for ($($name,)+) {
                fn shape() -> TypeShape<Self> {
                    TypeShape::Record(
                        RecordShape::<Self>::new()
                            $(.field::<$name>(stringify!($idx), |value: &mut Self| &mut value.$idx))+
                            .assemble_with(|inspector: &mut dyn Inspector, _version: u32| {
                                Ok(($(inspector.create_member::<$name>(stringify!($idx))?,)+))
                            }),
                    )
                }
            }
        )*
    };
}

inspect_tuple! {
    (A: 0)
    (A: 0, B: 1)
    (A: 0, B: 1, C: 2)
    (A: 0, B: 1, C: 2, D: 3)
}
