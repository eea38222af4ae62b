// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dense multi-dimensional arrays.
//!
//! [`NdArray<T, R>`] stores `R` extents and a row-major element buffer. It
//! is the rank-N counterpart of `Box<[T]>` and inspects as an array shape,
//! so backends see one `begin_array` with all extents followed by nested
//! enter/leave brackets.
//!
//! ```rust
//! use shapecast::NdArray;
//!
//! let grid = NdArray::from_fn([2, 3], |[row, col]| row * 10 + col);
//! assert_eq!(grid.get([1, 2]), Some(&12));
//! assert_eq!(grid.as_slice(), &[0, 1, 2, 10, 11, 12]);
//! ```

use crate::error::{Error, Result};
use crate::handler::ArrayStorage;
use crate::shape::{names, TypeShape};
use crate::Inspect;

/// Row-major array of rank `R`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NdArray<T, const R: usize> {
    lengths: [usize; R],
    data: Vec<T>,
}

/// Two-dimensional array.
pub type Array2<T> = NdArray<T, 2>;

/// Three-dimensional array.
pub type Array3<T> = NdArray<T, 3>;

impl<T, const R: usize> NdArray<T, R> {
    /// Wrap `data`, which must hold exactly `product(lengths)` elements.
    pub fn new(lengths: [usize; R], data: Vec<T>) -> Result<Self> {
        let expected = lengths.iter().product::<usize>();
        if data.len() != expected {
            return Err(Error::LengthMismatch {
                type_name: std::any::type_name::<Self>().to_string(),
                expected,
                found: data.len(),
            });
        }
        Ok(Self { lengths, data })
    }

    /// Build by evaluating `f` at every index in row-major order.
    pub fn from_fn(lengths: [usize; R], mut f: impl FnMut([usize; R]) -> T) -> Self {
        let total = lengths.iter().product::<usize>();
        let mut data = Vec::with_capacity(total);
        let mut index = [0usize; R];
        for _ in 0..total {
            data.push(f(index));
            for axis in (0..R).rev() {
                index[axis] += 1;
                if index[axis] < lengths[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Self { lengths, data }
    }

    pub fn lengths(&self) -> [usize; R] {
        self.lengths
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: [usize; R]) -> Option<&T> {
        self.offset(index).and_then(|at| self.data.get(at))
    }

    pub fn get_mut(&mut self, index: [usize; R]) -> Option<&mut T> {
        self.offset(index).and_then(|at| self.data.get_mut(at))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    fn offset(&self, index: [usize; R]) -> Option<usize> {
        let mut offset = 0usize;
        for (axis, &at) in index.iter().enumerate() {
            if at >= self.lengths[axis] {
                return None;
            }
            offset = offset * self.lengths[axis] + at;
        }
        Some(offset)
    }
}

impl<T, const R: usize> Default for NdArray<T, R> {
    fn default() -> Self {
        Self {
            lengths: [0; R],
            data: Vec::new(),
        }
    }
}

impl<T: Inspect, const R: usize> ArrayStorage for NdArray<T, R> {
    type Elem = T;
    const RANK: usize = R;

    fn lengths(&self) -> Vec<usize> {
        self.lengths.to_vec()
    }

    fn elements_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn from_elements(lengths: &[usize], elements: Vec<T>) -> Result<Self> {
        let lengths: [usize; R] = lengths.try_into().map_err(|_| Error::LengthMismatch {
            type_name: names::of::<Self>().full.clone(),
            expected: R,
            found: lengths.len(),
        })?;
        Self::new(lengths, elements)
    }
}

impl<T: Inspect, const R: usize> Inspect for NdArray<T, R> {
    fn shape() -> TypeShape<Self> {
        TypeShape::array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_element_count() {
        assert!(NdArray::new([2, 2], vec![1, 2, 3, 4]).is_ok());
        let err = NdArray::new([2, 2], vec![1, 2, 3]).expect_err("short buffer");
        assert!(matches!(err, Error::LengthMismatch { expected: 4, found: 3, .. }));
    }

    #[test]
    fn test_row_major_indexing() {
        let mut grid = NdArray::from_fn([2, 3, 2], |[a, b, c]| a * 100 + b * 10 + c);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.get([1, 2, 1]), Some(&121));
        assert_eq!(grid.as_slice()[..4], [0, 1, 10, 11]);
        assert_eq!(grid.get([2, 0, 0]), None);
        if let Some(cell) = grid.get_mut([0, 0, 1]) {
            *cell = 7;
        }
        assert_eq!(grid.as_slice()[1], 7);
    }

    #[test]
    fn test_empty_extent() {
        let empty: Array2<u8> = NdArray::from_fn([0, 5], |_| 1);
        assert!(empty.is_empty());
        assert_eq!(empty.lengths(), [0, 5]);
    }
}
