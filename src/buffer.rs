// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Fixed-length numeric containers for host-side buffers.
//!
//! A [`FixedVector`] is a flat vector whose length is part of its type. It
//! never carries a row/column interpretation; laying values out as a grid is
//! the job of [`crate::grid`].

use std::ops::{Index, IndexMut};

/// A numeric element type that can be staged to and from device memory.
///
/// The bounds match what device transfers need: plain-old-data that is cheap
/// to copy and safe to hand to another thread.
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Element name recorded in transfer and footprint log lines.
    const NAME: &'static str;

    /// Size of one element in bytes.
    #[must_use]
    fn size_in_bytes() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Convert a flat index to an element value.
    ///
    /// Used to build the deterministic `x[k] = k` inputs.
    fn from_index(index: usize) -> Self;
}

impl Element for f32 {
    const NAME: &'static str = "f32";

    #[allow(clippy::cast_precision_loss)]
    fn from_index(index: usize) -> Self {
        index as f32
    }
}

impl Element for f64 {
    const NAME: &'static str = "f64";

    #[allow(clippy::cast_precision_loss)]
    fn from_index(index: usize) -> Self {
        index as f64
    }
}

impl Element for i32 {
    const NAME: &'static str = "i32";

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn from_index(index: usize) -> Self {
        index as i32
    }
}

/// A flat, fixed-length vector of `N` elements.
///
/// ```rust
/// use vector_combine::FixedVector;
///
/// let v = FixedVector::<f32, 4>::indexed();
/// assert_eq!(v.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedVector<T: Element, const N: usize> {
    data: [T; N],
}

impl<T: Element, const N: usize> Default for FixedVector<T, N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<T: Element, const N: usize> FixedVector<T, N> {
    /// Number of elements.
    pub const LEN: usize = N;

    /// All elements set to `T::default()`.
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            data: [T::default(); N],
        }
    }

    /// Build from a function of the flat index.
    pub fn from_fn(f: impl FnMut(usize) -> T) -> Self {
        Self {
            data: std::array::from_fn(f),
        }
    }

    /// Element `k` is `k`.
    #[must_use]
    pub fn indexed() -> Self {
        Self::from_fn(T::from_index)
    }

    /// Copy from a slice of exactly `N` elements.
    ///
    /// # Errors
    ///
    /// Returns `CombineError::ShapeMismatch` if `values.len() != N`.
    pub fn try_from_slice(values: &[T]) -> crate::Result<Self> {
        let data: [T; N] = values
            .try_into()
            .map_err(|_| crate::CombineError::shape_mismatch(N, values.len()))?;
        Ok(Self { data })
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// `true` when `N == 0`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Size of the contents in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        N * T::size_in_bytes()
    }

    /// Borrow as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Borrow as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Consume into the backing array.
    #[must_use]
    pub fn into_array(self) -> [T; N] {
        self.data
    }
}

impl<T: Element, const N: usize> From<[T; N]> for FixedVector<T, N> {
    fn from(data: [T; N]) -> Self {
        Self { data }
    }
}

impl<T: Element, const N: usize> Index<usize> for FixedVector<T, N> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[index]
    }
}

impl<T: Element, const N: usize> IndexMut<usize> for FixedVector<T, N> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.data[index]
    }
}

impl<'a, T: Element, const N: usize> IntoIterator for &'a FixedVector<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_sizes() {
        assert_eq!(f32::size_in_bytes(), 4);
        assert_eq!(f64::size_in_bytes(), 8);
        assert_eq!(i32::size_in_bytes(), 4);
        assert_eq!(f32::NAME, "f32");
    }

    #[test]
    fn test_indexed_sets_value_to_flat_index() {
        let v = FixedVector::<f32, 16>::indexed();
        for k in 0..16 {
            #[allow(clippy::cast_precision_loss)]
            let expected = k as f32;
            assert_eq!(v[k], expected);
        }
    }

    #[test]
    fn test_zeroed_and_size() {
        let v = FixedVector::<f32, 16>::zeroed();
        assert!(v.iter().all(|&x| x == 0.0));
        assert_eq!(v.len(), 16);
        assert_eq!(v.size_in_bytes(), 64);
        assert!(!v.is_empty());
        assert!(FixedVector::<f32, 0>::zeroed().is_empty());
    }

    #[test]
    fn test_try_from_slice_checks_length() {
        let ok = FixedVector::<i32, 3>::try_from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(ok.into_array(), [1, 2, 3]);

        let err = FixedVector::<i32, 3>::try_from_slice(&[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            crate::CombineError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_index_mut() {
        let mut v = FixedVector::<f64, 2>::from([1.0, 2.0]);
        v[1] = 5.0;
        v.as_mut_slice()[0] = 4.0;
        assert_eq!(v.as_slice(), &[4.0, 5.0]);
    }
}
