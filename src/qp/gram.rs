//! Append-only symmetric Gram matrix with fixed capacity
//!
//! The bundle driver grows the matrix by one row/column per outer iteration
//! and never recomputes old entries. Storage is column-major with a fixed
//! stride equal to the capacity, so each logical column is a contiguous
//! slice regardless of the current size. This is exactly the layout the
//! generalized-SMO solver wants through the [`ColumnOracle`] trait.

use crate::core::ColumnOracle;

/// Dense symmetric matrix sized for a maximum of `capacity` rows/columns
#[derive(Debug, Clone)]
pub struct GramMatrix {
    capacity: usize,
    n: usize,
    values: Vec<f64>,
    diag: Vec<f64>,
}

impl GramMatrix {
    /// Create an empty matrix with room for `capacity` rows/columns
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            n: 0,
            values: vec![0.0; capacity * capacity],
            diag: vec![0.0; capacity],
        }
    }

    /// Current number of rows/columns
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Maximum number of rows/columns
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.n == self.capacity
    }

    /// Entry `(i, j)`; panics when out of the current size
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n);
        self.values[j * self.capacity + i]
    }

    /// Append one row/column.
    ///
    /// `products[i]` is the new entry `(i, n)` for `i <= n` where `n` is the
    /// current size; the last element is the new diagonal entry. Both the new
    /// row and the new column are written so symmetry holds by construction.
    ///
    /// # Panics
    /// Panics when the matrix is full or `products` has the wrong length.
    pub fn extend(&mut self, products: &[f64]) {
        assert!(!self.is_full(), "Gram matrix is at capacity");
        let n = self.n;
        assert_eq!(products.len(), n + 1, "need one product per existing row plus the diagonal");

        for (i, &value) in products.iter().enumerate() {
            self.values[n * self.capacity + i] = value;
            self.values[i * self.capacity + n] = value;
        }
        self.diag[n] = products[n];
        self.n += 1;
    }

    /// Compact rows and columns down to the given positions.
    ///
    /// `keep` must be strictly ascending positions below the current size.
    /// Entry `(keep[i], keep[j])` moves to `(i, j)`; since every destination
    /// index is at most its source index, the in-place copy never reads an
    /// already overwritten cell.
    pub fn compact(&mut self, keep: &[usize]) {
        debug_assert!(keep.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(keep.last().map_or(true, |&p| p < self.n));

        for (new_j, &old_j) in keep.iter().enumerate() {
            for (new_i, &old_i) in keep.iter().enumerate() {
                self.values[new_j * self.capacity + new_i] =
                    self.values[old_j * self.capacity + old_i];
            }
        }
        for (new_i, &old_i) in keep.iter().enumerate() {
            self.diag[new_i] = self.diag[old_i];
        }
        self.n = keep.len();
    }
}

impl ColumnOracle for GramMatrix {
    fn column(&self, j: usize) -> &[f64] {
        debug_assert!(j < self.n);
        &self.values[j * self.capacity..j * self.capacity + self.n]
    }

    fn diagonal(&self) -> &[f64] {
        &self.diag[..self.n]
    }
}
