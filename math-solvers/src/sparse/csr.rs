//! Row-compressed storage for pencil matrices
//!
//! Pencil matrices (`L`, `M` and the right preconditioner) arrive from the
//! discretization in this format.

use crate::traits::{ComplexField, LinearOperator};
use ndarray::{Array1, Array2};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Sparse matrix in compressed row layout
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T: ComplexField> {
    pub num_rows: usize,
    pub num_cols: usize,
    /// Stored entries, row by row
    pub values: Vec<T>,
    pub col_indices: Vec<usize>,
    /// Row `i` occupies `row_ptrs[i]..row_ptrs[i + 1]`
    pub row_ptrs: Vec<usize>,
}

impl<T: ComplexField> CsrMatrix<T> {
    /// Keep the entries of `dense` whose magnitude exceeds `threshold`
    pub fn from_dense(dense: &Array2<T>, threshold: T::Real) -> Self {
        let (num_rows, num_cols) = dense.dim();

        let mut values = Vec::new();
        let mut col_indices = Vec::new();
        let mut row_ptrs = vec![0usize; num_rows + 1];

        for i in 0..num_rows {
            for j in 0..num_cols {
                let val = dense[[i, j]];
                if val.norm() > threshold {
                    values.push(val);
                    col_indices.push(j);
                }
            }
            row_ptrs[i + 1] = values.len();
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Build from `(row, col, value)` triplets in any order, summing repeats
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        triplets.sort_by_key(|&(row, col, _)| (row, col));

        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            assert!(
                row < num_rows && col < num_cols,
                "Triplet ({}, {}) outside {}x{} matrix",
                row,
                col,
                num_rows,
                num_cols
            );
            if last == Some((row, col)) {
                if let Some(prev) = values.last_mut() {
                    *prev += val;
                }
            } else {
                values.push(val);
                col_indices.push(col);
                row_counts[row] += 1;
                last = Some((row, col));
            }
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        for count in row_counts {
            let next = row_ptrs[row_ptrs.len() - 1] + count;
            row_ptrs.push(next);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Stored entry count
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    /// `(col, value)` pairs stored in `row`
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, T)> + '_ {
        let range = self.row_range(row);
        self.col_indices[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// Every stored entry as `(row, col, value)`
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.num_rows).flat_map(move |i| self.row_entries(i).map(move |(j, v)| (i, j, v)))
    }

    /// `A x`, row-parallel under the `rayon` feature for large matrices
    pub fn matvec(&self, x: &Array1<T>) -> Array1<T> {
        assert_eq!(x.len(), self.num_cols, "Input vector size mismatch");

        #[cfg(feature = "rayon")]
        {
            if self.num_rows >= 256 {
                return self.matvec_parallel(x);
            }
        }

        self.matvec_sequential(x)
    }

    fn matvec_sequential(&self, x: &Array1<T>) -> Array1<T> {
        Array1::from_iter((0..self.num_rows).map(|i| self.row_dot(i, x)))
    }

    #[cfg(feature = "rayon")]
    fn matvec_parallel(&self, x: &Array1<T>) -> Array1<T> {
        Array1::from_vec(
            (0..self.num_rows)
                .into_par_iter()
                .map(|i| self.row_dot(i, x))
                .collect(),
        )
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &Array1<T>) -> T {
        let mut sum = T::zero();
        for (j, v) in self.row_entries(row) {
            sum += v * x[j];
        }
        sum
    }

    /// Entry `(i, j)`, zero when not stored
    pub fn get(&self, i: usize, j: usize) -> T {
        self.row_entries(i)
            .find(|&(col, _)| col == j)
            .map(|(_, v)| v)
            .unwrap_or_else(T::zero)
    }

    /// Multiply every stored entry by `scalar`
    pub fn scale(&mut self, scalar: T) {
        for val in &mut self.values {
            *val *= scalar;
        }
    }

    /// Return `-A`
    pub fn negated(&self) -> Self {
        let mut out = self.clone();
        out.scale(-T::one());
        out
    }

    /// Scaled sum: C = A + alpha * B
    ///
    /// Sparsity patterns may differ; entries present in either operand are kept.
    pub fn add_scaled(&self, alpha: T, other: &CsrMatrix<T>) -> CsrMatrix<T> {
        assert_eq!(
            (self.num_rows, self.num_cols),
            (other.num_rows, other.num_cols),
            "Matrix dimension mismatch in scaled addition"
        );

        let triplets = self
            .triplets()
            .chain(other.triplets().map(|(i, j, v)| (i, j, alpha * v)))
            .collect();

        CsrMatrix::from_triplets(self.num_rows, self.num_cols, triplets)
    }

    /// `n x n` identity
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Square matrix with `diag` on its diagonal
    pub fn from_diagonal(diag: &Array1<T>) -> Self {
        let n = diag.len();
        Self {
            num_rows: n,
            num_cols: n,
            values: diag.to_vec(),
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Dense copy
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());
        for (i, j, v) in self.triplets() {
            dense[[i, j]] += v;
        }
        dense
    }
}

impl<T: ComplexField> LinearOperator<T> for CsrMatrix<T> {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn apply(&self, x: &Array1<T>) -> Array1<T> {
        self.matvec(x)
    }
}
