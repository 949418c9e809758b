// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Matrix storage
//!
//! `A` and `H` are consumed by the rest of this crate only through `matvec`/`rmatvec`/`to_dense`,
//! so callers may supply either a dense matrix or a sparse one without the kernel caring which.
//! Factorizations (Cholesky/LU/QR in [`crate::projections`] and [`crate::kkt`]) always operate on
//! the densified form.

use nalgebra::DMatrix;

/// A sparse matrix stored as a row-sorted coordinate (triplet) list.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    nrows: usize,
    ncols: usize,
    /// (row, col, value) triplets.
    triplets: Vec<(usize, usize, f64)>,
}

impl SparseMatrix {
    /// Build a sparse matrix from an explicit triplet list.
    pub fn from_triplets(nrows: usize, ncols: usize, triplets: Vec<(usize, usize, f64)>) -> Self {
        for &(r, c, _) in &triplets {
            assert!(r < nrows && c < ncols, "triplet index out of bounds");
        }
        SparseMatrix {
            nrows,
            ncols,
            triplets,
        }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `A v`.
    pub fn matvec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.ncols);
        let mut out = vec![0.0; self.nrows];
        for &(r, c, val) in &self.triplets {
            out[r] += val * v[c];
        }
        out
    }

    /// `Aᵀ v`.
    pub fn rmatvec(&self, v: &[f64]) -> Vec<f64> {
        assert_eq!(v.len(), self.nrows);
        let mut out = vec![0.0; self.ncols];
        for &(r, c, val) in &self.triplets {
            out[c] += val * v[r];
        }
        out
    }

    /// Materialize as a dense `nalgebra::DMatrix<f64>`.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut m = DMatrix::<f64>::zeros(self.nrows, self.ncols);
        for &(r, c, val) in &self.triplets {
            m[(r, c)] += val;
        }
        m
    }
}

/// Dense-or-sparse matrix, as consumed by the rest of the kernel.
#[derive(Debug, Clone)]
pub enum EqpMatrix {
    /// Dense storage (`nalgebra::DMatrix<f64>`).
    Dense(DMatrix<f64>),
    /// Sparse (coordinate-list) storage.
    Sparse(SparseMatrix),
}

impl EqpMatrix {
    /// Build a dense matrix from row-major data.
    pub fn from_row_slice(nrows: usize, ncols: usize, data: &[f64]) -> Self {
        EqpMatrix::Dense(DMatrix::from_row_slice(nrows, ncols, data))
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        match self {
            EqpMatrix::Dense(m) => m.nrows(),
            EqpMatrix::Sparse(m) => m.nrows(),
        }
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        match self {
            EqpMatrix::Dense(m) => m.ncols(),
            EqpMatrix::Sparse(m) => m.ncols(),
        }
    }

    /// `A v`.
    pub fn matvec(&self, v: &[f64]) -> Vec<f64> {
        match self {
            EqpMatrix::Dense(m) => {
                assert_eq!(v.len(), m.ncols());
                (0..m.nrows())
                    .map(|i| (0..m.ncols()).map(|j| m[(i, j)] * v[j]).sum())
                    .collect()
            }
            EqpMatrix::Sparse(m) => m.matvec(v),
        }
    }

    /// `Aᵀ v`.
    pub fn rmatvec(&self, v: &[f64]) -> Vec<f64> {
        match self {
            EqpMatrix::Dense(m) => {
                assert_eq!(v.len(), m.nrows());
                (0..m.ncols())
                    .map(|j| (0..m.nrows()).map(|i| m[(i, j)] * v[i]).sum())
                    .collect()
            }
            EqpMatrix::Sparse(m) => m.rmatvec(v),
        }
    }

    /// Materialize as a dense `nalgebra::DMatrix<f64>`.
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            EqpMatrix::Dense(m) => m.clone(),
            EqpMatrix::Sparse(m) => m.to_dense(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dense_matvec() {
        let a = EqpMatrix::from_row_slice(2, 3, &[1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(a.matvec(&v), vec![4.0, 5.0]);
        assert_eq!(a.rmatvec(&vec![1.0, 1.0]), vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_sparse_matches_dense() {
        let dense = EqpMatrix::from_row_slice(2, 3, &[1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        let sparse = EqpMatrix::Sparse(SparseMatrix::from_triplets(
            2,
            3,
            vec![(0, 0, 1.0), (0, 2, 1.0), (1, 1, 1.0), (1, 2, 1.0)],
        ));
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(dense.matvec(&v), sparse.matvec(&v));
        let w = vec![1.0, 1.0];
        assert_eq!(dense.rmatvec(&w), sparse.rmatvec(&w));
        assert_relative_eq!(sparse.to_dense(), dense.to_dense());
    }
}
