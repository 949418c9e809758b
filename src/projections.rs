// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Projection factory
//!
//! Builds the null-space projector `Z`, least-squares projector `LS`, and row-space right-inverse
//! `Y` of a constraint matrix `A`, sharing one factorization (`Rc`-owned, never `Rc<RefCell<_>>`
//! since applying a projection never mutates the factor). Generalizes the teacher's dense-solve
//! idiom in `argmin/src/solver/trustregion/dogleg.rs` (`h.inv()?`) from a one-off 2x2/3x3 solve to
//! three reusable factorization strategies.

use std::rc::Rc;

use nalgebra::{DMatrix, DVector};

use crate::errors::EqpError;
use crate::linalg::norm;
use crate::matrix::EqpMatrix;
use crate::operator::LinearOperator;

/// Factorization strategy used to build a [`ProjectionBundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum ProjectionMethod {
    /// Factor `A Aᵀ` via dense Cholesky.
    #[default]
    NormalEquation,
    /// Factor the saddle-point matrix `[[I, Aᵀ], [A, 0]]` via dense LU.
    AugmentedSystem,
    /// Factor `Aᵀ` via dense QR.
    QrFactorization,
}

/// Internal factorization shared by `Z`, `LS`, and `Y`. Each `apply_*_once` computes one
/// (unrefined) application; iterative refinement lives in the operator wrappers below.
trait ProjectionFactor {
    fn apply_z_once(&self, v: &[f64]) -> Vec<f64>;
    fn apply_ls_once(&self, v: &[f64]) -> Vec<f64>;
    fn apply_y_once(&self, w: &[f64]) -> Vec<f64>;
}

struct NormalEquationFactor {
    a: DMatrix<f64>,
    chol: nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>,
}

impl ProjectionFactor for NormalEquationFactor {
    fn apply_z_once(&self, v: &[f64]) -> Vec<f64> {
        let aw = self.apply_ls_once(v);
        let a_t_aw = self.a.transpose() * DVector::from_row_slice(&aw);
        v.iter().zip(a_t_aw.iter()).map(|(a, b)| a - b).collect()
    }

    fn apply_ls_once(&self, v: &[f64]) -> Vec<f64> {
        let av = &self.a * DVector::from_row_slice(v);
        self.chol.solve(&av).as_slice().to_vec()
    }

    fn apply_y_once(&self, w: &[f64]) -> Vec<f64> {
        let aw = self.chol.solve(&DVector::from_row_slice(w));
        (self.a.transpose() * aw).as_slice().to_vec()
    }
}

struct AugmentedSystemFactor {
    n: usize,
    m: usize,
    lu: nalgebra::linalg::LU<f64, nalgebra::Dyn, nalgebra::Dyn>,
}

impl AugmentedSystemFactor {
    fn solve(&self, rhs: DVector<f64>) -> DVector<f64> {
        self.lu
            .solve(&rhs)
            .expect("augmented system factor built as non-singular at construction time")
    }
}

impl ProjectionFactor for AugmentedSystemFactor {
    fn apply_z_once(&self, v: &[f64]) -> Vec<f64> {
        let mut rhs = vec![0.0; self.n + self.m];
        rhs[..self.n].copy_from_slice(v);
        let sol = self.solve(DVector::from_vec(rhs));
        sol.iter().take(self.n).copied().collect()
    }

    fn apply_y_once(&self, w: &[f64]) -> Vec<f64> {
        let mut rhs = vec![0.0; self.n + self.m];
        rhs[self.n..].copy_from_slice(w);
        let sol = self.solve(DVector::from_vec(rhs));
        sol.iter().take(self.n).copied().collect()
    }

    fn apply_ls_once(&self, v: &[f64]) -> Vec<f64> {
        let mut rhs = vec![0.0; self.n + self.m];
        rhs[..self.n].copy_from_slice(v);
        let sol = self.solve(DVector::from_vec(rhs));
        sol.iter().skip(self.n).take(self.m).copied().collect()
    }
}

struct QrFactor {
    q1: DMatrix<f64>,
    r_t: DMatrix<f64>,
}

impl QrFactor {
    fn solve_rt(&self, rhs: DVector<f64>) -> DVector<f64> {
        self.r_t
            .solve_lower_triangular(&rhs)
            .expect("QR factor built as non-singular at construction time")
    }
}

impl ProjectionFactor for QrFactor {
    fn apply_z_once(&self, v: &[f64]) -> Vec<f64> {
        let vv = DVector::from_row_slice(v);
        let q1tv = self.q1.transpose() * &vv;
        let proj = &self.q1 * q1tv;
        vv.iter().zip(proj.iter()).map(|(a, b)| a - b).collect()
    }

    fn apply_ls_once(&self, v: &[f64]) -> Vec<f64> {
        let q1tv = self.q1.transpose() * DVector::from_row_slice(v);
        self.solve_rt(q1tv).as_slice().to_vec()
    }

    fn apply_y_once(&self, w: &[f64]) -> Vec<f64> {
        let t = self.solve_rt(DVector::from_row_slice(w));
        (&self.q1 * t).as_slice().to_vec()
    }
}

/// A built `Z`/`LS`/`Y` triple, ready to hand to [`crate::ppcg::projected_cg`] or
/// [`crate::dogleg::modified_dogleg`].
pub struct ProjectionBundle {
    z: ZOperator,
    ls: LsOperator,
    y: YOperator,
}

impl ProjectionBundle {
    /// Null-space projector: `Z v` is `v` with its row(A) component removed.
    pub fn z(&self) -> &dyn LinearOperator {
        &self.z
    }

    /// Least-squares projector: `LS v` is the coefficients of `v`'s row(A) component in the
    /// factor's basis.
    pub fn ls(&self) -> &dyn LinearOperator {
        &self.ls
    }

    /// Row-space right-inverse: `Y w` is the minimum-norm solution of `A x = w`.
    pub fn y(&self) -> &dyn LinearOperator {
        &self.y
    }
}

struct ZOperator {
    factor: Rc<dyn ProjectionFactor>,
    a: Rc<EqpMatrix>,
    orth_tol: f64,
    max_refin: u32,
}

impl LinearOperator for ZOperator {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        let mut z = self.factor.apply_z_once(v);
        let v_norm = norm(v).max(f64::EPSILON);
        for _ in 0..self.max_refin {
            let residual = self.a.matvec(&z);
            if norm(&residual) / v_norm <= self.orth_tol {
                break;
            }
            let correction = self.factor.apply_y_once(&residual);
            z = z.iter().zip(correction.iter()).map(|(a, b)| a - b).collect();
        }
        z
    }
}

struct LsOperator {
    factor: Rc<dyn ProjectionFactor>,
}

impl LinearOperator for LsOperator {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        self.factor.apply_ls_once(v)
    }
}

struct YOperator {
    factor: Rc<dyn ProjectionFactor>,
    a: Rc<EqpMatrix>,
    orth_tol: f64,
    max_refin: u32,
}

impl LinearOperator for YOperator {
    fn apply(&self, w: &[f64]) -> Vec<f64> {
        let mut y = self.factor.apply_y_once(w);
        let w_norm = norm(w).max(f64::EPSILON);
        for _ in 0..self.max_refin {
            let residual: Vec<f64> = self
                .a
                .matvec(&y)
                .iter()
                .zip(w.iter())
                .map(|(a, b)| a - b)
                .collect();
            if norm(&residual) / w_norm <= self.orth_tol {
                break;
            }
            let correction = self.factor.apply_y_once(&residual);
            y = y.iter().zip(correction.iter()).map(|(a, b)| a - b).collect();
        }
        y
    }
}

/// Entry point for building a [`ProjectionBundle`] from a constraint matrix.
pub struct Projections;

impl Projections {
    /// Build `Z`, `LS`, `Y` for `a` using `method`. `orth_tol`/`max_refin` bound the iterative
    /// refinement applied to `Z` and `Y`.
    pub fn build(
        a: &EqpMatrix,
        method: ProjectionMethod,
        orth_tol: f64,
        max_refin: u32,
    ) -> Result<ProjectionBundle, EqpError> {
        let m = a.nrows();
        let n = a.ncols();
        if m == 0 || n == 0 || m > n {
            return Err(EqpError::InvalidInput {
                text: format!("constraint matrix must be m x n with 0 < m <= n, got {m}x{n}"),
            });
        }
        let dense = a.to_dense();
        let a_rc = Rc::new(a.clone());

        let factor: Rc<dyn ProjectionFactor> = match method {
            ProjectionMethod::NormalEquation => {
                let aat = &dense * dense.transpose();
                let chol = nalgebra::linalg::Cholesky::new(aat).ok_or_else(|| EqpError::Singular {
                    text: "A A^T is not positive definite; A may be rank-deficient".to_string(),
                })?;
                Rc::new(NormalEquationFactor { a: dense, chol })
            }
            ProjectionMethod::AugmentedSystem => {
                let dim = n + m;
                let mut k = DMatrix::<f64>::zeros(dim, dim);
                for i in 0..n {
                    k[(i, i)] = 1.0;
                }
                for i in 0..m {
                    for j in 0..n {
                        k[(n + i, j)] = dense[(i, j)];
                        k[(j, n + i)] = dense[(i, j)];
                    }
                }
                let lu = nalgebra::linalg::LU::new(k);
                if lu.solve(&DVector::from_element(dim, 1.0)).is_none() {
                    return Err(EqpError::Singular {
                        text: "augmented system matrix is singular".to_string(),
                    });
                }
                Rc::new(AugmentedSystemFactor { n, m, lu })
            }
            ProjectionMethod::QrFactorization => {
                let qr = nalgebra::linalg::QR::new(dense.transpose());
                let q1 = qr.q();
                let r = qr.r();
                let r_t = r.transpose();
                if r_t.solve_lower_triangular(&DVector::from_element(m, 1.0)).is_none() {
                    return Err(EqpError::Singular {
                        text: "R factor of A^T is singular; A may be rank-deficient".to_string(),
                    });
                }
                Rc::new(QrFactor { q1, r_t })
            }
        };

        Ok(ProjectionBundle {
            z: ZOperator {
                factor: Rc::clone(&factor),
                a: Rc::clone(&a_rc),
                orth_tol,
                max_refin,
            },
            ls: LsOperator {
                factor: Rc::clone(&factor),
            },
            y: YOperator {
                factor,
                a: a_rc,
                orth_tol,
                max_refin,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_a() -> EqpMatrix {
        EqpMatrix::from_row_slice(
            2,
            4,
            &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0],
        )
    }

    #[test]
    fn test_normal_equation_z_is_orthogonal() {
        let a = sample_a();
        let bundle = Projections::build(&a, ProjectionMethod::NormalEquation, 1e-12, 3).unwrap();
        let v = vec![1.0, 2.0, 3.0, 4.0];
        let z = bundle.z().apply(&v);
        let residual = a.matvec(&z);
        assert_relative_eq!(norm(&residual), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normal_equation_y_solves_a_y_eq_w() {
        let a = sample_a();
        let bundle = Projections::build(&a, ProjectionMethod::NormalEquation, 1e-12, 3).unwrap();
        let w = vec![3.0, -1.0];
        let y = bundle.y().apply(&w);
        let check = a.matvec(&y);
        assert_relative_eq!(check[0], w[0], epsilon = 1e-9);
        assert_relative_eq!(check[1], w[1], epsilon = 1e-9);
    }

    #[test]
    fn test_augmented_system_matches_normal_equation() {
        let a = sample_a();
        let bundle_ne = Projections::build(&a, ProjectionMethod::NormalEquation, 1e-12, 3).unwrap();
        let bundle_as = Projections::build(&a, ProjectionMethod::AugmentedSystem, 1e-12, 3).unwrap();
        let v = vec![1.0, 2.0, 3.0, 4.0];
        let z_ne = bundle_ne.z().apply(&v);
        let z_as = bundle_as.z().apply(&v);
        for (x, y) in z_ne.iter().zip(z_as.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_qr_matches_normal_equation() {
        let a = sample_a();
        let bundle_ne = Projections::build(&a, ProjectionMethod::NormalEquation, 1e-12, 3).unwrap();
        let bundle_qr = Projections::build(&a, ProjectionMethod::QrFactorization, 1e-12, 3).unwrap();
        let v = vec![1.0, 2.0, 3.0, 4.0];
        let z_ne = bundle_ne.z().apply(&v);
        let z_qr = bundle_qr.z().apply(&v);
        for (x, y) in z_ne.iter().zip(z_qr.iter()) {
            assert_relative_eq!(x, y, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_rejects_non_full_row_rank_dims() {
        let a = EqpMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let err = Projections::build(&a, ProjectionMethod::NormalEquation, 1e-12, 3);
        assert!(err.is_err());
    }
}
