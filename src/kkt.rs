// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Direct KKT factorization
//!
//! Oracle solve for the equality-constrained QP, used on small problems and to validate
//! [`crate::ppcg::projected_cg`]/[`crate::dogleg::modified_dogleg`] in tests. Generalizes the
//! teacher's small dense-solve idiom in `dogleg.rs` (`h.inv()? * g`) to an (n+m)x(n+m) saddle-point
//! system.

use nalgebra::DMatrix;

use crate::errors::EqpError;
use crate::matrix::EqpMatrix;

/// Solve `min 1/2 xᵀHx + cᵀx  s.t.  Ax = b` directly via the KKT system
///
/// `[[H, Aᵀ], [A, 0]] [x; λ] = [-c; b]`
///
/// Returns `(x, λ)` with the sign convention `∇q(x) + Aᵀλ = 0` at the solution.
pub fn eqp_kktfact(
    h: &EqpMatrix,
    c: &[f64],
    a: &EqpMatrix,
    b: &[f64],
) -> Result<(Vec<f64>, Vec<f64>), EqpError> {
    let n = h.nrows();
    let m = a.nrows();
    if h.ncols() != n || a.ncols() != n || c.len() != n || b.len() != m {
        return Err(EqpError::InvalidInput {
            text: format!(
                "dimension mismatch: H is {n}x{}, A is {m}x{}, c has {}, b has {}",
                h.ncols(),
                a.ncols(),
                c.len(),
                b.len()
            ),
        });
    }

    let h_dense = h.to_dense();
    let a_dense = a.to_dense();
    let dim = n + m;
    let mut k = DMatrix::<f64>::zeros(dim, dim);
    for i in 0..n {
        for j in 0..n {
            k[(i, j)] = h_dense[(i, j)];
        }
    }
    for i in 0..m {
        for j in 0..n {
            k[(n + i, j)] = a_dense[(i, j)];
            k[(j, n + i)] = a_dense[(i, j)];
        }
    }

    let mut rhs = vec![0.0; dim];
    for i in 0..n {
        rhs[i] = -c[i];
    }
    rhs[n..].copy_from_slice(b);

    let lu = nalgebra::linalg::LU::new(k);
    let sol = lu
        .solve(&nalgebra::DVector::from_vec(rhs))
        .ok_or_else(|| EqpError::Singular {
            text: "singular KKT matrix".to_string(),
        })?;

    let x = sol.iter().take(n).copied().collect();
    let lambda = sol.iter().skip(n).take(m).copied().collect();
    Ok((x, lambda))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nocedal_wright_example_16_2() {
        // Nocedal & Wright, Example 16.2: min 3x1^2 + 2x1x2 + x1x3 + 2.5x2^2 + 2x2x3 + 2x3^2
        //   - 8x1 - 3x2 - 3x3  s.t.  x1 + x3 = 3, x2 + x3 = 0.
        let h = EqpMatrix::from_row_slice(
            3,
            3,
            &[6.0, 2.0, 1.0, 2.0, 5.0, 2.0, 1.0, 2.0, 4.0],
        );
        let c = vec![-8.0, -3.0, -3.0];
        let a = EqpMatrix::from_row_slice(2, 3, &[1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        let b = vec![3.0, 0.0];

        let (x, _lambda) = eqp_kktfact(&h, &c, &a, &b).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(x[1], -1.0, epsilon = 1e-8);
        assert_relative_eq!(x[2], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_singular_kkt_matrix() {
        let h = EqpMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 0.0]);
        let c = vec![0.0, 0.0];
        let a = EqpMatrix::from_row_slice(1, 2, &[0.0, 0.0]);
        let b = vec![1.0];
        assert!(eqp_kktfact(&h, &c, &a, &b).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let h = EqpMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let c = vec![0.0, 0.0, 0.0];
        let a = EqpMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let b = vec![1.0];
        assert!(eqp_kktfact(&h, &c, &a, &b).is_err());
    }
}
