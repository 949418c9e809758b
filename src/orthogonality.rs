// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Orthogonality probe

use crate::linalg::norm;
use crate::matrix::EqpMatrix;

/// Normalized inner product, maximized over the rows of `a`, between each row and `x`:
///
/// `max_i |<a_i, x>| / (‖a_i‖ ‖x‖)`
///
/// Returns `0.0` if `x` or a row has zero norm. Used to decide whether iterative refinement of a
/// projection needs another pass.
pub fn orthogonality(a: &EqpMatrix, x: &[f64]) -> f64 {
    let x_norm = norm(x);
    if x_norm == 0.0 {
        return 0.0;
    }
    let dense = a.to_dense();
    let mut worst = 0.0_f64;
    for i in 0..dense.nrows() {
        let row: Vec<f64> = (0..dense.ncols()).map(|j| dense[(i, j)]).collect();
        let row_norm = norm(&row);
        if row_norm == 0.0 {
            continue;
        }
        let inner: f64 = row.iter().zip(x.iter()).map(|(a, b)| a * b).sum();
        let ratio = inner.abs() / (row_norm * x_norm);
        if ratio > worst {
            worst = ratio;
        }
    }
    worst
}
