// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Modified dogleg
//!
//! Finds a point minimizing infeasibility `‖A x − b‖₂` inside the trust region and box bounds,
//! walking the piecewise-linear path origin -> Cauchy -> Newton. Generalizes the teacher's
//! `Dogleg` solver (`argmin/src/solver/trustregion/dogleg.rs`), which doglegs between the
//! steepest-descent and Newton points of the *objective* model, to the *feasibility* subproblem
//! used when a starting iterate needs to be pulled back onto `Ax = b`.

use crate::intersections::box_sphere_boundaries_intersections;
use crate::linalg::{axpy, dot, norm, scale, sub};
use crate::matrix::EqpMatrix;
use crate::operator::LinearOperator;

fn in_bounds(x: &[f64], lb: &[f64], ub: &[f64], trust_radius: f64) -> bool {
    if norm(x) > trust_radius {
        return false;
    }
    x.iter()
        .zip(lb.iter())
        .zip(ub.iter())
        .all(|((xi, li), ui)| *xi >= *li && *xi <= *ui)
}

/// Dogleg step towards `‖A x − b‖ = 0`, restricted to the trust region and box bounds.
///
/// `y` is the row-space right-inverse from a [`crate::projections::ProjectionBundle`].
pub fn modified_dogleg(
    a: &EqpMatrix,
    y: &dyn LinearOperator,
    b: &[f64],
    trust_radius: f64,
    lb: &[f64],
    ub: &[f64],
) -> Vec<f64> {
    let n = a.ncols();
    let x_newton = scale(&y.apply(b), -1.0);
    if in_bounds(&x_newton, lb, ub, trust_radius) {
        return x_newton;
    }

    let g = a.rmatvec(b);
    let ag = a.matvec(&g);
    let gg = dot(&g, &g);
    let agag = dot(&ag, &ag);
    let t_opt = if agag > 0.0 { gg / agag } else { 0.0 };
    let x_cauchy_candidate = scale(&g, -t_opt);

    let zeros = vec![0.0; n];
    let (_, frac_c, hit_c) =
        box_sphere_boundaries_intersections(&zeros, &x_cauchy_candidate, lb, ub, trust_radius, false);
    let x_cauchy = if hit_c {
        scale(&x_cauchy_candidate, frac_c)
    } else {
        zeros
    };

    let d = sub(&x_newton, &x_cauchy);
    let (_, frac_seg, hit_seg) =
        box_sphere_boundaries_intersections(&x_cauchy, &d, lb, ub, trust_radius, false);
    if hit_seg {
        axpy(&x_cauchy, frac_seg, &d)
    } else {
        x_cauchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::MatrixOperator;
    use crate::projections::{ProjectionMethod, Projections};
    use approx::assert_relative_eq;

    fn y_of(a: &EqpMatrix) -> crate::projections::ProjectionBundle {
        Projections::build(a, ProjectionMethod::NormalEquation, 1e-12, 3).unwrap()
    }

    #[test]
    fn test_newton_point_already_feasible() {
        let a = EqpMatrix::from_row_slice(1, 3, &[1.0, 0.0, 0.0]);
        let b = vec![0.5];
        let bundle = y_of(&a);
        let x = modified_dogleg(
            &a,
            bundle.y(),
            &b,
            10.0,
            &[-10.0, -10.0, -10.0],
            &[10.0, 10.0, 10.0],
        );
        assert_relative_eq!(x[0], -0.5, epsilon = 1e-8);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-8);
        assert_relative_eq!(x[2], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_trust_region_caps_cauchy_and_segment_is_exhausted() {
        let a = EqpMatrix::from_row_slice(1, 3, &[1.0, 0.0, 0.0]);
        let b = vec![10.0];
        let bundle = y_of(&a);
        let lb = vec![f64::NEG_INFINITY; 3];
        let ub = vec![f64::INFINITY; 3];
        let x = modified_dogleg(&a, bundle.y(), &b, 1.0, &lb, &ub);
        assert_relative_eq!(norm(&x), 1.0, epsilon = 1e-8);
        assert_relative_eq!(x[0], -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_box_bound_binds_before_trust_region() {
        let a = EqpMatrix::from_row_slice(1, 3, &[1.0, 0.0, 0.0]);
        let b = vec![-5.0];
        let bundle = y_of(&a);
        let lb = vec![-100.0, -100.0, -100.0];
        let ub = vec![2.0, 100.0, 100.0];
        let x = modified_dogleg(&a, bundle.y(), &b, 100.0, &lb, &ub);
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(x[1], 0.0, epsilon = 1e-8);
        assert_relative_eq!(x[2], 0.0, epsilon = 1e-8);
    }
}
