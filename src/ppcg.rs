// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Projected preconditioned conjugate gradient
//!
//! Minimizes the quadratic model inside `null(A)` while respecting a trust radius and optional
//! box bounds, generalizing the teacher's `Steihaug` CG-on-the-Hessian loop
//! (`argmin/src/solver/trustregion/steihaug.rs`) with an added null-space projection and box
//! handling.

use crate::errors::EqpError;
use crate::intersections::{
    box_sphere_boundaries_intersections, spherical_boundaries_intersections,
};
use crate::linalg::{axpy, dot, norm, scale, sub};
use crate::operator::LinearOperator;

/// Relative tolerance used to decide whether a returned iterate sits on a box face or the trust
/// boundary, for the purposes of reporting `hits_boundary`.
const BOUNDARY_TOL: f64 = 1e-8;

fn touches_boundary(x: &[f64], lb: &[f64], ub: &[f64], trust_radius: f64) -> bool {
    if trust_radius.is_finite() {
        let radius_scale = trust_radius.max(1.0);
        if (norm(x) - trust_radius).abs() <= BOUNDARY_TOL * radius_scale {
            return true;
        }
    }
    x.iter().zip(lb.iter()).zip(ub.iter()).any(|((xi, li), ui)| {
        (li.is_finite() && (xi - li).abs() <= BOUNDARY_TOL * li.abs().max(1.0))
            || (ui.is_finite() && (xi - ui).abs() <= BOUNDARY_TOL * ui.abs().max(1.0))
    })
}

/// Termination condition of [`projected_cg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StopCode {
    /// Converged on the projected residual.
    Converged = 1,
    /// Hit the trust-region or box boundary.
    Boundary = 2,
    /// Negative curvature direction encountered.
    NegativeCurvature = 3,
    /// Converged immediately (zero or one step).
    Trivial = 4,
}

/// Options accepted by [`projected_cg`], mirroring the teacher's `Steihaug` builder-style setters
/// rather than a long positional parameter list.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct CgOptions {
    tol: f64,
    trust_radius: f64,
    lb: Option<Vec<f64>>,
    ub: Option<Vec<f64>>,
    max_iter: Option<usize>,
    return_all: bool,
}

impl Default for CgOptions {
    fn default() -> Self {
        CgOptions {
            tol: 1e-8,
            trust_radius: f64::INFINITY,
            lb: None,
            ub: None,
            max_iter: None,
            return_all: false,
        }
    }
}

impl CgOptions {
    /// Residual-norm tolerance for convergence. Default `1e-8`.
    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Trust-region radius. Default `f64::INFINITY`.
    pub fn trust_radius(mut self, trust_radius: f64) -> Self {
        self.trust_radius = trust_radius;
        self
    }

    /// Elementwise box bounds. Default: unconstrained.
    pub fn bounds(mut self, lb: Vec<f64>, ub: Vec<f64>) -> Self {
        self.lb = Some(lb);
        self.ub = Some(ub);
        self
    }

    /// Iteration cap. Default: `n - m` (set internally if left unset).
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = Some(max_iter);
        self
    }

    /// Record every iterate in [`CgInfo::x_all`]. Default `false`.
    pub fn return_all(mut self, return_all: bool) -> Self {
        self.return_all = return_all;
        self
    }
}

/// Diagnostics returned alongside the solution of [`projected_cg`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct CgInfo {
    /// See [`StopCode`].
    pub stop_cond: u8,
    /// Number of CG iterations performed.
    pub iter: usize,
    /// Every iterate, if `CgOptions::return_all(true)` was requested.
    pub x_all: Option<Vec<Vec<f64>>>,
}

/// Minimize `q(x) = 1/2 xᵀHx + cᵀx` subject to `Ax = b` (via the projections `z`/`y`), the trust
/// radius, and the box bounds in `opts`.
///
/// Returns `(x, hits_boundary, info)`.
pub fn projected_cg(
    h: &dyn LinearOperator,
    c: &[f64],
    z: &dyn LinearOperator,
    y: &dyn LinearOperator,
    b: &[f64],
    opts: CgOptions,
) -> Result<(Vec<f64>, bool, CgInfo), EqpError> {
    let n = c.len();
    let m = b.len();
    let lb = opts.lb.clone().unwrap_or_else(|| vec![f64::NEG_INFINITY; n]);
    let ub = opts.ub.clone().unwrap_or_else(|| vec![f64::INFINITY; n]);
    if lb.len() != n || ub.len() != n {
        return Err(EqpError::InvalidInput {
            text: format!("lb/ub must have length {n}"),
        });
    }
    let max_iter = opts.max_iter.unwrap_or(n.saturating_sub(m).max(1));

    let mut x = y.apply(b);
    if norm(&x) > opts.trust_radius {
        return Err(EqpError::Infeasible {
            text: "the particular solution Y b already violates the trust radius".to_string(),
        });
    }
    for i in 0..n {
        if x[i] < lb[i] || x[i] > ub[i] {
            return Err(EqpError::Infeasible {
                text: "the particular solution Y b already violates the box bounds".to_string(),
            });
        }
    }

    let mut x_all = if opts.return_all { Some(vec![x.clone()]) } else { None };

    let mut r = axpy(c, 1.0, &h.apply(&x));
    let mut g = z.apply(&r);
    let mut rt_g = dot(&r, &g);

    if norm(&g) < opts.tol {
        let hits_boundary = touches_boundary(&x, &lb, &ub, opts.trust_radius);
        let info = CgInfo {
            stop_cond: StopCode::Trivial as u8,
            iter: 0,
            x_all,
        };
        return Ok((x, hits_boundary, info));
    }

    let mut p = scale(&g, -1.0);
    let mut iter = 0usize;
    // Stays at `Converged` unless a trust-radius hit or negative curvature forces an early
    // return below; running out of `max_iter` falls through with whatever value is here.
    let stop_cond = StopCode::Converged as u8;

    while iter < max_iter {
        let hp = h.apply(&p);
        let curv = dot(&p, &hp);

        if curv <= 0.0 {
            let (_, tb, hit) =
                box_sphere_boundaries_intersections(&x, &p, &lb, &ub, opts.trust_radius, true);
            if !hit || tb.is_infinite() {
                return Err(EqpError::NegativeCurvatureUnbounded {
                    text: "negative curvature direction with no finite boundary".to_string(),
                });
            }
            x = axpy(&x, tb, &p);
            if let Some(all) = x_all.as_mut() {
                all.push(x.clone());
            }
            let info = CgInfo {
                stop_cond: StopCode::NegativeCurvature as u8,
                iter: iter + 1,
                x_all,
            };
            return Ok((x, true, info));
        }

        let alpha = rt_g / curv;
        let x_next = axpy(&x, alpha, &p);

        // Only the trust-radius (ball) boundary forces an immediate stop: the step is clipped
        // to where it leaves the ball and CG terminates there. Box-bound violations are handled
        // below by clipping the coordinates that left the box and letting CG continue.
        if norm(&x_next) > opts.trust_radius {
            let (_, tb, hit) = spherical_boundaries_intersections(&x, &p, opts.trust_radius, true);
            let tau = if hit { tb.min(alpha) } else { alpha };
            x = axpy(&x, tau, &p);
            if let Some(all) = x_all.as_mut() {
                all.push(x.clone());
            }
            let info = CgInfo {
                stop_cond: StopCode::Boundary as u8,
                iter: iter + 1,
                x_all,
            };
            return Ok((x, true, info));
        }

        let out_of_box = (0..n).any(|i| x_next[i] < lb[i] || x_next[i] > ub[i]);

        if out_of_box {
            x = (0..n).map(|i| x_next[i].clamp(lb[i], ub[i])).collect();
            if let Some(all) = x_all.as_mut() {
                all.push(x.clone());
            }
            iter += 1;

            r = axpy(c, 1.0, &h.apply(&x));
            g = z.apply(&r);
            if norm(&g) < opts.tol {
                let hits_boundary = touches_boundary(&x, &lb, &ub, opts.trust_radius);
                let info = CgInfo {
                    stop_cond: StopCode::Converged as u8,
                    iter,
                    x_all,
                };
                return Ok((x, hits_boundary, info));
            }
            rt_g = dot(&r, &g);
            // The active set changed underfoot; the old conjugate direction is no longer valid,
            // so restart from the clipped point instead of applying the Polak-Ribiere update.
            p = scale(&g, -1.0);
            continue;
        }

        x = x_next;
        if let Some(all) = x_all.as_mut() {
            all.push(x.clone());
        }
        let r_next = axpy(&r, alpha, &hp);
        let g_next = z.apply(&r_next);

        iter += 1;
        if norm(&g_next) < opts.tol {
            let hits_boundary = touches_boundary(&x, &lb, &ub, opts.trust_radius);
            let info = CgInfo {
                stop_cond: StopCode::Converged as u8,
                iter,
                x_all,
            };
            return Ok((x, hits_boundary, info));
        }

        let rt_g_next = dot(&r_next, &g_next);
        let beta = rt_g_next / rt_g;
        p = sub(&scale(&g_next, -1.0), &scale(&p, -beta));
        r = r_next;
        g = g_next;
        rt_g = rt_g_next;
    }

    let hits_boundary = touches_boundary(&x, &lb, &ub, opts.trust_radius);
    Ok((
        x,
        hits_boundary,
        CgInfo {
            stop_cond,
            iter,
            x_all,
        },
    ))
}
