// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Equality-constrained trust-region quadratic-programming kernel.
//!
//! Given a symmetric Hessian `H`, linear term `c`, equality constraint matrix `A` with right-hand
//! side `b`, a spherical trust radius `Δ`, and optional elementwise box bounds `(ℓ, u)`, this
//! crate returns an approximate minimizer of
//!
//! `q(x) = 1/2 xᵀHx + cᵀx   subject to   Ax = b, ‖x‖₂ ≤ Δ, ℓ ≤ x ≤ u`.
//!
//! Four numerical components cooperate:
//!
//! - [`projections`]: build the null-space projector `Z`, row-space right-inverse `Y`, and
//!   least-squares projector `LS` of `A` once, reused across calls.
//! - [`ppcg`]: projected preconditioned conjugate gradient inside `null(A)`.
//! - [`intersections`]: ray/ball, ray/box, and ray/(box∩ball) entry-exit parameters.
//! - [`dogleg`]: modified dogleg step restoring feasibility under the trust region and box.
//!
//! [`kkt::eqp_kktfact`] provides a direct factorization oracle for small problems.

pub mod dogleg;
pub mod errors;
pub mod intersections;
pub mod kkt;
pub mod linalg;
pub mod matrix;
pub mod operator;
pub mod orthogonality;
pub mod ppcg;
pub mod projections;

pub use dogleg::modified_dogleg;
pub use errors::EqpError;
pub use intersections::{
    box_boundaries_intersections, box_sphere_boundaries_intersections,
    spherical_boundaries_intersections,
};
pub use kkt::eqp_kktfact;
pub use matrix::{EqpMatrix, SparseMatrix};
pub use operator::{ClosureOperator, IdentityOperator, LinearOperator, MatrixOperator};
pub use orthogonality::orthogonality;
pub use ppcg::{projected_cg, CgInfo, CgOptions, StopCode};
pub use projections::{ProjectionBundle, ProjectionMethod, Projections};
