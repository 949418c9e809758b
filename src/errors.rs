// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Errors

use thiserror::Error;

/// Error type returned by the EQP-TR kernel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EqpError {
    /// Wrong shapes, NaN-producing input, or any other malformed argument.
    #[error("Invalid input: {text:?}")]
    InvalidInput {
        /// Text
        text: String,
    },

    /// A factorization that was expected to succeed (AAᵀ, the augmented system, the KKT matrix)
    /// turned out to be singular, which for `A` implies it does not have full row rank.
    #[error("Singular matrix: {text:?}")]
    Singular {
        /// Text
        text: String,
    },

    /// The trust region is infeasible: the least-norm particular solution of `A x = b` already
    /// lies outside the ball of radius `Δ`.
    #[error("Infeasible: {text:?}")]
    Infeasible {
        /// Text
        text: String,
    },

    /// Negative curvature was encountered along a conjugate-gradient direction, but there is no
    /// finite trust radius and no box constraint against which to clip the step.
    #[error("Negative curvature in unconstrained direction: {text:?}")]
    NegativeCurvatureUnbounded {
        /// Text
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = EqpError::Infeasible {
            text: "trust region infeasible".to_string(),
        };
        assert_eq!(format!("{e}"), "Infeasible: \"trust region infeasible\"");
    }
}
