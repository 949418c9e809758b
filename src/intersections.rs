// Copyright 2018-2024 argmin developers
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! # Intersection primitives
//!
//! Entry/exit parameters of a parametric ray `{z + t d : t in R}` against a ball, a box, or
//! their intersection. By default the returned interval is clipped to `t in [0, 1]` (segment
//! semantics used by trust-region steps); with `line_intersections = true` the interval spans
//! all of `R`.
//!
//! The quadratic-root-solving shape of [`spherical_boundaries_intersections`] generalizes the
//! teacher's `Steihaug::tau`/`Dogleg`'s `tau1`/`tau2` discriminant computations
//! (`argmin/src/solver/trustregion/{steihaug,dogleg}.rs`) to a standalone primitive.

/// Clip a raw (possibly unbounded) intersection interval to segment semantics `t in [0, 1]`,
/// unless `line_intersections` is set, in which case the raw interval is returned unchanged.
fn finalize(ta: f64, tb: f64, hit: bool, line_intersections: bool) -> (f64, f64, bool) {
    if !hit {
        return (0.0, 0.0, false);
    }
    if line_intersections {
        return (ta, tb, true);
    }
    let a = ta.max(0.0);
    let b = tb.min(1.0);
    if a <= b {
        (a, b, true)
    } else {
        (0.0, 0.0, false)
    }
}

fn spherical_raw(z: &[f64], d: &[f64], delta: f64) -> (f64, f64, bool) {
    let a: f64 = d.iter().map(|x| x * x).sum();
    let b: f64 = 2.0 * z.iter().zip(d.iter()).map(|(z, d)| z * d).sum::<f64>();
    let c: f64 = z.iter().map(|x| x * x).sum::<f64>() - delta * delta;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return (0.0, 0.0, false);
    }
    let sqrt_discriminant = discriminant.sqrt();
    let mut ta = (-b - sqrt_discriminant) / (2.0 * a);
    let mut tb = (-b + sqrt_discriminant) / (2.0 * a);
    if ta > tb {
        std::mem::swap(&mut ta, &mut tb);
    }
    (ta, tb, true)
}

/// Entry/exit parameters of the ray `z + t d` against the ball `‖x‖₂ ≤ delta`.
pub fn spherical_boundaries_intersections(
    z: &[f64],
    d: &[f64],
    delta: f64,
    line_intersections: bool,
) -> (f64, f64, bool) {
    let (ta, tb, hit) = spherical_raw(z, d, delta);
    finalize(ta, tb, hit, line_intersections)
}

fn box_raw(z: &[f64], d: &[f64], lb: &[f64], ub: &[f64]) -> (f64, f64, bool) {
    let mut ta_max = f64::NEG_INFINITY;
    let mut tb_min = f64::INFINITY;
    for i in 0..z.len() {
        if d[i] == 0.0 {
            if z[i] < lb[i] || z[i] > ub[i] {
                return (0.0, 0.0, false);
            }
            continue;
        }
        let traw = (lb[i] - z[i]) / d[i];
        let tbraw = (ub[i] - z[i]) / d[i];
        let (lo, hi) = if traw <= tbraw {
            (traw, tbraw)
        } else {
            (tbraw, traw)
        };
        if lo > ta_max {
            ta_max = lo;
        }
        if hi < tb_min {
            tb_min = hi;
        }
    }
    if ta_max < tb_min {
        (ta_max, tb_min, true)
    } else {
        (0.0, 0.0, false)
    }
}

/// Entry/exit parameters of the ray `z + t d` against the axis-aligned box `[lb, ub]`. Entries of
/// `lb`/`ub` may be `f64::NEG_INFINITY`/`f64::INFINITY`.
pub fn box_boundaries_intersections(
    z: &[f64],
    d: &[f64],
    lb: &[f64],
    ub: &[f64],
    line_intersections: bool,
) -> (f64, f64, bool) {
    let (ta, tb, hit) = box_raw(z, d, lb, ub);
    finalize(ta, tb, hit, line_intersections)
}

/// Entry/exit parameters of the ray `z + t d` against the intersection of the box `[lb, ub]` and
/// the ball `‖x‖₂ ≤ delta`.
pub fn box_sphere_boundaries_intersections(
    z: &[f64],
    d: &[f64],
    lb: &[f64],
    ub: &[f64],
    delta: f64,
    line_intersections: bool,
) -> (f64, f64, bool) {
    let (ta_b, tb_b, hit_b) = box_raw(z, d, lb, ub);
    let (ta_s, tb_s, hit_s) = spherical_raw(z, d, delta);
    if !hit_b || !hit_s {
        return (0.0, 0.0, false);
    }
    let ta = ta_b.max(ta_s);
    let tb = tb_b.min(tb_s);
    finalize(ta, tb, ta <= tb, line_intersections)
}
