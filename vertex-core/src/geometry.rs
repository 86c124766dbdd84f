//! Periodic-boundary vector algebra and polygon measures.
//!
//! Everything here is a pure function. Positions live in a periodic box of
//! size `box_size = (Lx, Ly)`; physical displacements are always taken
//! through [`periodic_diff`], never through raw subtraction.

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use rand::Rng;

use crate::types::VertexId;

/// Shortest signed displacement from `b` to `a` on a torus of size `box_size`.
///
/// Computed per component as `((a - b + L/2) mod L) - L/2`, so every
/// component of the result lies in `[-L/2, L/2)`.
///
/// ### Parameters
/// - `a` - Target point.
/// - `b` - Origin point.
/// - `box_size` - Periodic box dimensions `(Lx, Ly)`.
///
/// ### Returns
/// The minimum-image displacement `a - b`.
#[inline]
pub fn periodic_diff(a: DVec2, b: DVec2, box_size: DVec2) -> DVec2 {
    let d = a - b;
    DVec2::new(
        wrap_component(d.x, box_size.x),
        wrap_component(d.y, box_size.y),
    )
}

#[inline]
fn wrap_component(d: f64, l: f64) -> f64 {
    (d + 0.5 * l).rem_euclid(l) - 0.5 * l
}

/// Minimum-image distance between two points.
#[inline]
pub fn periodic_distance(a: DVec2, b: DVec2, box_size: DVec2) -> f64 {
    periodic_diff(a, b, box_size).length()
}

/// Signed polygon area via the shoelace formula.
///
/// The loop must already be unwrapped (locally contiguous across the
/// periodic boundary). Counter-clockwise loops give a positive area.
pub fn area(points: &[DVec2]) -> f64 {
    let n = points.len();
    let mut cross = 0.0;
    for i in 0..n {
        let p0 = points[i];
        let p1 = points[(i + 1) % n];
        cross += p0.perp_dot(p1);
    }
    0.5 * cross
}

/// Length of the closed loop, wrapping last to first.
pub fn perimeter(points: &[DVec2]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].distance(points[(i + 1) % n]))
        .sum()
}

/// Arithmetic mean of the loop's vertices (not the area centroid).
///
/// Returns `DVec2::ZERO` for an empty loop.
pub fn center(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}

/// Normalized direction from `q` to `p`.
///
/// ### Returns
/// - `Some(unit)` when the two points are distinct.
/// - `None` when they coincide (or the input is not finite), since the
///   direction is then undefined.
#[inline]
pub fn unit_vector(p: DVec2, q: DVec2) -> Option<DVec2> {
    let v = p - q;
    let len = v.length();
    if len > 0.0 && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Builds the unwrapped vertex loop of an index cycle.
///
/// The walk starts at the raw position of the first vertex; each following
/// vertex is placed at `previous + periodic_diff(raw, previous)`. The result
/// is contiguous across the periodic boundary regardless of where the raw
/// coordinates were wrapped.
///
/// ### Parameters
/// - `positions` - All vertex positions of the tissue.
/// - `cycle` - Vertex indices of the polygon, in order.
/// - `box_size` - Periodic box dimensions.
///
/// ### Returns
/// One unwrapped point per entry of `cycle`.
pub fn unwrap_loop(positions: &[DVec2], cycle: &[VertexId], box_size: DVec2) -> Vec<DVec2> {
    let mut out = Vec::with_capacity(cycle.len());
    let Some(&first) = cycle.first() else {
        return out;
    };
    let mut last = positions[first];
    for &i in cycle {
        let next = last + periodic_diff(positions[i], last, box_size);
        out.push(next);
        last = next;
    }
    out
}

/// `true` if the unwrapped loop winds counter-clockwise.
pub fn is_counter_clockwise(points: &[DVec2]) -> bool {
    area(points) > 0.0
}

/// Unit heading for an angle in radians.
#[inline]
pub fn angle_to_vector(theta: f64) -> DVec2 {
    DVec2::from_angle(theta)
}

/// Angle of a vector, in `(-π, π]`.
#[inline]
pub fn vector_to_angle(v: DVec2) -> f64 {
    v.y.atan2(v.x)
}

/// Difference `a - b` wrapped into `[-π, π)`.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let theta = a - b;
    theta - TAU * ((theta + PI) / TAU).floor()
}

/// Uniformly distributed angle in `[-π, π)`.
pub fn random_angle(rng: &mut impl Rng) -> f64 {
    rng.random_range(-PI..PI)
}

/// Angle at `p1` between the arms towards `p2` and `p3`, by the law of cosines.
///
/// Rounding can push the cosine slightly outside `[-1, 1]`; it is clamped
/// back instead of producing `NaN`. If either arm has zero length the angle
/// is reported as `0`.
pub fn angle_at(p1: DVec2, p2: DVec2, p3: DVec2) -> f64 {
    let p12 = p1.distance(p2);
    let p13 = p1.distance(p3);
    let p23 = p2.distance(p3);
    if p12 == 0.0 || p13 == 0.0 {
        return 0.0;
    }
    let cos = (p12 * p12 + p13 * p13 - p23 * p23) / (2.0 * p12 * p13);
    cos.clamp(-1.0, 1.0).acos()
}
