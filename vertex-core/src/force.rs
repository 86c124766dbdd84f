//! Vertex forces and the overdamped position update.
//!
//! The elastic, adhesion and contraction contributions are the gradients of
//! the corresponding terms in [`crate::energy`]; the total force is their
//! negated sum. The motility term is exogenous: a noisy drive aligning each
//! cell with its neighbours, which also updates the cells' orientations.

use std::f64::consts::PI;

use glam::DVec2;
use rand::Rng;

use crate::{
    alignment_buffer::AlignmentBuffer,
    config::Parameters,
    error::{Result, SimError},
    geometry::{angle_to_vector, periodic_diff, unit_vector, vector_to_angle},
    tissue::{Polygon, Tissue},
    types::Edge,
};

/// Gradient of the elastic (area) energy, per vertex.
///
/// For a counter-clockwise cycle the shoelace area gives
/// `∂A/∂v = ½ (v_next - v_prev)⊥`, scaled here by `ka (A - A0)`.
pub fn elastic_force(
    vertices: &[DVec2],
    polygons: &[Polygon],
    ka: f64,
    box_size: DVec2,
) -> Vec<DVec2> {
    let mut forces = vec![DVec2::ZERO; vertices.len()];
    for poly in polygons {
        let coeff = ka * (poly.a0 - poly.area(vertices, box_size));
        let n = poly.indices.len();
        for k in 0..n {
            let i = poly.indices[k];
            let v = vertices[i];
            let next = v + periodic_diff(vertices[poly.indices[(k + 1) % n]], v, box_size);
            let prev = v + periodic_diff(vertices[poly.indices[(k + n - 1) % n]], v, box_size);
            forces[i] += coeff * 0.5 * (next - prev).perp();
        }
    }
    forces
}

/// Gradient of the contraction (perimeter) energy, per vertex.
///
/// ### Errors
/// [`SimError::CoincidentVertices`] if a vertex sits on top of one of its
/// cycle neighbours.
pub fn contraction_force(
    vertices: &[DVec2],
    polygons: &[Polygon],
    gamma: f64,
    box_size: DVec2,
) -> Result<Vec<DVec2>> {
    let mut forces = vec![DVec2::ZERO; vertices.len()];
    for poly in polygons {
        let perim = poly.perimeter(vertices, box_size);
        let n = poly.indices.len();
        for k in 0..n {
            let i = poly.indices[k];
            let i_next = poly.indices[(k + 1) % n];
            let i_prev = poly.indices[(k + n - 1) % n];
            let v = vertices[i];
            let next = v + periodic_diff(vertices[i_next], v, box_size);
            let prev = v + periodic_diff(vertices[i_prev], v, box_size);

            let to_self_from_next =
                unit_vector(v, next).ok_or(SimError::CoincidentVertices { a: i, b: i_next })?;
            let to_prev_from_self =
                unit_vector(prev, v).ok_or(SimError::CoincidentVertices { a: i_prev, b: i })?;

            forces[i] += gamma * perim * (to_self_from_next - to_prev_from_self);
        }
    }
    Ok(forces)
}

/// Gradient of the quartered adhesion energy, per vertex.
///
/// Each directed edge `(i, j)` pushes only its tail `i`; the reverse edge
/// supplies the reaction on `j`. With every bond stored once per direction
/// the tail receives `(Λ/2) · unit(i - j)`, matching `∂(E_adhesion / 4)/∂v_i`.
///
/// ### Errors
/// [`SimError::CoincidentVertices`] for a zero-length edge.
pub fn adhesion_force(
    vertices: &[DVec2],
    edges: &[Edge],
    lambda: f64,
    box_size: DVec2,
) -> Result<Vec<DVec2>> {
    let mut forces = vec![DVec2::ZERO; vertices.len()];
    for e in edges {
        let v1 = vertices[e.from];
        let v2 = v1 + periodic_diff(vertices[e.to], v1, box_size);
        let uv = unit_vector(v1, v2).ok_or(SimError::CoincidentVertices {
            a: e.from,
            b: e.to,
        })?;
        forces[e.from] += 0.5 * lambda * uv;
    }
    Ok(forces)
}

/// Output of [`motility_force`]: the drive on every vertex and each
/// polygon's new orientation.
#[derive(Clone, Debug)]
pub struct Motility {
    pub forces: Vec<DVec2>,
    pub theta: Vec<f64>,
}

/// Noisy alignment drive.
///
/// Each polygon averages its own heading with the headings of every polygon
/// sharing at least one vertex with it, adds `eta · (nx, ny)` with
/// `nx, ny ~ U[-π, π)`, and applies the result to each of its vertices. The
/// new orientation is the angle of that same vector.
///
/// ### Parameters
/// - `tissue` - Current tissue; only read.
/// - `eta` - Noise scale.
/// - `rng` - Source of the noise draws, two per polygon in polygon order.
/// - `acc` - Scratch buffer, resized and cleared here.
pub fn motility_force(
    tissue: &Tissue,
    eta: f64,
    rng: &mut impl Rng,
    acc: &mut AlignmentBuffer,
) -> Motility {
    let polygons = tissue.polygons();
    acc.ensure_len(polygons.len());

    for poly in polygons {
        acc.add(poly.id, angle_to_vector(poly.theta));
        for nb in tissue.neighbors_of(poly.id) {
            acc.add(poly.id, angle_to_vector(polygons[nb].theta));
        }
    }

    let mut forces = vec![DVec2::ZERO; tissue.vertices.len()];
    let mut theta = Vec::with_capacity(polygons.len());
    for poly in polygons {
        let noise = DVec2::new(rng.random_range(-PI..PI), rng.random_range(-PI..PI));
        let drive = acc.avg_dir(poly.id) + eta * noise;
        for &i in &poly.indices {
            forces[i] += drive;
        }
        theta.push(vector_to_angle(drive));
    }

    Motility { forces, theta }
}

/// `-(elastic + adhesion + contraction)`: minus the energy gradient.
pub fn passive_force(tissue: &Tissue, params: &Parameters) -> Result<Vec<DVec2>> {
    let box_size = params.box_size();
    let vertices = &tissue.vertices;
    let polygons = tissue.polygons();

    let f1 = elastic_force(vertices, polygons, params.ka, box_size);
    let f2 = adhesion_force(vertices, tissue.edges(), params.lambda, box_size)?;
    let f3 = contraction_force(vertices, polygons, params.gamma, box_size)?;

    Ok(f1
        .iter()
        .zip(&f2)
        .zip(&f3)
        .map(|((a, b), c)| -(*a + *b + *c))
        .collect())
}

/// `-(elastic + adhesion + contraction + motility)`.
///
/// Draws the motility noise from `rng`. The tissue is only read; the new
/// orientations come back in [`Motility::theta`] for the caller to commit
/// once the move has succeeded.
///
/// ### Returns
/// The total force per vertex, and the motility output whose `forces` are
/// already folded into it.
pub fn total_force(
    tissue: &Tissue,
    params: &Parameters,
    rng: &mut impl Rng,
    acc: &mut AlignmentBuffer,
) -> Result<(Vec<DVec2>, Motility)> {
    let mut forces = passive_force(tissue, params)?;
    let motility = motility_force(tissue, params.eta, rng, acc);

    for (f, m) in forces.iter_mut().zip(&motility.forces) {
        *f -= *m;
    }
    Ok((forces, motility))
}

/// Overdamped update `v += Δt · F`, then one periodic wrap per axis.
///
/// The single wrap brings a coordinate back into `[0, L)` as long as the
/// step moved it by less than one box length. Every new position is
/// checked before any is written, so on error `vertices` is unchanged.
///
/// ### Errors
/// [`SimError::NonFinitePosition`] if any updated coordinate is not finite.
pub fn move_vertices(vertices: &mut [DVec2], forces: &[DVec2], params: &Parameters) -> Result<()> {
    let moved = vertices
        .iter()
        .zip(forces)
        .enumerate()
        .map(|(i, (v, f))| {
            let p = *v + params.delta_t * *f;
            if p.is_finite() {
                Ok(DVec2::new(wrap_once(p.x, params.lx), wrap_once(p.y, params.ly)))
            } else {
                Err(SimError::NonFinitePosition { vertex: i })
            }
        })
        .collect::<Result<Vec<_>>>()?;

    vertices[..moved.len()].copy_from_slice(&moved);
    Ok(())
}

#[inline]
fn wrap_once(x: f64, l: f64) -> f64 {
    if x < 0.0 {
        let w = x + l;
        // A tiny negative x rounds to exactly `l`.
        if w >= l { 0.0 } else { w }
    } else if x >= l {
        x - l
    } else {
        x
    }
}

/// Euclidean norm of the whole force field.
pub fn force_norm(forces: &[DVec2]) -> f64 {
    forces.iter().map(|f| f.length_squared()).sum::<f64>().sqrt()
}
