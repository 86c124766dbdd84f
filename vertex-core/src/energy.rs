//! Potential energy of a vertex-model configuration.
//!
//! `E = E_elastic + E_adhesion / 4 + E_contraction`, where
//!
//! - `E_elastic = Σ_cells (ka/2) (A - A0)²`
//! - `E_adhesion = Σ_directed edges Λ · |edge|`
//! - `E_contraction = Σ_cells (γ/2) P²`
//!
//! The adhesion sum runs over the directed edge list as stored, which holds
//! each bond in both directions and counts every bond from both cells that
//! share it; the factor 1/4 is applied to the aggregate.
//!
//! All functions are pure and take slices, so the T1 engine can evaluate
//! a handful of hypothetical polygons and edges without touching the tissue.

use glam::DVec2;

use crate::{config::Parameters, geometry, tissue::Polygon, types::Edge};

/// Energy split into its three terms. `adhesion` is already divided by 4.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnergyBreakdown {
    pub elastic: f64,
    pub adhesion: f64,
    pub contraction: f64,
}

impl EnergyBreakdown {
    #[inline]
    pub fn total(&self) -> f64 {
        self.elastic + self.adhesion + self.contraction
    }
}

/// Total potential energy of the configuration.
pub fn total_energy(
    vertices: &[DVec2],
    polygons: &[Polygon],
    edges: &[Edge],
    params: &Parameters,
) -> f64 {
    energy_breakdown(vertices, polygons, edges, params).total()
}

/// Per-term potential energy of the configuration.
pub fn energy_breakdown(
    vertices: &[DVec2],
    polygons: &[Polygon],
    edges: &[Edge],
    params: &Parameters,
) -> EnergyBreakdown {
    let box_size = params.box_size();
    EnergyBreakdown {
        elastic: elastic_energy(vertices, polygons, params.ka, box_size),
        adhesion: adhesion_energy(vertices, edges, params.lambda, box_size) / 4.0,
        contraction: contraction_energy(vertices, polygons, params.gamma, box_size),
    }
}

pub fn elastic_energy(vertices: &[DVec2], polygons: &[Polygon], ka: f64, box_size: DVec2) -> f64 {
    polygons
        .iter()
        .map(|p| {
            let da = p.area(vertices, box_size) - p.a0;
            0.5 * ka * da * da
        })
        .sum()
}

/// Line-tension energy over the directed edge list, before the 1/4 factor.
pub fn adhesion_energy(vertices: &[DVec2], edges: &[Edge], lambda: f64, box_size: DVec2) -> f64 {
    edges
        .iter()
        .map(|e| lambda * geometry::periodic_distance(vertices[e.to], vertices[e.from], box_size))
        .sum()
}

pub fn contraction_energy(
    vertices: &[DVec2],
    polygons: &[Polygon],
    gamma: f64,
    box_size: DVec2,
) -> f64 {
    polygons
        .iter()
        .map(|p| {
            let perim = p.perimeter(vertices, box_size);
            0.5 * gamma * perim * perim
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (Vec<DVec2>, Vec<Polygon>, Vec<Edge>) {
        let vertices = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(1.0, 2.0),
        ];
        let polygons = vec![Polygon::new(0, vec![0, 1, 2, 3], 1.0, 0.0)];
        let edges = (0..4)
            .flat_map(|i| [Edge::new(i, (i + 1) % 4), Edge::new((i + 1) % 4, i)])
            .collect();
        (vertices, polygons, edges)
    }

    fn params(ka: f64, gamma: f64, lambda: f64) -> Parameters {
        Parameters {
            lx: 10.0,
            ly: 10.0,
            ka,
            gamma,
            lambda,
            ..Parameters::default()
        }
    }

    #[test]
    fn square_at_preferred_area_has_no_elastic_energy() {
        let (v, p, e) = square();
        let b = energy_breakdown(&v, &p, &e, &params(1.0, 0.0, 0.0));
        assert_eq!(b.elastic, 0.0);
        assert_eq!(b.total(), 0.0);
    }

    #[test]
    fn terms_follow_their_formulas() {
        let (v, mut p, e) = square();
        p[0].a0 = 0.5;
        let b = energy_breakdown(&v, &p, &e, &params(2.0, 0.1, 0.3));

        // (ka/2)(A - A0)^2 = 1.0 * 0.25
        assert!((b.elastic - 0.25).abs() < 1e-12);
        // 8 directed unit edges, Λ = 0.3, quartered.
        assert!((b.adhesion - 0.3 * 8.0 / 4.0).abs() < 1e-12);
        // (γ/2) P^2 = 0.05 * 16
        assert!((b.contraction - 0.8).abs() < 1e-12);
        assert!((total_energy(&v, &p, &e, &params(2.0, 0.1, 0.3)) - b.total()).abs() < 1e-12);
    }

    #[test]
    fn adhesion_uses_minimum_image_lengths() {
        let v = vec![DVec2::new(0.1, 5.0), DVec2::new(9.9, 5.0)];
        let e = vec![Edge::new(0, 1)];
        let len = adhesion_energy(&v, &e, 1.0, DVec2::new(10.0, 10.0));
        assert!((len - 0.2).abs() < 1e-12);
    }
}
