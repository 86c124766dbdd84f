//! Periodic honeycomb tissues.
//!
//! Builds the flat-top hexagonal tiling used as the reference network:
//! `nx` columns by `ny` rows of regular hexagons of a given area, with
//! every bond stored once in each direction.

use std::f64::consts::FRAC_PI_3;

use glam::DVec2;
use rand::Rng;

use crate::{
    error::Result,
    geometry,
    tissue::Tissue,
    types::{Edge, VertexId},
};

/// Raw honeycomb data, before it is turned into a [`Tissue`].
#[derive(Clone, Debug)]
pub struct Honeycomb {
    pub vertices: Vec<DVec2>,
    pub edges: Vec<Edge>,
    pub cycles: Vec<Vec<VertexId>>,
    pub box_size: DVec2,
}

impl Honeycomb {
    /// Side length of a regular hexagon with the given area.
    pub fn side_for_area(area: f64) -> f64 {
        (2.0 * area / (3.0 * 3.0_f64.sqrt())).sqrt()
    }

    /// Builds the tiling.
    ///
    /// Columns alternate by half a row, so `nx` must be even for the
    /// tiling to close periodically in x.
    ///
    /// ### Parameters
    /// - `nx` - Number of hexagon columns (even, at least 2).
    /// - `ny` - Number of hexagon rows (at least 2).
    /// - `cell_area` - Area of each hexagon.
    ///
    /// ### Panics
    /// Panics if `nx` is odd or either count is below 2.
    pub fn new(nx: usize, ny: usize, cell_area: f64) -> Self {
        assert!(nx >= 2 && nx % 2 == 0, "nx must be even and at least 2");
        assert!(ny >= 2, "ny must be at least 2");

        let a = Self::side_for_area(cell_area);
        let h = 3.0_f64.sqrt() * a;
        let box_size = DVec2::new(1.5 * a * nx as f64, h * ny as f64);
        let tol = 1e-6 * a;

        let mut vertices: Vec<DVec2> = Vec::with_capacity(2 * nx * ny);
        let mut cycles = Vec::with_capacity(nx * ny);

        for c in 0..nx {
            for r in 0..ny {
                let center = DVec2::new(
                    a + 1.5 * a * c as f64,
                    h * (r as f64 + 0.5) + 0.5 * h * (c % 2) as f64,
                );
                let cycle = (0..6)
                    .map(|k| {
                        let corner = center + a * geometry::angle_to_vector(k as f64 * FRAC_PI_3);
                        let wrapped = DVec2::new(
                            corner.x.rem_euclid(box_size.x),
                            corner.y.rem_euclid(box_size.y),
                        );
                        match vertices
                            .iter()
                            .position(|&v| geometry::periodic_distance(v, wrapped, box_size) < tol)
                        {
                            Some(id) => id,
                            None => {
                                vertices.push(wrapped);
                                vertices.len() - 1
                            }
                        }
                    })
                    .collect::<Vec<VertexId>>();
                cycles.push(cycle);
            }
        }

        let edges = cycles
            .iter()
            .flat_map(|cycle| {
                let n = cycle.len();
                (0..n).map(move |k| Edge::new(cycle[k], cycle[(k + 1) % n]))
            })
            .collect();

        Self {
            vertices,
            edges,
            cycles,
            box_size,
        }
    }

    /// Converts into a tissue whose cells all prefer area `a0`.
    pub fn into_tissue(self, a0: f64, rng: &mut impl Rng) -> Result<Tissue> {
        Tissue::from_cycles(
            self.vertices,
            self.edges,
            self.cycles,
            a0,
            self.box_size,
            rng,
        )
    }
}
