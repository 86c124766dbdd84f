//! Vertices, directed edges and polygons of a periodic vertex-model tissue.

use glam::DVec2;
use rand::Rng;

use crate::{
    error::{Result, SimError},
    geometry,
    types::{Edge, PolygonId, VertexId},
};

/// A cell of the tissue.
///
/// `indices` is the counter-clockwise vertex cycle. `a0` is the preferred
/// area and `theta` the orientation used by the motility force.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub id: PolygonId,
    pub indices: Vec<VertexId>,
    pub a0: f64,
    pub theta: f64,
}

impl Polygon {
    pub fn new(id: PolygonId, indices: Vec<VertexId>, a0: f64, theta: f64) -> Self {
        Self {
            id,
            indices,
            a0,
            theta,
        }
    }

    /// The cycle's positions, made contiguous across the periodic boundary.
    pub fn unwrapped(&self, vertices: &[DVec2], box_size: DVec2) -> Vec<DVec2> {
        geometry::unwrap_loop(vertices, &self.indices, box_size)
    }

    pub fn area(&self, vertices: &[DVec2], box_size: DVec2) -> f64 {
        geometry::area(&self.unwrapped(vertices, box_size)).abs()
    }

    pub fn perimeter(&self, vertices: &[DVec2], box_size: DVec2) -> f64 {
        geometry::perimeter(&self.unwrapped(vertices, box_size))
    }

    pub fn center(&self, vertices: &[DVec2], box_size: DVec2) -> DVec2 {
        geometry::center(&self.unwrapped(vertices, box_size))
    }

    #[inline]
    pub fn contains(&self, v: VertexId) -> bool {
        self.indices.contains(&v)
    }

    #[inline]
    pub fn position_of(&self, v: VertexId) -> Option<usize> {
        self.indices.iter().position(|&i| i == v)
    }

    /// Cyclic predecessor and successor of `v` in this polygon.
    pub fn cyclic_neighbors(&self, v: VertexId) -> Option<(VertexId, VertexId)> {
        let n = self.indices.len();
        let pos = self.position_of(v)?;
        Some((self.indices[(pos + n - 1) % n], self.indices[(pos + 1) % n]))
    }

    /// Interior angle at every corner, in cycle order.
    pub fn interior_angles(&self, vertices: &[DVec2], box_size: DVec2) -> Vec<f64> {
        let pts = self.unwrapped(vertices, box_size);
        let n = pts.len();
        (0..n)
            .map(|k| geometry::angle_at(pts[k], pts[(k + n - 1) % n], pts[(k + 1) % n]))
            .collect()
    }
}

/// The canonical tissue state.
///
/// Vertex, edge and polygon counts are fixed at construction. Positions are
/// moved by the integrator; cycles and edge endpoints change only through
/// [`Tissue::set_cycle`] and [`Tissue::edges_mut`], used by the T1 engine.
#[derive(Clone, Debug)]
pub struct Tissue {
    pub vertices: Vec<DVec2>,
    edges: Vec<Edge>,
    polygons: Vec<Polygon>,
    /// Polygons incident to each vertex.
    incidence: Vec<Vec<PolygonId>>,
}

impl Tissue {
    /// Builds a tissue after validating indices and cycle orientation.
    ///
    /// Polygon ids are reassigned to their position in `polygons`. Cycles
    /// that wind clockwise are reversed, with a warning.
    ///
    /// ### Errors
    /// [`SimError::InvalidTissue`] if an index is out of range, a cycle has
    /// fewer than three vertices, or a cycle repeats a vertex.
    pub fn new(
        vertices: Vec<DVec2>,
        edges: Vec<Edge>,
        mut polygons: Vec<Polygon>,
        box_size: DVec2,
    ) -> Result<Self> {
        let n = vertices.len();

        for (k, e) in edges.iter().enumerate() {
            if e.from >= n || e.to >= n {
                return Err(SimError::InvalidTissue(format!(
                    "edge {k} ({} -> {}) references a vertex outside 0..{n}",
                    e.from, e.to
                )));
            }
        }

        for (id, poly) in polygons.iter_mut().enumerate() {
            poly.id = id;
            if poly.indices.len() < 3 {
                return Err(SimError::InvalidTissue(format!(
                    "polygon {id} has only {} vertices",
                    poly.indices.len()
                )));
            }
            if let Some(&bad) = poly.indices.iter().find(|&&i| i >= n) {
                return Err(SimError::InvalidTissue(format!(
                    "polygon {id} references vertex {bad} outside 0..{n}"
                )));
            }
            let mut sorted = poly.indices.clone();
            sorted.sort_unstable();
            if sorted.windows(2).any(|w| w[0] == w[1]) {
                return Err(SimError::InvalidTissue(format!(
                    "polygon {id} repeats a vertex"
                )));
            }
            let pts = poly.unwrapped(&vertices, box_size);
            if !geometry::is_counter_clockwise(&pts) {
                log::warn!("polygon {id} is listed clockwise; reversing its cycle");
                poly.indices.reverse();
            }
        }

        let mut incidence = vec![Vec::with_capacity(3); n];
        for poly in &polygons {
            for &v in &poly.indices {
                incidence[v].push(poly.id);
            }
        }

        Ok(Self {
            vertices,
            edges,
            polygons,
            incidence,
        })
    }

    /// Builds a tissue from raw index cycles.
    ///
    /// Every polygon gets the preferred area `a0` and an orientation drawn
    /// uniformly from `[-π, π)`.
    pub fn from_cycles(
        vertices: Vec<DVec2>,
        edges: Vec<Edge>,
        cycles: Vec<Vec<VertexId>>,
        a0: f64,
        box_size: DVec2,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        let polygons = cycles
            .into_iter()
            .enumerate()
            .map(|(id, indices)| Polygon::new(id, indices, a0, geometry::random_angle(rng)))
            .collect();
        Self::new(vertices, edges, polygons, box_size)
    }

    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Mutable access to edge endpoints. The edge count cannot change.
    #[inline]
    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    #[inline]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Mutable polygons, for orientation updates. Cycles must go through
    /// [`Tissue::set_cycle`] to keep the incidence index valid.
    #[inline]
    pub(crate) fn polygons_mut(&mut self) -> &mut [Polygon] {
        &mut self.polygons
    }

    #[inline]
    pub fn polygon(&self, id: PolygonId) -> &Polygon {
        &self.polygons[id]
    }

    /// Polygons whose cycle contains `v`.
    #[inline]
    pub fn polygons_of(&self, v: VertexId) -> &[PolygonId] {
        &self.incidence[v]
    }

    /// Vertex-to-polygon incidence for every vertex.
    #[inline]
    pub fn incidence(&self) -> &[Vec<PolygonId>] {
        &self.incidence
    }

    /// Sets the preferred area of every polygon.
    pub fn set_preferred_area(&mut self, a0: f64) {
        for p in &mut self.polygons {
            p.a0 = a0;
        }
    }

    /// Replaces a polygon's cycle and updates the incidence index.
    pub fn set_cycle(&mut self, id: PolygonId, cycle: Vec<VertexId>) {
        for &v in &self.polygons[id].indices {
            if !cycle.contains(&v) {
                self.incidence[v].retain(|&p| p != id);
            }
        }
        for &v in &cycle {
            if !self.incidence[v].contains(&id) {
                self.incidence[v].push(id);
            }
        }
        self.polygons[id].indices = cycle;
    }

    /// Minimum-image length of a directed edge.
    pub fn edge_length(&self, edge: Edge, box_size: DVec2) -> f64 {
        geometry::periodic_distance(self.vertices[edge.from], self.vertices[edge.to], box_size)
    }

    /// Polygons sharing at least one vertex with `id`, excluding `id` itself.
    pub fn neighbors_of(&self, id: PolygonId) -> Vec<PolygonId> {
        let mut out: Vec<PolygonId> = self.polygons[id]
            .indices
            .iter()
            .flat_map(|&v| self.incidence[v].iter().copied())
            .filter(|&p| p != id)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}
