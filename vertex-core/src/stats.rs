//! Summary measures of cell shape.

use glam::DVec2;

use crate::tissue::Tissue;

/// Averages over all cells of a tissue.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TissueStats {
    pub cells: usize,
    pub mean_area: f64,
    pub mean_perimeter: f64,
    /// Mean of `P / √A`; about 3.72 for regular hexagons.
    pub mean_shape_index: f64,
    pub mean_sides: f64,
    /// Shortest directed edge.
    pub shortest_edge: f64,
    /// Mean interior angle over all cell corners, in radians.
    pub mean_interior_angle: f64,
}

impl TissueStats {
    /// Measures `tissue` in a box of size `box_size`.
    ///
    /// An empty tissue yields all zeros; `shortest_edge` is `INFINITY` when
    /// there are no edges.
    pub fn measure(tissue: &Tissue, box_size: DVec2) -> Self {
        let polygons = tissue.polygons();
        let vertices = &tissue.vertices;

        let shortest_edge = tissue
            .edges()
            .iter()
            .map(|&e| tissue.edge_length(e, box_size))
            .fold(f64::INFINITY, f64::min);

        if polygons.is_empty() {
            return Self {
                shortest_edge,
                ..Self::default()
            };
        }

        let mut stats = Self {
            cells: polygons.len(),
            shortest_edge,
            ..Self::default()
        };
        let mut corners = 0usize;
        let mut angle_sum = 0.0;

        for p in polygons {
            let area = p.area(vertices, box_size);
            let perimeter = p.perimeter(vertices, box_size);
            stats.mean_area += area;
            stats.mean_perimeter += perimeter;
            if area > 0.0 {
                stats.mean_shape_index += perimeter / area.sqrt();
            }
            stats.mean_sides += p.indices.len() as f64;

            let angles = p.interior_angles(vertices, box_size);
            corners += angles.len();
            angle_sum += angles.iter().sum::<f64>();
        }

        let n = polygons.len() as f64;
        stats.mean_area /= n;
        stats.mean_perimeter /= n;
        stats.mean_shape_index /= n;
        stats.mean_sides /= n;
        if corners > 0 {
            stats.mean_interior_angle = angle_sum / corners as f64;
        }
        stats
    }
}
