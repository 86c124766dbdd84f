use glam::DVec2;

use crate::types::PolygonId;

/// A temporary buffer that accumulates heading vectors per polygon.
///
/// For each `PolygonId`, this buffer stores:
///
/// - The sum of all heading vectors added for that polygon.
/// - The number of contributions that were added.
///
/// The motility force uses it to average a cell's heading with the
/// headings of the cells around it.
#[derive(Debug)]
pub struct AlignmentBuffer {
    /// Accumulated heading vectors for each polygon.
    dir: Vec<DVec2>,
    /// Number of contributions for each polygon.
    pub count: Vec<u32>,
}

impl AlignmentBuffer {
    /// Creates a new [`AlignmentBuffer`] with all sums zero and all counts zero.
    ///
    /// ### Parameters
    /// - `len` - Number of polygons this buffer can store headings for.
    pub fn with_len(len: usize) -> Self {
        Self {
            dir: vec![DVec2::ZERO; len],
            count: vec![0; len],
        }
    }

    /// Resizes the buffer to `len` entries and clears every entry.
    pub fn ensure_len(&mut self, len: usize) {
        if self.dir.len() != len {
            self.dir.resize(len, DVec2::ZERO);
            self.count.resize(len, 0);
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        self.dir.fill(DVec2::ZERO);
        self.count.fill(0);
    }

    /// Adds one heading contribution for the given polygon.
    ///
    /// ### Panics
    /// Panics if `id` is out of bounds for the internal arrays.
    #[inline]
    pub fn add(&mut self, id: PolygonId, dir: DVec2) {
        self.dir[id] += dir;
        self.count[id] += 1;
    }

    /// Mean heading for a polygon, or `DVec2::ZERO` if nothing was added.
    ///
    /// The mean of unit headings is not renormalized; its length shrinks
    /// as the contributing headings disagree.
    #[inline]
    pub fn avg_dir(&self, id: PolygonId) -> DVec2 {
        let c = self.count[id];
        if c == 0 {
            DVec2::ZERO
        } else {
            self.dir[id] / f64::from(c)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dir.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dir.is_empty()
    }
}
