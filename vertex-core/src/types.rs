/// Identifier for a vertex in a [`crate::tissue::Tissue`].
///
/// This is an index into `Tissue::vertices`, and is only meaningful within
/// the lifetime of a given `Tissue` instance.
pub type VertexId = usize;

/// Identifier for a polygon (cell) in a [`crate::tissue::Tissue`].
///
/// Polygon ids are stable: T1 transitions rewrite a polygon's vertex cycle
/// but never its id.
pub type PolygonId = usize;

/// A directed bond from one vertex to another.
///
/// The edge list of a tissue is not deduplicated; a bond shared by two
/// cells is normally stored once in each direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
}

impl Edge {
    pub const fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }

    /// The same bond traversed in the opposite direction.
    pub const fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}
