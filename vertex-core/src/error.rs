use std::path::PathBuf;

use thiserror::Error;

use crate::types::VertexId;

/// Errors raised by the simulation core.
///
/// Skipped T1 transitions are not errors; they are reported through
/// [`crate::transition::ScanReport`].
#[derive(Debug, Error)]
pub enum SimError {
    /// A unit vector was requested between two coincident vertices.
    #[error("vertices {a} and {b} coincide; direction between them is undefined")]
    CoincidentVertices { a: VertexId, b: VertexId },

    /// A vertex left the finite domain after a position update.
    #[error("vertex {vertex} has a non-finite position")]
    NonFinitePosition { vertex: VertexId },

    /// Relaxation exhausted its iteration or wall-time budget.
    #[error("relaxation did not converge after {iterations} iterations (force norm {force_norm:e})")]
    NotConverged { iterations: usize, force_norm: f64 },

    /// Box lengths and the time step must be positive and finite.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("invalid tissue: {0}")]
    InvalidTissue(String),

    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv trace: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
