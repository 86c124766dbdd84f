//! Core 2-D vertex-model tissue simulation library.
//!
//! Main components:
//! - [`geometry`]: periodic vector algebra and polygon measures.
//! - [`tissue`]: vertices, directed edges and polygon cycles.
//! - [`energy`]: elastic, adhesion and contraction energy.
//! - [`force`]: energy gradients, the motility drive and the position update.
//! - [`transition`]: T1 rewiring of short bonds.
//! - [`integrator`]: fixed-duration runs and steepest-descent relaxation.
//! - [`config`]: mechanical parameters and run settings.
//! - [`alignment_buffer`]: scratch buffer for averaged cell headings.
//! - [`lattice`]: periodic honeycomb tissues.
//! - [`io`]: tissue files, vertex dumps and CSV traces.
//! - [`stats`]: cell shape statistics.
//! - [`error`]: the crate error type.
//! - [`types`]: shared type aliases and IDs.

pub mod alignment_buffer;
pub mod config;
pub mod energy;
pub mod error;
pub mod force;
pub mod geometry;
pub mod integrator;
pub mod io;
pub mod lattice;
pub mod stats;
pub mod tissue;
pub mod transition;
pub mod types;
