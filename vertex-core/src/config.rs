//! Physical parameters and run settings.

use std::path::Path;
use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Preferred cell area used when building polygons from input files.
pub const DEFAULT_PREFERRED_AREA: f64 = 1.0;

/// Immutable per-run physical constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Box length along x.
    pub lx: f64,
    /// Box length along y.
    pub ly: f64,
    /// Elastic area modulus.
    pub ka: f64,
    /// Actomyosin contraction (perimeter) coefficient.
    pub gamma: f64,
    /// Line tension (adhesion) coefficient.
    pub lambda: f64,
    /// Motility noise scale.
    pub eta: f64,
    /// Reserved; carried through input files but unused by the physics.
    pub xi: f64,
    /// Bond length below which a T1 transition is attempted.
    pub lmin: f64,
    /// Integration step.
    pub delta_t: f64,
}

impl Parameters {
    /// Hexagonal-network constants for a box of size `lx` × `ly`.
    ///
    /// Scaled from `ka = 1` and a preferred area of
    /// [`DEFAULT_PREFERRED_AREA`]: `gamma = 0.04 ka A0`,
    /// `lambda = 0.12 ka A0^(3/2)`.
    pub fn hexagonal(lx: f64, ly: f64, eta: f64) -> Self {
        let ka = 1.0;
        let a0 = DEFAULT_PREFERRED_AREA;
        Self {
            lx,
            ly,
            ka,
            gamma: 0.04 * ka * a0,
            lambda: 0.12 * ka * a0.powf(1.5),
            eta,
            xi: 0.2,
            lmin: 0.2,
            delta_t: 0.05,
        }
    }

    #[inline]
    pub fn box_size(&self) -> DVec2 {
        DVec2::new(self.lx, self.ly)
    }

    /// Checks that the box and the time step are usable.
    ///
    /// ### Errors
    /// [`SimError::InvalidParameters`] if `lx`, `ly` or `delta_t` is not a
    /// positive finite number.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("lx", self.lx), ("ly", self.ly), ("delta_t", self.delta_t)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SimError::InvalidParameters(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Load from a JSON file, or return defaults if it is missing or malformed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(params) => {
                    log::info!("Loaded parameters from {:?}", path.as_ref());
                    params
                }
                Err(e) => {
                    log::warn!("Failed to parse parameters: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Parameters file not found, using defaults");
                Self::default()
            }
        }
    }
}

impl Default for Parameters {
    /// A 6 × 4 flat-top honeycomb of unit-area cells.
    fn default() -> Self {
        let side = (2.0 / (3.0 * 3.0_f64.sqrt())).sqrt();
        let lx = 9.0 * side;
        let ly = 4.0 * 3.0_f64.sqrt() * side;
        Self::hexagonal(lx, ly, 0.01)
    }
}

/// How the T1 scan applies accepted rewirings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanPolicy {
    /// Commit each rewiring immediately; later edges in the same scan see it.
    #[default]
    Sequential,
    /// Evaluate every short edge against the start-of-scan state and apply
    /// the accepted rewirings at the end, skipping overlapping ones.
    Deferred,
}

/// Settings for one integrator run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunConfig {
    /// Simulated duration for fixed-duration runs.
    pub duration: f64,
    /// Force-norm threshold for relaxation runs.
    pub tolerance: f64,
    /// Iteration budget for relaxation runs.
    pub max_iterations: usize,
    /// Optional wall-clock budget for relaxation runs.
    pub max_wall_time: Option<Duration>,
    /// Include the stochastic motility term in the force field.
    pub motility: bool,
    /// Seed from which initial orientations and the noise seed are drawn.
    pub seed: u64,
    pub scan_policy: ScanPolicy,
}

impl RunConfig {
    /// Fixed-duration molecular-dynamics run with active motility.
    pub fn dynamics() -> Self {
        Self {
            duration: 5.0,
            tolerance: 1e-6,
            max_iterations: 100_000,
            max_wall_time: None,
            motility: true,
            seed: 0,
            scan_policy: ScanPolicy::Sequential,
        }
    }

    /// Steepest-descent relaxation on the passive energy.
    pub fn relaxation() -> Self {
        Self {
            motility: false,
            ..Self::dynamics()
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::dynamics()
    }
}
