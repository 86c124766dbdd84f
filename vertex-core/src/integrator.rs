//! Overdamped time stepping.
//!
//! One step is:
//! 1. energy of the current configuration,
//! 2. force field (with or without the motility term, per [`RunConfig`]),
//! 3. [`force::move_vertices`] with the fixed time step,
//! 4. a [`transition::t1_scan`] over the moved tissue.
//!
//! [`Simulation::run_for`] repeats this for a fixed simulated duration and
//! hands every step to a [`SnapshotSink`]. [`Simulation::relax`] repeats it
//! until the force norm falls below a tolerance.

use std::time::Instant;

use glam::DVec2;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    alignment_buffer::AlignmentBuffer,
    config::{Parameters, RunConfig},
    energy,
    error::{Result, SimError},
    force,
    tissue::Tissue,
    transition::{self, ScanReport},
};

/// What happened during one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Simulated time at the start of the step.
    pub time: f64,
    /// Energy before the move.
    pub energy: f64,
    /// Norm of the force field that drove the move.
    pub force_norm: f64,
    pub scan: ScanReport,
}

/// Receives the tissue after every step of a run.
pub trait SnapshotSink {
    fn emit(&mut self, report: &StepReport, tissue: &Tissue) -> Result<()>;
}

/// Discards every snapshot.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn emit(&mut self, _report: &StepReport, _tissue: &Tissue) -> Result<()> {
        Ok(())
    }
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for &mut S {
    fn emit(&mut self, report: &StepReport, tissue: &Tissue) -> Result<()> {
        (**self).emit(report, tissue)
    }
}

impl<A: SnapshotSink, B: SnapshotSink> SnapshotSink for (A, B) {
    fn emit(&mut self, report: &StepReport, tissue: &Tissue) -> Result<()> {
        self.0.emit(report, tissue)?;
        self.1.emit(report, tissue)
    }
}

/// Outcome of [`Simulation::run_for`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    /// Simulated time after the last step.
    pub time: f64,
    /// Energy and force norm of the last step.
    pub energy: f64,
    pub force_norm: f64,
    /// T1 transitions committed during the run.
    pub transitions: usize,
}

/// Outcome of a converged [`Simulation::relax`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RelaxReport {
    /// Force evaluations, including the one that met the tolerance.
    pub iterations: usize,
    pub energy: f64,
    pub force_norm: f64,
    pub transitions: usize,
}

/// A tissue together with its parameters, noise source and clock.
#[derive(Debug)]
pub struct Simulation {
    tissue: Tissue,
    params: Parameters,
    rng: StdRng,
    acc: AlignmentBuffer,
    time: f64,
    steps: usize,
    transitions: usize,
}

impl Simulation {
    /// Wraps a tissue for stepping.
    ///
    /// ### Parameters
    /// - `tissue` - Initial configuration.
    /// - `params` - Mechanical constants and box size.
    /// - `seed` - Seed for the motility noise.
    pub fn new(tissue: Tissue, params: Parameters, seed: u64) -> Self {
        let acc = AlignmentBuffer::with_len(tissue.polygons().len());
        Self {
            tissue,
            params,
            rng: StdRng::seed_from_u64(seed),
            acc,
            time: 0.0,
            steps: 0,
            transitions: 0,
        }
    }

    pub fn tissue(&self) -> &Tissue {
        &self.tissue
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Replaces the parameters from the next step on.
    pub fn set_params(&mut self, params: Parameters) {
        self.params = params;
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// T1 transitions committed since construction.
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    pub fn into_tissue(self) -> Tissue {
        self.tissue
    }

    /// Current energy without advancing.
    pub fn energy(&self) -> f64 {
        energy::total_energy(
            &self.tissue.vertices,
            self.tissue.polygons(),
            self.tissue.edges(),
            &self.params,
        )
    }

    /// Energy and force field of the current configuration.
    ///
    /// With motility on this draws noise and also returns the new cell
    /// orientations, which [`Simulation::advance`] commits.
    fn forces(&mut self, cfg: &RunConfig) -> Result<(f64, Vec<DVec2>, Option<Vec<f64>>)> {
        let energy = self.energy();
        if cfg.motility {
            let (forces, motility) =
                force::total_force(&self.tissue, &self.params, &mut self.rng, &mut self.acc)?;
            Ok((energy, forces, Some(motility.theta)))
        } else {
            let forces = force::passive_force(&self.tissue, &self.params)?;
            Ok((energy, forces, None))
        }
    }

    /// Moves the vertices along `forces`, commits `theta`, then rewires
    /// short bonds. Nothing is written if the move fails.
    fn advance(
        &mut self,
        forces: &[DVec2],
        theta: Option<Vec<f64>>,
        cfg: &RunConfig,
    ) -> Result<ScanReport> {
        force::move_vertices(&mut self.tissue.vertices, forces, &self.params)?;
        if let Some(theta) = theta {
            for (poly, theta) in self.tissue.polygons_mut().iter_mut().zip(theta) {
                poly.theta = theta;
            }
        }
        let scan = transition::t1_scan(&mut self.tissue, &self.params, cfg.scan_policy);
        self.transitions += scan.transitions();
        self.time += self.params.delta_t;
        self.steps += 1;
        Ok(scan)
    }

    /// Advances the tissue by one time step.
    ///
    /// ### Errors
    /// [`SimError::InvalidParameters`] for a non-positive box or time step,
    /// coincident-vertex errors from the force model and
    /// [`SimError::NonFinitePosition`] from the move. A failed step leaves
    /// the tissue and the clock as they were.
    pub fn step(&mut self, cfg: &RunConfig) -> Result<StepReport> {
        self.params.validate()?;
        let time = self.time;
        let (energy, forces, theta) = self.forces(cfg)?;
        let force_norm = force::force_norm(&forces);
        let scan = self.advance(&forces, theta, cfg)?;
        Ok(StepReport {
            time,
            energy,
            force_norm,
            scan,
        })
    }

    /// Steps for `cfg.duration` of simulated time, emitting every step.
    ///
    /// The step count is `⌈duration / Δt⌉`, so the final time is the first
    /// multiple of `Δt` not below the requested duration.
    ///
    /// ### Errors
    /// [`SimError::InvalidParameters`] before any step is taken, or the
    /// first failing step or sink.
    pub fn run_for(&mut self, cfg: &RunConfig, sink: &mut impl SnapshotSink) -> Result<RunSummary> {
        self.params.validate()?;
        if !(cfg.duration >= 0.0 && cfg.duration.is_finite()) {
            return Err(SimError::InvalidParameters(format!(
                "run duration must be finite and non-negative, got {}",
                cfg.duration
            )));
        }
        let n = (cfg.duration / self.params.delta_t - 1e-9).ceil().max(0.0) as usize;
        log::info!(
            "running {n} steps (T = {}, dt = {}) on {} cells",
            cfg.duration,
            self.params.delta_t,
            self.tissue.polygons().len()
        );

        let mut summary = RunSummary::default();
        for k in 0..n {
            let report = self.step(cfg)?;
            sink.emit(&report, &self.tissue)?;

            summary.steps += 1;
            summary.energy = report.energy;
            summary.force_norm = report.force_norm;
            summary.transitions += report.scan.transitions();

            if (k + 1) % 100 == 0 {
                log::info!(
                    "t = {:.2}: energy {:.6}, force norm {:.3e}, {} T1 so far",
                    self.time,
                    report.energy,
                    report.force_norm,
                    summary.transitions
                );
            }
        }
        summary.time = self.time;

        log::info!(
            "run finished at t = {:.2} after {} steps, {} T1 transitions",
            summary.time,
            summary.steps,
            summary.transitions
        );
        Ok(summary)
    }

    /// Steepest descent until the force norm drops below `cfg.tolerance`.
    ///
    /// The norm is checked before each move, so an already relaxed tissue
    /// is left untouched.
    ///
    /// ### Errors
    /// [`SimError::InvalidParameters`] for a non-positive box or time step.
    /// [`SimError::NotConverged`] once `cfg.max_iterations` force
    /// evaluations or `cfg.max_wall_time` have been spent.
    pub fn relax(&mut self, cfg: &RunConfig) -> Result<RelaxReport> {
        self.params.validate()?;
        let started = Instant::now();
        let transitions_before = self.transitions;
        let mut force_norm = f64::INFINITY;

        log::info!(
            "relaxing {} cells to force norm < {:e}",
            self.tissue.polygons().len(),
            cfg.tolerance
        );

        for iteration in 1..=cfg.max_iterations {
            if let Some(budget) = cfg.max_wall_time
                && started.elapsed() > budget
            {
                log::warn!("relaxation hit its wall-time budget after {} iterations", iteration - 1);
                return Err(SimError::NotConverged {
                    iterations: iteration - 1,
                    force_norm,
                });
            }

            let (energy, forces, theta) = self.forces(cfg)?;
            force_norm = force::force_norm(&forces);
            if force_norm < cfg.tolerance {
                let report = RelaxReport {
                    iterations: iteration,
                    energy,
                    force_norm,
                    transitions: self.transitions - transitions_before,
                };
                log::info!(
                    "relaxed after {} iterations: energy {:.6}, force norm {:.3e}",
                    report.iterations,
                    report.energy,
                    report.force_norm
                );
                return Ok(report);
            }
            self.advance(&forces, theta, cfg)?;

            if iteration % 1000 == 0 {
                log::info!("iteration {iteration}: energy {energy:.6}, force norm {force_norm:.3e}");
            }
        }

        Err(SimError::NotConverged {
            iterations: cfg.max_iterations,
            force_norm,
        })
    }
}
