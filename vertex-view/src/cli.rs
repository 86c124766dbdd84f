//! Argument parsing and the headless run modes shared by both binaries.

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result, anyhow, bail};
use glam::DVec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use vertex_core::{
    config::{DEFAULT_PREFERRED_AREA, Parameters, RunConfig, ScanPolicy},
    integrator::Simulation,
    io::{self, TissueFiles, TraceWriter, VertexDumpSink},
    lattice::Honeycomb,
    stats::TissueStats,
    tissue::Tissue,
};

pub const USAGE: &str = "\
usage:
  vertex-view <vertices> <edges> <polygons> <out_folder> <eta>
  vertex-view --relax <vertices> <edges> <polygons> [<out_vertices>]
  vertex-view --view [<vertices> <edges> <polygons>] [--lattice NX NY]
flags:
  --seed N          seed for orientations and noise (default 0)
  --params FILE     JSON parameter file
  --duration T      simulated time for dynamics runs (default 5)
  --deferred        apply T1 rewirings at the end of each scan";

/// Parsed command line.
#[derive(Debug, Default)]
pub struct Args {
    pub relax: bool,
    pub view: bool,
    pub deferred: bool,
    pub lattice: Option<(usize, usize)>,
    pub seed: u64,
    pub params: Option<PathBuf>,
    pub duration: Option<f64>,
    pub positional: Vec<String>,
}

fn next_value<T>(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = it
        .next()
        .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))?;
    raw.parse()
        .map_err(|e| anyhow!("{flag}: cannot parse {raw:?}: {e}"))
}

/// Parses arguments, excluding the program name.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--relax" => out.relax = true,
            "--view" => out.view = true,
            "--deferred" => out.deferred = true,
            "--lattice" => {
                let nx = next_value(&mut it, "--lattice")?;
                let ny = next_value(&mut it, "--lattice")?;
                out.lattice = Some((nx, ny));
            }
            "--seed" => out.seed = next_value(&mut it, "--seed")?,
            "--params" => out.params = Some(next_value::<String>(&mut it, "--params")?.into()),
            "--duration" => out.duration = Some(next_value(&mut it, "--duration")?),
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            _ => out.positional.push(arg),
        }
    }
    Ok(out)
}

impl Args {
    fn scan_policy(&self) -> ScanPolicy {
        if self.deferred {
            ScanPolicy::Deferred
        } else {
            ScanPolicy::Sequential
        }
    }

    /// Parameters for a box, from `--params` or the hexagonal defaults.
    ///
    /// The box size always comes from the tissue; `eta` overrides the file
    /// when given.
    pub fn parameters(&self, box_size: DVec2, eta: Option<f64>) -> Parameters {
        let base = match &self.params {
            Some(path) => Parameters::load_or_default(path),
            None => Parameters::hexagonal(box_size.x, box_size.y, Parameters::default().eta),
        };
        Parameters {
            lx: box_size.x,
            ly: box_size.y,
            eta: eta.unwrap_or(base.eta),
            ..base
        }
    }
}

/// Loads a tissue from files, using the default box if no `L` file exists.
pub fn load_tissue(files: &TissueFiles, rng: &mut impl Rng) -> Result<(Tissue, DVec2)> {
    let box_path = files.box_path();
    let box_size = if box_path.exists() {
        io::read_box(&box_path)?
    } else {
        let fallback = Parameters::default().box_size();
        log::warn!(
            "no box file at {}, using the default {:.4} x {:.4} box",
            box_path.display(),
            fallback.x,
            fallback.y
        );
        fallback
    };
    let tissue = files
        .load_in_box(box_size, DEFAULT_PREFERRED_AREA, rng)
        .with_context(|| format!("loading tissue from {}", files.vertices.display()))?;
    Ok((tissue, box_size))
}

/// Builds an `nx` × `ny` honeycomb of unit-area cells.
pub fn lattice_tissue(nx: usize, ny: usize, rng: &mut impl Rng) -> Result<(Tissue, DVec2)> {
    if nx < 2 || nx % 2 != 0 || ny < 2 {
        bail!("--lattice needs an even NX >= 2 and NY >= 2, got {nx} x {ny}");
    }
    let hc = Honeycomb::new(nx, ny, DEFAULT_PREFERRED_AREA);
    let box_size = hc.box_size;
    Ok((hc.into_tissue(DEFAULT_PREFERRED_AREA, rng)?, box_size))
}

fn print_stats(tissue: &Tissue, box_size: DVec2) {
    let s = TissueStats::measure(tissue, box_size);
    println!(
        "{} cells: mean area {:.4}, mean perimeter {:.4}, shape index {:.4}, \
         mean sides {:.3}, shortest edge {:.4}",
        s.cells, s.mean_area, s.mean_perimeter, s.mean_shape_index, s.mean_sides, s.shortest_edge
    );
}

/// `<vertices> <edges> <polygons> <out_folder> <eta>`: fixed-duration run.
pub fn run_dynamics(args: &Args) -> Result<()> {
    let [vertices, edges, polygons, out, eta] = args.positional.as_slice() else {
        bail!("{USAGE}");
    };
    let eta: f64 = eta
        .parse()
        .with_context(|| format!("eta must be a number, got {eta:?}"))?;

    let files = TissueFiles::new(vertices, edges, polygons);
    let mut rng = StdRng::seed_from_u64(args.seed);
    let (tissue, box_size) = files
        .load(DEFAULT_PREFERRED_AREA, &mut rng)
        .with_context(|| format!("loading tissue (box file {})", files.box_path().display()))?;
    let params = args.parameters(box_size, Some(eta));

    let cfg = RunConfig {
        duration: args.duration.unwrap_or(RunConfig::dynamics().duration),
        seed: args.seed,
        scan_policy: args.scan_policy(),
        ..RunConfig::dynamics()
    };

    let out = Path::new(out);
    let dump = VertexDumpSink::new(out)?;
    let trace = TraceWriter::create(out.join("trace.csv"))?;
    let mut sinks = (dump, trace);

    let mut sim = Simulation::new(tissue, params, rng.random());
    let summary = sim.run_for(&cfg, &mut sinks)?;
    sinks.1.finish()?;

    println!(
        "t = {:.2} after {} steps: energy {:.6}, force norm {:.3e}, {} T1 transitions",
        summary.time, summary.steps, summary.energy, summary.force_norm, summary.transitions
    );
    print_stats(sim.tissue(), box_size);
    Ok(())
}

/// `<vertices> <edges> <polygons> [<out_vertices>]`: steepest descent.
pub fn run_relax(args: &Args) -> Result<()> {
    let (files, out) = match args.positional.as_slice() {
        [v, e, p] => (TissueFiles::new(v, e, p), None),
        [v, e, p, out] => (TissueFiles::new(v, e, p), Some(out)),
        _ => bail!("{USAGE}"),
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (tissue, box_size) = load_tissue(&files, &mut rng)?;
    let params = args.parameters(box_size, None);
    let cfg = RunConfig {
        seed: args.seed,
        scan_policy: args.scan_policy(),
        ..RunConfig::relaxation()
    };

    let mut sim = Simulation::new(tissue, params, rng.random());
    let report = sim.relax(&cfg).context("relaxation failed")?;
    println!(
        "relaxed in {} iterations: energy {:.6}, force norm {:.3e}, {} T1 transitions",
        report.iterations, report.energy, report.force_norm, report.transitions
    );
    print_stats(sim.tissue(), box_size);

    if let Some(out) = out {
        io::write_vertices(out, &sim.tissue().vertices)?;
        log::info!("relaxed vertices written to {out}");
    }
    Ok(())
}
