//! Application entry point for the vertex-model tissue simulator.
//!
//! Without `--view` this runs headless: a fixed-duration dynamics run that
//! dumps vertex positions every step, or a steepest-descent relaxation
//! with `--relax`. With `--view` it opens the [`Viewer`] on a tissue read
//! from files or on a fresh honeycomb (`--lattice NX NY`). See
//! [`cli::USAGE`] for the full command line.

mod viewer;

use anyhow::{Result, anyhow};
use rand::{Rng, SeedableRng, rngs::StdRng};
use vertex_core::io::TissueFiles;
use vertex_view::cli;
use viewer::Viewer;

/// Opens the interactive viewer.
///
/// ### Returns
/// - `Ok(())` if the window is closed normally.
/// - `Err` if the tissue cannot be built or eframe fails to create the
///   native window or event loop.
fn run_viewer(args: &cli::Args) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let (tissue, box_size) = match args.positional.as_slice() {
        [] => {
            let (nx, ny) = args.lattice.unwrap_or((6, 4));
            cli::lattice_tissue(nx, ny, &mut rng)?
        }
        [v, e, p] => cli::load_tissue(&TissueFiles::new(v, e, p), &mut rng)?,
        _ => anyhow::bail!("{}", cli::USAGE),
    };
    let params = args.parameters(box_size, None);
    let seed: u64 = rng.random();

    log::info!(
        "opening viewer on {} cells ({:.3} x {:.3} box)",
        tissue.polygons().len(),
        box_size.x,
        box_size.y
    );

    eframe::run_native(
        "Vertex Model",
        eframe::NativeOptions::default(),
        Box::new(move |_cc| Ok(Box::new(Viewer::new(tissue, params, seed)))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::parse_args(std::env::args().skip(1))?;

    if args.view {
        run_viewer(&args)
    } else if args.relax {
        cli::run_relax(&args)
    } else {
        cli::run_dynamics(&args)
    }
}
