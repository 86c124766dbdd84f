//! Steepest-descent relaxation of a tissue read from files.
//!
//! Same as `vertex-view --relax <vertices> <edges> <polygons> [<out_vertices>]`.

use anyhow::Result;
use vertex_view::cli;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = cli::parse_args(std::env::args().skip(1))?;
    args.relax = true;
    cli::run_relax(&args)
}
