//! Plain-text tissue files and per-step output.
//!
//! Input files are whitespace separated, one record per line:
//!
//! - vertices: `x y`
//! - edges: `from to` (integral floats such as `3.000e+00` are accepted)
//! - polygons: a counter-clockwise vertex cycle per line
//! - box: the two box lengths, on one line or two
//!
//! Blank lines are ignored. Parse errors carry the file and 1-based line.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use glam::DVec2;
use rand::Rng;
use serde::Serialize;

use crate::{
    error::{Result, SimError},
    integrator::{SnapshotSink, StepReport},
    tissue::Tissue,
    types::{Edge, VertexId},
};

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_error(path: &Path, line: usize, message: impl Into<String>) -> SimError {
    SimError::Parse {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

/// Non-blank lines with their 1-based line numbers, split on whitespace.
fn records(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(k, line)| (k + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, tokens)| !tokens.is_empty())
}

fn parse_float(path: &Path, line: usize, token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|e| parse_error(path, line, format!("bad number {token:?}: {e}")))
}

fn parse_index(path: &Path, line: usize, token: &str) -> Result<VertexId> {
    if let Ok(i) = token.parse::<VertexId>() {
        return Ok(i);
    }
    let x = parse_float(path, line, token)?;
    if x >= 0.0 && x.fract() == 0.0 && x <= VertexId::MAX as f64 {
        Ok(x as VertexId)
    } else {
        Err(parse_error(path, line, format!("{token:?} is not a vertex index")))
    }
}

pub fn read_vertices(path: impl AsRef<Path>) -> Result<Vec<DVec2>> {
    let path = path.as_ref();
    let text = read_text(path)?;
    records(&text)
        .map(|(line, tokens)| match tokens.as_slice() {
            [x, y] => Ok(DVec2::new(
                parse_float(path, line, x)?,
                parse_float(path, line, y)?,
            )),
            _ => Err(parse_error(
                path,
                line,
                format!("expected 2 coordinates, found {}", tokens.len()),
            )),
        })
        .collect()
}

pub fn read_edges(path: impl AsRef<Path>) -> Result<Vec<Edge>> {
    let path = path.as_ref();
    let text = read_text(path)?;
    records(&text)
        .map(|(line, tokens)| match tokens.as_slice() {
            [from, to] => Ok(Edge::new(
                parse_index(path, line, from)?,
                parse_index(path, line, to)?,
            )),
            _ => Err(parse_error(
                path,
                line,
                format!("expected 2 vertex indices, found {}", tokens.len()),
            )),
        })
        .collect()
}

pub fn read_polygons(path: impl AsRef<Path>) -> Result<Vec<Vec<VertexId>>> {
    let path = path.as_ref();
    let text = read_text(path)?;
    records(&text)
        .map(|(line, tokens)| {
            tokens
                .iter()
                .map(|t| parse_index(path, line, t))
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Reads the box lengths `(lx, ly)`.
pub fn read_box(path: impl AsRef<Path>) -> Result<DVec2> {
    let path = path.as_ref();
    let text = read_text(path)?;
    let values = records(&text)
        .flat_map(|(line, tokens)| tokens.into_iter().map(move |t| (line, t)))
        .map(|(line, t)| parse_float(path, line, t).map(|x| (line, x)))
        .collect::<Result<Vec<_>>>()?;

    match values.as_slice() {
        [(_, lx), (_, ly)] if *lx > 0.0 && *ly > 0.0 => Ok(DVec2::new(*lx, *ly)),
        [(line, _), (_, _)] => Err(parse_error(path, *line, "box lengths must be positive")),
        _ => Err(parse_error(
            path,
            values.last().map_or(1, |(line, _)| *line),
            format!("expected 2 box lengths, found {}", values.len()),
        )),
    }
}

/// Formats like `%.18e`: `1.500000000000000000e+00`.
fn scientific(x: f64) -> String {
    let s = format!("{x:.18e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exp),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => s,
    }
}

/// Writes one `x y` line per vertex.
pub fn write_vertices(path: impl AsRef<Path>, vertices: &[DVec2]) -> Result<()> {
    let path = path.as_ref();
    let mut out = String::with_capacity(vertices.len() * 52);
    for v in vertices {
        out.push_str(&scientific(v.x));
        out.push(' ');
        out.push_str(&scientific(v.y));
        out.push('\n');
    }
    fs::write(path, out).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Paths of the three files that describe a tissue.
#[derive(Clone, Debug)]
pub struct TissueFiles {
    pub vertices: PathBuf,
    pub edges: PathBuf,
    pub polygons: PathBuf,
}

impl TissueFiles {
    pub fn new(
        vertices: impl Into<PathBuf>,
        edges: impl Into<PathBuf>,
        polygons: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vertices: vertices.into(),
            edges: edges.into(),
            polygons: polygons.into(),
        }
    }

    /// The box file `L` in the same directory as the vertex file.
    pub fn box_path(&self) -> PathBuf {
        self.vertices
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("L")
    }

    /// Reads all files, taking the box size from [`TissueFiles::box_path`].
    ///
    /// ### Parameters
    /// - `a0` - Preferred area given to every cell.
    /// - `rng` - Source of the initial cell orientations.
    ///
    /// ### Returns
    /// The tissue and its box size.
    pub fn load(&self, a0: f64, rng: &mut impl Rng) -> Result<(Tissue, DVec2)> {
        let box_size = read_box(self.box_path())?;
        let tissue = self.load_in_box(box_size, a0, rng)?;
        Ok((tissue, box_size))
    }

    /// Reads the vertex, edge and polygon files for a known box size.
    pub fn load_in_box(&self, box_size: DVec2, a0: f64, rng: &mut impl Rng) -> Result<Tissue> {
        let vertices = read_vertices(&self.vertices)?;
        let edges = read_edges(&self.edges)?;
        let cycles = read_polygons(&self.polygons)?;
        log::info!(
            "loaded {} vertices, {} edges, {} cells in a {:.4} x {:.4} box",
            vertices.len(),
            edges.len(),
            cycles.len(),
            box_size.x,
            box_size.y
        );
        Tissue::from_cycles(vertices, edges, cycles, a0, box_size, rng)
    }
}

/// Dumps vertex positions to `<folder>/<t:.2>.txt` after every step.
#[derive(Clone, Debug)]
pub struct VertexDumpSink {
    folder: PathBuf,
}

impl VertexDumpSink {
    /// Creates `folder` if it does not exist.
    pub fn new(folder: impl Into<PathBuf>) -> Result<Self> {
        let folder = folder.into();
        fs::create_dir_all(&folder).map_err(|source| SimError::Io {
            path: folder.clone(),
            source,
        })?;
        Ok(Self { folder })
    }

    pub fn path_for(&self, time: f64) -> PathBuf {
        self.folder.join(format!("{time:.2}.txt"))
    }
}

impl SnapshotSink for VertexDumpSink {
    fn emit(&mut self, report: &StepReport, tissue: &Tissue) -> Result<()> {
        write_vertices(self.path_for(report.time), &tissue.vertices)
    }
}

/// One row of the CSV trace.
#[derive(Clone, Debug, Serialize)]
pub struct TraceRecord {
    pub time: f64,
    pub energy: f64,
    pub force_norm: f64,
    pub short_edges: usize,
    pub transitions: usize,
}

impl From<&StepReport> for TraceRecord {
    fn from(r: &StepReport) -> Self {
        Self {
            time: r.time,
            energy: r.energy,
            force_norm: r.force_norm,
            short_edges: r.scan.short_edges,
            transitions: r.scan.transitions(),
        }
    }
}

/// Per-step energy and force trace as CSV.
pub struct TraceWriter<W: Write = File> {
    writer: csv::Writer<W>,
}

impl TraceWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("CSV trace: {}", path.display());
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn from_writer(w: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(w),
        }
    }

    pub fn record(&mut self, report: &StepReport) -> Result<()> {
        self.writer.serialize(TraceRecord::from(report))?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| SimError::Csv(csv::Error::from(e.into_error())))
    }
}

impl<W: Write> SnapshotSink for TraceWriter<W> {
    fn emit(&mut self, report: &StepReport, _tissue: &Tissue) -> Result<()> {
        self.record(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition::ScanReport;
    use rand::{SeedableRng, rngs::StdRng};

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vertex-io-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_vertices_and_skips_blank_lines() {
        let dir = scratch("vertices");
        let path = dir.join("v.txt");
        fs::write(&path, "0.5 1.0\n\n   \n2.5e-1\t3\n").unwrap();

        let v = read_vertices(&path).unwrap();
        assert_eq!(v, vec![DVec2::new(0.5, 1.0), DVec2::new(0.25, 3.0)]);
    }

    #[test]
    fn parse_errors_name_the_line() {
        let dir = scratch("bad");
        let path = dir.join("v.txt");
        fs::write(&path, "0 0\n1 x\n").unwrap();

        match read_vertices(&path) {
            Err(SimError::Parse { line, path: p, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(p, path);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
        assert!(matches!(
            read_edges(dir.join("missing.txt")),
            Err(SimError::Io { .. })
        ));
    }

    #[test]
    fn edges_accept_integral_floats() {
        let dir = scratch("edges");
        let path = dir.join("e.txt");
        fs::write(&path, "0 1\n1.000000000000000000e+00 0.000000000000000000e+00\n").unwrap();
        assert_eq!(
            read_edges(&path).unwrap(),
            vec![Edge::new(0, 1), Edge::new(1, 0)]
        );

        fs::write(&path, "0 1.5\n").unwrap();
        assert!(matches!(read_edges(&path), Err(SimError::Parse { line: 1, .. })));
    }

    #[test]
    fn polygons_keep_their_cycle_lengths() {
        let dir = scratch("polygons");
        let path = dir.join("p.txt");
        fs::write(&path, "0\t1\t2\t3\n4\t5\t6\n").unwrap();
        assert_eq!(
            read_polygons(&path).unwrap(),
            vec![vec![0, 1, 2, 3], vec![4, 5, 6]]
        );
    }

    #[test]
    fn box_file_accepts_one_or_two_lines() {
        let dir = scratch("box");
        let path = dir.join("L");
        fs::write(&path, "3.0 4.0\n").unwrap();
        assert_eq!(read_box(&path).unwrap(), DVec2::new(3.0, 4.0));
        fs::write(&path, "3.0\n4.0\n").unwrap();
        assert_eq!(read_box(&path).unwrap(), DVec2::new(3.0, 4.0));
        fs::write(&path, "3.0\n").unwrap();
        assert!(read_box(&path).is_err());
        fs::write(&path, "3.0 -1\n").unwrap();
        assert!(read_box(&path).is_err());
    }

    #[test]
    fn scientific_matches_printf() {
        assert_eq!(scientific(1.5), "1.500000000000000000e+00");
        assert_eq!(scientific(-0.0025), "-2.500000000000000000e-03");
        assert_eq!(scientific(0.0), "0.000000000000000000e+00");
        assert_eq!(scientific(1.0e120), "1.000000000000000000e+120");
    }

    #[test]
    fn written_vertices_read_back_exactly() {
        let dir = scratch("write");
        let path = dir.join("out.txt");
        let v = vec![DVec2::new(0.1, 2.0 / 3.0), DVec2::new(1e-9, 7.25)];
        write_vertices(&path, &v).unwrap();
        assert_eq!(read_vertices(&path).unwrap(), v);
    }

    #[test]
    fn tissue_files_load_the_box_beside_the_vertices() {
        let dir = scratch("tissue");
        fs::write(dir.join("L"), "10 10\n").unwrap();
        fs::write(dir.join("v.txt"), "1 1\n2 1\n2 2\n1 2\n").unwrap();
        fs::write(dir.join("e.txt"), "0 1\n1 2\n2 3\n3 0\n").unwrap();
        fs::write(dir.join("p.txt"), "0\t1\t2\t3\n").unwrap();

        let files = TissueFiles::new(dir.join("v.txt"), dir.join("e.txt"), dir.join("p.txt"));
        assert_eq!(files.box_path(), dir.join("L"));

        let mut rng = StdRng::seed_from_u64(0);
        let (tissue, box_size) = files.load(1.0, &mut rng).unwrap();
        assert_eq!(box_size, DVec2::new(10.0, 10.0));
        assert_eq!(tissue.polygons().len(), 1);
        assert_eq!(tissue.polygon(0).a0, 1.0);
        assert_eq!(tissue.edges().len(), 4);
    }

    #[test]
    fn dump_sink_names_files_by_step_start_time() {
        let dir = scratch("dump").join("out");
        let mut sink = VertexDumpSink::new(&dir).unwrap();
        let vertices = vec![DVec2::new(1.0, 1.0), DVec2::new(2.0, 1.0), DVec2::new(1.5, 2.0)];
        let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
        let mut rng = StdRng::seed_from_u64(0);
        let tissue =
            Tissue::from_cycles(vertices.clone(), edges, vec![vec![0, 1, 2]], 1.0, DVec2::splat(5.0), &mut rng)
                .unwrap();
        let report = StepReport {
            time: 0.35,
            ..StepReport::default()
        };

        sink.emit(&report, &tissue).unwrap();
        let path = dir.join("0.35.txt");
        assert_eq!(sink.path_for(0.35), path);
        assert_eq!(read_vertices(&path).unwrap(), vertices);
    }

    #[test]
    fn trace_writes_a_header_and_one_row_per_step() {
        let mut trace = TraceWriter::from_writer(Vec::new());
        let report = StepReport {
            time: 0.05,
            energy: 1.25,
            force_norm: 0.5,
            scan: ScanReport {
                short_edges: 2,
                left: 1,
                ..ScanReport::default()
            },
        };
        trace.record(&report).unwrap();

        let text = String::from_utf8(trace.finish().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "time,energy,force_norm,short_edges,transitions");
        assert_eq!(lines[1], "0.05,1.25,0.5,2,1");
        assert_eq!(lines.len(), 2);
    }
}
