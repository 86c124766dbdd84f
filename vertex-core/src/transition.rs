//! T1 transitions for short bonds.
//!
//! The four cells around a bond `i1 → i2` are labelled counter-clockwise:
//!
//! - Cell 0: `i4, i1, i2, i5` (traverses the bond as `i1 → i2`)
//! - Cell 1: `i3, i1, i4` (contains `i1` only)
//! - Cell 2: `i6, i2, i1, i3` (traverses the bond as `i2 → i1`)
//! - Cell 3: `i5, i2, i6` (contains `i2` only)
//!
//! The ten local directed edges are the bond, the four spokes
//! `i1-i3, i1-i4, i2-i5, i2-i6`, and their reverses. A left rewiring hands
//! `i2` to cell 1 and `i1` to cell 3 on the `i3`/`i5` side; a right
//! rewiring does the same on the `i4`/`i6` side. Whichever of keep, left
//! and right has the lowest energy is committed.

use std::collections::HashSet;

use crate::{
    config::{Parameters, ScanPolicy},
    energy,
    tissue::{Polygon, Tissue},
    types::{Edge, PolygonId, VertexId},
};

/// The four cells and six vertices around a short bond.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighborhood {
    /// Cells 0..=3, counter-clockwise around the bond.
    pub cells: [PolygonId; 4],
    /// `i1..=i6`.
    pub vertices: [VertexId; 6],
}

/// One of the three local topologies a short bond can take.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rewiring {
    Keep,
    Left,
    Right,
}

impl Rewiring {
    pub const ALL: [Rewiring; 3] = [Rewiring::Keep, Rewiring::Left, Rewiring::Right];
}

/// Hypothetical cycles of the four cells and the ten local edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub cycles: [Vec<VertexId>; 4],
    pub edges: [Edge; 10],
}

/// Result of comparing the three candidates for one bond.
#[derive(Clone, Debug)]
pub struct Decision {
    pub rewiring: Rewiring,
    /// Local energies of keep, left and right; `INFINITY` if ineligible.
    pub energies: [f64; 3],
    /// The winning candidate, absent when the topology is kept.
    pub candidate: Option<Candidate>,
}

/// Counters for one pass over the edge list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Bonds shorter than `lmin` that were examined.
    pub short_edges: usize,
    /// Short bonds whose four-cell neighborhood could not be resolved.
    pub skipped: usize,
    pub kept: usize,
    pub left: usize,
    pub right: usize,
    /// Deferred rewirings dropped because an earlier one touched their cells.
    pub conflicts: usize,
}

impl ScanReport {
    #[inline]
    pub fn transitions(&self) -> usize {
        self.left + self.right
    }

    fn record(&mut self, rewiring: Rewiring) {
        match rewiring {
            Rewiring::Keep => self.kept += 1,
            Rewiring::Left => self.left += 1,
            Rewiring::Right => self.right += 1,
        }
    }
}

/// Locates the four cells around the directed bond `i1 → i2`.
///
/// ### Returns
/// `None` if any of the four slots is missing or claimed by more than one
/// polygon, or if a polygon holds both endpoints without them being
/// consecutive. Such bonds are left alone.
pub fn find_neighborhood(tissue: &Tissue, i1: VertexId, i2: VertexId) -> Option<Neighborhood> {
    let mut slots: [Option<PolygonId>; 4] = [None; 4];

    fn claim(slot: &mut Option<PolygonId>, id: PolygonId) -> Option<()> {
        if slot.replace(id).is_some() {
            None
        } else {
            Some(())
        }
    }

    for &pid in tissue.polygons_of(i1) {
        let poly = tissue.polygon(pid);
        if poly.contains(i2) {
            let (_, after_i1) = poly.cyclic_neighbors(i1)?;
            let (_, after_i2) = poly.cyclic_neighbors(i2)?;
            let slot = if after_i1 == i2 {
                0
            } else if after_i2 == i1 {
                2
            } else {
                return None;
            };
            claim(&mut slots[slot], pid)?;
        } else {
            claim(&mut slots[1], pid)?;
        }
    }
    for &pid in tissue.polygons_of(i2) {
        if !tissue.polygon(pid).contains(i1) {
            claim(&mut slots[3], pid)?;
        }
    }

    let cells = [slots[0]?, slots[1]?, slots[2]?, slots[3]?];
    let (i3, i4) = tissue.polygon(cells[1]).cyclic_neighbors(i1)?;
    let (i5, i6) = tissue.polygon(cells[3]).cyclic_neighbors(i2)?;

    Some(Neighborhood {
        cells,
        vertices: [i1, i2, i3, i4, i5, i6],
    })
}

fn without(cycle: &[VertexId], v: VertexId) -> Vec<VertexId> {
    cycle.iter().copied().filter(|&x| x != v).collect()
}

fn inserted(cycle: &[VertexId], anchor: VertexId, v: VertexId, after: bool) -> Vec<VertexId> {
    let mut out = cycle.to_vec();
    let pos = cycle.iter().position(|&x| x == anchor).unwrap_or(0);
    out.insert(if after { pos + 1 } else { pos }, v);
    out
}

impl Neighborhood {
    /// Builds the local cycles and edges for a rewiring.
    ///
    /// ### Returns
    /// `None` if the rewiring would leave a cell with fewer than three
    /// vertices.
    pub fn candidate(&self, tissue: &Tissue, rewiring: Rewiring) -> Option<Candidate> {
        let [i1, i2, i3, i4, i5, i6] = self.vertices;
        let c = self.cells.map(|id| tissue.polygon(id).indices.as_slice());
        let e = Edge::new;

        let (cycles, edges) = match rewiring {
            Rewiring::Keep => (
                c.map(<[VertexId]>::to_vec),
                [
                    e(i1, i2),
                    e(i1, i3),
                    e(i1, i4),
                    e(i2, i1),
                    e(i2, i5),
                    e(i2, i6),
                    e(i3, i1),
                    e(i4, i1),
                    e(i5, i2),
                    e(i6, i2),
                ],
            ),
            Rewiring::Left => (
                [
                    without(c[0], i2),
                    inserted(c[1], i1, i2, false),
                    without(c[2], i1),
                    inserted(c[3], i2, i1, false),
                ],
                [
                    e(i1, i2),
                    e(i2, i3),
                    e(i1, i4),
                    e(i2, i1),
                    e(i1, i5),
                    e(i2, i6),
                    e(i3, i2),
                    e(i4, i1),
                    e(i5, i1),
                    e(i6, i2),
                ],
            ),
            Rewiring::Right => (
                [
                    without(c[0], i1),
                    inserted(c[1], i1, i2, true),
                    without(c[2], i2),
                    inserted(c[3], i2, i1, true),
                ],
                [
                    e(i1, i2),
                    e(i1, i3),
                    e(i1, i6),
                    e(i2, i1),
                    e(i2, i5),
                    e(i2, i4),
                    e(i3, i1),
                    e(i4, i2),
                    e(i5, i2),
                    e(i6, i1),
                ],
            ),
        };

        if cycles.iter().any(|cycle| cycle.len() < 3) {
            return None;
        }
        Some(Candidate { cycles, edges })
    }

    /// Directed edges renamed when a rewiring is committed, as `(old, new)`.
    fn edge_renames(&self, rewiring: Rewiring) -> Option<[(Edge, Edge); 4]> {
        let [i1, i2, i3, i4, i5, i6] = self.vertices;
        let e = Edge::new;
        match rewiring {
            Rewiring::Keep => None,
            Rewiring::Left => Some([
                (e(i1, i3), e(i2, i3)),
                (e(i2, i5), e(i1, i5)),
                (e(i3, i1), e(i3, i2)),
                (e(i5, i2), e(i5, i1)),
            ]),
            Rewiring::Right => Some([
                (e(i1, i4), e(i2, i4)),
                (e(i2, i6), e(i1, i6)),
                (e(i4, i1), e(i4, i2)),
                (e(i6, i2), e(i6, i1)),
            ]),
        }
    }
}

/// Energy of the four cells and ten edges of a candidate.
///
/// Cells and edges outside the neighborhood contribute the same amount to
/// every candidate, so comparing local energies is enough.
pub fn candidate_energy(
    tissue: &Tissue,
    nb: &Neighborhood,
    candidate: &Candidate,
    params: &Parameters,
) -> f64 {
    let polygons: Vec<Polygon> = nb
        .cells
        .iter()
        .zip(&candidate.cycles)
        .map(|(&id, cycle)| {
            let p = tissue.polygon(id);
            Polygon::new(id, cycle.clone(), p.a0, p.theta)
        })
        .collect();
    energy::total_energy(&tissue.vertices, &polygons, &candidate.edges, params)
}

/// Picks the rewiring with the unique lowest energy.
///
/// Keep wins whenever it attains the minimum, and a tie between left and
/// right also keeps the current topology.
pub fn choose(energies: [f64; 3]) -> Rewiring {
    let min = energies.iter().copied().fold(f64::INFINITY, f64::min);
    let ties = energies.iter().filter(|&&e| e == min).count();
    if !min.is_finite() || ties > 1 || energies[0] == min {
        Rewiring::Keep
    } else if energies[1] == min {
        Rewiring::Left
    } else {
        Rewiring::Right
    }
}

/// Evaluates keep, left and right for a neighborhood.
pub fn evaluate(tissue: &Tissue, nb: &Neighborhood, params: &Parameters) -> Decision {
    let mut candidates: [Option<Candidate>; 3] = [None, None, None];
    let mut energies = [f64::INFINITY; 3];

    for (k, rewiring) in Rewiring::ALL.into_iter().enumerate() {
        if let Some(c) = nb.candidate(tissue, rewiring) {
            energies[k] = candidate_energy(tissue, nb, &c, params);
            candidates[k] = Some(c);
        }
    }

    let rewiring = choose(energies);
    let candidate = match rewiring {
        Rewiring::Keep => None,
        Rewiring::Left => candidates[1].take(),
        Rewiring::Right => candidates[2].take(),
    };
    Decision {
        rewiring,
        energies,
        candidate,
    }
}

/// Writes a decided rewiring into the tissue.
///
/// Overwrites the four cells' cycles and renames the endpoints of every
/// directed edge matching one of the four affected spokes.
fn commit(tissue: &mut Tissue, nb: &Neighborhood, rewiring: Rewiring, candidate: Candidate) {
    for (&id, cycle) in nb.cells.iter().zip(candidate.cycles) {
        tissue.set_cycle(id, cycle);
    }
    if let Some(renames) = nb.edge_renames(rewiring) {
        for edge in tissue.edges_mut() {
            if let Some((_, new)) = renames.iter().find(|(old, _)| old == edge) {
                *edge = *new;
            }
        }
    }
}

/// Applies a rewiring unconditionally, without comparing energies.
///
/// ### Returns
/// `true` if the tissue changed; `false` for [`Rewiring::Keep`] or an
/// ineligible rewiring.
pub fn apply_rewiring(tissue: &mut Tissue, nb: &Neighborhood, rewiring: Rewiring) -> bool {
    if rewiring == Rewiring::Keep {
        return false;
    }
    match nb.candidate(tissue, rewiring) {
        Some(candidate) => {
            commit(tissue, nb, rewiring, candidate);
            true
        }
        None => false,
    }
}

/// Scans every edge for bonds shorter than `params.lmin` and rewires them.
///
/// Edges are visited in stored order. Once a bond `i1 → i2` has been
/// evaluated its reverse `i2 → i1` is skipped for the rest of the pass.
///
/// ### Parameters
/// - `tissue` - Live tissue, mutated in place.
/// - `params` - Box size, `lmin` and the energy coefficients.
/// - `policy` - [`ScanPolicy::Sequential`] commits each rewiring as soon
///   as it is chosen, so later bonds see it. [`ScanPolicy::Deferred`]
///   decides every bond against the start-of-pass tissue and applies the
///   winners at the end, dropping any that share a cell with one already
///   applied.
pub fn t1_scan(tissue: &mut Tissue, params: &Parameters, policy: ScanPolicy) -> ScanReport {
    let box_size = params.box_size();
    let mut report = ScanReport::default();
    let mut reverse: HashSet<Edge> = HashSet::new();
    let mut pending: Vec<(Neighborhood, Decision)> = Vec::new();

    for k in 0..tissue.edges().len() {
        let edge = tissue.edges()[k];
        if reverse.contains(&edge) {
            continue;
        }
        let length = tissue.edge_length(edge, box_size);
        if length >= params.lmin {
            continue;
        }
        report.short_edges += 1;

        let Some(nb) = find_neighborhood(tissue, edge.from, edge.to) else {
            log::trace!(
                "T1 skipped: bond {}-{} (length {length:.4}) has no four-cell neighborhood",
                edge.from,
                edge.to
            );
            report.skipped += 1;
            continue;
        };
        reverse.insert(edge.reversed());

        let decision = evaluate(tissue, &nb, params);
        log::debug!(
            "T1 {:?} on bond {}-{} (length {length:.4}), energies {:?}",
            decision.rewiring,
            edge.from,
            edge.to,
            decision.energies
        );

        match policy {
            ScanPolicy::Sequential => {
                report.record(decision.rewiring);
                if let Some(candidate) = decision.candidate {
                    commit(tissue, &nb, decision.rewiring, candidate);
                }
            }
            ScanPolicy::Deferred => {
                if decision.candidate.is_some() {
                    pending.push((nb, decision));
                } else {
                    report.kept += 1;
                }
            }
        }
    }

    let mut touched: HashSet<PolygonId> = HashSet::new();
    for (nb, decision) in pending {
        if nb.cells.iter().any(|c| touched.contains(c)) {
            report.conflicts += 1;
            continue;
        }
        touched.extend(nb.cells);
        report.record(decision.rewiring);
        if let Some(candidate) = decision.candidate {
            commit(tissue, &nb, decision.rewiring, candidate);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::periodic_diff, lattice::Honeycomb};
    use glam::DVec2;
    use rand::{SeedableRng, rngs::StdRng};

    fn honeycomb() -> (Tissue, Parameters) {
        let mut rng = StdRng::seed_from_u64(0);
        let hc = Honeycomb::new(4, 4, 1.0);
        let params = Parameters {
            lx: hc.box_size.x,
            ly: hc.box_size.y,
            ..Parameters::default()
        };
        (hc.into_tissue(1.0, &mut rng).unwrap(), params)
    }

    fn wrap(p: DVec2, b: DVec2) -> DVec2 {
        DVec2::new(p.x.rem_euclid(b.x), p.y.rem_euclid(b.y))
    }

    /// Shrinks bond `k` to a tenth of its length, optionally turning it by 90°.
    fn squeeze(tissue: &mut Tissue, params: &Parameters, k: usize, turn: bool) {
        let b = params.box_size();
        let e = tissue.edges()[k];
        let v1 = tissue.vertices[e.from];
        let d = periodic_diff(tissue.vertices[e.to], v1, b);
        let mid = v1 + 0.5 * d;
        let half = 0.05 * if turn { d.perp() } else { d };
        tissue.vertices[e.from] = wrap(mid - half, b);
        tissue.vertices[e.to] = wrap(mid + half, b);
    }

    fn count(tissue: &Tissue, e: Edge) -> usize {
        tissue.edges().iter().filter(|&&x| x == e).count()
    }

    fn cycles(tissue: &Tissue) -> Vec<Vec<VertexId>> {
        tissue.polygons().iter().map(|p| p.indices.clone()).collect()
    }

    #[test]
    fn neighborhood_follows_the_cell_layout() {
        let (tissue, _) = honeycomb();
        let e = tissue.edges()[0];
        let nb = find_neighborhood(&tissue, e.from, e.to).unwrap();
        let [i1, i2, i3, i4, i5, i6] = nb.vertices;
        let [c0, c1, c2, c3] = nb.cells.map(|id| tissue.polygon(id));

        assert_eq!(nb.cells[0], 0);
        let unique: HashSet<PolygonId> = nb.cells.into_iter().collect();
        assert_eq!(unique.len(), 4);

        // Cell 0: i4, i1, i2, i5
        assert_eq!(c0.cyclic_neighbors(i1), Some((i4, i2)));
        assert_eq!(c0.cyclic_neighbors(i2), Some((i1, i5)));
        // Cell 1: i3, i1, i4
        assert_eq!(c1.cyclic_neighbors(i1), Some((i3, i4)));
        // Cell 2: i6, i2, i1, i3
        assert_eq!(c2.cyclic_neighbors(i2), Some((i6, i1)));
        assert_eq!(c2.cyclic_neighbors(i1), Some((i2, i3)));
        // Cell 3: i5, i2, i6
        assert_eq!(c3.cyclic_neighbors(i2), Some((i5, i6)));
    }

    #[test]
    fn left_rewiring_hands_the_bond_to_cells_one_and_three() {
        let (mut tissue, _) = honeycomb();
        let e = tissue.edges()[0];
        let nb = find_neighborhood(&tissue, e.from, e.to).unwrap();
        let [i1, i2, i3, _, i5, _] = nb.vertices;
        let [c0, c1, c2, c3] = nb.cells;
        let before = cycles(&tissue);
        let n_edges = tissue.edges().len();

        assert!(apply_rewiring(&mut tissue, &nb, Rewiring::Left));

        assert_eq!(tissue.polygon(c0).indices, without(&before[c0], i2));
        assert_eq!(tissue.polygon(c1).indices, inserted(&before[c1], i1, i2, false));
        assert_eq!(tissue.polygon(c2).indices, without(&before[c2], i1));
        assert_eq!(tissue.polygon(c3).indices, inserted(&before[c3], i2, i1, false));
        assert_eq!(tissue.polygon(c1).cyclic_neighbors(i2), Some((i3, i1)));
        assert_eq!(tissue.polygon(c3).cyclic_neighbors(i1), Some((i5, i2)));

        assert_eq!(tissue.edges().len(), n_edges);
        assert_eq!(count(&tissue, Edge::new(i1, i3)), 0);
        assert_eq!(count(&tissue, Edge::new(i2, i3)), 1);
        assert_eq!(count(&tissue, Edge::new(i3, i2)), 1);
        assert_eq!(count(&tissue, Edge::new(i2, i5)), 0);
        assert_eq!(count(&tissue, Edge::new(i1, i5)), 1);
        assert_eq!(count(&tissue, Edge::new(i5, i1)), 1);

        let mut of_i1 = tissue.polygons_of(i1).to_vec();
        of_i1.sort_unstable();
        let mut expected = vec![c0, c1, c3];
        expected.sort_unstable();
        assert_eq!(of_i1, expected);

        // The bond now separates cells 3 and 1.
        let after = find_neighborhood(&tissue, i1, i2).unwrap();
        assert_eq!(after.cells, [c3, c0, c1, c2]);
    }

    #[test]
    fn right_rewiring_mirrors_left() {
        let (mut tissue, _) = honeycomb();
        let e = tissue.edges()[0];
        let nb = find_neighborhood(&tissue, e.from, e.to).unwrap();
        let [i1, i2, _, i4, _, i6] = nb.vertices;
        let [c0, c1, c2, c3] = nb.cells;
        let before = cycles(&tissue);

        assert!(apply_rewiring(&mut tissue, &nb, Rewiring::Right));

        assert_eq!(tissue.polygon(c0).indices, without(&before[c0], i1));
        assert_eq!(tissue.polygon(c1).cyclic_neighbors(i2), Some((i1, i4)));
        assert_eq!(tissue.polygon(c2).indices, without(&before[c2], i2));
        assert_eq!(tissue.polygon(c3).cyclic_neighbors(i1), Some((i2, i6)));

        assert_eq!(count(&tissue, Edge::new(i2, i4)), 1);
        assert_eq!(count(&tissue, Edge::new(i4, i2)), 1);
        assert_eq!(count(&tissue, Edge::new(i1, i6)), 1);
        assert_eq!(count(&tissue, Edge::new(i6, i1)), 1);
        assert_eq!(count(&tissue, Edge::new(i1, i4)), 0);

        let after = find_neighborhood(&tissue, i1, i2).unwrap();
        assert_eq!(after.cells, [c1, c2, c3, c0]);
    }

    #[test]
    fn keep_changes_nothing() {
        let (mut tissue, _) = honeycomb();
        let e = tissue.edges()[0];
        let nb = find_neighborhood(&tissue, e.from, e.to).unwrap();
        let before = cycles(&tissue);
        assert!(!apply_rewiring(&mut tissue, &nb, Rewiring::Keep));
        assert_eq!(cycles(&tissue), before);
    }

    #[test]
    fn choose_prefers_a_unique_minimum() {
        assert_eq!(choose([1.0, 2.0, 3.0]), Rewiring::Keep);
        assert_eq!(choose([2.0, 1.0, 3.0]), Rewiring::Left);
        assert_eq!(choose([3.0, 2.0, 1.0]), Rewiring::Right);
        assert_eq!(choose([2.0, f64::INFINITY, 1.0]), Rewiring::Right);
        // Ties keep the current topology.
        assert_eq!(choose([1.0, 1.0, 2.0]), Rewiring::Keep);
        assert_eq!(choose([2.0, 1.0, 1.0]), Rewiring::Keep);
        assert_eq!(choose([f64::INFINITY; 3]), Rewiring::Keep);
    }

    #[test]
    fn regular_honeycomb_has_no_short_bonds() {
        let (mut tissue, params) = honeycomb();
        let before = cycles(&tissue);
        let report = t1_scan(&mut tissue, &params, ScanPolicy::Sequential);
        assert_eq!(report, ScanReport::default());
        assert_eq!(cycles(&tissue), before);
    }

    #[test]
    fn turned_short_bond_is_rewired() {
        let (mut tissue, params) = honeycomb();
        squeeze(&mut tissue, &params, 0, true);
        let e = tissue.edges()[0];
        let nb = find_neighborhood(&tissue, e.from, e.to).unwrap();
        let before = cycles(&tissue);
        let (nv, ne, np) = (
            tissue.vertices.len(),
            tissue.edges().len(),
            tissue.polygons().len(),
        );

        let decision = evaluate(&tissue, &nb, &params);
        assert_eq!(decision.rewiring, Rewiring::Right);
        assert!(decision.energies[2] < decision.energies[0]);
        assert!(decision.energies[2] < decision.energies[1]);

        let report = t1_scan(&mut tissue, &params, ScanPolicy::Sequential);
        assert_eq!(report.short_edges, 1, "reverse bond must not be rescanned");
        assert_eq!(report.right, 1);
        assert_eq!(report.transitions(), 1);

        assert_eq!(tissue.vertices.len(), nv);
        assert_eq!(tissue.edges().len(), ne);
        assert_eq!(tissue.polygons().len(), np);

        let [c0, c1, c2, c3] = nb.cells;
        assert_eq!(tissue.polygon(c0).indices.len(), before[c0].len() - 1);
        assert_eq!(tissue.polygon(c1).indices.len(), before[c1].len() + 1);
        assert_eq!(tissue.polygon(c2).indices.len(), before[c2].len() - 1);
        assert_eq!(tissue.polygon(c3).indices.len(), before[c3].len() + 1);
        for (id, cycle) in before.iter().enumerate() {
            if !nb.cells.contains(&id) {
                assert_eq!(&tissue.polygon(id).indices, cycle);
            }
        }
    }

    #[test]
    fn short_bond_keeping_its_direction_is_kept() {
        let (mut tissue, params) = honeycomb();
        squeeze(&mut tissue, &params, 0, false);
        let before = cycles(&tissue);

        let report = t1_scan(&mut tissue, &params, ScanPolicy::Sequential);
        assert_eq!(report.short_edges, 1);
        assert_eq!(report.kept, 1);
        assert_eq!(report.transitions(), 0);
        assert_eq!(cycles(&tissue), before);
    }

    #[test]
    fn deferred_scan_drops_overlapping_rewirings() {
        let (mut tissue, params) = honeycomb();
        // Bonds 0 and 2 both belong to cell 0.
        squeeze(&mut tissue, &params, 0, true);
        squeeze(&mut tissue, &params, 2, true);
        let ne = tissue.edges().len();

        let report = t1_scan(&mut tissue, &params, ScanPolicy::Deferred);
        assert_eq!(report.short_edges, 2);
        assert_eq!(report.transitions(), 1);
        assert_eq!(report.conflicts, 1);
        assert_eq!(tissue.edges().len(), ne);
    }

    #[test]
    fn sequential_scan_rewires_against_the_live_tissue() {
        let (mut tissue, params) = honeycomb();
        squeeze(&mut tissue, &params, 0, true);
        squeeze(&mut tissue, &params, 2, true);
        let (nv, ne, np) = (
            tissue.vertices.len(),
            tissue.edges().len(),
            tissue.polygons().len(),
        );
        let sides: usize = tissue.polygons().iter().map(|p| p.indices.len()).sum();

        // The second bond shares cell 0 with the first, so it is only
        // rewired if the scan sees the first rewiring.
        let report = t1_scan(&mut tissue, &params, ScanPolicy::Sequential);
        assert_eq!(report.short_edges, 2);
        assert_eq!(report.right, 2);
        assert_eq!(report.transitions(), 2);
        assert_eq!(report.conflicts, 0);

        assert_eq!(tissue.vertices.len(), nv);
        assert_eq!(tissue.edges().len(), ne);
        assert_eq!(tissue.polygons().len(), np);
        let after: usize = tissue.polygons().iter().map(|p| p.indices.len()).sum();
        assert_eq!(after, sides);

        for e in tissue.edges() {
            let bordered = tissue.polygons_of(e.from).iter().any(|&id| {
                tissue
                    .polygon(id)
                    .cyclic_neighbors(e.from)
                    .is_some_and(|(prev, next)| prev == e.to || next == e.to)
            });
            assert!(bordered, "edge {e:?} is not a side of any cell");
        }
    }

    #[test]
    fn bond_without_four_cells_is_skipped() {
        let vertices = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(1.1, 1.0),
            DVec2::new(1.1, 2.0),
            DVec2::new(1.0, 2.0),
        ];
        let polygons = vec![Polygon::new(0, vec![0, 1, 2, 3], 0.1, 0.0)];
        let edges = vec![Edge::new(0, 1), Edge::new(1, 0)];
        let mut tissue = Tissue::new(vertices, edges, polygons, DVec2::ONE * 5.0).unwrap();
        let params = Parameters {
            lx: 5.0,
            ly: 5.0,
            ..Parameters::default()
        };

        let report = t1_scan(&mut tissue, &params, ScanPolicy::Sequential);
        assert_eq!(report.short_edges, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(tissue.polygon(0).indices, vec![0, 1, 2, 3]);
    }
}
