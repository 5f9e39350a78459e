//! Multi-source cost-distance analysis
//!
//! Computes, for every cell of a friction raster, the accumulated travel
//! time to the nearest source point, which source that is, and the direction
//! toward the predecessor cell on the optimal path.
//!
//! The grid is an 8-connected graph: the weight of the edge between a cell
//! and an orthogonal neighbor is the average of their friction values
//! (average cell-crossing time), scaled by sqrt(2) for diagonal neighbors.
//! Weights are symmetric and positive (the friction converter clamps zeros
//! and infinities beforehand), so a multi-source Dijkstra search over a
//! binary min-heap finalizes every reachable cell at its minimal cost.
//!
//! A run moves through three phases with no observable intermediate state:
//! seeded (all sources in the frontier at cost 0), relaxing (the globally
//! cheapest frontier cell is finalized and its neighbors relaxed), and
//! finalized (outputs packaged). When two sources reach a cell at exactly
//! equal cost, the lowest source id wins; the frontier orders equal-cost
//! entries by source id, so the tie-break is structural, not dependent on
//! queue insertion order.
//!
//! Direction encoding (shared with the backlink raster):
//! ```text
//!   4  3  2
//!   5  0  1
//!   6  7  8
//! ```
//! 0 marks a source cell; codes 1-8 point toward the predecessor.

mod solver;

pub use solver::{solver_for, CostDistanceSolver, DijkstraSolver};

use accessgis_core::raster::Raster;
use accessgis_core::{Algorithm, Error, Result};
use ndarray::Array2;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// D8 neighbor offsets: (row_offset, col_offset)
/// Indexed to match the direction encoding (1=E, 2=NE, ..., 8=SE)
const D8_OFFSETS: [(isize, isize); 8] = [
    (0, 1),   // 1: E
    (-1, 1),  // 2: NE
    (-1, 0),  // 3: N
    (-1, -1), // 4: NW
    (0, -1),  // 5: W
    (1, -1),  // 6: SW
    (1, 0),   // 7: S
    (1, 1),   // 8: SE
];

/// Distance factors for each D8 direction
const D8_DIST: [f64; 8] = [
    1.0, std::f64::consts::SQRT_2, 1.0, std::f64::consts::SQRT_2,
    1.0, std::f64::consts::SQRT_2, 1.0, std::f64::consts::SQRT_2,
];

/// Backlink code for source cells
pub const BACKLINK_SOURCE: u8 = 0;
/// Backlink sentinel for cells no source can reach
pub const BACKLINK_UNREACHED: u8 = 255;
/// Nearest-source sentinel meaning "no source" (source ids are > 0)
pub const NO_SOURCE: u32 = 0;

/// Get the opposite direction code for D8
fn opposite_dir(dir: u8) -> u8 {
    if dir == 0 {
        return 0;
    }
    ((dir - 1 + 4) % 8) + 1
}

/// A seed location for the cost-distance search: a cell coordinate plus a
/// unique positive identifier (e.g. a health facility id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePoint {
    pub row: usize,
    pub col: usize,
    pub id: u32,
}

impl SourcePoint {
    pub fn new(row: usize, col: usize, id: u32) -> Self {
        Self { row, col, id }
    }
}

/// Extract source points from a target raster.
///
/// Every valid cell with a non-zero value becomes a source with that value
/// as its id. Zero-valued and nodata cells are skipped — zero is the
/// "no source" convention of rasterized point layers.
pub fn sources_from_raster(targets: &Raster<u32>) -> Vec<SourcePoint> {
    let (rows, cols) = targets.shape();
    let mut sources = Vec::new();

    for row in 0..rows {
        for col in 0..cols {
            let id = unsafe { targets.get_unchecked(row, col) };
            if id != NO_SOURCE && !targets.is_nodata(id) {
                sources.push(SourcePoint::new(row, col, id));
            }
        }
    }

    sources
}

/// Parameters for the cost-distance engine
#[derive(Debug, Clone, Default)]
pub struct CostDistanceParams {
    /// Seed set; must be non-empty with distinct positive ids on distinct cells
    pub sources: Vec<SourcePoint>,
    /// Skip the backlink raster when only accumulated cost is needed
    pub compute_backlink: bool,
}

impl CostDistanceParams {
    /// Parameters computing all three outputs for the given sources
    pub fn new(sources: Vec<SourcePoint>) -> Self {
        Self {
            sources,
            compute_backlink: true,
        }
    }
}

/// Outputs of a cost-distance run.
///
/// Unreached cells (nodata-masked or disconnected regions) hold NaN cost,
/// nearest id 0 and backlink 255.
#[derive(Debug, Clone)]
pub struct CostDistanceOutput {
    /// Accumulated minimal travel time in seconds
    pub cost: Raster<f64>,
    /// Id of the source whose shortest path finalized each cell
    pub nearest: Raster<u32>,
    /// Direction toward the predecessor on the optimal path
    pub backlink: Option<Raster<u8>>,
}

/// A frontier entry, ordered for a min-heap on (cost, source id).
#[derive(Debug, Clone)]
struct Frontier {
    cost: f64,
    source: u32,
    row: usize,
    col: usize,
    arrival: u8,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.source == other.source
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reverse ordering so BinaryHeap (max-heap) acts as a min-heap; among equal
// costs the lower source id has higher priority, which fixes the tie-break.
impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Compute accumulated cost, nearest source and backlink rasters from a
/// friction surface and a set of source points.
///
/// # Arguments
/// * `friction` - Per-cell traversal time in seconds; nodata cells are
///   impassable
/// * `params` - Source set and output selection
///
/// # Errors
/// All preconditions are validated before relaxation starts: the source set
/// must be non-empty, ids must be positive and distinct, cells distinct,
/// every source inside the grid and on valid friction. Nothing is computed
/// when any of them fails.
pub fn cost_distance(
    friction: &Raster<f64>,
    params: &CostDistanceParams,
) -> Result<CostDistanceOutput> {
    let (rows, cols) = friction.shape();
    validate_sources(friction, &params.sources)?;

    let mut cost = Array2::<f64>::from_elem((rows, cols), f64::NAN);
    let mut nearest = Array2::<u32>::from_elem((rows, cols), NO_SOURCE);
    let mut backlink = Array2::<u8>::from_elem((rows, cols), BACKLINK_UNREACHED);
    let mut finalized = Array2::<bool>::from_elem((rows, cols), false);
    // Cheapest cost seen so far per cell, to prune dominated frontier entries
    let mut best = Array2::<f64>::from_elem((rows, cols), f64::INFINITY);

    let mut heap = BinaryHeap::with_capacity(params.sources.len());

    // Seeded: every source enters the frontier at cost 0
    for source in &params.sources {
        best[(source.row, source.col)] = 0.0;
        heap.push(Frontier {
            cost: 0.0,
            source: source.id,
            row: source.row,
            col: source.col,
            arrival: BACKLINK_SOURCE,
        });
    }

    // Relaxing: always finalize the globally cheapest frontier cell next
    while let Some(node) = heap.pop() {
        if finalized[(node.row, node.col)] {
            continue;
        }
        finalized[(node.row, node.col)] = true;
        cost[(node.row, node.col)] = node.cost;
        nearest[(node.row, node.col)] = node.source;
        backlink[(node.row, node.col)] = node.arrival;

        let here = unsafe { friction.get_unchecked(node.row, node.col) };

        for (idx, &(dr, dc)) in D8_OFFSETS.iter().enumerate() {
            let nr = node.row as isize + dr;
            let nc = node.col as isize + dc;

            if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                continue;
            }

            let nr = nr as usize;
            let nc = nc as usize;

            if finalized[(nr, nc)] {
                continue;
            }

            let there = unsafe { friction.get_unchecked(nr, nc) };
            if friction.is_nodata(there) {
                continue;
            }

            // Average cell-crossing time, scaled for diagonal moves
            let weight = 0.5 * (here + there) * D8_DIST[idx];
            let candidate = node.cost + weight;

            // Equal-cost candidates are kept: a lower source id may still
            // win the cell on the heap's tie order
            if candidate <= best[(nr, nc)] {
                best[(nr, nc)] = candidate;
                heap.push(Frontier {
                    cost: candidate,
                    source: node.source,
                    row: nr,
                    col: nc,
                    arrival: opposite_dir((idx + 1) as u8),
                });
            }
        }
    }

    // Finalized: package the outputs
    let mut cost_raster = friction.with_same_meta::<f64>();
    cost_raster.set_nodata(Some(f64::NAN));
    *cost_raster.data_mut() = cost;

    let mut nearest_raster = friction.with_same_meta::<u32>();
    nearest_raster.set_nodata(Some(NO_SOURCE));
    *nearest_raster.data_mut() = nearest;

    let backlink_raster = if params.compute_backlink {
        let mut raster = friction.with_same_meta::<u8>();
        raster.set_nodata(Some(BACKLINK_UNREACHED));
        *raster.data_mut() = backlink;
        Some(raster)
    } else {
        None
    };

    Ok(CostDistanceOutput {
        cost: cost_raster,
        nearest: nearest_raster,
        backlink: backlink_raster,
    })
}

/// Validate the engine's preconditions before any relaxation work.
fn validate_sources(friction: &Raster<f64>, sources: &[SourcePoint]) -> Result<()> {
    if sources.is_empty() {
        return Err(Error::EmptySources);
    }

    let (rows, cols) = friction.shape();
    let mut ids = HashSet::with_capacity(sources.len());
    let mut cells = HashSet::with_capacity(sources.len());

    for source in sources {
        if source.id == NO_SOURCE {
            return Err(Error::InvalidParameter {
                name: "sources",
                value: format!("({}, {})", source.row, source.col),
                reason: "source id 0 is reserved for \"no source\"".to_string(),
            });
        }
        if !ids.insert(source.id) {
            return Err(Error::InvalidParameter {
                name: "sources",
                value: source.id.to_string(),
                reason: "duplicate source id".to_string(),
            });
        }
        if source.row >= rows || source.col >= cols {
            return Err(Error::SourceOutsideGrid {
                id: source.id,
                row: source.row,
                col: source.col,
            });
        }
        if !cells.insert((source.row, source.col)) {
            return Err(Error::InvalidParameter {
                name: "sources",
                value: format!("({}, {})", source.row, source.col),
                reason: "two sources on the same cell".to_string(),
            });
        }
        if friction.is_nodata_at(source.row, source.col)? {
            return Err(Error::SourceOnNodata {
                id: source.id,
                row: source.row,
                col: source.col,
            });
        }
    }

    Ok(())
}

/// Cost-distance algorithm
#[derive(Debug, Clone, Default)]
pub struct CostDistance;

impl Algorithm for CostDistance {
    type Input = Raster<f64>;
    type Output = CostDistanceOutput;
    type Params = CostDistanceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Cost Distance"
    }

    fn description(&self) -> &'static str {
        "Multi-source least-cost accumulation over a friction surface"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        cost_distance(&input, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgis_core::GeoTransform;
    use approx::assert_relative_eq;

    const SQRT_2: f64 = std::f64::consts::SQRT_2;

    fn uniform_friction(rows: usize, cols: usize, value: f64) -> Raster<f64> {
        let mut raster = Raster::filled(rows, cols, value);
        raster.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        raster.set_nodata(Some(-1.0));
        raster
    }

    #[test]
    fn test_single_source_center_of_uniform_grid() {
        let friction = uniform_friction(3, 3, 10.0);
        let params = CostDistanceParams::new(vec![SourcePoint::new(1, 1, 42)]);
        let out = cost_distance(&friction, &params).unwrap();

        assert_eq!(out.cost.get(1, 1).unwrap(), 0.0);
        // Orthogonal neighbors: (10 + 10) / 2
        for (r, c) in [(0, 1), (1, 0), (1, 2), (2, 1)] {
            assert_relative_eq!(out.cost.get(r, c).unwrap(), 10.0, epsilon = 1e-9);
        }
        // Diagonal neighbors: 10 * sqrt(2)
        for (r, c) in [(0, 0), (0, 2), (2, 0), (2, 2)] {
            assert_relative_eq!(out.cost.get(r, c).unwrap(), 10.0 * SQRT_2, epsilon = 1e-9);
        }

        // Every cell reached by source 42
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(out.nearest.get(r, c).unwrap(), 42);
            }
        }
    }

    #[test]
    fn test_backlinks_point_toward_source() {
        let friction = uniform_friction(3, 3, 10.0);
        let params = CostDistanceParams::new(vec![SourcePoint::new(1, 1, 1)]);
        let out = cost_distance(&friction, &params).unwrap();
        let backlink = out.backlink.unwrap();

        assert_eq!(backlink.get(1, 1).unwrap(), BACKLINK_SOURCE);

        // Each neighbor's backlink must step back onto the source cell
        for r in 0..3_usize {
            for c in 0..3_usize {
                if (r, c) == (1, 1) {
                    continue;
                }
                let code = backlink.get(r, c).unwrap();
                assert!((1..=8).contains(&code));
                let (dr, dc) = D8_OFFSETS[(code - 1) as usize];
                let pred = (r as isize + dr, c as isize + dc);
                assert_eq!(pred, (1, 1), "backlink at ({}, {}) misses the source", r, c);
            }
        }
    }

    #[test]
    fn test_equal_cost_tie_goes_to_lowest_id() {
        let friction = uniform_friction(3, 3, 10.0);

        // The center is equidistant from both corner sources
        let params = CostDistanceParams::new(vec![
            SourcePoint::new(0, 0, 1),
            SourcePoint::new(2, 2, 2),
        ]);
        let out = cost_distance(&friction, &params).unwrap();
        assert_eq!(out.nearest.get(1, 1).unwrap(), 1);

        // Independent of the order sources are supplied in
        let params = CostDistanceParams::new(vec![
            SourcePoint::new(2, 2, 2),
            SourcePoint::new(0, 0, 1),
        ]);
        let out = cost_distance(&friction, &params).unwrap();
        assert_eq!(out.nearest.get(1, 1).unwrap(), 1);

        // The off-diagonal corners tie as well (cost 20 from either source)
        assert_eq!(out.nearest.get(0, 2).unwrap(), 1);
        assert_eq!(out.nearest.get(2, 0).unwrap(), 1);

        // Unambiguous cells keep their own source
        assert_eq!(out.nearest.get(0, 1).unwrap(), 1);
        assert_eq!(out.nearest.get(2, 1).unwrap(), 2);
    }

    #[test]
    fn test_path_detours_around_expensive_cell() {
        let mut friction = uniform_friction(3, 3, 10.0);
        friction.set(1, 1, 1000.0).unwrap();

        let params = CostDistanceParams::new(vec![SourcePoint::new(1, 0, 1)]);
        let out = cost_distance(&friction, &params).unwrap();

        // Straight through the center would cost (10+1000)/2 + (1000+10)/2 = 1010;
        // two diagonal hops around it cost 2 * 10 * sqrt(2)
        assert_relative_eq!(
            out.cost.get(1, 2).unwrap(),
            20.0 * SQRT_2,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_costs_monotone_along_backlinks() {
        // Deterministic pseudo-random friction
        let mut friction = uniform_friction(12, 9, 0.0);
        for row in 0..12 {
            for col in 0..9 {
                let value = 1.0 + ((row * 31 + col * 17) % 23) as f64;
                friction.set(row, col, value).unwrap();
            }
        }

        let params = CostDistanceParams::new(vec![
            SourcePoint::new(0, 0, 3),
            SourcePoint::new(11, 8, 7),
        ]);
        let out = cost_distance(&friction, &params).unwrap();
        let backlink = out.backlink.as_ref().unwrap();

        for row in 0..12_usize {
            for col in 0..9_usize {
                // Walk the backlink chain to a source; cost must decrease
                // strictly at every step and reach 0
                let (mut r, mut c) = (row, col);
                let mut steps = 0;
                loop {
                    let cost = out.cost.get(r, c).unwrap();
                    assert!(cost >= 0.0);
                    let code = backlink.get(r, c).unwrap();
                    if code == BACKLINK_SOURCE {
                        assert_eq!(cost, 0.0);
                        break;
                    }
                    let (dr, dc) = D8_OFFSETS[(code - 1) as usize];
                    let pr = (r as isize + dr) as usize;
                    let pc = (c as isize + dc) as usize;
                    let pred_cost = out.cost.get(pr, pc).unwrap();
                    assert!(
                        pred_cost < cost,
                        "cost not decreasing at ({}, {}): {} -> {}",
                        r, c, cost, pred_cost
                    );
                    // Nearest source propagates along the path
                    assert_eq!(
                        out.nearest.get(r, c).unwrap(),
                        out.nearest.get(pr, pc).unwrap()
                    );
                    r = pr;
                    c = pc;
                    steps += 1;
                    assert!(steps <= 12 * 9, "backlink chain does not terminate");
                }
            }
        }
    }

    #[test]
    fn test_nodata_region_is_unreached() {
        let mut friction = uniform_friction(3, 3, 10.0);
        for row in 0..3 {
            friction.set(row, 1, -1.0).unwrap();
        }

        let params = CostDistanceParams::new(vec![SourcePoint::new(1, 0, 1)]);
        let out = cost_distance(&friction, &params).unwrap();
        let backlink = out.backlink.unwrap();

        // Left column reached
        assert_eq!(out.cost.get(1, 0).unwrap(), 0.0);
        assert!(out.cost.get(0, 0).unwrap().is_finite());

        // Masked column and everything behind it: unreached sentinels
        for row in 0..3 {
            for col in 1..3 {
                assert!(out.cost.get(row, col).unwrap().is_nan());
                assert_eq!(out.nearest.get(row, col).unwrap(), NO_SOURCE);
                assert_eq!(backlink.get(row, col).unwrap(), BACKLINK_UNREACHED);
                assert!(out.cost.is_nodata_at(row, col).unwrap());
            }
        }
    }

    #[test]
    fn test_backlink_output_is_optional() {
        let friction = uniform_friction(3, 3, 10.0);
        let params = CostDistanceParams {
            sources: vec![SourcePoint::new(1, 1, 1)],
            compute_backlink: false,
        };
        let out = cost_distance(&friction, &params).unwrap();
        assert!(out.backlink.is_none());
        assert_relative_eq!(out.cost.get(0, 1).unwrap(), 10.0);
    }

    #[test]
    fn test_empty_sources_fail_fast() {
        let friction = uniform_friction(3, 3, 10.0);
        let err = cost_distance(&friction, &CostDistanceParams::default());
        assert!(matches!(err, Err(Error::EmptySources)));
    }

    #[test]
    fn test_source_outside_grid_fails() {
        let friction = uniform_friction(3, 3, 10.0);
        let params = CostDistanceParams::new(vec![SourcePoint::new(5, 1, 1)]);
        let err = cost_distance(&friction, &params);
        assert!(matches!(
            err,
            Err(Error::SourceOutsideGrid { id: 1, row: 5, col: 1 })
        ));
    }

    #[test]
    fn test_source_on_nodata_reports_which() {
        let mut friction = uniform_friction(3, 3, 10.0);
        friction.set(0, 2, -1.0).unwrap();

        let params = CostDistanceParams::new(vec![
            SourcePoint::new(1, 1, 1),
            SourcePoint::new(0, 2, 9),
        ]);
        let err = cost_distance(&friction, &params);
        assert!(matches!(
            err,
            Err(Error::SourceOnNodata { id: 9, row: 0, col: 2 })
        ));
    }

    #[test]
    fn test_zero_and_duplicate_ids_rejected() {
        let friction = uniform_friction(3, 3, 10.0);

        let params = CostDistanceParams::new(vec![SourcePoint::new(0, 0, 0)]);
        assert!(matches!(
            cost_distance(&friction, &params),
            Err(Error::InvalidParameter { .. })
        ));

        let params = CostDistanceParams::new(vec![
            SourcePoint::new(0, 0, 1),
            SourcePoint::new(2, 2, 1),
        ]);
        assert!(matches!(
            cost_distance(&friction, &params),
            Err(Error::InvalidParameter { .. })
        ));

        let params = CostDistanceParams::new(vec![
            SourcePoint::new(0, 0, 1),
            SourcePoint::new(0, 0, 2),
        ]);
        assert!(matches!(
            cost_distance(&friction, &params),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_sources_from_raster_skips_zero_and_nodata() {
        let mut targets: Raster<u32> = Raster::new(3, 3);
        targets.set_nodata(Some(u32::MAX));
        targets.set(0, 0, 4).unwrap();
        targets.set(1, 2, 7).unwrap();
        targets.set(2, 2, u32::MAX).unwrap();

        let sources = sources_from_raster(&targets);
        assert_eq!(
            sources,
            vec![SourcePoint::new(0, 0, 4), SourcePoint::new(1, 2, 7)]
        );
    }

    #[test]
    fn test_opposite_direction() {
        assert_eq!(opposite_dir(1), 5); // E -> W
        assert_eq!(opposite_dir(3), 7); // N -> S
        assert_eq!(opposite_dir(5), 1); // W -> E
        assert_eq!(opposite_dir(7), 3); // S -> N
        assert_eq!(opposite_dir(2), 6); // NE -> SW
        assert_eq!(opposite_dir(8), 4); // SE -> NW
        assert_eq!(opposite_dir(0), 0); // source marker
    }
}
